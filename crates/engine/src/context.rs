use advisor_metrics::{Metric, MetricRequest, MetricResolver, ResolutionTable};
use advisor_protocol::{Finding, ReportingSink, Severity};

use crate::error::Result;
use crate::evidence::{EvidenceChannel, EvidencePayload};
use crate::rule::RuleInfo;
use crate::unit::{ProfiledUnit, WorkloadKind};

/// Everything a rule can reach while it evaluates one unit.
///
/// Findings and published evidence are held back until the rule returns
/// successfully; a rule that fails leaves no trace beyond its diagnostics.
pub struct RuleContext<'a> {
    info: &'a RuleInfo,
    unit: &'a ProfiledUnit,
    resolver: MetricResolver,
    sink: &'a mut dyn ReportingSink,
    evidence: &'a EvidenceChannel,
    warn_on_undeclared_parent: bool,
    findings: Vec<Finding>,
    outgoing: Option<EvidencePayload>,
}

/// What a successful evaluation leaves behind
pub(crate) struct Completed {
    pub findings: Vec<Finding>,
    pub evidence: Option<EvidencePayload>,
}

impl<'a> RuleContext<'a> {
    pub(crate) fn new(
        info: &'a RuleInfo,
        unit: &'a ProfiledUnit,
        resolver: MetricResolver,
        sink: &'a mut dyn ReportingSink,
        evidence: &'a EvidenceChannel,
        warn_on_undeclared_parent: bool,
    ) -> Self {
        Self {
            info,
            unit,
            resolver,
            sink,
            evidence,
            warn_on_undeclared_parent,
            findings: Vec::new(),
            outgoing: None,
        }
    }

    pub fn rule_id(&self) -> &str {
        &self.info.identifier
    }

    pub fn info(&self) -> &RuleInfo {
        self.info
    }

    pub fn unit(&self) -> &ProfiledUnit {
        self.unit
    }

    pub fn workload_kind(&self) -> WorkloadKind {
        self.unit.workload_kind()
    }

    /// Resolve an additional batch of metrics with the same contract as the
    /// rule's declared requests. A missing mandatory metric here aborts the
    /// rule once the error is propagated.
    pub fn resolve(&mut self, requests: &[MetricRequest]) -> Result<ResolutionTable> {
        let table = self.resolver.resolve(
            &self.info.identifier,
            self.unit.catalog(),
            &mut *self.sink,
            requests,
        )?;
        Ok(table)
    }

    /// Resolve every metric named by a breakdown counter, all as mandatory
    pub fn resolve_breakdown(&mut self, breakdown: &Metric) -> Result<ResolutionTable> {
        let table = self.resolver.resolve_breakdown(
            &self.info.identifier,
            self.unit.catalog(),
            &mut *self.sink,
            breakdown,
        )?;
        Ok(table)
    }

    /// Evidence published by `parent` in this pass, empty if there is none
    pub fn receive_from_parent(&self, parent: &str) -> EvidencePayload {
        if !self.info.has_parent(parent) {
            if self.warn_on_undeclared_parent {
                log::warn!(
                    "Rule {} reads evidence from {parent}, which is not a declared parent",
                    self.info.identifier
                );
            }
            return EvidencePayload::empty();
        }
        self.evidence.receive(parent)
    }

    /// Weight in percent published by `parent` under `key`
    pub fn parent_weight(&self, parent: &str, key: &str) -> Option<f64> {
        self.receive_from_parent(parent).get(key)
    }

    /// Publish evidence for child rules; a later call replaces an earlier one
    pub fn send_to_children(&mut self, payload: impl Into<EvidencePayload>) {
        if self.outgoing.replace(payload.into()).is_some() {
            log::debug!(
                "Rule {} replaced its pending evidence",
                self.info.identifier
            );
        }
    }

    /// Finding pre-filled with this rule's identifier
    pub fn finding(
        &self,
        severity: Severity,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Finding {
        Finding::new(self.info.identifier.clone(), severity, title, message)
    }

    /// Queue a finding for delivery when evaluation succeeds
    pub fn report(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    /// Immediate warning diagnostic, not tied to a finding
    pub fn warn(&mut self, message: &str) {
        self.sink.emit_warning(&self.info.identifier, message);
    }

    pub fn pending_findings(&self) -> usize {
        self.findings.len()
    }

    pub(crate) fn complete(self) -> Completed {
        Completed {
            findings: self.findings,
            evidence: self.outgoing,
        }
    }
}
