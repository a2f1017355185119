use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::finding::{
    Finding, FindingId, FocusMetric, Severity, SourceMarker, Speedup, Table,
};

/// Host-side receiver of everything a rule reports.
///
/// Findings are announced with [`ReportingSink::emit`] and enriched through the
/// `attach_*` calls using the returned id. Warnings, errors and aborts are
/// diagnostics about the rule run itself and never count as findings.
pub trait ReportingSink {
    fn emit(&mut self, rule: &str, severity: Severity, message: &str, title: &str) -> FindingId;

    fn attach_focus_metric(&mut self, id: FindingId, focus: FocusMetric);

    fn attach_speedup(&mut self, id: FindingId, speedup: Speedup);

    fn attach_table(&mut self, id: FindingId, table: Table);

    fn attach_source_marker(&mut self, id: FindingId, marker: SourceMarker);

    fn emit_warning(&mut self, rule: &str, message: &str);

    fn emit_error(&mut self, rule: &str, message: &str);

    /// The rule stopped without producing findings.
    fn abort(&mut self, rule: &str, reason: &str);
}

/// Hand a fully built finding to a sink through the piecewise protocol.
pub fn deliver(sink: &mut dyn ReportingSink, finding: Finding) -> FindingId {
    let Finding {
        rule,
        severity,
        title,
        message,
        speedup,
        focus_metrics,
        table,
        source_markers,
    } = finding;

    let id = sink.emit(&rule, severity, &message, &title);
    if let Some(speedup) = speedup {
        sink.attach_speedup(id, speedup);
    }
    for focus in focus_metrics {
        sink.attach_focus_metric(id, focus);
    }
    if let Some(table) = table {
        sink.attach_table(id, table);
    }
    for marker in source_markers {
        sink.attach_source_marker(id, marker);
    }
    id
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    Warning,
    Error,
    Abort,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct Diagnostic {
    pub rule: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Sink that records everything in memory, in arrival order.
#[derive(Debug, Serialize, Deserialize, Clone, Default, JsonSchema)]
pub struct MemorySink {
    findings: Vec<Finding>,
    diagnostics: Vec<Diagnostic>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn findings_for<'a>(&'a self, rule: &'a str) -> impl Iterator<Item = &'a Finding> + 'a {
        self.findings.iter().filter(move |f| f.rule == rule)
    }

    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics_of(DiagnosticKind::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics_of(DiagnosticKind::Error)
    }

    pub fn aborts(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics_of(DiagnosticKind::Abort)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        crate::serialize_json(self)
    }

    fn finding_mut(&mut self, id: FindingId) -> Option<&mut Finding> {
        let finding = usize::try_from(id.0)
            .ok()
            .and_then(|idx| self.findings.get_mut(idx));
        if finding.is_none() {
            log::warn!("Dropping attachment for unknown finding {}", id.0);
        }
        finding
    }

    fn push_diagnostic(&mut self, rule: &str, kind: DiagnosticKind, message: &str) {
        self.diagnostics.push(Diagnostic {
            rule: rule.to_string(),
            kind,
            message: message.to_string(),
        });
    }
}

impl ReportingSink for MemorySink {
    fn emit(&mut self, rule: &str, severity: Severity, message: &str, title: &str) -> FindingId {
        let id = FindingId(self.findings.len() as u64);
        self.findings
            .push(Finding::new(rule, severity, title, message));
        id
    }

    fn attach_focus_metric(&mut self, id: FindingId, focus: FocusMetric) {
        if let Some(finding) = self.finding_mut(id) {
            finding.focus_metrics.push(focus);
        }
    }

    fn attach_speedup(&mut self, id: FindingId, speedup: Speedup) {
        if let Some(finding) = self.finding_mut(id) {
            finding.speedup = Some(speedup);
        }
    }

    fn attach_table(&mut self, id: FindingId, table: Table) {
        if let Some(finding) = self.finding_mut(id) {
            finding.table = Some(table);
        }
    }

    fn attach_source_marker(&mut self, id: FindingId, marker: SourceMarker) {
        if let Some(finding) = self.finding_mut(id) {
            finding.source_markers.push(marker);
        }
    }

    fn emit_warning(&mut self, rule: &str, message: &str) {
        self.push_diagnostic(rule, DiagnosticKind::Warning, message);
    }

    fn emit_error(&mut self, rule: &str, message: &str) {
        self.push_diagnostic(rule, DiagnosticKind::Error, message);
    }

    fn abort(&mut self, rule: &str, reason: &str) {
        self.push_diagnostic(rule, DiagnosticKind::Abort, reason);
    }
}
