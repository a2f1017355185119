use advisor_graph::RuleGraph;
use advisor_metrics::MetricResolver;
use advisor_protocol::{deliver, ReportingSink};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::config::EngineConfig;
use crate::context::RuleContext;
use crate::error::Result;
use crate::evidence::{EvidenceChannel, EvidencePayload};
use crate::lifecycle::{Lifecycle, RuleOutcome, RuleState};
use crate::rule::Rule;
use crate::unit::ProfiledUnit;

/// An immutable, ordered set of rules.
///
/// The dependency order is computed once at construction; evaluating a unit
/// never mutates the set, so one `RuleSet` can serve several threads, each
/// evaluating its own units.
pub struct RuleSet {
    /// Enabled rules, parents before children
    rules: Vec<Box<dyn Rule>>,
    graph: RuleGraph,
    config: EngineConfig,
    resolver: MetricResolver,
}

/// Outcome of one rule on one unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleReport {
    pub rule: String,
    #[serde(flatten)]
    pub outcome: RuleOutcome,
    /// Lifecycle states visited, starting at `Declared`
    pub states: Vec<RuleState>,
}

/// Outcome of one pass over one unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitReport {
    pub unit: String,
    /// In execution order
    pub rules: Vec<RuleReport>,
    /// Evidence visible at the end of the pass, by publishing rule
    pub evidence: BTreeMap<String, EvidencePayload>,
}

impl UnitReport {
    pub fn outcome(&self, rule: &str) -> Option<&RuleOutcome> {
        self.rules.iter().find(|r| r.rule == rule).map(|r| &r.outcome)
    }

    #[must_use]
    pub fn count(&self, state: RuleState) -> usize {
        self.rules
            .iter()
            .filter(|r| r.outcome.state() == state)
            .count()
    }

    pub fn aborted(&self) -> impl Iterator<Item = &RuleReport> {
        self.rules.iter().filter(|r| r.outcome.is_aborted())
    }
}

impl RuleSet {
    /// Build a rule set, dropping rules the configuration disables.
    ///
    /// Fails on invalid configuration, duplicate identifiers and dependency
    /// cycles among the declared rules, including cycles through rules the
    /// configuration disables.
    pub fn new(rules: Vec<Box<dyn Rule>>, config: EngineConfig) -> Result<Self> {
        config.validate()?;

        // Cycles are checked over every declared rule, disabled or not
        RuleGraph::build(rules.iter().map(|rule| rule.info().declaration()))?;

        let (enabled, disabled): (Vec<_>, Vec<_>) = rules
            .into_iter()
            .partition(|rule| config.is_enabled(rule.info()));
        for rule in &disabled {
            log::info!("Rule {} disabled by configuration", rule.info().identifier);
        }

        let graph = RuleGraph::build(enabled.iter().map(|rule| rule.info().declaration()))?;

        let mut by_id: HashMap<String, Box<dyn Rule>> = enabled
            .into_iter()
            .map(|rule| (rule.info().identifier.clone(), rule))
            .collect();
        let rules: Vec<Box<dyn Rule>> = graph
            .order()
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();

        let resolver =
            MetricResolver::new().warn_on_missing_optional(config.warn_on_missing_optional);

        log::info!(
            "Rule set ready: {} rules ({} disabled)",
            rules.len(),
            disabled.len()
        );

        Ok(Self {
            rules,
            graph,
            config,
            resolver,
        })
    }

    pub fn with_defaults(rules: Vec<Box<dyn Rule>>) -> Result<Self> {
        Self::new(rules, EngineConfig::default())
    }

    /// Rule identifiers in execution order
    pub fn order(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.info().identifier.as_str())
    }

    pub fn graph(&self) -> &RuleGraph {
        &self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every enabled rule against `unit`, parents first.
    ///
    /// Each call gets a fresh evidence channel, so nothing published here is
    /// visible to any other unit or pass. Rule failures are recorded as
    /// `Aborted` outcomes; only engine faults are returned as errors.
    pub fn evaluate_unit(
        &self,
        unit: &ProfiledUnit,
        sink: &mut dyn ReportingSink,
    ) -> Result<UnitReport> {
        let mut channel = EvidenceChannel::new(unit.id());
        let mut reports = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            reports.push(self.run_rule(rule.as_ref(), unit, sink, &mut channel)?);
        }

        let report = UnitReport {
            unit: unit.id().to_string(),
            rules: reports,
            evidence: channel.snapshot(),
        };

        log::info!(
            "Unit {}: {} emitted, {} skipped, {} aborted",
            report.unit,
            report.count(RuleState::Emitted),
            report.count(RuleState::Skipped),
            report.count(RuleState::Aborted)
        );

        Ok(report)
    }

    fn run_rule(
        &self,
        rule: &dyn Rule,
        unit: &ProfiledUnit,
        sink: &mut dyn ReportingSink,
        channel: &mut EvidenceChannel,
    ) -> Result<RuleReport> {
        let info = rule.info();
        let id = info.identifier.as_str();
        let mut lifecycle = Lifecycle::new(id);

        lifecycle.advance(RuleState::Resolving)?;
        let requests = rule.requested_metrics();
        let metrics = match self.resolver.resolve(id, unit.catalog(), sink, &requests) {
            Ok(metrics) => metrics,
            Err(err) => return abort(lifecycle, id, unit, sink, err.to_string()),
        };

        lifecycle.advance(RuleState::Evaluating)?;
        let mut ctx = RuleContext::new(
            info,
            unit,
            self.resolver,
            sink,
            channel,
            self.config.warn_on_undeclared_parent,
        );
        let result = rule.evaluate(&mut ctx, &metrics);
        let completed = ctx.complete();

        if let Err(err) = result {
            return abort(lifecycle, id, unit, sink, err.to_string());
        }

        if let Some(payload) = completed.evidence {
            channel.publish(id, payload);
        }

        let outcome = if completed.findings.is_empty() {
            lifecycle.advance(RuleState::Skipped)?;
            log::debug!("Rule {id} skipped on unit {}: nothing to report", unit.id());
            RuleOutcome::Skipped
        } else {
            let findings = completed.findings.len();
            for finding in completed.findings {
                deliver(sink, finding);
            }
            lifecycle.advance(RuleState::Emitted)?;
            log::info!("Rule {id} emitted {findings} findings on unit {}", unit.id());
            RuleOutcome::Emitted { findings }
        };

        Ok(RuleReport {
            rule: id.to_string(),
            outcome,
            states: lifecycle.into_history(),
        })
    }
}

fn abort(
    mut lifecycle: Lifecycle,
    rule: &str,
    unit: &ProfiledUnit,
    sink: &mut dyn ReportingSink,
    reason: String,
) -> Result<RuleReport> {
    lifecycle.advance(RuleState::Aborted)?;
    sink.abort(rule, &reason);
    log::warn!("Rule {rule} aborted on unit {}: {reason}", unit.id());
    Ok(RuleReport {
        rule: rule.to_string(),
        outcome: RuleOutcome::Aborted { reason },
        states: lifecycle.into_history(),
    })
}
