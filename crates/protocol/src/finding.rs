use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Message type of an emitted finding.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Nothing to improve; informational summary.
    Ok,
    /// An actionable performance opportunity.
    Optimization,
    Warning,
    Error,
}

/// How strongly a focus metric relates to the finding.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    #[default]
    Default,
    Low,
    High,
}

/// Scope of a speedup estimate.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SpeedupKind {
    /// Improvement of the examined pattern only, not weighted by its share of unit time.
    Local,
    /// Improvement weighted by a utilization fraction, relative to total unit runtime.
    Global,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, JsonSchema)]
pub struct Speedup {
    pub kind: SpeedupKind,
    pub percent: f64,
}

/// A metric the host should highlight next to a finding.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct FocusMetric {
    pub metric_name: String,
    pub value: f64,
    pub importance: Importance,
    pub hint: String,
}

impl FocusMetric {
    pub fn new(
        metric_name: impl Into<String>,
        value: f64,
        importance: Importance,
        hint: impl Into<String>,
    ) -> Self {
        Self {
            metric_name: metric_name.into(),
            value,
            importance,
            hint: hint.into(),
        }
    }
}

/// Tabular evidence, carried as opaque data for the host's table renderer.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default, JsonSchema)]
pub struct Table {
    pub title: String,
    pub description: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Advice pinned to a source line.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct SourceMarker {
    pub path: String,
    pub line: u32,
    pub message: String,
    pub severity: Severity,
}

/// Handle returned by a sink for a finding it accepted.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema)]
pub struct FindingId(pub u64);

/// One diagnostic produced by a rule.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct Finding {
    /// Identifier of the rule that produced it
    pub rule: String,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub speedup: Option<Speedup>,
    #[serde(default)]
    pub focus_metrics: Vec<FocusMetric>,
    pub table: Option<Table>,
    #[serde(default)]
    pub source_markers: Vec<SourceMarker>,
}

impl Finding {
    pub fn new(
        rule: impl Into<String>,
        severity: Severity,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule: rule.into(),
            severity,
            title: title.into(),
            message: message.into(),
            speedup: None,
            focus_metrics: Vec::new(),
            table: None,
            source_markers: Vec::new(),
        }
    }

    /// Builder: set the speedup estimate
    #[must_use]
    pub fn with_speedup(mut self, speedup: Speedup) -> Self {
        self.speedup = Some(speedup);
        self
    }

    /// Builder: add a focus metric
    #[must_use]
    pub fn with_focus_metric(mut self, focus: FocusMetric) -> Self {
        self.focus_metrics.push(focus);
        self
    }

    /// Builder: attach a table; empty tables are dropped
    #[must_use]
    pub fn with_table(mut self, table: Table) -> Self {
        if !table.is_empty() {
            self.table = Some(table);
        }
        self
    }

    /// Builder: add a source marker
    #[must_use]
    pub fn with_source_marker(mut self, marker: SourceMarker) -> Self {
        self.source_markers.push(marker);
        self
    }
}
