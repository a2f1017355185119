use anyhow::Result;
use serde::Serialize;

pub mod finding;
pub mod sink;

pub use finding::{
    Finding, FindingId, FocusMetric, Importance, Severity, SourceMarker, Speedup, SpeedupKind,
    Table,
};
pub use sink::{deliver, Diagnostic, DiagnosticKind, MemorySink, ReportingSink};

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

/// JSON schema of a [`Finding`], for hosts that validate reports
pub fn finding_schema() -> Result<String> {
    serialize_json(&schemars::schema_for!(Finding))
}
