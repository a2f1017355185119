use advisor_graph::RuleDeclaration;
use advisor_metrics::{MetricRequest, ResolutionTable};
use serde::{Deserialize, Serialize};

use crate::context::RuleContext;
use crate::error::Result;

/// Static description of a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleInfo {
    /// Unique identifier, also the key other rules use as parent
    pub identifier: String,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Report section the rule belongs to
    #[serde(default)]
    pub section_identifier: String,

    /// Rules whose evidence this rule reads
    #[serde(default)]
    pub parent_identifiers: Vec<String>,
}

impl RuleInfo {
    /// New rule description; the display name defaults to the identifier
    pub fn new(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        Self {
            name: identifier.clone(),
            identifier,
            description: String::new(),
            section_identifier: String::new(),
            parent_identifiers: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section_identifier = section.into();
        self
    }

    #[must_use]
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_identifiers.push(parent.into());
        self
    }

    #[must_use]
    pub fn has_parent(&self, parent: &str) -> bool {
        self.parent_identifiers.iter().any(|p| p == parent)
    }

    pub fn declaration(&self) -> RuleDeclaration {
        RuleDeclaration {
            identifier: self.identifier.clone(),
            parents: self.parent_identifiers.clone(),
        }
    }
}

/// A performance rule.
///
/// The engine resolves [`Rule::requested_metrics`] before calling
/// [`Rule::evaluate`]; a rule whose mandatory metrics are missing is never
/// evaluated. Returning an error from `evaluate` aborts the rule and drops
/// every finding it reported.
pub trait Rule: Send + Sync {
    fn info(&self) -> &RuleInfo;

    /// Metrics resolved before evaluation
    fn requested_metrics(&self) -> Vec<MetricRequest> {
        Vec::new()
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>, metrics: &ResolutionTable) -> Result<()>;
}
