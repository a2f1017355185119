use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A rule as seen by the dependency graph: its identifier and the
/// identifiers of the rules whose evidence it reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleDeclaration {
    pub identifier: String,

    #[serde(default)]
    pub parents: Vec<String>,
}

impl RuleDeclaration {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            parents: Vec::new(),
        }
    }

    /// Builder: add a parent
    #[must_use]
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }
}

/// A parent identifier that names no declared rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanglingParent {
    pub rule: String,
    pub parent: String,
}

/// Parent → child graph over the declared rules, with its execution order
/// computed once at build time.
#[derive(Debug, Clone)]
pub struct RuleGraph {
    /// Directed graph (parent -> child)
    pub(crate) graph: DiGraph<String, ()>,

    /// Rule identifier -> NodeIndex mapping
    pub(crate) index: HashMap<String, NodeIndex>,

    /// Topological order, parents first, ties broken by declaration order
    pub(crate) order: Vec<String>,

    pub(crate) dangling: Vec<DanglingParent>,
}
