use advisor_metrics::MetricCatalog;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// What kind of workload a profiled unit measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadKind {
    #[default]
    Kernel,
    Range,
    Graph,
}

/// One profiled unit: an identifier, its workload kind and its metrics.
#[derive(Clone)]
pub struct ProfiledUnit {
    id: String,
    kind: WorkloadKind,
    catalog: Arc<dyn MetricCatalog>,
}

impl ProfiledUnit {
    pub fn new(id: impl Into<String>, catalog: impl MetricCatalog + 'static) -> Self {
        Self {
            id: id.into(),
            kind: WorkloadKind::default(),
            catalog: Arc::new(catalog),
        }
    }

    /// Builder: set the workload kind
    #[must_use]
    pub fn kind(mut self, kind: WorkloadKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn workload_kind(&self) -> WorkloadKind {
        self.kind
    }

    pub fn catalog(&self) -> &dyn MetricCatalog {
        self.catalog.as_ref()
    }
}

impl fmt::Debug for ProfiledUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfiledUnit")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
