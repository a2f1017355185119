use thiserror::Error;

/// Result type for metric resolution
pub type Result<T> = std::result::Result<T, MetricError>;

/// Prefix of the abort reason when mandatory metrics are absent
pub const MISSING_REQUIRED_MESSAGE: &str = "Some required metrics are missing; aborted rule execution";

/// Errors raised while declaring or resolving metrics
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    /// One or more mandatory metrics are absent from the catalog
    #[error("Some required metrics are missing; aborted rule execution: {}", .names.join(", "))]
    MissingRequired { names: Vec<String> },

    /// A lookup key would point at two different metrics
    #[error("Alias {alias} is already used by metric {existing}; cannot bind it to {requested}")]
    AliasCollision {
        alias: String,
        existing: String,
        requested: String,
    },

    /// The same metric was requested twice with different contracts
    #[error("Conflicting requests for metric {name}: {detail}")]
    ConflictingRequest { name: String, detail: String },

    /// Fallback of a type the resolver cannot synthesize
    #[error("Invalid fallback value: {0}")]
    InvalidFallback(String),

    /// Breakdown metric does not hold a list of metric names
    #[error("Metric {0} is not a breakdown list")]
    InvalidBreakdown(String),

    /// Key is unknown or resolved to the missing marker
    #[error("Metric {0} was not resolved")]
    NotResolved(String),
}

impl MetricError {
    /// Create an invalid fallback error
    pub fn invalid_fallback(msg: impl Into<String>) -> Self {
        Self::InvalidFallback(msg.into())
    }

    /// Names of the missing mandatory metrics, empty for other errors
    pub fn missing_names(&self) -> &[String] {
        match self {
            Self::MissingRequired { names } => names,
            _ => &[],
        }
    }
}
