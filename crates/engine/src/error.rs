use thiserror::Error;

use crate::lifecycle::RuleState;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Rule graph error: {0}")]
    Graph(#[from] advisor_graph::GraphError),

    #[error(transparent)]
    Metric(#[from] advisor_metrics::MetricError),

    #[error("Invalid lifecycle transition for rule {rule}: {from:?} -> {to:?}")]
    InvalidTransition {
        rule: String,
        from: RuleState,
        to: RuleState,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A rule could not complete its own computation
    #[error("Rule {rule} failed: {message}")]
    Evaluation { rule: String, message: String },
}

impl EngineError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn evaluation(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Evaluation {
            rule: rule.into(),
            message: message.into(),
        }
    }
}
