use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Rule declared twice: {0}")]
    DuplicateRule(String),

    #[error("Empty rule identifier")]
    EmptyIdentifier,

    #[error("Dependency cycle among rules: {}", .rules.join(", "))]
    Cycle { rules: Vec<String> },

    #[error("Rule not found: {0}")]
    RuleNotFound(String),
}
