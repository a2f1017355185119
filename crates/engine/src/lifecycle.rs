use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Where a rule is within one pass over one profiled unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleState {
    Declared,
    Resolving,
    Evaluating,
    /// Mandatory metrics missing or evaluation failed
    Aborted,
    /// Evaluation produced at least one finding
    Emitted,
    /// Evaluation completed with nothing to report
    Skipped,
}

impl RuleState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Aborted | Self::Emitted | Self::Skipped)
    }

    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Declared, Self::Resolving)
                | (Self::Resolving, Self::Aborted)
                | (Self::Resolving, Self::Evaluating)
                | (Self::Evaluating, Self::Emitted)
                | (Self::Evaluating, Self::Skipped)
                | (Self::Evaluating, Self::Aborted)
        )
    }
}

/// State machine for one rule in one pass; keeps the visited states.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    rule: String,
    history: Vec<RuleState>,
}

impl Lifecycle {
    pub fn new(rule: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            history: vec![RuleState::Declared],
        }
    }

    #[must_use]
    pub fn state(&self) -> RuleState {
        self.history
            .last()
            .copied()
            .unwrap_or(RuleState::Declared)
    }

    pub fn advance(&mut self, next: RuleState) -> Result<()> {
        let from = self.state();
        if !from.can_transition_to(next) {
            return Err(EngineError::InvalidTransition {
                rule: self.rule.clone(),
                from,
                to: next,
            });
        }
        log::trace!("Rule {}: {from:?} -> {next:?}", self.rule);
        self.history.push(next);
        Ok(())
    }

    pub fn history(&self) -> &[RuleState] {
        &self.history
    }

    pub fn into_history(self) -> Vec<RuleState> {
        self.history
    }
}

/// Final result of one rule on one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RuleOutcome {
    Emitted { findings: usize },
    Skipped,
    Aborted { reason: String },
}

impl RuleOutcome {
    #[must_use]
    pub const fn state(&self) -> RuleState {
        match self {
            Self::Emitted { .. } => RuleState::Emitted,
            Self::Skipped => RuleState::Skipped,
            Self::Aborted { .. } => RuleState::Aborted,
        }
    }

    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}
