//! Configuration errors.
//!
//! The search itself has no recoverable failure modes; only a bad
//! configuration is reported to the caller.

use thiserror::Error;

/// Invalid `MctsConfig` parameter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("exploration constant must be finite and non-negative, got {0}")]
    ExplorationConstant(f64),

    #[error("tie reward must lie in [0, 1], got {0}")]
    TieReward(f64),
}
