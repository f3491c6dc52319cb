//! MCTS configuration parameters.

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// MCTS configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    /// Exploration constant C in U = C * sqrt(N_parents) / (1 + n).
    /// Higher values favor exploration over exploitation.
    pub exploration_constant: f64,

    /// Reward credited for a tie, as a fraction of a win.
    pub tie_reward: f64,

    /// Random seed for playout RNG.
    /// Same seed produces deterministic single-threaded searches.
    pub seed: u64,

    /// Maximum plies per playout (0 = unlimited).
    /// Playouts cut off at the limit are scored as a tie.
    pub playout_max_depth: u32,

    /// Arena and table capacity reserved up front.
    pub initial_capacity: usize,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            exploration_constant: 1.44,
            tie_reward: 0.5,
            seed: 42,
            playout_max_depth: 0,
            initial_capacity: 1024,
        }
    }
}

impl MctsConfig {
    /// Create a new config with custom exploration constant.
    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration_constant = c;
        self
    }

    /// Create a new config with custom tie reward.
    pub fn with_tie_reward(mut self, reward: f64) -> Self {
        self.tie_reward = reward;
        self
    }

    /// Create a new config with custom seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Create a new config with a playout depth limit.
    pub fn with_playout_max_depth(mut self, depth: u32) -> Self {
        self.playout_max_depth = depth;
        self
    }

    /// Create a new config with custom initial capacity.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.exploration_constant.is_finite() || self.exploration_constant < 0.0 {
            return Err(ConfigError::ExplorationConstant(self.exploration_constant));
        }
        if !(0.0..=1.0).contains(&self.tie_reward) {
            return Err(ConfigError::TieReward(self.tie_reward));
        }
        Ok(())
    }
}
