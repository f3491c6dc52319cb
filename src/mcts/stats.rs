//! Per-search statistics for diagnostics and tuning.

use serde::{Deserialize, Serialize};

/// Statistics collected during one `mcts` call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Total iterations performed.
    pub iterations: u32,

    /// Playouts (rollouts) performed.
    pub playouts: u32,

    /// Leaves whose children were attached.
    pub expansions: u32,

    /// Longest selected path, in edges.
    pub max_depth: u16,

    /// Total time spent searching (microseconds).
    pub time_us: u64,
}

impl SearchStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all statistics to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fold another worker's counters into these. Time is not summed;
    /// workers run concurrently.
    pub fn merge(&mut self, other: &SearchStats) {
        self.iterations += other.iterations;
        self.playouts += other.playouts;
        self.expansions += other.expansions;
        self.max_depth = self.max_depth.max(other.max_depth);
    }

    /// Calculate iterations per second.
    #[must_use]
    pub fn iterations_per_second(&self) -> f64 {
        if self.time_us == 0 {
            0.0
        } else {
            self.iterations as f64 / (self.time_us as f64 / 1_000_000.0)
        }
    }
}
