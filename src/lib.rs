//! # mcts-graph
//!
//! Monte Carlo Tree Search for two-player, deterministic, turn-based games,
//! searching a transposition-deduplicated game graph.
//!
//! ## Design Principles
//!
//! 1. **Graph, not tree**: a position reached by several move orders is one
//!    node with several parents. Statistics gathered on any path benefit
//!    all of them.
//!
//! 2. **Explicit memory bounds**: subtrees are released on request and a
//!    node is reclaimed as soon as nothing points at it.
//!
//! 3. **Game-agnostic**: the search only sees the `Game` trait.
//!
//! ## Architecture
//!
//! - **Arena + handles**: nodes live in a slot arena and refer to each
//!   other through generation-checked `NodeId`s.
//!
//! - **Two lock levels**: one lock for the node table and root set, one per
//!   node for its statistics and edges. Never held together.
//!
//! ## Modules
//!
//! - `core`: Player IDs and the forkable playout RNG
//! - `rules`: The `Game` trait implemented by rules engines
//! - `games`: Bundled games (tic-tac-toe)
//! - `mcts`: Search graph, selection, expansion, pruning

pub mod core;
pub mod rules;
pub mod games;
pub mod mcts;

// Re-export commonly used types
pub use crate::core::{PlayerId, PlayoutRng};

pub use crate::rules::{Game, GameResult, PolicyGrid};

pub use crate::mcts::{
    ConfigError, Expansion, LogObserver, MctsConfig, MovePolicy, Node, NodeId, NodeStats,
    NullObserver, PlayoutPolicy, RandomPlayout, SearchStats, Tree, TreeEvent, TreeObserver,
    TreeStats,
};
