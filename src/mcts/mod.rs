//! Monte Carlo Tree Search over a shared game graph.
//!
//! ## Overview
//!
//! - **Transpositions**: identical states reached by different move orders
//!   share one node with several parents
//! - **Bounded memory**: subtrees are released explicitly (`filicide`,
//!   `prune`, `prune_children`, `prune_ancestors`) and unreachable nodes
//!   are reclaimed immediately
//! - **Thread-capable**: one lock for the node table, one per node;
//!   `Tree::mcts_parallel` fans iterations over scoped workers
//! - **Pluggable playouts and tracing**: `PlayoutPolicy`, `TreeObserver`
//!
//! ## Usage
//!
//! ```rust
//! use mcts_graph::games::tictactoe::{Board, TicTacToe};
//! use mcts_graph::mcts::{MctsConfig, Tree};
//!
//! let tree = Tree::with_config(TicTacToe::new(), MctsConfig::default().with_seed(7)).unwrap();
//!
//! // Run 500 iterations from the empty board
//! let stats = tree.mcts(&Board::new(), 500);
//! assert_eq!(stats.iterations, 500);
//!
//! // Best move for X
//! let root = tree.find(&Board::new()).unwrap();
//! let best = tree.get_move(&root);
//! assert!(best.is_some());
//!
//! // Keep memory bounded between moves
//! tree.prune(1_000);
//! ```

pub mod config;
pub mod error;
pub mod node;
pub mod observer;
pub mod policy;
pub mod prune;
pub mod search;
pub mod stats;
pub mod tree;

// Re-export main types
pub use config::MctsConfig;
pub use error::ConfigError;
pub use node::{Expansion, Node, NodeId, NodeStats};
pub use observer::{LogObserver, NullObserver, TreeEvent, TreeObserver};
pub use policy::{PlayoutPolicy, RandomPlayout};
pub use search::MovePolicy;
pub use stats::SearchStats;
pub use tree::{Tree, TreeStats};
