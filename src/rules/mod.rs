//! Game trait for rules implementations.
//!
//! Games implement `Game` to define:
//! - Legal moves for each state
//! - How moves produce new states
//! - Win/draw conditions
//!
//! The search core calls into `Game` but never interprets
//! game-specific concepts directly.

pub mod engine;

pub use engine::{Game, GameResult, PolicyGrid};
