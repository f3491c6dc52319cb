//! 3x3 tic-tac-toe.
//!
//! The reference game for the search engine:
//! - X (player 0) moves first, O (player 1) second
//! - Moves are cell indices 0..9, row-major
//! - Three in a row wins, a full board without a line is a draw
//!
//! Small enough to enumerate (5478 reachable positions) and rich in
//! transpositions, which makes it a good check for the dedup table.

mod game;

pub use game::{Board, Cell, TicTacToe, REACHABLE_POSITIONS};
