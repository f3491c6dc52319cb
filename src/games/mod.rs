//! Bundled `Game` implementations.

pub mod tictactoe;
