//! Game trait for rules implementations.
//!
//! The search core never interprets game-specific concepts. It needs:
//! - The ordered list of legal moves for a state (empty iff terminal)
//! - Pure move application
//! - The terminal result, if any
//! - The player to move
//!
//! States must compare and hash equal whenever they describe the same
//! position, otherwise transpositions are not detected.

use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;

/// Result of a completed game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    /// Single winner.
    Winner(PlayerId),
    /// Tie.
    Draw,
}

impl GameResult {
    /// Check if a player won.
    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        matches!(self, GameResult::Winner(p) if *p == player)
    }

    /// Check if the game was tied.
    #[must_use]
    pub fn is_draw(&self) -> bool {
        matches!(self, GameResult::Draw)
    }
}

/// Rules of a two-player, deterministic, turn-based game.
///
/// ## Implementation Notes
///
/// - `legal_moves`: must return the same order for equal states
/// - `apply`: must not depend on anything but its inputs
/// - `result`: `None` while the game continues
pub trait Game {
    /// Board position. Cloned into every search node.
    type State: Clone + Eq + Hash + Debug;

    /// Move identifier.
    type Move: Clone + Debug;

    /// Legal moves in a fixed order. Empty iff the state is terminal.
    fn legal_moves(&self, state: &Self::State) -> Vec<Self::Move>;

    /// State reached by playing `mv` in `state`.
    fn apply(&self, state: &Self::State, mv: &Self::Move) -> Self::State;

    /// Terminal result, or `None` if the game continues.
    fn result(&self, state: &Self::State) -> Option<GameResult>;

    /// Player whose turn it is.
    fn player_to_move(&self, state: &Self::State) -> PlayerId;

    /// Check if the game is over.
    fn is_terminal(&self, state: &Self::State) -> bool {
        self.result(state).is_some()
    }
}

/// Games whose moves map onto a fixed 2-D grid, used to lay out policy
/// values for inspection and training.
pub trait PolicyGrid: Game {
    /// Grid dimensions as (rows, cols).
    fn policy_shape(&self) -> (usize, usize);

    /// Cell of a move as (row, col). Must lie inside `policy_shape`.
    fn policy_coords(&self, mv: &Self::Move) -> (usize, usize);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_result_is_winner() {
        let result = GameResult::Winner(PlayerId::new(1));
        assert!(!result.is_winner(PlayerId::new(0)));
        assert!(result.is_winner(PlayerId::new(1)));
        assert!(!result.is_draw());

        let draw = GameResult::Draw;
        assert!(!draw.is_winner(PlayerId::new(0)));
        assert!(!draw.is_winner(PlayerId::new(1)));
        assert!(draw.is_draw());
    }
}
