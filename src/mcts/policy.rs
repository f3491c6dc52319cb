//! Playout policies.
//!
//! A playout continues a leaf state to the end of the game and reports the
//! result, which is then credited along the selected path. Policies are
//! trait objects so applications can swap in heuristic playouts.

use crate::core::PlayoutRng;
use crate::rules::{Game, GameResult};

/// Policy for running playouts (rollouts) from a leaf state.
pub trait PlayoutPolicy<G: Game>: Send + Sync {
    /// Play `state` out to a terminal result.
    ///
    /// `max_depth` caps the number of plies (0 = unlimited); a capped
    /// playout is scored as a draw.
    fn playout(&self, game: &G, state: &G::State, rng: &mut PlayoutRng, max_depth: u32) -> GameResult;
}

/// Uniform random playout policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomPlayout;

impl<G: Game> PlayoutPolicy<G> for RandomPlayout {
    fn playout(&self, game: &G, state: &G::State, rng: &mut PlayoutRng, max_depth: u32) -> GameResult {
        let mut state = state.clone();
        let mut depth = 0;

        loop {
            if let Some(result) = game.result(&state) {
                return result;
            }

            if max_depth > 0 && depth >= max_depth {
                return GameResult::Draw;
            }

            let moves = game.legal_moves(&state);
            let Some(mv) = rng.choose(&moves) else {
                // No moves but no result either: score as a draw
                return GameResult::Draw;
            };
            state = game.apply(&state, mv);
            depth += 1;
        }
    }
}
