//! Core types shared by the rules and search layers: players and the
//! deterministic playout RNG.

pub mod player;
pub mod rng;

pub use player::PlayerId;
pub use rng::PlayoutRng;
