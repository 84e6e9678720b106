//! Typed failure modes of the engine. Configuration problems are caller
//! errors rejected before anything is constructed; a solver stall is an
//! expected, recoverable outcome of normal play.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::Coord;

/// Rejected [`GameConfig`](crate::game::GameConfig) values. A game is never
/// partially constructed: validation runs before any board state exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("grid size {0} is outside the supported range 5..=35")]
    GridSize(usize),
    /// The board must keep at least one non-bomb cell besides the first
    /// clicked one.
    #[error("bomb amount {bombs} does not fit a {size}x{size} grid")]
    BombAmount { size: usize, bombs: usize },
    #[error("max bomb probability {0}% is outside 1..=100")]
    MaxProbability(u8),
}

/// The solver reached its fixed point with no proven-safe cell left to
/// reveal: the game cannot continue without a guess. Recoverable; the
/// caller decides whether to prompt the player or stop auto-solving.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("guess required: {} cells with no deducible status", unknown.len())]
pub struct GuessRequired {
    /// The cells a guess would have to pick from, sorted.
    pub unknown: Vec<Coord>,
    /// Proven-safe cells still unrevealed when the solver stalled. Zero
    /// under the stall condition; carried for presentation.
    pub unrevealed_safe: usize,
}
