//! A Minesweeper game engine: a grid of cells with hidden bombs, bomb
//! population (uniformly random or distance-biased around the first click),
//! an iterative cascade reveal, and a constraint-propagation solver that
//! classifies unrevealed cells as provably safe, provably bombs, or unknown.
//!
//! The crate is a pure in-memory engine. Rendering, input wiring, timers and
//! menus are left to the caller, which drives a [`Game`] through
//! [`Game::reveal`], [`Game::toggle_flag`] and [`Game::solve`], and reads
//! cell state back for presentation.

pub mod board;
pub mod cell;
pub mod error;
pub mod game;
pub mod solver;

pub use board::{Board, Coord, PopulationMode, RevealedCell};
pub use cell::Cell;
pub use error::{ConfigError, GuessRequired};
pub use game::{AutoSolveOutcome, Difficulty, Game, GameConfig, GameStatus, RevealOutcome};
pub use solver::{Deductions, SolverState};
