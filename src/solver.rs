//! The deduction engine: a fixed-point iteration of two single-cell
//! constraint rules over the currently revealed board.
//!
//! Rule 1 (`deduce_bombs`): a revealed count that equals its number of
//! unrevealed, not-proven-safe neighbors proves every one of them a bomb.
//! Rule 2 (`deduce_safe`): a revealed count fully accounted for by proven
//! bombs proves every other unrevealed neighbor safe. Bombs are deduced
//! before safes in each pass because newly proven bombs are what makes safe
//! cells provable at all.

use std::collections::HashSet;

use itertools::Itertools;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Coord};
use crate::error::GuessRequired;

/// The solver's classification of the still-unrevealed board. The vectors
/// are sorted, so two calls with no intervening reveal compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deductions {
    /// Provably non-bomb cells that are not yet revealed.
    pub safe: Vec<Coord>,
    /// Provably bomb cells.
    pub bombs: Vec<Coord>,
    /// Cells with no deducible status under the current revealed
    /// information: the candidates a guess would have to pick from.
    pub unknown: Vec<Coord>,
}

/// Everything the solver has proven about the current board.
///
/// The sets accumulate for the whole session and are never rebuilt from
/// scratch; they stay pairwise disjoint, and a revealed cell is a member of
/// none of them. Owned by the game session and driven through
/// [`Game::solve`](crate::game::Game::solve).
#[derive(Debug, Default, Clone)]
pub struct SolverState {
    found_safe: HashSet<Coord>,
    found_bombs: HashSet<Coord>,
    found_unknown: HashSet<Coord>,
}

impl SolverState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Proven-safe cells still waiting to be revealed. When this reaches
    /// zero at the fixed point, the player has to guess.
    pub fn unrevealed_safe(&self) -> usize {
        self.found_safe.len()
    }

    /// Must be called for every cell that becomes revealed, through any
    /// path. Stale entries would corrupt the guess-required signal.
    pub(crate) fn on_reveal(&mut self, at: Coord) {
        self.found_safe.remove(&at);
        self.found_bombs.remove(&at);
        self.found_unknown.remove(&at);
    }

    /// Runs both deduction rules to their fixed point.
    ///
    /// The pass pair repeats while either rule still produces new
    /// classifications; termination is guaranteed because the sets only
    /// grow and are bounded by the grid. At the fixed point, if no
    /// proven-safe cell remains unrevealed, the solver cannot offer a move
    /// and reports [`GuessRequired`] instead.
    pub(crate) fn solve(&mut self, board: &Board) -> Result<Deductions, GuessRequired> {
        let mut pass = 0u32;
        loop {
            pass += 1;
            let new_bombs = self.deduce_bombs(board);
            let new_safe = self.deduce_safe(board);
            trace!("solver pass {pass}: {new_bombs} new bombs, {new_safe} new safe");

            if new_bombs == 0 && new_safe == 0 {
                break;
            }
        }

        if self.found_safe.is_empty() {
            return Err(GuessRequired {
                unknown: self.found_unknown.iter().copied().sorted().collect(),
                unrevealed_safe: self.unrevealed_safe(),
            });
        }

        Ok(self.deductions())
    }

    /// Sorted snapshot of the current working sets.
    pub(crate) fn deductions(&self) -> Deductions {
        Deductions {
            safe: self.found_safe.iter().copied().sorted().collect(),
            bombs: self.found_bombs.iter().copied().sorted().collect(),
            unknown: self.found_unknown.iter().copied().sorted().collect(),
        }
    }

    /// Rule 1. Returns how many cells were newly proven to be bombs.
    fn deduce_bombs(&mut self, board: &Board) -> usize {
        let mut newly_found = 0;

        for at in board.positions() {
            let cell = board.cell(at);
            if !cell.is_revealed() || cell.neighboring_bombs() == 0 {
                continue;
            }

            let possible: Vec<Coord> = at
                .neighbors(board.size())
                .filter(|&n| !board.cell(n).is_revealed())
                .filter(|n| !self.found_safe.contains(n))
                .collect();

            if possible.len() == usize::from(cell.neighboring_bombs()) {
                for bomb in possible {
                    if self.found_bombs.insert(bomb) {
                        newly_found += 1;
                        self.found_unknown.remove(&bomb);
                    }
                }
            }
        }

        newly_found
    }

    /// Rule 2. Returns how many cells were newly proven safe. Neighbors
    /// that stay unprovable either way are recorded as guess candidates.
    fn deduce_safe(&mut self, board: &Board) -> usize {
        let mut newly_found = 0;

        for at in board.positions() {
            let cell = board.cell(at);
            if !cell.is_revealed() || cell.neighboring_bombs() == 0 {
                continue;
            }

            let mut found_bombs = 0u8;
            let mut possible = Vec::new();
            for neighbor in at.neighbors(board.size()) {
                if board.cell(neighbor).is_revealed() {
                    continue;
                }
                if self.found_bombs.contains(&neighbor) {
                    found_bombs += 1;
                } else if !self.found_safe.contains(&neighbor) {
                    possible.push(neighbor);
                }
            }

            if found_bombs == cell.neighboring_bombs() {
                for safe in possible {
                    if self.found_safe.insert(safe) {
                        newly_found += 1;
                        self.found_unknown.remove(&safe);
                    }
                }
            } else {
                for unknown in possible {
                    self.found_unknown.insert(unknown);
                }
            }
        }

        newly_found
    }
}
