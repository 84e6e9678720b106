//! The square grid owning all cell state: bomb population (uniform or
//! distance-biased ring sweep) and the iterative cascade reveal.

use std::f64::consts::PI;

use itertools::Itertools;
use log::trace;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::solver::SolverState;

/// A 2D coordinate on the board. Two cells are the same cell iff their
/// coordinates are equal; no rendering handle is involved.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Manhattan distance to `other`. The population bias uses this instead
    /// of the euclidean distance because it is cheaper to compute.
    pub fn manhattan(self, other: Coord) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// The in-bounds 8-connected neighbors on a `size`-wide square grid.
    pub fn neighbors(self, size: usize) -> impl Iterator<Item = Coord> {
        let size = size as isize;
        (-1isize..=1).flat_map(move |dr| {
            (-1isize..=1).filter_map(move |dc| {
                // Skip the cell itself
                if dr == 0 && dc == 0 {
                    return None;
                }

                let row = self.row as isize + dr;
                let col = self.col as isize + dc;

                if row >= 0 && row < size && col >= 0 && col < size {
                    Some(Coord {
                        row: row as usize,
                        col: col as usize,
                    })
                } else {
                    None
                }
            })
        })
    }
}

/// How bombs are distributed on the first reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PopulationMode {
    /// Uniformly random placement across the whole grid.
    Uniform,
    /// Distance-biased placement: cells near the first click are less likely
    /// to hold a bomb, which reduces early-game guessing.
    ProbabilityBiased,
}

/// A cell revealed by a cascade, with the neighbor count recorded on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedCell {
    pub at: Coord,
    pub neighboring_bombs: u8,
}

/// How a cascade run ended, consumed by the game controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CascadeEnd {
    /// Worklist exhausted; the game stays open.
    Exhausted,
    /// The win condition fired mid-cascade.
    Won,
    /// The starting cell was a bomb; nothing spread.
    Bomb,
}

/// Probability that a cell at `distance` (Manhattan, to the first click)
/// holds a bomb. `atan` saturates, so `max_probability` caps the density
/// reached at the far edges of the grid.
fn bomb_probability(distance: usize, size: usize, max_probability: u8) -> f64 {
    let distance = distance as f64;
    f64::from(max_probability) / 100.0 * (2.0 / PI) * ((distance * distance) / size as f64).atan()
}

/// The in-bounds cells on the perimeter of the Chebyshev ring `d` around
/// `center`, in row-major order within the ring's bounding box. Interior
/// cells belong to smaller rings and are skipped.
fn ring_positions(center: Coord, d: usize, size: usize) -> impl Iterator<Item = Coord> {
    let size = size as isize;
    let (row0, col0) = (center.row as isize, center.col as isize);
    let d = d as isize;

    ((row0 - d)..=(row0 + d)).flat_map(move |row| {
        ((col0 - d)..=(col0 + d)).filter_map(move |col| {
            let on_perimeter = (row - row0).abs().max((col - col0).abs()) == d;
            let in_bounds = row >= 0 && row < size && col >= 0 && col < size;
            (on_perimeter && in_bounds).then(|| Coord {
                row: row as usize,
                col: col as usize,
            })
        })
    })
}

/// The square grid of cells. Owned by the game session; the bomb amount is
/// fixed at population time and `revealed_count` only ever grows.
#[derive(Debug, Clone)]
pub struct Board {
    size: usize,
    bomb_amount: usize,
    revealed_count: usize,
    cells: Vec<Cell>,
}

impl Board {
    pub(crate) fn new(size: usize, bomb_amount: usize) -> Self {
        Self {
            size,
            bomb_amount,
            revealed_count: 0,
            cells: vec![Cell::default(); size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn bomb_amount(&self) -> usize {
        self.bomb_amount
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed_count
    }

    pub fn contains(&self, at: Coord) -> bool {
        at.row < self.size && at.col < self.size
    }

    fn index(&self, at: Coord) -> usize {
        at.row * self.size + at.col
    }

    pub fn cell(&self, at: Coord) -> &Cell {
        &self.cells[self.index(at)]
    }

    pub(crate) fn cell_mut(&mut self, at: Coord) -> &mut Cell {
        let index = self.index(at);
        &mut self.cells[index]
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Coord> {
        (0..self.size)
            .cartesian_product(0..self.size)
            .map(|(row, col)| Coord { row, col })
    }

    /// Win condition: every non-bomb cell is revealed.
    pub(crate) fn is_won(&self) -> bool {
        self.size * self.size - self.revealed_count == self.bomb_amount
    }

    // --- Population ---

    pub(crate) fn populate<R: Rng + ?Sized>(
        &mut self,
        mode: PopulationMode,
        exception: Coord,
        max_probability: u8,
        rng: &mut R,
    ) {
        match mode {
            PopulationMode::Uniform => self.populate_uniform(exception, rng),
            PopulationMode::ProbabilityBiased => {
                self.populate_ring_biased(exception, max_probability, rng)
            }
        }
    }

    /// Uniform placement: draw positions until `bomb_amount` bombs are
    /// placed, skipping existing bombs and the exception cell. No retry
    /// bound; termination relies on `bomb_amount` fitting the grid.
    pub(crate) fn populate_uniform<R: Rng + ?Sized>(&mut self, exception: Coord, rng: &mut R) {
        let mut remaining = self.bomb_amount;

        while remaining > 0 {
            let at = Coord {
                row: rng.random_range(0..self.size),
                col: rng.random_range(0..self.size),
            };

            if at == exception || self.cell(at).is_bomb() {
                continue;
            }

            self.cell_mut(at).make_bomb();
            remaining -= 1;
        }
    }

    /// Distance-biased placement: sweep expanding square rings around the
    /// exception cell and place a bomb wherever a uniform draw lands below
    /// the distance probability. A single sweep can fall short because the
    /// `atan` bound saturates; the whole sweep then repeats. Best-effort
    /// retry behavior, not bounded for adversarial parameters.
    pub(crate) fn populate_ring_biased<R: Rng + ?Sized>(
        &mut self,
        exception: Coord,
        max_probability: u8,
        rng: &mut R,
    ) {
        let mut remaining = self.bomb_amount;
        let largest_ring = 1 + self.size - exception.row.min(exception.col);

        let mut sweeps = 0u32;
        while remaining > 0 {
            sweeps += 1;

            'sweep: for ring in 1..=largest_ring {
                for at in ring_positions(exception, ring, self.size) {
                    if self.cell(at).is_bomb() {
                        continue;
                    }

                    let p = bomb_probability(at.manhattan(exception), self.size, max_probability);
                    if rng.random::<f64>() < p {
                        self.cell_mut(at).make_bomb();
                        remaining -= 1;
                        if remaining == 0 {
                            break 'sweep;
                        }
                    }
                }
            }

            if remaining > 0 {
                trace!("ring sweep {sweeps} left {remaining} bombs unplaced, retrying");
            }
        }
    }

    // --- Cascade reveal ---

    /// Reveals `start` and flood-fills through the zero-count region.
    ///
    /// Runs on an explicit worklist; the revealed flag doubles as the
    /// visited set, so every cell is processed at most once. Each revealed
    /// cell is reported to the solver so its working sets stay in sync.
    /// The win condition is checked immediately after each reveal, before
    /// that cell's neighbor count is computed, so a win on the last
    /// non-bomb cell aborts the cascade.
    pub(crate) fn reveal_cascade(
        &mut self,
        start: Coord,
        solver: &mut SolverState,
    ) -> (Vec<RevealedCell>, CascadeEnd) {
        let mut revealed = Vec::new();
        let mut worklist = vec![start];

        while let Some(at) = worklist.pop() {
            let cell = self.cell(at);
            if cell.is_revealed() || cell.is_flagged() {
                continue;
            }

            self.cell_mut(at).reveal();
            self.revealed_count += 1;

            if self.is_won() {
                // The last non-bomb cell: stop before computing its count.
                revealed.push(RevealedCell {
                    at,
                    neighboring_bombs: 0,
                });
                return (revealed, CascadeEnd::Won);
            }

            solver.on_reveal(at);

            if self.cell(at).is_bomb() {
                // Loss signal; the caller assigns the terminal state.
                return (revealed, CascadeEnd::Bomb);
            }

            let count = self.count_hidden_bomb_neighbors(at);
            self.cell_mut(at).set_neighboring_bombs(count);
            revealed.push(RevealedCell {
                at,
                neighboring_bombs: count,
            });

            if count == 0 {
                for neighbor in at.neighbors(self.size) {
                    let cell = self.cell(neighbor);
                    if !cell.is_revealed() && !cell.is_flagged() {
                        worklist.push(neighbor);
                    }
                }
            }
        }

        (revealed, CascadeEnd::Exhausted)
    }

    /// Bombs among the unrevealed 8-neighbors of `at`. Revealed neighbors
    /// are excluded from the count, which keeps it stable across
    /// auto-reveal paths that may expose a bomb.
    fn count_hidden_bomb_neighbors(&self, at: Coord) -> u8 {
        at.neighbors(self.size)
            .filter(|&n| {
                let cell = self.cell(n);
                !cell.is_revealed() && cell.is_bomb()
            })
            .count() as u8
    }

    /// Exposes every bomb on the board, for presentation after a loss.
    /// Does not touch `revealed_count`: the win arithmetic only counts
    /// cells revealed through play.
    pub(crate) fn reveal_bombs(&mut self) {
        for cell in &mut self.cells {
            if cell.is_bomb() {
                cell.reveal();
            }
        }
    }
}

#[cfg(test)]
impl Board {
    /// Test constructor with a fixed bomb layout.
    pub(crate) fn with_bombs(size: usize, bombs: &[Coord]) -> Self {
        let mut board = Board::new(size, bombs.len());
        for &at in bombs {
            board.cell_mut(at).make_bomb();
        }
        board
    }
}
