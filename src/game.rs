//! The session controller: configuration, the
//! `NotStarted → InProgress → Won | Lost` state machine, first-click
//! population, flag bookkeeping, and the hint/auto-solve orchestration.

use log::debug;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::board::{Board, CascadeEnd, Coord, PopulationMode, RevealedCell};
use crate::cell::Cell;
use crate::error::{ConfigError, GuessRequired};
use crate::solver::{Deductions, SolverState};

/// Supported grid sizes, inclusive.
pub const GRID_SIZE_MIN: usize = 5;
pub const GRID_SIZE_MAX: usize = 35;

/// Validated game parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub grid_size: usize,
    pub bomb_amount: usize,
    pub population: PopulationMode,
    /// Density cap for [`PopulationMode::ProbabilityBiased`], in percent.
    pub max_probability: u8,
}

impl GameConfig {
    /// Checks the bounds accepted from the difficulty layer: grid size
    /// 5..=35, bomb amount below `size² - 1`, probability cap 1..=100
    /// (zero would make every cell permanently safe).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(GRID_SIZE_MIN..=GRID_SIZE_MAX).contains(&self.grid_size) {
            return Err(ConfigError::GridSize(self.grid_size));
        }
        if self.bomb_amount >= self.grid_size * self.grid_size - 1 {
            return Err(ConfigError::BombAmount {
                size: self.grid_size,
                bombs: self.bomb_amount,
            });
        }
        if !(1..=100).contains(&self.max_probability) {
            return Err(ConfigError::MaxProbability(self.max_probability));
        }
        Ok(())
    }
}

/// Canonical difficulty presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// The preset's configuration, with uniform population.
    pub fn config(self) -> GameConfig {
        let (grid_size, bomb_amount) = match self {
            Difficulty::Easy => (10, 15),
            Difficulty::Medium => (20, 60),
            Difficulty::Hard => (35, 185),
        };
        GameConfig {
            grid_size,
            bomb_amount,
            population: PopulationMode::Uniform,
            max_probability: 100,
        }
    }
}

/// Lifecycle of a session. `Won` and `Lost` are terminal: once either is
/// reached, no request mutates the board any further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    NotStarted,
    InProgress,
    Won,
    Lost,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::Won | GameStatus::Lost)
    }
}

/// What a single reveal request did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealOutcome {
    /// Non-bomb cells revealed by this call, in cascade order. When the
    /// result is `Won`, the final cell's count is reported as recorded,
    /// because the win check fires before that count is computed.
    pub revealed: Vec<RevealedCell>,
    pub result: GameStatus,
}

/// Accumulated result of an [`Game::auto_solve`] run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSolveOutcome {
    pub revealed: Vec<RevealedCell>,
    pub result: GameStatus,
    /// Present when the run stopped because the solver had nothing safe
    /// left to offer.
    pub guess_required: Option<GuessRequired>,
}

/// One game session. Sole owner of the current board/solver pair; both are
/// discarded together on [`Game::restart`].
pub struct Game {
    config: GameConfig,
    board: Board,
    solver: SolverState,
    status: GameStatus,
    flags_placed: usize,
    rng: Box<dyn RngCore>,
}

impl Game {
    /// Creates a session with a thread-local RNG.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, rand::rng())
    }

    /// Creates a session with a caller-supplied RNG, so tests and replays
    /// can seed population deterministically.
    pub fn with_rng(config: GameConfig, rng: impl RngCore + 'static) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            board: Board::new(config.grid_size, config.bomb_amount),
            solver: SolverState::new(),
            status: GameStatus::NotStarted,
            flags_placed: 0,
            rng: Box::new(rng),
            config,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn size(&self) -> usize {
        self.config.grid_size
    }

    pub fn bomb_amount(&self) -> usize {
        self.config.bomb_amount
    }

    /// Bombs minus flags placed, for the counter display. Negative when
    /// the player has over-flagged.
    pub fn remaining_bombs(&self) -> i32 {
        self.config.bomb_amount as i32 - self.flags_placed as i32
    }

    /// Read access to the grid for presentation.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The cell at `at`, or `None` when out of bounds.
    pub fn cell(&self, at: Coord) -> Option<&Cell> {
        self.board.contains(at).then(|| self.board.cell(at))
    }

    /// Handles a reveal request.
    ///
    /// The first reveal populates the board with the clicked cell exempt,
    /// then cascades from it. Requests on flagged or already-revealed
    /// cells, out-of-bounds coordinates, or a finished game are no-ops
    /// reporting the current status.
    pub fn reveal(&mut self, at: Coord) -> RevealOutcome {
        if self.status.is_terminal() || !self.board.contains(at) {
            return self.no_op();
        }

        let cell = self.board.cell(at);
        if cell.is_flagged() || cell.is_revealed() {
            return self.no_op();
        }

        if self.status == GameStatus::NotStarted {
            self.board.populate(
                self.config.population,
                at,
                self.config.max_probability,
                &mut *self.rng,
            );
            self.status = GameStatus::InProgress;
            debug!(
                "populated {0}x{0} board with {1} bombs, first reveal at {2:?}",
                self.config.grid_size, self.config.bomb_amount, at
            );
        }

        let (revealed, end) = self.board.reveal_cascade(at, &mut self.solver);
        self.status = match end {
            CascadeEnd::Won => GameStatus::Won,
            CascadeEnd::Bomb => {
                self.board.reveal_bombs();
                GameStatus::Lost
            }
            CascadeEnd::Exhausted => GameStatus::InProgress,
        };

        RevealOutcome {
            revealed,
            result: self.status,
        }
    }

    fn no_op(&self) -> RevealOutcome {
        RevealOutcome {
            revealed: Vec::new(),
            result: self.status,
        }
    }

    /// Toggles the flag on an unrevealed cell and keeps the remaining-bomb
    /// counter in sync. Returns whether the cell is flagged afterwards.
    pub fn toggle_flag(&mut self, at: Coord) -> bool {
        if self.status.is_terminal() || !self.board.contains(at) {
            return false;
        }

        let cell = self.board.cell_mut(at);
        if cell.is_revealed() {
            return false;
        }

        cell.toggle_flag();
        let flagged = cell.is_flagged();
        if flagged {
            self.flags_placed += 1;
        } else {
            self.flags_placed -= 1;
        }
        flagged
    }

    /// Runs the deduction engine over the current board and returns the
    /// classification, or [`GuessRequired`] when no safe cell can be
    /// offered.
    pub fn solve(&mut self) -> Result<Deductions, GuessRequired> {
        self.solver.solve(&self.board)
    }

    /// Reveals every currently-known-safe cell, re-solving after each
    /// batch, until the solver stalls, nothing new gets revealed, or the
    /// game ends.
    pub fn auto_solve(&mut self) -> AutoSolveOutcome {
        let mut revealed = Vec::new();
        let mut guess_required = None;

        while self.status == GameStatus::InProgress {
            let safe = match self.solver.solve(&self.board) {
                Ok(deductions) => deductions.safe,
                Err(stall) => {
                    guess_required = Some(stall);
                    break;
                }
            };

            let before = revealed.len();
            for at in safe {
                if self.status != GameStatus::InProgress {
                    break;
                }
                revealed.extend(self.reveal(at).revealed);
            }

            // A safe cell the player flagged cannot be revealed; without
            // this check such a cell would spin the loop forever.
            if revealed.len() == before {
                break;
            }
        }

        AutoSolveOutcome {
            revealed,
            result: self.status,
            guess_required,
        }
    }

    /// Discards the board and solver and returns to `NotStarted`, keeping
    /// the configuration and RNG.
    pub fn restart(&mut self) {
        self.board = Board::new(self.config.grid_size, self.config.bomb_amount);
        self.solver = SolverState::new();
        self.status = GameStatus::NotStarted;
        self.flags_placed = 0;
    }
}

#[cfg(test)]
impl Game {
    /// Test harness: wraps a pre-populated board in an in-progress session.
    pub(crate) fn from_board(board: Board) -> Self {
        Self {
            config: GameConfig {
                grid_size: board.size(),
                bomb_amount: board.bomb_amount(),
                population: PopulationMode::Uniform,
                max_probability: 100,
            },
            solver: SolverState::new(),
            status: GameStatus::InProgress,
            flags_placed: 0,
            rng: Box::new(rand::rng()),
            board,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn config(grid_size: usize, bomb_amount: usize) -> GameConfig {
        GameConfig {
            grid_size,
            bomb_amount,
            population: PopulationMode::Uniform,
            max_probability: 100,
        }
    }

    fn seeded_game(config: GameConfig, seed: u64) -> Game {
        Game::with_rng(config, SmallRng::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn test_config_validation_rejects_bad_bounds() {
        assert_eq!(
            Game::new(config(4, 3)).err(),
            Some(ConfigError::GridSize(4))
        );
        assert_eq!(
            Game::new(config(36, 3)).err(),
            Some(ConfigError::GridSize(36))
        );
        assert_eq!(
            Game::new(config(5, 24)).err(),
            Some(ConfigError::BombAmount { size: 5, bombs: 24 })
        );

        let mut degenerate = config(5, 3);
        degenerate.max_probability = 0;
        assert_eq!(
            Game::new(degenerate).err(),
            Some(ConfigError::MaxProbability(0))
        );

        assert!(Game::new(config(5, 23)).is_ok());
        assert!(Game::new(Difficulty::Hard.config()).is_ok());
    }

    #[test]
    fn test_first_reveal_populates_and_starts_the_game() {
        for seed in 0..5 {
            let mut game = seeded_game(config(9, 10), seed);
            assert_eq!(game.status(), GameStatus::NotStarted);

            let at = Coord::new(4, 4);
            let outcome = game.reveal(at);

            assert_ne!(outcome.result, GameStatus::NotStarted);
            assert_ne!(outcome.result, GameStatus::Lost);

            let bombs = game
                .board()
                .positions()
                .filter(|&p| game.board().cell(p).is_bomb())
                .count();
            assert_eq!(bombs, 10);
            assert!(!game.board().cell(at).is_bomb());
            assert!(game.board().cell(at).is_revealed());
        }
    }

    #[test]
    fn test_probability_biased_game_populates_fully() {
        let mut base = config(20, 10);
        base.population = PopulationMode::ProbabilityBiased;
        base.max_probability = 1;
        let mut game = seeded_game(base, 3);

        game.reveal(Coord::new(10, 10));

        let bombs = game
            .board()
            .positions()
            .filter(|&p| game.board().cell(p).is_bomb())
            .count();
        assert_eq!(bombs, 10);
        assert!(!game.board().cell(Coord::new(10, 10)).is_bomb());
    }

    #[test]
    fn test_reveal_on_flagged_cell_is_a_no_op() {
        let mut game = Game::from_board(Board::with_bombs(5, &[Coord::new(4, 4)]));
        assert!(game.toggle_flag(Coord::new(0, 0)));

        let outcome = game.reveal(Coord::new(0, 0));

        assert!(outcome.revealed.is_empty());
        assert_eq!(outcome.result, GameStatus::InProgress);
        assert!(!game.board().cell(Coord::new(0, 0)).is_revealed());
    }

    #[test]
    fn test_reveal_on_revealed_cell_is_a_no_op() {
        let mut game = Game::from_board(Board::with_bombs(4, &[
            Coord::new(0, 0),
            Coord::new(3, 3),
        ]));
        game.reveal(Coord::new(2, 2));
        assert_eq!(game.board().revealed_count(), 1);

        let outcome = game.reveal(Coord::new(2, 2));

        assert!(outcome.revealed.is_empty());
        assert_eq!(game.board().revealed_count(), 1);
    }

    #[test]
    fn test_single_cell_reveal_scenario() {
        // 4x4 board, bombs at (0,0) and (3,3): revealing (2,2) records one
        // neighboring bomb and triggers no cascade
        let mut game = Game::from_board(Board::with_bombs(4, &[
            Coord::new(0, 0),
            Coord::new(3, 3),
        ]));

        let outcome = game.reveal(Coord::new(2, 2));

        assert_eq!(outcome.result, GameStatus::InProgress);
        assert_eq!(
            outcome.revealed,
            vec![RevealedCell {
                at: Coord::new(2, 2),
                neighboring_bombs: 1
            }]
        );
    }

    #[test]
    fn test_full_cascade_wins_in_one_reveal() {
        // 5x5 board, single bomb at (4,4): the corner reveal floods all 24
        // non-bomb cells and the game is won mid-cascade
        let mut game = Game::from_board(Board::with_bombs(5, &[Coord::new(4, 4)]));

        let outcome = game.reveal(Coord::new(0, 0));

        assert_eq!(outcome.result, GameStatus::Won);
        assert_eq!(outcome.revealed.len(), 24);
        assert_eq!(game.status(), GameStatus::Won);
    }

    #[test]
    fn test_revealing_a_bomb_loses_and_exposes_all_bombs() {
        let bombs = [Coord::new(1, 1), Coord::new(4, 4), Coord::new(2, 3)];
        let mut game = Game::from_board(Board::with_bombs(5, &bombs));

        let outcome = game.reveal(Coord::new(1, 1));

        assert_eq!(outcome.result, GameStatus::Lost);
        assert!(outcome.revealed.is_empty());
        for at in bombs {
            assert!(game.board().cell(at).is_revealed());
        }

        // Terminal: nothing mutates anymore
        let after = game.reveal(Coord::new(0, 0));
        assert!(after.revealed.is_empty());
        assert_eq!(after.result, GameStatus::Lost);
        assert!(!game.toggle_flag(Coord::new(0, 0)));
    }

    #[test]
    fn test_flag_bookkeeping() {
        let mut game = Game::from_board(Board::with_bombs(5, &[Coord::new(4, 4)]));
        assert_eq!(game.remaining_bombs(), 1);

        assert!(game.toggle_flag(Coord::new(0, 0)));
        assert!(game.toggle_flag(Coord::new(0, 1)));
        assert_eq!(game.remaining_bombs(), -1);

        assert!(!game.toggle_flag(Coord::new(0, 0)));
        assert_eq!(game.remaining_bombs(), 0);
    }

    #[test]
    fn test_auto_solve_finishes_a_deducible_board() {
        // Single bomb at (1,0); the flood from (0,2) leaves exactly one
        // hidden non-bomb cell, which the solver proves safe
        let mut game = Game::from_board(Board::with_bombs(4, &[Coord::new(1, 0)]));
        game.reveal(Coord::new(0, 2));
        assert_eq!(game.status(), GameStatus::InProgress);

        let outcome = game.auto_solve();

        assert_eq!(outcome.result, GameStatus::Won);
        assert!(outcome.guess_required.is_none());
        assert_eq!(outcome.revealed.len(), 1);
        assert_eq!(outcome.revealed[0].at, Coord::new(0, 0));
    }

    #[test]
    fn test_auto_solve_reports_guess_required() {
        // A lone revealed '1' gives the solver nothing to work with
        let mut game = Game::from_board(Board::with_bombs(3, &[Coord::new(0, 0)]));
        game.reveal(Coord::new(1, 1));

        let outcome = game.auto_solve();

        assert_eq!(outcome.result, GameStatus::InProgress);
        assert!(outcome.revealed.is_empty());
        let stall = outcome.guess_required.unwrap();
        assert_eq!(stall.unknown.len(), 8);
    }

    #[test]
    fn test_solve_is_idempotent_through_the_controller() {
        let mut game = Game::from_board(Board::with_bombs(4, &[
            Coord::new(0, 0),
            Coord::new(3, 3),
        ]));
        game.reveal(Coord::new(2, 2));

        let first = game.solve();
        let second = game.solve();
        assert_eq!(first, second);
    }

    #[test]
    fn test_auto_solve_never_loses() {
        // Auto-solve only reveals proven-safe cells, so whatever happens it
        // must not end in a loss
        for seed in 0..25 {
            let mut game = seeded_game(config(9, 10), seed);
            game.reveal(Coord::new(4, 4));

            let outcome = game.auto_solve();

            assert_ne!(outcome.result, GameStatus::Lost, "seed {seed}");
            for cell in &outcome.revealed {
                assert!(!game.board().cell(cell.at).is_bomb(), "seed {seed}");
            }
        }
    }

    #[test]
    fn test_restart_discards_board_and_solver() {
        let mut game = seeded_game(config(9, 10), 1);
        game.reveal(Coord::new(4, 4));
        game.toggle_flag(Coord::new(0, 0));

        game.restart();

        assert_eq!(game.status(), GameStatus::NotStarted);
        assert_eq!(game.board().revealed_count(), 0);
        assert_eq!(game.remaining_bombs(), 10);
        let bombs = game
            .board()
            .positions()
            .filter(|&p| game.board().cell(p).is_bomb())
            .count();
        assert_eq!(bombs, 0);
    }
}
