use minesweeper::{Coord, Difficulty, Game, GameStatus};
use rand::prelude::IndexedRandom;
use std::thread;
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // --- 1. Initialization ---
    let mut game = Game::new(Difficulty::Easy.config())?;
    let mut rng = rand::rng();

    println!("--- Autonomous Minesweeper Bot ---");
    println!("Strategy: reveal proven-safe cells, guess among the unknowns otherwise.");

    // Opening move in the middle of the board.
    let size = game.size();
    game.reveal(Coord::new(size / 2, size / 2));
    print_board(&game);
    thread::sleep(Duration::from_secs(1));

    // --- 2. Game Loop ---
    let mut move_count = 0;
    while game.status() == GameStatus::InProgress {
        move_count += 1;
        println!("\n--- Move #{move_count} ---");

        // --- 3. Bot's Decision Logic ---
        let target = match game.solve() {
            Ok(deductions) => {
                println!(
                    "Logic proved {} safe and {} mined cells.",
                    deductions.safe.len(),
                    deductions.bombs.len()
                );
                deductions.safe.first().copied()
            }
            Err(stall) => {
                println!("{stall}. Guessing...");
                stall
                    .unknown
                    .choose(&mut rng)
                    .copied()
                    .or_else(|| random_hidden(&game, &mut rng))
            }
        };

        // --- 4. Execute the Chosen Move ---
        match target {
            Some(at) => {
                println!("Bot reveals ({}, {})...", at.row, at.col);
                game.reveal(at);
                print_board(&game);
            }
            None => {
                println!("No moves left to make.");
                break;
            }
        }

        thread::sleep(Duration::from_millis(300));
    }

    // --- 5. Final Result ---
    println!("\n--- Game Over ---");
    match game.status() {
        GameStatus::Won => println!("Result: the bot won!"),
        GameStatus::Lost => println!("Result: the bot hit a bomb and lost."),
        _ => println!("Result: the game ended unexpectedly."),
    }

    Ok(())
}

/// Fallback guess when the solver has no candidate list to offer: any
/// hidden, unflagged cell.
fn random_hidden(game: &Game, rng: &mut impl rand::Rng) -> Option<Coord> {
    let hidden: Vec<Coord> = game
        .board()
        .positions()
        .filter(|&at| {
            let cell = game.board().cell(at);
            !cell.is_revealed() && !cell.is_flagged()
        })
        .collect();
    hidden.choose(rng).copied()
}

fn print_board(game: &Game) {
    let size = game.size();

    // Print header
    print!("   ");
    for col in 0..size {
        print!("{col:^3}");
    }
    println!("\n  +{}", "---".repeat(size));

    // Print rows
    for row in 0..size {
        print!("{row:^2}|");
        for col in 0..size {
            let cell = game.board().cell(Coord::new(row, col));
            let display = if cell.is_flagged() {
                " F ".to_string()
            } else if !cell.is_revealed() {
                " ■ ".to_string()
            } else if cell.is_bomb() {
                " * ".to_string()
            } else {
                format!(" {} ", cell.neighboring_bombs())
            };
            print!("{display}");
        }
        println!();
    }
    println!();
}
