//! Terminal front end: play against the engine or watch it play itself.

#![deny(
    clippy::all,
    clippy::nursery,
    clippy::must_use_candidate,
    // clippy::restriction,
    // clippy::pedantic
)]
// now allow a few rules which are denied by the above statement
// --> they are ridiculous and not necessary
#![allow(
    clippy::suboptimal_flops,
    clippy::redundant_pub_crate,
    clippy::fallible_impl_from
)]
#![deny(missing_debug_implementations)]
#![deny(rustdoc::all)]

use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::Parser;
use tictactoe_minimax::{
    Board, GameError, GameSession, Mark, Move, Outcome, SIZE, minmax_search, play_ai_turn,
};
use tracing_subscriber::EnvFilter;

/// Play Tic-Tac-Toe against a computer that never loses.
///
/// Log output is controlled with `RUST_LOG`, e.g. `RUST_LOG=debug`.
#[derive(Parser, Debug)]
#[command(name = "tictactoe-cli", version, about, long_about = None)]
struct Cli {
    /// Let the computer make the first move
    #[arg(long)]
    ai_first: bool,

    /// Let the computer play against itself
    #[arg(long, conflicts_with = "ai_first")]
    self_play: bool,
}

fn print_board(board: &Board) {
    for (i, row) in Move::ALL.chunks(SIZE).enumerate() {
        if i > 0 {
            println!("-+-+-");
        }
        // empty cells show the number to type for them
        let symbols = row
            .iter()
            .map(|&mv| {
                board
                    .cell(mv)
                    .map_or_else(|| cell_number(mv), Mark::symbol)
                    .to_string()
            })
            .collect::<Vec<_>>();
        println!("{}", symbols.join("|"));
    }
}

/// Number the player types to pick `mv`.
fn cell_number(mv: Move) -> char {
    u32::try_from(mv.index() + 1)
        .ok()
        .and_then(|n| char::from_digit(n, 10))
        .unwrap_or('?')
}

/// Reads one trimmed line. `None` at the end of the input.
fn read_line(input: &mut impl BufRead) -> anyhow::Result<Option<String>> {
    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok((read > 0).then(|| line.trim().to_owned()))
}

fn prompt(text: &str) -> anyhow::Result<()> {
    print!("{text}");
    io::stdout().flush().context("failed to flush stdout")
}

/// Asks for a cell number until the player names a cell that exists.
fn read_player_move(input: &mut impl BufRead) -> anyhow::Result<Option<Move>> {
    loop {
        prompt("Choose your move (cell 1-9): ")?;
        let Some(line) = read_line(input)? else {
            return Ok(None);
        };

        let mv = line
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(Move::from_index);
        match mv {
            Some(mv) => return Ok(Some(mv)),
            None => println!("'{line}' is not a cell between 1 and 9."),
        }
    }
}

/// Plays until the game ends. `None` if the player closed the input.
fn play_game(
    session: &mut GameSession,
    input: &mut impl BufRead,
) -> anyhow::Result<Option<Outcome>> {
    loop {
        println!("----------------");
        print_board(session.board());
        println!();

        let outcome = session.outcome();
        if outcome.is_over() {
            return Ok(Some(outcome));
        }

        match session.to_move() {
            // Human player
            Mark::Player => {
                let Some(mv) = read_player_move(input)? else {
                    return Ok(None);
                };
                match session.play(Mark::Player, mv) {
                    Ok(_) => {}
                    Err(GameError::IllegalMove(_)) => {
                        println!("Cell {} is already taken.", mv.index() + 1);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            // Computer player
            Mark::Ai => {
                let mv = play_ai_turn(session)?;
                println!("Computer chose cell {}", mv.index() + 1);
            }
        }
    }
}

fn print_outcome(outcome: Outcome) {
    match outcome {
        Outcome::PlayerWin => println!("You won!"),
        Outcome::AiWin => println!("Computer won!"),
        Outcome::Draw => println!("Draw!"),
        Outcome::InProgress => {}
    }
}

fn self_play(session: &mut GameSession) -> anyhow::Result<()> {
    while !session.outcome().is_over() {
        let mark = session.to_move();
        let mut scratch = *session.board();
        let evaluation = minmax_search(&mut scratch, mark)?;
        session.play(mark, evaluation.best_move)?;

        println!("----------------");
        println!(
            "{} plays cell {} (score {}, {} positions searched)",
            mark.symbol(),
            evaluation.best_move.index() + 1,
            evaluation.score,
            evaluation.nodes
        );
        print_board(session.board());
    }
    print_outcome(session.outcome());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let first = if cli.ai_first { Mark::Ai } else { Mark::Player };
    let mut session = GameSession::new(first);

    if cli.self_play {
        return self_play(&mut session);
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();

    println!(
        "Let's play Tic-Tac-Toe against the computer. You are '{}', the computer is '{}'.",
        Mark::Player.symbol(),
        Mark::Ai.symbol()
    );
    loop {
        let Some(outcome) = play_game(&mut session, &mut input)? else {
            break;
        };
        print_outcome(outcome);

        prompt("Play again? [y/N] ")?;
        match read_line(&mut input)?.as_deref() {
            Some("y" | "Y" | "yes") => {
                session.restart();
                match session.first() {
                    Mark::Player => println!("New game, you start."),
                    Mark::Ai => println!("New game, the computer starts."),
                }
            }
            _ => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_are_numbered_one_to_nine() {
        let numbers = Move::ALL.map(cell_number);
        assert_eq!(numbers, ['1', '2', '3', '4', '5', '6', '7', '8', '9']);
    }
}
