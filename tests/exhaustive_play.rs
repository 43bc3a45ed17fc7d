//! Plays every possible sequence of human moves against the engine.

use rayon::prelude::*;
use tictactoe_minimax::{GameSession, Mark, Move, Outcome, best_move, minmax_search, play_ai_turn};

/// Follows every player reply from this position and returns the number of
/// finished games.
fn explore(session: &GameSession) -> usize {
    match session.outcome() {
        Outcome::InProgress => {}
        Outcome::PlayerWin => panic!("computer lost:\n{}", session.board()),
        Outcome::AiWin | Outcome::Draw => return 1,
    }

    match session.to_move() {
        Mark::Ai => {
            let board = *session.board();
            let mut scratch = board;
            let evaluation = minmax_search(&mut scratch, Mark::Ai).unwrap();
            assert_eq!(scratch, board);
            assert!(board.is_empty(evaluation.best_move));
            assert!(evaluation.score >= 0, "lost position:\n{board}");
            assert_eq!(best_move(&board), Ok(evaluation.best_move));

            let mut next = session.clone();
            assert_eq!(play_ai_turn(&mut next), Ok(evaluation.best_move));
            explore(&next)
        }
        Mark::Player => session
            .board()
            .empty_cells_iter()
            .map(|mv| {
                let mut next = session.clone();
                next.play(Mark::Player, mv).unwrap();
                explore(&next)
            })
            .sum(),
    }
}

/// Fans the first player reply out over the thread pool.
fn explore_replies(session: &GameSession) -> usize {
    assert_eq!(session.to_move(), Mark::Player);
    Move::ALL
        .par_iter()
        .filter(|&&mv| session.board().is_empty(mv))
        .map(|&mv| {
            let mut next = session.clone();
            next.play(Mark::Player, mv).unwrap();
            explore(&next)
        })
        .sum()
}

#[test]
fn computer_never_loses_when_moving_second() {
    let games = explore_replies(&GameSession::new(Mark::Player));
    assert!(games >= 9);
}

#[test]
fn computer_never_loses_when_moving_first() {
    let mut session = GameSession::new(Mark::Ai);
    assert_eq!(play_ai_turn(&mut session), Ok(Move::new(0, 0)));

    let games = explore_replies(&session);
    assert!(games >= 8);
}
