use core::ops::{Deref, DerefMut};

use tracing::{debug, instrument};

use crate::{Board, GameError, Mark, Move};

/// Result of a search from the perspective of the searching mark.
#[derive(Debug, PartialOrd, PartialEq, Clone, Copy, Eq)]
pub struct Evaluation {
    /// First cell (row-major) with the best score.
    pub best_move: Move,
    /// 1: forced win, 0: draw, -1: forced loss.
    pub score: i32,
    /// Number of positions evaluated below the root.
    pub nodes: u64,
}

/// A mark placed for the duration of one exploration step. The cell is empty
/// again once the guard is dropped, on every exit path.
struct ScopedPlacement<'a> {
    board: &'a mut Board,
    mv: Move,
}

impl<'a> ScopedPlacement<'a> {
    fn new(board: &'a mut Board, mv: Move, mark: Mark) -> Self {
        debug_assert!(board.is_empty(mv));
        board.set(mv, Some(mark));
        Self { board, mv }
    }
}

impl Deref for ScopedPlacement<'_> {
    type Target = Board;

    fn deref(&self) -> &Board {
        self.board
    }
}

impl DerefMut for ScopedPlacement<'_> {
    fn deref_mut(&mut self) -> &mut Board {
        self.board
    }
}

impl Drop for ScopedPlacement<'_> {
    fn drop(&mut self) {
        self.board.set(self.mv, None);
    }
}

/// minmax step of placing `current` on every empty cell and getting the score
/// of the resulting position. Recursively calls [`value`] again.
fn minmax_step(
    board: &mut Board,
    target: Mark,
    current: Mark,
    initial_score: i32,
    better_score: impl Fn(i32, i32) -> bool,
    nodes: &mut u64,
) -> (Option<Move>, i32) {
    let mut best_score = initial_score;
    let mut best_move = None;

    // Row-major scan; only a strictly better score replaces the best move, so
    // the first cell wins ties.
    for mv in Move::ALL {
        if !board.is_empty(mv) {
            continue;
        }

        let score = {
            let mut placed = ScopedPlacement::new(board, mv, current);
            value(&mut placed, target, current != target, nodes)
        };

        if better_score(score, best_score) {
            best_score = score;
            best_move = Some(mv);
        }
    }

    (best_move, best_score)
}

/// Exact value of the position for `target`, including the recursion end
/// conditions.
fn value(board: &mut Board, target: Mark, maximizing: bool, nodes: &mut u64) -> i32 {
    *nodes += 1;

    match board.winner() {
        Some(mark) if mark == target => return 1,
        Some(_) => return -1,
        None if board.is_full() => return 0,
        None => {}
    }

    let (_, score) = if maximizing {
        minmax_step(board, target, target, i32::MIN, |new, best| new > best, nodes)
    } else {
        minmax_step(
            board,
            target,
            target.opponent(),
            i32::MAX,
            |new, best| new < best,
            nodes,
        )
    };
    score
}

/// Exhaustively searches the best move for `mark`.
///
/// The board is used as scratch space and is identical to its input again when
/// this returns.
///
/// # Errors
/// [`GameError::NoLegalMove`] if the board is full.
#[instrument(skip(board), fields(round = board.occupied_count()))]
pub fn minmax_search(board: &mut Board, mark: Mark) -> Result<Evaluation, GameError> {
    let before = *board;
    let mut nodes = 0;

    let (best_move, score) =
        minmax_step(board, mark, mark, i32::MIN, |new, best| new > best, &mut nodes);
    debug_assert_eq!(before, *board);

    let best_move = best_move.ok_or(GameError::NoLegalMove)?;
    debug!(%best_move, score, nodes, "search finished");

    Ok(Evaluation {
        best_move,
        score,
        nodes,
    })
}

/// Returns the move of the AI ([`Mark::Ai`]) for the given position.
///
/// Only call this on the AI's turn of an unfinished game.
///
/// # Errors
/// [`GameError::NoLegalMove`] if the board is full.
#[instrument(skip(board), ret, err(level = "debug"))]
pub fn best_move(board: &Board) -> Result<Move, GameError> {
    let mut scratch = *board;
    minmax_search(&mut scratch, Mark::Ai).map(|evaluation| evaluation.best_move)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameSession, Outcome};

    fn board(s: &str) -> Board {
        s.parse().unwrap()
    }

    #[test]
    fn opens_in_the_top_left_corner() {
        let mut board = Board::new();
        let evaluation = minmax_search(&mut board, Mark::Ai).unwrap();
        assert_eq!(evaluation.best_move, Move::new(0, 0));
        assert_eq!(evaluation.score, 0);
        assert_eq!(board, Board::new());
        assert_eq!(best_move(&Board::new()), Ok(Move::new(0, 0)));
    }

    #[test]
    fn takes_the_win_over_blocking() {
        let mut board = board("XX /OO /   ");
        let evaluation = minmax_search(&mut board, Mark::Ai).unwrap();
        assert_eq!(evaluation.best_move, Move::new(0, 2));
        assert_eq!(evaluation.score, 1);
    }

    #[test]
    fn blocks_the_imminent_loss() {
        assert_eq!(best_move(&board("X  /OO /   ")), Ok(Move::new(1, 2)));
        assert_eq!(best_move(&board(" O / O /  X")), Ok(Move::new(2, 1)));
    }

    #[test]
    fn blocking_is_worthless_when_the_player_is_a_move_ahead() {
        // after the block at (1, 2) the player forks with (0, 0)
        let mut board = board("   /OO /   ");
        let evaluation = minmax_search(&mut board, Mark::Ai).unwrap();
        assert_eq!(evaluation.score, -1);
        assert_eq!(evaluation.best_move, Move::new(0, 0));
    }

    #[test]
    fn lost_position_still_returns_first_cell() {
        // two open threats of the player, every reply loses
        let mut board = board("OO /   /  O");
        let evaluation = minmax_search(&mut board, Mark::Ai).unwrap();
        assert_eq!(evaluation.score, -1);
        assert_eq!(evaluation.best_move, Move::new(0, 2));
    }

    #[test]
    fn full_board_has_no_legal_move() {
        let full = board("XOX/XOO/OXX");
        assert_eq!(best_move(&full), Err(GameError::NoLegalMove));
        let mut scratch = full;
        assert_eq!(
            minmax_search(&mut scratch, Mark::Player),
            Err(GameError::NoLegalMove)
        );
    }

    #[test]
    fn last_cell_is_a_single_node() {
        let mut board = board("XOX/XOO/OX ");
        let evaluation = minmax_search(&mut board, Mark::Ai).unwrap();
        assert_eq!(evaluation.best_move, Move::new(2, 2));
        assert_eq!(evaluation.nodes, 1);
    }

    #[test]
    fn search_leaves_the_board_unchanged() {
        for s in ["   /   /   ", "X  / O /   ", "XO / X /O  ", "   /OO /X  "] {
            let mut board = board(s);
            let before = board;
            let evaluation = minmax_search(&mut board, Mark::Player).unwrap();
            assert_eq!(board, before);
            assert!(board.is_empty(evaluation.best_move));
        }
    }

    #[test]
    fn placement_is_undone_on_drop() {
        let mut board = Board::new();
        {
            let placed = ScopedPlacement::new(&mut board, Move::new(1, 1), Mark::Ai);
            assert_eq!(placed.cell(Move::new(1, 1)), Some(Mark::Ai));
        }
        assert_eq!(board, Board::new());
    }

    #[test]
    fn searches_from_the_players_perspective() {
        let mut board = board("OO /XX /   ");
        let evaluation = minmax_search(&mut board, Mark::Player).unwrap();
        assert_eq!(evaluation.best_move, Move::new(0, 2));
        assert_eq!(evaluation.score, 1);
    }

    #[test]
    fn any_forced_win_ties_with_the_immediate_one() {
        // (0, 2) blocks and forks, scanned before the immediate win at (1, 2)
        let mut board = board("XX /OO /   ");
        let evaluation = minmax_search(&mut board, Mark::Player).unwrap();
        assert_eq!(evaluation.best_move, Move::new(0, 2));
        assert_eq!(evaluation.score, 1);
    }

    #[test]
    fn optimal_self_play_is_a_draw() {
        for first in [Mark::Ai, Mark::Player] {
            let mut session = GameSession::new(first);
            while session.outcome() == Outcome::InProgress {
                let mark = session.to_move();
                let mut scratch = *session.board();
                let evaluation = minmax_search(&mut scratch, mark).unwrap();
                assert_eq!(evaluation.score, 0);
                session.play(mark, evaluation.best_move).unwrap();
            }
            assert_eq!(session.outcome(), Outcome::Draw);
            assert_eq!(session.round(), 9);
        }
    }
}
