use tracing::{info, instrument};

use crate::{GameError, GameSession, Mark, Move, best_move};

/// Searches the AI's move and plays it in the session.
///
/// # Errors
/// - [`GameError::GameOver`] if the game has already ended
/// - [`GameError::NotYourTurn`] if the player is to move
#[instrument(skip(session), fields(round = session.round()))]
pub fn play_ai_turn(session: &mut GameSession) -> Result<Move, GameError> {
    if session.outcome().is_over() {
        return Err(GameError::GameOver);
    }
    if session.to_move() != Mark::Ai {
        return Err(GameError::NotYourTurn(Mark::Ai));
    }

    let mv = best_move(session.board())?;
    let outcome = session.play(Mark::Ai, mv)?;
    info!(%mv, ?outcome, "computer moved");
    Ok(mv)
}
