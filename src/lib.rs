//! Tic-Tac-Toe against a computer that never loses.
//!
//! The computer performs an exhaustive minmax search over the full game tree
//! (at most nine plies). A front end owns a [`GameSession`] (or a bare
//! [`Board`]) and talks to the core through two calls: [`Board::outcome`]
//! after every move and [`best_move`] once per AI turn.

mod ai_player;
mod game;
pub mod minmax;

pub use ai_player::play_ai_turn;
pub use game::*;
pub use minmax::{Evaluation, best_move, minmax_search};
