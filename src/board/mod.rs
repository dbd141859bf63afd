//! Chess board representation and game logic.
//!
//! A [`Position`] is a stack of snapshots: making a move pushes a copy of
//! the current [`PositionState`] and mutates it, unmaking pops it. Every
//! snapshot carries its Zobrist keys, split into channels for the
//! correction tables.
//!
//! # Example
//! ```
//! use chess_nnue::board::Position;
//!
//! let mut position = Position::startpos();
//! let moves = position.legal_moves();
//! println!("Starting position has {} legal moves", moves.len());
//! ```

mod attack_tables;
mod error;
mod fen;
mod make_unmake;
mod movegen;
mod notation;
mod see;
mod state;
mod types;

pub mod nnue;
pub mod search;

#[cfg(test)]
mod tests;

pub use error::{FenError, MoveParseError, SquareError};
pub use fen::START_FEN;
pub use see::SEE_VALUES;
pub use state::{Hashes, Position, PositionState};
pub use types::{
    Bitboard, BitboardIter, CastleSide, CastlingRights, Color, Move, MoveKind, MoveList, Piece,
    PieceType, ScoredMove, ScoredMoveList, Square,
};

pub(crate) use types::{MAX_MOVES, PROMOTION_PIECES};
