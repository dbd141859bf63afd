//! Core chess types.
//!
//! This module contains the fundamental types used throughout the engine:
//! - `PieceType`, `Color` and the colored `Piece`
//! - `Square` - compact board square representation (u8)
//! - `Bitboard` - 64-bit board representation
//! - `Move` and `MoveList` - 16-bit move representation
//! - `CastlingRights` - rook origin squares that may still castle

mod bitboard;
mod castling;
mod moves;
mod piece;
mod square;

pub use bitboard::{Bitboard, BitboardIter};
pub use castling::{CastleSide, CastlingRights};
pub use moves::{Move, MoveKind, MoveList, ScoredMove, ScoredMoveList};
pub use piece::{Color, Piece, PieceType};
pub use square::Square;

pub(crate) use moves::MAX_MOVES;
pub(crate) use piece::PROMOTION_PIECES;
