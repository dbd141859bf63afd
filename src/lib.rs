//! UCI chess engine built around an incrementally updated, quantized NNUE.
//!
//! The crate is split the usual way: [`board`] holds the rules, the
//! evaluator and the search, [`engine`] drives searches and limits, and
//! [`uci`] is the text front end.

pub mod board;
pub mod engine;
pub mod tt;
pub mod uci;
pub mod zobrist;

pub use board::{Color, Move, Piece, Position, Square};
pub use engine::{Engine, EngineOptions};
pub use tt::TranspositionTable;
