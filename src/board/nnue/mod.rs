//! NNUE (Efficiently Updatable Neural Network) evaluation.
//!
//! Architecture: (768 -> 1024) x 2 perspectives -> pairwise -> 16 -> 32 -> 1
//!
//! - Dual perspective accumulators maintained incrementally with make/unmake
//! - Pairwise clipped products quantized to u8
//! - Integer first hidden layer (scalar, SIMD or sparse kernel)
//! - Float tail with clipped-square activations

mod accumulator;
mod network;
mod simd;
mod sparse;

pub use accumulator::Accumulator;
pub use network::{Network, NetworkError, DEFAULT_NETWORK};

use super::{Color, Piece, Position, Square};

/// Input features: 2 colors x 6 piece types x 64 squares
pub const INPUTS: usize = 768;

/// Accumulator width per perspective
pub const L1: usize = 1024;

/// First hidden layer width
pub const L2: usize = 16;

/// Second hidden layer width
pub const L3: usize = 32;

/// Accumulator clip ceiling
pub const QA: i32 = 255;

/// First hidden layer weight quantization
pub const QB: i32 = 64;

/// Right shift applied to pairwise products
pub const PAIRWISE_SHIFT: u32 = 9;

/// Network output to centipawns
pub const EVAL_SCALE: f32 = 400.0;

/// Forward pass implementation for the integer first hidden layer.
///
/// Every kernel produces identical results; they differ only in speed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Kernel {
    /// Portable reference
    Scalar,
    /// AVX2 or NEON when available, scalar otherwise
    #[default]
    Simd,
    /// Skips weight columns that are zero across a 16-row chunk
    Sparse,
}

impl Kernel {
    pub const ALL: [Kernel; 3] = [Kernel::Scalar, Kernel::Simd, Kernel::Sparse];
}

/// Embedding row for `piece` on `sq` as seen from `perspective`.
///
/// Black's view flips the board vertically and swaps colors.
#[inline]
#[must_use]
pub fn feature_index(piece: Piece, sq: Square, perspective: Color) -> usize {
    let (color, sq) = match perspective {
        Color::White => (piece.color.index(), sq.index()),
        Color::Black => (piece.color.opponent().index(), sq.flip_vertical().index()),
    };
    color * 384 + piece.kind.index() * 64 + sq
}

/// Evaluate from scratch with the default network, side-to-move relative
#[must_use]
pub fn evaluate_position(pos: &Position) -> i32 {
    let net = &**DEFAULT_NETWORK;
    let acc = Accumulator::reset(pos, net);
    net.evaluate(&acc, pos.side_to_move())
}
