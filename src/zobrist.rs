//! Zobrist hashing keys.
//!
//! Provides the random keys every incremental hash channel is built from.

use std::sync::LazyLock;

use rand::prelude::*;

use crate::board::{Piece, Square};

pub(crate) struct ZobristKeys {
    // piece_square[piece.index()][square]
    piece_square: [[u64; 64]; Piece::COUNT],
    // castling[rights.mask()], one key per combination of the four rights
    pub(crate) castling: [u64; 16],
    // en_passant[file] (only the file of the target square matters)
    pub(crate) en_passant: [u64; 8],
    pub(crate) black_to_move: u64,
}

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(1234567890_u64);
        let mut piece_square = [[0; 64]; Piece::COUNT];
        let mut castling = [0; 16];
        let mut en_passant = [0; 8];

        for piece in &mut piece_square {
            for key in piece.iter_mut() {
                *key = rng.gen();
            }
        }

        // No rights hashes to zero so that "no castling" leaves the hash untouched.
        for key in castling.iter_mut().skip(1) {
            *key = rng.gen();
        }

        for key in &mut en_passant {
            *key = rng.gen();
        }

        let black_to_move = rng.gen();

        ZobristKeys {
            piece_square,
            castling,
            en_passant,
            black_to_move,
        }
    }

    #[inline]
    pub(crate) fn piece(&self, piece: Piece, sq: Square) -> u64 {
        self.piece_square[piece.index()][sq.index()]
    }
}

pub(crate) static ZOBRIST: LazyLock<ZobristKeys> = LazyLock::new(ZobristKeys::new);
