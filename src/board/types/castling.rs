//! Castling rights type.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::piece::Color;
use super::square::Square;

/// Which wing a castling right belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CastleSide {
    King,
    Queen,
}

impl CastleSide {
    pub const BOTH: [CastleSide; 2] = [CastleSide::King, CastleSide::Queen];

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Destination file of the king when castling on this side
    #[inline]
    #[must_use]
    pub const fn king_file(self) -> usize {
        match self {
            CastleSide::King => 6,
            CastleSide::Queen => 2,
        }
    }

    /// Destination file of the rook when castling on this side
    #[inline]
    #[must_use]
    pub const fn rook_file(self) -> usize {
        match self {
            CastleSide::King => 5,
            CastleSide::Queen => 3,
        }
    }
}

/// Castling rights, stored per color and side as the origin square of the
/// rook that may still castle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CastlingRights {
    rooks: [[Option<Square>; 2]; 2],
}

impl CastlingRights {
    /// No castling rights
    #[must_use]
    pub const fn none() -> Self {
        CastlingRights {
            rooks: [[None; 2]; 2],
        }
    }

    /// Standard starting rights (rooks on a1, h1, a8, h8)
    #[must_use]
    pub const fn standard() -> Self {
        CastlingRights {
            rooks: [
                [Some(Square::H1), Some(Square::A1)],
                [Some(Square::H8), Some(Square::A8)],
            ],
        }
    }

    /// Rook origin square for a right, if held
    #[inline]
    #[must_use]
    pub const fn rook(self, color: Color, side: CastleSide) -> Option<Square> {
        self.rooks[color.index()][side.index()]
    }

    #[inline]
    #[must_use]
    pub const fn has(self, color: Color, side: CastleSide) -> bool {
        self.rook(color, side).is_some()
    }

    #[inline]
    pub fn set(&mut self, color: Color, side: CastleSide, rook: Square) {
        self.rooks[color.index()][side.index()] = Some(rook);
    }

    /// Drop both rights of a color (king moved or castled)
    #[inline]
    pub fn clear(&mut self, color: Color) {
        self.rooks[color.index()] = [None; 2];
    }

    /// Drop whichever right of `color` is tied to a rook on `sq`
    #[inline]
    pub fn remove_rook(&mut self, color: Color, sq: Square) {
        for slot in &mut self.rooks[color.index()] {
            if *slot == Some(sq) {
                *slot = None;
            }
        }
    }

    /// 4-bit summary used to index the castling hash keys:
    /// bit0 white kingside, bit1 white queenside, bit2 black kingside, bit3 black queenside.
    #[inline]
    #[must_use]
    pub const fn mask(self) -> usize {
        let mut mask = 0;
        if self.rooks[0][0].is_some() {
            mask |= 1;
        }
        if self.rooks[0][1].is_some() {
            mask |= 2;
        }
        if self.rooks[1][0].is_some() {
            mask |= 4;
        }
        if self.rooks[1][1].is_some() {
            mask |= 8;
        }
        mask
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.mask() == 0
    }
}
