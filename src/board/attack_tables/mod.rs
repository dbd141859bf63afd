//! Attack tables shared by move generation, check detection and SEE.
//!
//! Leapers (knight, king, pawn) use precomputed tables. Sliders use
//! Hyperbola Quintessence for files and diagonals and a lookup for ranks.

#![allow(clippy::inline_always)]

mod tables;

use std::sync::LazyLock;

use tables::{KING_ATTACKS, KNIGHT_ATTACKS, PAWN_ATTACKS};

use crate::board::{Bitboard, Color, Square};

const FILE_A: u64 = 0x0101_0101_0101_0101;

/// Squares on the line through `sq` along `(dr, df)` in both directions, `sq` included
fn line_mask(sq: usize, dr: isize, df: isize) -> u64 {
    let (rank, file) = ((sq / 8) as isize, (sq % 8) as isize);
    let mut mask = 1u64 << sq;
    for sign in [1, -1] {
        let (mut r, mut f) = (rank + sign * dr, file + sign * df);
        while (0..8).contains(&r) && (0..8).contains(&f) {
            mask |= 1u64 << (r * 8 + f);
            r += sign * dr;
            f += sign * df;
        }
    }
    mask
}

static DIAG_MASKS: LazyLock<[u64; 64]> = LazyLock::new(|| std::array::from_fn(|sq| line_mask(sq, 1, 1)));
static ANTI_MASKS: LazyLock<[u64; 64]> = LazyLock::new(|| std::array::from_fn(|sq| line_mask(sq, 1, -1)));
static FILE_MASKS: LazyLock<[u64; 64]> = LazyLock::new(|| std::array::from_fn(|sq| FILE_A << (sq % 8)));

/// First-rank attacks indexed by `8 * inner_occupancy + file`.
///
/// The inner occupancy holds files b..g; edge squares never block.
static RANK_ATTACKS: LazyLock<[u64; 512]> = LazyLock::new(|| {
    std::array::from_fn(|index| {
        let (inner, file) = ((index / 8) as u64, index % 8);
        let occupied = inner << 1;
        let mut attacks = 0u64;
        for step in [1isize, -1] {
            let mut f = file as isize + step;
            while (0..8).contains(&f) {
                attacks |= 1u64 << f;
                if occupied & (1u64 << f) != 0 {
                    break;
                }
                f += step;
            }
        }
        attacks
    })
});

/// Hyperbola Quintessence along one line, mirrored with a byte swap for
/// the reverse direction. The slider's own square is masked out first.
#[inline(always)]
fn line_attacks(occupied: u64, mask: u64, square: usize) -> u64 {
    let piece = 1u64 << square;
    let forward = occupied & mask & !piece;
    let reverse = forward.swap_bytes();
    let up = forward.wrapping_sub(piece);
    let down = reverse.wrapping_sub(piece.swap_bytes()).swap_bytes();
    (up ^ down) & mask & !piece
}

#[inline(always)]
fn rank_attacks(occupied: u64, square: usize) -> u64 {
    let (rank, file) = (square / 8, square % 8);
    let inner = ((occupied >> (rank * 8 + 1)) & 63) as usize;
    RANK_ATTACKS[8 * inner + file] << (rank * 8)
}

/// Bishop attacks (diagonals only)
#[inline]
#[must_use]
pub fn bishop_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    let square = sq.index();
    Bitboard(
        line_attacks(occupancy.0, DIAG_MASKS[square], square)
            | line_attacks(occupancy.0, ANTI_MASKS[square], square),
    )
}

/// Rook attacks (ranks and files only)
#[inline]
#[must_use]
pub fn rook_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    let square = sq.index();
    Bitboard(line_attacks(occupancy.0, FILE_MASKS[square], square) | rank_attacks(occupancy.0, square))
}

/// Queen attacks (all 8 directions)
#[inline]
#[must_use]
pub fn queen_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    bishop_attacks(sq, occupancy) | rook_attacks(sq, occupancy)
}

#[inline]
#[must_use]
pub fn knight_attacks(sq: Square) -> Bitboard {
    Bitboard(KNIGHT_ATTACKS[sq.index()])
}

#[inline]
#[must_use]
pub fn king_attacks(sq: Square) -> Bitboard {
    Bitboard(KING_ATTACKS[sq.index()])
}

/// Squares a pawn of `color` on `sq` attacks
#[inline]
#[must_use]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    Bitboard(PAWN_ATTACKS[color.index()][sq.index()])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn bb(squares: &[&str]) -> Bitboard {
        squares
            .iter()
            .fold(Bitboard::EMPTY, |acc, s| acc | Bitboard::from_square(sq(s)))
    }

    #[test]
    fn rook_attacks_empty_board() {
        let attacks = rook_attacks(sq("e4"), Bitboard::EMPTY);
        let expected = Bitboard(0xFF << 24) | Bitboard(FILE_A << 4);
        assert_eq!(attacks, expected & !Bitboard::from_square(sq("e4")));
    }

    #[test]
    fn bishop_attacks_empty_board() {
        let attacks = bishop_attacks(sq("e4"), Bitboard::EMPTY);
        for s in ["b1", "h7", "h1", "a8"] {
            assert!(attacks.contains(sq(s)), "{s}");
        }
        assert!(!attacks.contains(sq("e4")));
        assert_eq!(attacks.popcount(), 13);
    }

    #[test]
    fn rook_attacks_stop_at_blockers() {
        let attacks = rook_attacks(sq("e4"), bb(&["e6", "c4"]));
        assert!(attacks.contains(sq("e6")));
        assert!(!attacks.contains(sq("e7")));
        assert!(attacks.contains(sq("c4")));
        assert!(!attacks.contains(sq("b4")));
    }

    #[test]
    fn bishop_attacks_stop_at_blockers() {
        let attacks = bishop_attacks(sq("e4"), bb(&["g6"]));
        assert!(attacks.contains(sq("g6")));
        assert!(!attacks.contains(sq("h7")));
    }

    #[test]
    fn leaper_tables() {
        assert_eq!(knight_attacks(sq("a1")), bb(&["b3", "c2"]));
        assert_eq!(king_attacks(sq("h8")), bb(&["g8", "g7", "h7"]));
        assert_eq!(pawn_attacks(Color::White, sq("e4")), bb(&["d5", "f5"]));
        assert_eq!(pawn_attacks(Color::Black, sq("a5")), bb(&["b4"]));
    }
}
