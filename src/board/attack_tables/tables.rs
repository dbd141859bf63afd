//! Precomputed attack tables for leaper pieces (knights, kings, pawns).

use std::sync::LazyLock;

const KNIGHT_DELTAS: [(isize, isize); 8] = [
    (2, 1),
    (1, 2),
    (-1, 2),
    (-2, 1),
    (-2, -1),
    (-1, -2),
    (1, -2),
    (2, -1),
];

const KING_DELTAS: [(isize, isize); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Union of the on-board squares reached from `sq` by each (rank, file) delta
fn leaper_mask(sq: usize, deltas: &[(isize, isize)]) -> u64 {
    let r = (sq / 8) as isize;
    let f = (sq % 8) as isize;
    deltas
        .iter()
        .map(|&(dr, df)| (r + dr, f + df))
        .filter(|&(nr, nf)| (0..8).contains(&nr) && (0..8).contains(&nf))
        .fold(0u64, |mask, (nr, nf)| mask | 1u64 << (nr * 8 + nf))
}

pub(crate) static KNIGHT_ATTACKS: LazyLock<[u64; 64]> =
    LazyLock::new(|| std::array::from_fn(|sq| leaper_mask(sq, &KNIGHT_DELTAS)));

pub(crate) static KING_ATTACKS: LazyLock<[u64; 64]> =
    LazyLock::new(|| std::array::from_fn(|sq| leaper_mask(sq, &KING_DELTAS)));

/// `PAWN_ATTACKS[color][sq]`: white pawns capture toward rank 8, black toward rank 1
pub(crate) static PAWN_ATTACKS: LazyLock<[[u64; 64]; 2]> = LazyLock::new(|| {
    [
        std::array::from_fn(|sq| leaper_mask(sq, &[(1, -1), (1, 1)])),
        std::array::from_fn(|sq| leaper_mask(sq, &[(-1, -1), (-1, 1)])),
    ]
});
