//! History heuristics and evaluation correction tables.
//!
//! Every entry follows the same saturating update
//! `value += bonus - value * |bonus| / cap`, which keeps it inside `[-cap, cap]`.

use super::params::SearchConfig;
use crate::board::{Color, Move, Piece, PieceType, Position, Square};

/// Cap for move ordering tables
pub const MAX_HIST: i32 = 16384;

/// Cap for correction tables
pub const MAX_CORR_HIST: i32 = 1024;

const PAWN_HIST_BUCKETS: usize = 1024;
const CORR_BUCKETS: usize = 16384;

/// Depth-scaled bonus for a move that caused a cutoff
#[inline]
#[must_use]
pub fn bonus(depth: i32) -> i32 {
    (depth * 300).clamp(0, 2500)
}

#[inline]
fn update_entry(value: &mut i32, bonus: i32, cap: i32) {
    let bonus = bonus.clamp(-cap, cap);
    *value += bonus - *value * bonus.abs() / cap;
}

fn zeroed(len: usize) -> Box<[i32]> {
    vec![0; len].into_boxed_slice()
}

/// Correction tables, one per hash channel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Channel {
    Pawn,
    Minor,
    Major,
    NonPawnStm,
    NonPawnNtm,
}

impl Channel {
    const ALL: [Channel; 5] = [
        Channel::Pawn,
        Channel::Minor,
        Channel::Major,
        Channel::NonPawnStm,
        Channel::NonPawnNtm,
    ];

    fn key(self, pos: &Position) -> u64 {
        let stm = pos.side_to_move();
        match self {
            Channel::Pawn => pos.pawn_hash(),
            Channel::Minor => pos.minor_hash(),
            Channel::Major => pos.major_hash(),
            Channel::NonPawnStm => pos.non_pawn_hash(stm),
            Channel::NonPawnNtm => pos.non_pawn_hash(stm.opponent()),
        }
    }

    fn weight(self, config: &SearchConfig) -> i32 {
        match self {
            Channel::Pawn => config.pawn_corr_weight,
            Channel::Minor => config.minor_corr_weight,
            Channel::Major => config.major_corr_weight,
            Channel::NonPawnStm => config.non_pawn_stm_corr_weight,
            Channel::NonPawnNtm => config.non_pawn_ntm_corr_weight,
        }
    }
}

/// Per-worker statistics tables
#[derive(Clone)]
pub struct History {
    /// `[color][from][to]`
    quiet: Box<[i32]>,
    /// `[piece][to][previous piece][previous to]`
    continuation: Box<[i32]>,
    /// `[attacker][to][victim type]`
    capture: Box<[i32]>,
    /// `[color][pawn hash bucket][piece type][to]`
    pawn: Box<[i32]>,
    /// `[channel][color][hash bucket]`
    correction: Box<[i32]>,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for History {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History").finish_non_exhaustive()
    }
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        History {
            quiet: zeroed(2 * 64 * 64),
            continuation: zeroed(Piece::COUNT * 64 * Piece::COUNT * 64),
            capture: zeroed(Piece::COUNT * 64 * 6),
            pawn: zeroed(2 * PAWN_HIST_BUCKETS * 6 * 64),
            correction: zeroed(Channel::ALL.len() * 2 * CORR_BUCKETS),
        }
    }

    /// Zero every table
    pub fn reset(&mut self) {
        for table in [
            &mut self.quiet,
            &mut self.continuation,
            &mut self.capture,
            &mut self.pawn,
            &mut self.correction,
        ] {
            table.fill(0);
        }
    }

    #[inline]
    fn quiet_index(stm: Color, mv: Move) -> usize {
        stm.index() * 4096 + mv.from().index() * 64 + mv.to().index()
    }

    #[inline]
    fn continuation_index(piece: Piece, to: Square, prev_piece: Piece, prev_to: Square) -> usize {
        ((piece.index() * 64 + to.index()) * Piece::COUNT + prev_piece.index()) * 64 + prev_to.index()
    }

    #[inline]
    fn capture_index(attacker: Piece, to: Square, victim: PieceType) -> usize {
        (attacker.index() * 64 + to.index()) * 6 + victim.index()
    }

    #[inline]
    fn pawn_index(stm: Color, pawn_hash: u64, kind: PieceType, to: Square) -> usize {
        let bucket = (pawn_hash % PAWN_HIST_BUCKETS as u64) as usize;
        ((stm.index() * PAWN_HIST_BUCKETS + bucket) * 6 + kind.index()) * 64 + to.index()
    }

    #[inline]
    fn correction_index(channel: Channel, stm: Color, key: u64) -> usize {
        let bucket = (key % CORR_BUCKETS as u64) as usize;
        ((channel as usize) * 2 + stm.index()) * CORR_BUCKETS + bucket
    }

    #[must_use]
    pub fn quiet(&self, stm: Color, mv: Move) -> i32 {
        self.quiet[Self::quiet_index(stm, mv)]
    }

    pub fn update_quiet(&mut self, stm: Color, mv: Move, bonus: i32) {
        update_entry(&mut self.quiet[Self::quiet_index(stm, mv)], bonus, MAX_HIST);
    }

    #[must_use]
    pub fn continuation(&self, piece: Piece, to: Square, prev_piece: Piece, prev_to: Square) -> i32 {
        self.continuation[Self::continuation_index(piece, to, prev_piece, prev_to)]
    }

    pub fn update_continuation(
        &mut self,
        piece: Piece,
        to: Square,
        prev_piece: Piece,
        prev_to: Square,
        bonus: i32,
    ) {
        let idx = Self::continuation_index(piece, to, prev_piece, prev_to);
        update_entry(&mut self.continuation[idx], bonus, MAX_HIST);
    }

    #[must_use]
    pub fn capture(&self, attacker: Piece, to: Square, victim: PieceType) -> i32 {
        self.capture[Self::capture_index(attacker, to, victim)]
    }

    pub fn update_capture(&mut self, attacker: Piece, to: Square, victim: PieceType, bonus: i32) {
        let idx = Self::capture_index(attacker, to, victim);
        update_entry(&mut self.capture[idx], bonus, MAX_HIST);
    }

    #[must_use]
    pub fn pawn(&self, stm: Color, pawn_hash: u64, kind: PieceType, to: Square) -> i32 {
        self.pawn[Self::pawn_index(stm, pawn_hash, kind, to)]
    }

    pub fn update_pawn(&mut self, stm: Color, pawn_hash: u64, kind: PieceType, to: Square, bonus: i32) {
        let idx = Self::pawn_index(stm, pawn_hash, kind, to);
        update_entry(&mut self.pawn[idx], bonus, MAX_HIST);
    }

    /// Static evaluation adjusted by every correction channel
    #[must_use]
    pub fn corrected_eval(&self, eval: i32, pos: &Position, config: &SearchConfig) -> i32 {
        let stm = pos.side_to_move();
        let correction: i32 = Channel::ALL
            .iter()
            .map(|&ch| ch.weight(config) * self.correction[Self::correction_index(ch, stm, ch.key(pos))])
            .sum();
        eval + correction / 2048
    }

    /// Move every correction channel toward `diff`
    pub fn update_correction(&mut self, pos: &Position, diff: i32) {
        let stm = pos.side_to_move();
        for ch in Channel::ALL {
            let idx = Self::correction_index(ch, stm, ch.key(pos));
            update_entry(&mut self.correction[idx], diff, MAX_CORR_HIST);
        }
    }

    #[cfg(test)]
    pub(crate) fn max_abs(&self) -> (i32, i32) {
        let ordering = [&self.quiet, &self.continuation, &self.capture, &self.pawn]
            .iter()
            .flat_map(|t| t.iter())
            .map(|v| v.abs())
            .max()
            .unwrap_or(0);
        let correction = self.correction.iter().map(|v| v.abs()).max().unwrap_or(0);
        (ordering, correction)
    }
}
