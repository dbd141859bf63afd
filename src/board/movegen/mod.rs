//! Move generation.
//!
//! Generators are pseudo-legal: moves that leave the own king in check are
//! filtered by making the move and testing `is_king_attacked`.

mod kings;
mod knights;
mod pawns;
mod sliders;

use super::{Bitboard, Move, MoveList, Position};

/// Which subset of moves a generator emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum GenType {
    /// Every pseudo-legal move, castling included
    All,
    /// Captures, en passant, and promotions that capture
    Captures,
}

impl Position {
    /// All pseudo-legal moves for the side to move
    #[must_use]
    pub fn generate_moves(&self) -> MoveList {
        let mut list = MoveList::new();
        self.generate_into(GenType::All, &mut list);
        list
    }

    /// Pseudo-legal captures for the side to move
    #[must_use]
    pub fn generate_captures(&self) -> MoveList {
        let mut list = MoveList::new();
        self.generate_into(GenType::Captures, &mut list);
        list
    }

    fn generate_into(&self, gen: GenType, list: &mut MoveList) {
        let us = self.side_to_move();
        let targets = match gen {
            GenType::All => !self.occupancy(us),
            GenType::Captures => self.occupancy(us.opponent()),
        };

        self.generate_pawn_moves(gen, list);
        self.generate_knight_moves(targets, list);
        self.generate_slider_moves(targets, list);
        self.generate_king_moves(targets, list);
        if gen == GenType::All {
            self.generate_castling(list);
        }
    }

    /// Whether a pseudo-legal move keeps the mover's king out of check
    pub fn is_legal(&mut self, mv: Move) -> bool {
        let us = self.side_to_move();
        self.make_move(mv);
        let legal = !self.is_king_attacked(us);
        self.unmake_move();
        legal
    }

    /// Fully legal moves
    pub fn legal_moves(&mut self) -> MoveList {
        let mut legal = MoveList::new();
        for &mv in &self.generate_moves() {
            if self.is_legal(mv) {
                legal.push(mv);
            }
        }
        legal
    }

    /// Whether `mv` is among the generated moves of this position
    #[must_use]
    pub fn is_pseudo_legal(&self, mv: Move) -> bool {
        !mv.is_none() && self.generate_moves().contains(mv)
    }

    /// Count leaf nodes of the legal move tree to `depth`
    pub fn perft(&mut self, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }

        let us = self.side_to_move();
        let moves = self.generate_moves();
        let mut nodes = 0;
        for &mv in &moves {
            self.make_move(mv);
            if !self.is_king_attacked(us) {
                nodes += self.perft(depth - 1);
            }
            self.unmake_move();
        }

        nodes
    }

    /// Per-root-move perft counts, in generation order
    pub fn divide(&mut self, depth: u32) -> Vec<(Move, u64)> {
        let moves = self.legal_moves();
        moves
            .iter()
            .map(|&mv| {
                self.make_move(mv);
                let nodes = self.perft(depth.saturating_sub(1));
                self.unmake_move();
                (mv, nodes)
            })
            .collect()
    }
}

/// Squares from `a` to `b` inclusive, both on the same rank
#[inline]
fn rank_span(a: usize, b: usize) -> Bitboard {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    Bitboard((u64::MAX >> (63 - hi)) & (u64::MAX << lo))
}
