//! Incrementally maintained first-layer activations.

use super::network::Network;
use super::{feature_index, simd, L1};
use crate::board::{CastleSide, Color, Move, MoveKind, Piece, PieceType, Position, Square};

/// Per-perspective embedding sums
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accumulator {
    pub(crate) white: [i16; L1],
    pub(crate) black: [i16; L1],
}

impl Accumulator {
    /// Build from scratch: bias plus one embedding row per piece
    #[must_use]
    pub fn reset(pos: &Position, net: &Network) -> Self {
        let mut acc = Accumulator {
            white: *net.bias(),
            black: *net.bias(),
        };
        for sq in pos.occupied().iter() {
            if let Some(piece) = pos.piece_at(sq) {
                acc.add(net, piece, sq);
            }
        }
        acc
    }

    #[inline]
    #[must_use]
    pub fn perspective(&self, color: Color) -> &[i16; L1] {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    #[inline]
    fn add(&mut self, net: &Network, piece: Piece, sq: Square) {
        simd::add_assign(&mut self.white, net.row(feature_index(piece, sq, Color::White)));
        simd::add_assign(&mut self.black, net.row(feature_index(piece, sq, Color::Black)));
    }

    #[inline]
    fn sub(&mut self, net: &Network, piece: Piece, sq: Square) {
        simd::sub_assign(&mut self.white, net.row(feature_index(piece, sq, Color::White)));
        simd::sub_assign(&mut self.black, net.row(feature_index(piece, sq, Color::Black)));
    }

    /// Accumulator for the position after `mv`, computed from the position
    /// before it. Equals `reset` on the resulting position.
    #[must_use]
    pub fn update(&self, before: &Position, mv: Move, net: &Network) -> Self {
        let mut next = self.clone();
        next.apply(before, mv, net);
        next
    }

    /// In-place form of [`Accumulator::update`]
    pub fn apply(&mut self, before: &Position, mv: Move, net: &Network) {
        let from = mv.from();
        let to = mv.to();
        let Some(mover) = before.piece_at(from) else {
            debug_assert!(false, "accumulator update for {mv} from empty square");
            return;
        };
        let us = mover.color;

        match mv.kind() {
            MoveKind::Normal => {
                if let Some(victim) = before.piece_at(to) {
                    self.sub(net, victim, to);
                }
                self.sub(net, mover, from);
                self.add(net, mover, to);
            }
            MoveKind::Promotion => {
                if let Some(victim) = before.piece_at(to) {
                    self.sub(net, victim, to);
                }
                self.sub(net, mover, from);
                let promoted = mv.promotion_piece().unwrap_or(PieceType::Queen);
                self.add(net, Piece::new(promoted, us), to);
            }
            MoveKind::EnPassant => {
                let victim = Piece::new(PieceType::Pawn, us.opponent());
                self.sub(net, victim, to.offset(-us.forward()));
                self.sub(net, mover, from);
                self.add(net, mover, to);
            }
            MoveKind::Castling => {
                let side = if to.index() > from.index() {
                    CastleSide::King
                } else {
                    CastleSide::Queen
                };
                self.sub(net, mover, from);
                self.add(net, mover, to);
                if let Some(rook_from) = before.castling_rights().rook(us, side) {
                    let rook = Piece::new(PieceType::Rook, us);
                    let rook_to = Square::from_index(from.rank() * 8 + side.rook_file());
                    self.sub(net, rook, rook_from);
                    self.add(net, rook, rook_to);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::nnue::Kernel;
    use rand::prelude::*;

    fn play_random(fen: &str, plies: usize, seed: u64) {
        let net = Network::random(11);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut pos = Position::from_fen(fen).unwrap();
        let mut acc = Accumulator::reset(&pos, &net);
        let mut stack = vec![acc.clone()];

        for _ in 0..plies {
            let moves = pos.legal_moves();
            if moves.len() == 0 {
                break;
            }
            let mv = moves[rng.gen_range(0..moves.len())];
            acc = acc.update(&pos, mv, &net);
            pos.make_move(mv);
            stack.push(acc.clone());

            let fresh = Accumulator::reset(&pos, &net);
            assert_eq!(acc, fresh, "after {mv} in {}", pos.to_fen());
            for kernel in Kernel::ALL {
                assert_eq!(
                    net.evaluate_with(&acc, pos.side_to_move(), kernel),
                    net.evaluate_with(&fresh, pos.side_to_move(), Kernel::Scalar)
                );
            }
        }

        // Popping mirrors unmake.
        while stack.len() > 1 {
            stack.pop();
            pos.unmake_move();
            assert_eq!(stack.last().unwrap(), &Accumulator::reset(&pos, &net));
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "from empty square")]
    fn update_from_empty_square_is_an_invariant_breach() {
        let net = Network::random(14);
        let pos = Position::startpos();
        let acc = Accumulator::reset(&pos, &net);
        let e4: Square = "e4".parse().unwrap();
        let e5: Square = "e5".parse().unwrap();
        let _ = acc.update(&pos, Move::normal(e4, e5), &net);
    }

    #[test]
    fn incremental_matches_reset_from_startpos() {
        for seed in 0..4 {
            play_random(crate::board::START_FEN, 40, seed);
        }
    }

    #[test]
    fn incremental_matches_reset_with_special_moves() {
        // Castling both sides, en passant and promotions are all reachable.
        play_random("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1", 30, 7);
        play_random("n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1", 20, 8);
        play_random("8/8/8/2k5/3Pp3/8/8/4K3 b - d3 0 1", 10, 9);
    }

    #[test]
    fn castling_update_moves_the_rook() {
        let net = Network::random(12);
        let pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let acc = Accumulator::reset(&pos, &net);
        for uci in ["e1g1", "e1c1"] {
            let mv = pos.move_from_uci(uci).unwrap();
            let mut after = pos.clone();
            after.make_move(mv);
            assert_eq!(acc.update(&pos, mv, &net), Accumulator::reset(&after, &net));
        }
    }

    #[test]
    fn perspectives_mirror_on_symmetric_position() {
        let net = Network::random(13);
        let acc = Accumulator::reset(&Position::startpos(), &net);
        assert_eq!(acc.perspective(Color::White), acc.perspective(Color::Black));
    }
}
