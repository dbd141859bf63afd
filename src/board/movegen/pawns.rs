use super::super::attack_tables::pawn_attacks;
use super::super::{Bitboard, Color, Move, MoveList, PieceType, Position, Square, PROMOTION_PIECES};
use super::GenType;

impl Position {
    pub(super) fn generate_pawn_moves(&self, gen: GenType, list: &mut MoveList) {
        let us = self.side_to_move();
        let pawns = self.pieces(PieceType::Pawn, us);
        let enemies = self.occupancy(us.opponent());
        let ep = self.ep_square();

        for from in pawns {
            let attacks = pawn_attacks(us, from);
            for to in attacks & enemies {
                push_pawn_move(us, from, to, list);
            }
            if let Some(ep) = ep {
                if attacks.contains(ep) {
                    list.push(Move::en_passant(from, ep));
                }
            }
        }

        if gen == GenType::Captures {
            return;
        }

        let empty = !self.occupied();
        let (single, double_rank) = match us {
            Color::White => (pawns.shift_north() & empty, Bitboard::RANK_3),
            Color::Black => (pawns.shift_south() & empty, Bitboard::RANK_6),
        };
        let double = match us {
            Color::White => (single & double_rank).shift_north(),
            Color::Black => (single & double_rank).shift_south(),
        } & empty;

        let forward = us.forward();
        for to in single {
            push_pawn_move(us, to.offset(-forward), to, list);
        }
        for to in double {
            list.push(Move::normal(to.offset(-2 * forward), to));
        }
    }
}

/// Push a pawn move, expanding it into four promotions on the last rank
#[inline]
fn push_pawn_move(us: Color, from: Square, to: Square, list: &mut MoveList) {
    if to.rank() == us.promotion_rank() {
        for piece in PROMOTION_PIECES {
            list.push(Move::promotion(from, to, piece));
        }
    } else {
        list.push(Move::normal(from, to));
    }
}
