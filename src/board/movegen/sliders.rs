use super::super::attack_tables::{bishop_attacks, queen_attacks, rook_attacks};
use super::super::{Bitboard, Move, MoveList, PieceType, Position};

impl Position {
    pub(super) fn generate_slider_moves(&self, targets: Bitboard, list: &mut MoveList) {
        let us = self.side_to_move();
        let occupied = self.occupied();

        for kind in [PieceType::Bishop, PieceType::Rook, PieceType::Queen] {
            for from in self.pieces(kind, us) {
                let attacks = match kind {
                    PieceType::Bishop => bishop_attacks(from, occupied),
                    PieceType::Rook => rook_attacks(from, occupied),
                    _ => queen_attacks(from, occupied),
                };
                for to in attacks & targets {
                    list.push(Move::normal(from, to));
                }
            }
        }
    }
}
