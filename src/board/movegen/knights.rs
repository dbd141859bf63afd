use super::super::attack_tables::knight_attacks;
use super::super::{Bitboard, Move, MoveList, PieceType, Position};

impl Position {
    pub(super) fn generate_knight_moves(&self, targets: Bitboard, list: &mut MoveList) {
        for from in self.pieces(PieceType::Knight, self.side_to_move()) {
            for to in knight_attacks(from) & targets {
                list.push(Move::normal(from, to));
            }
        }
    }
}
