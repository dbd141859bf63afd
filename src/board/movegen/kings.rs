use super::super::attack_tables::king_attacks;
use super::super::{Bitboard, CastleSide, Color, Move, MoveList, Piece, PieceType, Position, Square};
use super::rank_span;

impl Position {
    pub(super) fn generate_king_moves(&self, targets: Bitboard, list: &mut MoveList) {
        if let Some(from) = self.king_square(self.side_to_move()) {
            for to in king_attacks(from) & targets {
                list.push(Move::normal(from, to));
            }
        }
    }

    /// King origin, king destination and rook origin of a castle that the
    /// rights and piece placement allow, ignoring blockers and attacks.
    ///
    /// Move generation and text parsing both go through here.
    pub(crate) fn castling_squares(&self, us: Color, side: CastleSide) -> Option<(Square, Square, Square)> {
        let rook = self.castling_rights().rook(us, side)?;
        let king = self.king_square(us)?;
        if king.file() != 4 || king.rank() != rook.rank() {
            return None;
        }
        if self.piece_at(rook) != Some(Piece::new(PieceType::Rook, us)) {
            return None;
        }
        let king_to = Square::from_index(king.rank() * 8 + side.king_file());
        Some((king, king_to, rook))
    }

    /// Castling: every square the king and rook cross must be empty (apart
    /// from the two castling pieces) and the king may not start, pass or land
    /// on an attacked square.
    pub(super) fn generate_castling(&self, list: &mut MoveList) {
        let us = self.side_to_move();
        let them = us.opponent();
        if self.castling_rights().is_empty() {
            return;
        }

        for side in CastleSide::BOTH {
            let Some((king, king_to, rook)) = self.castling_squares(us, side) else {
                continue;
            };
            let rook_to = Square::from_index(king.rank() * 8 + side.rook_file());

            let pieces = Bitboard::from_square(king) | Bitboard::from_square(rook);
            let must_be_empty = (rank_span(king.index(), king_to.index())
                | rank_span(rook.index(), rook_to.index()))
                & !pieces;
            if (must_be_empty & self.occupied()).any() {
                continue;
            }

            let king_path = rank_span(king.index(), king_to.index());
            if king_path.iter().any(|sq| self.is_square_attacked(sq, them)) {
                continue;
            }

            list.push(Move::castling(king, king_to));
        }
    }
}
