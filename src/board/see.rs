//! Static Exchange Evaluation (SEE).
//!
//! Decides whether resolving every capture on a move's destination square
//! leaves the mover at least `threshold` centipawns ahead.

use super::attack_tables::{bishop_attacks, rook_attacks};
use super::types::{Bitboard, Move, PieceType, Square};
use super::Position;

/// Exchange values by piece type. The king never counts as material.
pub const SEE_VALUES: [i32; 6] = [
    100, // Pawn
    300, // Knight
    300, // Bishop
    500, // Rook
    900, // Queen
    0,   // King
];

/// Order in which the cheapest attacker is picked; the king comes last
const CAPTURE_ORDER: [PieceType; 5] = [
    PieceType::Pawn,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Rook,
    PieceType::Queen,
];

impl Position {
    #[inline]
    fn see_value(&self, sq: Square) -> i32 {
        self.piece_at(sq).map_or(0, |p| SEE_VALUES[p.kind.index()])
    }

    /// Whether the exchange started by `mv` wins at least `threshold`.
    ///
    /// En passant is treated as an even trade. Promotions count as pawn moves.
    #[must_use]
    pub fn see_ge(&self, mv: Move, threshold: i32) -> bool {
        if mv.is_en_passant() {
            return threshold <= 0;
        }

        let from = mv.from();
        let to = mv.to();

        let mut score = self.see_value(to) - threshold;
        if score < 0 {
            return false;
        }
        score = self.see_value(from) - score;
        if score <= 0 {
            return true;
        }

        let diagonal = self.pieces_of_type(PieceType::Bishop) | self.pieces_of_type(PieceType::Queen);
        let straight = self.pieces_of_type(PieceType::Rook) | self.pieces_of_type(PieceType::Queen);

        let mut occupied =
            self.occupied() & !(Bitboard::from_square(from) | Bitboard::from_square(to));
        let mut attackers = self.attackers_to(to, occupied) & occupied;

        let root = self.side_to_move();
        let mut stm = root;
        let mut winner = root;

        loop {
            stm = stm.opponent();
            attackers &= occupied;

            let ours = attackers & self.occupancy(stm);
            if ours.is_empty() {
                break;
            }
            winner = winner.opponent();

            let cheapest = CAPTURE_ORDER
                .iter()
                .find_map(|&kind| (ours & self.pieces_of_type(kind)).lsb().map(|sq| (kind, sq)));

            let Some((kind, sq)) = cheapest else {
                // Only the king is left; it may take unless the square is still defended.
                let defended = (attackers & self.occupancy(stm.opponent())).any();
                return if defended { root != winner } else { root == winner };
            };

            occupied &= !Bitboard::from_square(sq);
            if matches!(kind, PieceType::Pawn | PieceType::Bishop | PieceType::Queen) {
                attackers |= bishop_attacks(to, occupied) & diagonal;
            }
            if matches!(kind, PieceType::Rook | PieceType::Queen) {
                attackers |= rook_attacks(to, occupied) & straight;
            }

            score = SEE_VALUES[kind.index()] - score + 1;
            if score <= 0 {
                break;
            }
        }

        root == winner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn see(fen: &str, uci: &str, threshold: i32) -> bool {
        let pos = Position::from_fen(fen).unwrap();
        let mv = pos.move_from_uci(uci).unwrap();
        pos.see_ge(mv, threshold)
    }

    #[test]
    fn undefended_capture_wins_the_victim() {
        let fen = "4k3/8/8/3n4/8/8/8/3QK3 w - - 0 1";
        assert!(see(fen, "d1d5", 300));
        assert!(!see(fen, "d1d5", 301));
    }

    #[test]
    fn queen_takes_defended_knight() {
        // Qxd5 exd5 nets 300 - 900 = -600
        let fen = "4k3/8/4p3/3n4/8/8/8/3QK3 w - - 0 1";
        assert!(see(fen, "d1d5", -600));
        assert!(!see(fen, "d1d5", -599));
        assert!(!see(fen, "d1d5", 0));
    }

    #[test]
    fn pawn_takes_defended_knight() {
        let fen = "4k3/8/4p3/3n4/4P3/8/8/4K3 w - - 0 1";
        assert!(see(fen, "e4d5", 200));
        assert!(!see(fen, "e4d5", 201));
    }

    #[test]
    fn xray_backs_up_the_first_attacker() {
        // Rxd5 Rxd5 Rxd5 with a second white rook behind on d1
        let fen = "3rk3/8/8/3p4/8/8/3R4/3RK3 w - - 0 1";
        assert!(see(fen, "d2d5", 100));
        let no_backup = "3rk3/8/8/3p4/8/8/3R4/4K3 w - - 0 1";
        assert!(!see(no_backup, "d2d5", 1));
    }

    #[test]
    fn quiet_move_onto_attacked_square() {
        let fen = "4k3/8/4p3/8/8/8/8/3QK3 w - - 0 1";
        assert!(!see(fen, "d1d5", 0));
        assert!(see(fen, "d1d2", 0));
    }

    #[test]
    fn en_passant_is_even() {
        let fen = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1";
        assert!(see(fen, "e5d6", 0));
        assert!(!see(fen, "e5d6", 1));
    }

    #[test]
    fn king_cannot_recapture_defended_square() {
        let defended = "4k3/3p4/8/1B6/8/8/8/3RK3 w - - 0 1";
        assert!(see(defended, "d1d7", 100));
        let undefended = "4k3/3p4/8/8/8/8/8/3RK3 w - - 0 1";
        assert!(!see(undefended, "d1d7", 100));
        assert!(see(undefended, "d1d7", -400));
    }
}
