//! Text forms of moves: long algebraic input and short algebraic output.

use super::error::MoveParseError;
use super::{CastleSide, Move, PieceType, Position, Square};

impl Move {
    /// Short algebraic notation without disambiguation or check markers.
    ///
    /// `self` must be a move of `position`'s side to move.
    #[must_use]
    pub fn to_pgn(self, position: &Position) -> String {
        if self.is_none() {
            return String::new();
        }
        if self.is_castling() {
            return if self.to().file() == CastleSide::King.king_file() {
                "O-O".to_string()
            } else {
                "O-O-O".to_string()
            };
        }

        let from = self.from();
        let to = self.to();
        let moving = position.piece_at(from).map_or(PieceType::Pawn, |p| p.kind);
        let capture = self.is_en_passant() || position.piece_at(to).is_some();

        let mut pgn = String::with_capacity(8);
        if moving == PieceType::Pawn {
            if capture {
                pgn.push((b'a' + from.file() as u8) as char);
            }
        } else {
            pgn.push(moving.to_char().to_ascii_uppercase());
        }
        if capture {
            pgn.push('x');
        }
        pgn.push_str(&to.to_string());
        if let Some(promo) = self.promotion_piece() {
            pgn.push('=');
            pgn.push(promo.to_char().to_ascii_uppercase());
        }
        pgn
    }
}

impl Position {
    /// Classify long algebraic text (`e2e4`, `e7e8q`, `e1g1`) against this position.
    ///
    /// Only the syntax is validated; the result may still be illegal here.
    pub fn move_from_uci(&self, text: &str) -> Result<Move, MoveParseError> {
        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return Err(MoveParseError::InvalidLength {
                len: text.chars().count(),
            });
        }

        let square = |s: &str| {
            s.parse::<Square>()
                .map_err(|_| MoveParseError::InvalidSquare {
                    notation: text.to_string(),
                })
        };
        let from = square(&text[0..2])?;
        let to = square(&text[2..4])?;

        if let Some(c) = text[4..].chars().next() {
            return match PieceType::from_char(c) {
                Some(
                    piece @ (PieceType::Knight
                    | PieceType::Bishop
                    | PieceType::Rook
                    | PieceType::Queen),
                ) if c.is_ascii_lowercase() => Ok(Move::promotion(from, to, piece)),
                _ => Err(MoveParseError::InvalidPromotion { char: c }),
            };
        }

        let moving = self.piece_at(from).map(|p| p.kind);
        let us = self.side_to_move();

        if moving == Some(PieceType::King) {
            for side in CastleSide::BOTH {
                let castles = self.castling_squares(us, side);
                if matches!(castles, Some((king, king_to, _)) if king == from && king_to == to) {
                    return Ok(Move::castling(from, to));
                }
            }
        }

        if moving == Some(PieceType::Pawn) && self.ep_square() == Some(to) {
            return Ok(Move::en_passant(from, to));
        }

        Ok(Move::normal(from, to))
    }

    /// Parse and require membership among the legal moves
    pub fn parse_legal_move(&mut self, text: &str) -> Result<Move, MoveParseError> {
        let mv = self.move_from_uci(text)?;
        if self.legal_moves().contains(mv) {
            Ok(mv)
        } else {
            Err(MoveParseError::IllegalMove {
                notation: text.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uci_classifies_special_moves() {
        let pos = Position::from_fen("r3k2r/8/8/3pP3/8/8/8/R3K2R w KQkq d6 0 1").unwrap();
        assert!(pos.move_from_uci("e1g1").unwrap().is_castling());
        assert!(pos.move_from_uci("e1c1").unwrap().is_castling());
        assert!(pos.move_from_uci("e5d6").unwrap().is_en_passant());
        assert_eq!(pos.move_from_uci("e1f1").unwrap(), Move::normal(Square::E1, Square::F1));

        let no_rights = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w - - 0 1").unwrap();
        assert!(!no_rights.move_from_uci("e1g1").unwrap().is_castling());
    }

    #[test]
    fn uci_castling_agrees_with_generation() {
        for fen in [
            "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1",
            "r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1",
            // Rights without the rook at home, or without the king at home
            "r3k3/8/8/8/8/8/8/R3K3 w KQkq - 0 1",
            "4k3/8/8/8/8/8/8/5K1R w K - 0 1",
        ] {
            let pos = Position::from_fen(fen).unwrap();
            let generated = pos.generate_moves();
            for mv in generated.iter() {
                assert_eq!(pos.move_from_uci(&mv.to_string()).unwrap(), *mv, "{fen} {mv}");
            }
            let king = pos.king_square(pos.side_to_move()).unwrap();
            for file in [2, 6] {
                let to = Square::from_index(king.rank() * 8 + file);
                let parsed = pos.move_from_uci(&format!("{king}{to}")).unwrap();
                if parsed.is_castling() {
                    assert!(generated.contains(parsed), "{fen} {parsed}");
                }
            }
        }

        let displaced = Position::from_fen("4k3/8/8/8/8/8/8/5K1R w K - 0 1").unwrap();
        assert!(!displaced.move_from_uci("f1g1").unwrap().is_castling());
        let no_rook = Position::from_fen("r3k3/8/8/8/8/8/8/R3K3 w KQkq - 0 1").unwrap();
        assert!(!no_rook.move_from_uci("e1g1").unwrap().is_castling());
        assert!(no_rook.move_from_uci("e1c1").unwrap().is_castling());
    }

    #[test]
    fn uci_rejects_malformed_text() {
        let pos = Position::startpos();
        assert_eq!(
            pos.move_from_uci("e2e"),
            Err(MoveParseError::InvalidLength { len: 3 })
        );
        assert!(matches!(
            pos.move_from_uci("z2e4"),
            Err(MoveParseError::InvalidSquare { .. })
        ));
        assert_eq!(
            pos.move_from_uci("e7e8k"),
            Err(MoveParseError::InvalidPromotion { char: 'k' })
        );
    }

    #[test]
    fn parse_legal_rejects_illegal() {
        let mut pos = Position::startpos();
        assert!(pos.parse_legal_move("e2e4").is_ok());
        assert!(matches!(
            pos.parse_legal_move("e2e5"),
            Err(MoveParseError::IllegalMove { .. })
        ));
    }

    #[test]
    fn pgn_forms() {
        let pos = Position::from_fen("r3k2r/1P6/8/3pP3/8/5N2/8/R3K2R w KQkq d6 0 1").unwrap();
        let pgn = |uci: &str| pos.move_from_uci(uci).unwrap().to_pgn(&pos);
        assert_eq!(pgn("e1g1"), "O-O");
        assert_eq!(pgn("e1c1"), "O-O-O");
        assert_eq!(pgn("e5d6"), "exd6");
        assert_eq!(pgn("f3d4"), "Nd4");
        assert_eq!(pgn("b7a8q"), "bxa8=Q");
        assert_eq!(pgn("a1a8"), "Rxa8");
        assert_eq!(pgn("e5e6"), "e6");
        assert_eq!(Move::NONE.to_pgn(&pos), "");
    }
}
