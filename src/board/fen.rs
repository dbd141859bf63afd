use std::fmt;
use std::str::FromStr;

use super::error::FenError;
use super::state::PositionState;
use super::{CastleSide, Color, Piece, PieceType, Position, Square};

/// Standard starting position
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Position {
    /// The standard starting position
    #[must_use]
    pub fn startpos() -> Self {
        Position::from_fen(START_FEN).expect("START_FEN is valid")
    }

    /// Parse a position from FEN. The clock fields are optional.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(FenError::TooFewParts { found: parts.len() });
        }

        let mut state = PositionState::empty();
        parse_placement(&mut state, parts[0])?;

        state.side_to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(FenError::InvalidSideToMove {
                    found: other.to_string(),
                })
            }
        };

        if parts[2] != "-" {
            for c in parts[2].chars() {
                let (color, side) = match c {
                    'K' => (Color::White, CastleSide::King),
                    'Q' => (Color::White, CastleSide::Queen),
                    'k' => (Color::Black, CastleSide::King),
                    'q' => (Color::Black, CastleSide::Queen),
                    _ => return Err(FenError::InvalidCastling { char: c }),
                };
                let rank = match color {
                    Color::White => 0,
                    Color::Black => 7,
                };
                let file = match side {
                    CastleSide::King => 7,
                    CastleSide::Queen => 0,
                };
                state
                    .castling
                    .set(color, side, Square::from_index(rank * 8 + file));
            }
        }

        state.ep_square = match parts[3] {
            "-" => None,
            text => {
                let invalid = || FenError::InvalidEnPassant {
                    found: text.to_string(),
                };
                let sq: Square = text.parse().map_err(|_| invalid())?;
                let us = state.side_to_move;
                let (ep_rank, behind) = match us {
                    Color::White => (5, -8),
                    Color::Black => (2, 8),
                };
                if sq.rank() != ep_rank {
                    return Err(invalid());
                }
                // The double-pushed pawn sits just past an empty target square
                let pushed = state.mailbox[sq.offset(behind).index()];
                if state.mailbox[sq.index()].is_some()
                    || pushed != Some(Piece::new(PieceType::Pawn, us.opponent()))
                {
                    return Err(invalid());
                }
                Some(sq)
            }
        };

        state.halfmove_clock = parse_clock(parts.get(4), 0)?;
        state.fullmove_number = parse_clock(parts.get(5), 1)?;

        let mut pos = Position::from_state(state);
        pos.current.hashes = pos.explicit_hashes();
        Ok(pos)
    }

    /// Reset to `fen`, discarding history. On error the position is untouched.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), FenError> {
        *self = Position::from_fen(fen)?;
        Ok(())
    }

    /// Reset to the starting position, discarding history
    pub fn set_startpos(&mut self) {
        *self = Position::startpos();
    }

    /// Six-field FEN of the current position
    #[must_use]
    pub fn to_fen(&self) -> String {
        let state = &self.current;
        let mut fen = String::with_capacity(90);

        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match state.mailbox[rank * 8 + file] {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(piece.to_fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match state.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        fen.push(' ');
        let mut any = false;
        for (color, side, c) in [
            (Color::White, CastleSide::King, 'K'),
            (Color::White, CastleSide::Queen, 'Q'),
            (Color::Black, CastleSide::King, 'k'),
            (Color::Black, CastleSide::Queen, 'q'),
        ] {
            if state.castling.has(color, side) {
                fen.push(c);
                any = true;
            }
        }
        if !any {
            fen.push('-');
        }

        fen.push(' ');
        match state.ep_square {
            Some(sq) => fen.push_str(&sq.to_string()),
            None => fen.push('-'),
        }

        fen.push_str(&format!(
            " {} {}",
            state.halfmove_clock, state.fullmove_number
        ));
        fen
    }
}

fn parse_placement(state: &mut PositionState, placement: &str) -> Result<(), FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::InvalidRankCount { found: ranks.len() });
    }

    for (i, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - i;
        let mut file = 0;
        for c in rank_str.chars() {
            if let Some(skip) = c.to_digit(10) {
                file += skip as usize;
                continue;
            }
            let piece = Piece::from_fen_char(c).ok_or(FenError::InvalidPiece { char: c })?;
            if file >= 8 {
                return Err(FenError::InvalidRankLength {
                    rank: rank + 1,
                    files: file + 1,
                });
            }
            state.put_piece(piece, Square::from_index(rank * 8 + file));
            file += 1;
        }
        if file != 8 {
            return Err(FenError::InvalidRankLength {
                rank: rank + 1,
                files: file,
            });
        }
    }

    for (color, name) in [(Color::White, "White"), (Color::Black, "Black")] {
        let kings = state.pieces[PieceType::King.index()] & state.colors[color.index()];
        if kings.popcount() != 1 {
            return Err(FenError::InvalidKingCount { color: name });
        }
    }

    Ok(())
}

fn parse_clock(field: Option<&&str>, default: u16) -> Result<u16, FenError> {
    match field {
        None => Ok(default),
        Some(text) => text.parse().map_err(|_| FenError::InvalidClock {
            found: (*text).to_string(),
        }),
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::startpos()
    }
}

impl FromStr for Position {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::from_fen(s)
    }
}

/// Plain ASCII diagram, rank 8 at the top
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8 {
                let c = self
                    .piece_at(Square::from_index(rank * 8 + file))
                    .map_or('.', Piece::to_fen_char);
                write!(f, " {c}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "   a b c d e f g h")?;
        write!(f, "FEN: {}", self.to_fen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_is_exact() {
        for fen in [
            START_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 2",
            "4k3/8/8/8/8/8/8/4K3 b - - 57 120",
        ] {
            assert_eq!(Position::from_fen(fen).unwrap().to_fen(), fen);
        }
    }

    #[test]
    fn clocks_are_optional() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - -").unwrap();
        assert_eq!(pos.halfmove_clock(), 0);
        assert_eq!(pos.fullmove_number(), 1);
        assert!(pos.to_fen().ends_with(" 0 1"));
    }

    #[test]
    fn reports_each_malformed_field() {
        assert_eq!(
            Position::from_fen("8/8/8 w").unwrap_err(),
            FenError::TooFewParts { found: 2 }
        );
        assert!(matches!(
            Position::from_fen("4k3/8/8/8/8/8/8/4K2X w - - 0 1"),
            Err(FenError::InvalidPiece { char: 'X' })
        ));
        assert!(matches!(
            Position::from_fen("4k3/8/8/8/8/8/4K3 w - - 0 1"),
            Err(FenError::InvalidRankCount { found: 7 })
        ));
        assert!(matches!(
            Position::from_fen("4k3/8/8/8/8/8/8/4K4 w - - 0 1"),
            Err(FenError::InvalidRankLength { .. })
        ));
        assert!(matches!(
            Position::from_fen("4k3/8/8/8/8/8/8/4K3 x - - 0 1"),
            Err(FenError::InvalidSideToMove { .. })
        ));
        assert!(matches!(
            Position::from_fen("4k3/8/8/8/8/8/8/4K3 w KX - 0 1"),
            Err(FenError::InvalidCastling { char: 'X' })
        ));
        assert!(matches!(
            Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - e4 0 1"),
            Err(FenError::InvalidEnPassant { .. })
        ));
        assert!(matches!(
            Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - x 1"),
            Err(FenError::InvalidClock { .. })
        ));
        assert!(matches!(
            Position::from_fen("8/8/8/8/8/8/8/4K3 w - - 0 1"),
            Err(FenError::InvalidKingCount { color: "Black" })
        ));
    }

    #[test]
    fn set_fen_resets_history() {
        let mut pos = Position::startpos();
        let mv = pos.move_from_uci("e2e4").unwrap();
        pos.make_move(mv);
        pos.set_fen(START_FEN).unwrap();
        assert_eq!(pos.history_len(), 0);
        assert!(pos.set_fen("garbage").is_err());
        assert_eq!(pos.to_fen(), START_FEN);
    }

    #[test]
    fn display_shows_board_and_fen() {
        let text = Position::startpos().to_string();
        assert!(text.starts_with("8  r n b q k b n r"));
        assert!(text.contains(START_FEN));
    }
}
