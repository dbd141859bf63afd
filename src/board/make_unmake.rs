use crate::zobrist::ZOBRIST;

use super::{CastleSide, Color, Move, MoveKind, Piece, PieceType, Position, Square};

impl Position {
    /// Apply a pseudo-legal move, pushing the previous snapshot onto history.
    ///
    /// Legality (own king left in check) is not checked here.
    ///
    /// # Panics
    ///
    /// Panics if the source square is empty, or a castling move has no
    /// matching right or no rook on the recorded origin square.
    pub fn make_move(&mut self, mv: Move) {
        let mut next = self.current;
        let us = next.side_to_move;
        let them = us.opponent();
        let from = mv.from();
        let to = mv.to();
        let moving = next.mailbox[from.index()].expect("make_move: no piece on source square");
        let old_castling = next.castling;

        if let Some(ep) = next.ep_square.take() {
            next.hashes.full ^= ZOBRIST.en_passant[ep.file()];
        }

        let captures = !mv.is_castling() && next.mailbox[to.index()].is_some();
        next.halfmove_clock = if captures || moving.kind == PieceType::Pawn {
            0
        } else {
            next.halfmove_clock.saturating_add(1)
        };
        if us == Color::Black {
            next.fullmove_number = next.fullmove_number.saturating_add(1);
        }

        match mv.kind() {
            MoveKind::Normal => {
                if let Some(victim) = next.remove_piece(to) {
                    if victim.kind == PieceType::Rook {
                        next.castling.remove_rook(them, to);
                    }
                }
                next.remove_piece(from);
                next.put_piece(moving, to);

                if moving.kind == PieceType::Pawn && from.index().abs_diff(to.index()) == 16 {
                    let ep = from.offset(us.forward());
                    next.ep_square = Some(ep);
                    next.hashes.full ^= ZOBRIST.en_passant[ep.file()];
                }
            }
            MoveKind::Castling => {
                let side = if to.index() > from.index() {
                    CastleSide::King
                } else {
                    CastleSide::Queen
                };
                let rook_from = old_castling
                    .rook(us, side)
                    .expect("make_move: castling without the matching right");
                let rook_to = Square::from_index(from.rank() * 8 + side.rook_file());

                next.remove_piece(from);
                let rook = next
                    .remove_piece(rook_from)
                    .expect("make_move: castling rook missing from its origin");
                debug_assert_eq!(rook, Piece::new(PieceType::Rook, us));
                next.put_piece(moving, to);
                next.put_piece(rook, rook_to);
            }
            MoveKind::EnPassant => {
                let captured = next.remove_piece(to.offset(-us.forward()));
                debug_assert_eq!(captured, Some(Piece::new(PieceType::Pawn, them)));
                next.remove_piece(from);
                next.put_piece(moving, to);
            }
            MoveKind::Promotion => {
                if let Some(victim) = next.remove_piece(to) {
                    if victim.kind == PieceType::Rook {
                        next.castling.remove_rook(them, to);
                    }
                }
                next.remove_piece(from);
                let promoted = mv.promotion_piece().unwrap_or(PieceType::Queen);
                next.put_piece(Piece::new(promoted, us), to);
            }
        }

        match moving.kind {
            PieceType::King => next.castling.clear(us),
            PieceType::Rook => next.castling.remove_rook(us, from),
            _ => {}
        }
        if next.castling != old_castling {
            next.hashes.full ^=
                ZOBRIST.castling[old_castling.mask()] ^ ZOBRIST.castling[next.castling.mask()];
        }

        next.side_to_move = them;
        next.hashes.full ^= ZOBRIST.black_to_move;

        self.history.push(self.current);
        self.current = next;
    }

    /// Pass the turn without moving. Clears en passant and ticks the clocks.
    pub fn make_null_move(&mut self) {
        let mut next = self.current;
        if let Some(ep) = next.ep_square.take() {
            next.hashes.full ^= ZOBRIST.en_passant[ep.file()];
        }
        next.halfmove_clock = next.halfmove_clock.saturating_add(1);
        if next.side_to_move == Color::Black {
            next.fullmove_number = next.fullmove_number.saturating_add(1);
        }
        next.side_to_move = next.side_to_move.opponent();
        next.hashes.full ^= ZOBRIST.black_to_move;

        self.history.push(self.current);
        self.current = next;
    }

    /// Restore the snapshot below the current one. Works for real and null moves.
    ///
    /// # Panics
    ///
    /// Panics when there is nothing to undo.
    pub fn unmake_move(&mut self) {
        self.current = self
            .history
            .pop()
            .expect("unmake_move: history is empty");
    }
}
