//! Position state: snapshot stack, hash channels, accessors and draw detection.

use crate::zobrist::ZOBRIST;

use super::attack_tables::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks};
use super::{Bitboard, CastlingRights, Color, Piece, PieceType, Square};

/// Incrementally maintained hash channels.
///
/// Piece contributions route by type: pawns to `pawn`, knights and bishops to
/// `minor`, rooks and queens to `major`, kings to both `minor` and `major`,
/// and every non-pawn additionally to `non_pawn[color]`. Side, castling and
/// en passant keys only enter `full`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Hashes {
    pub full: u64,
    pub pawn: u64,
    pub minor: u64,
    pub major: u64,
    pub non_pawn: [u64; 2],
}

impl Hashes {
    /// XOR a piece on a square into every channel it belongs to
    #[inline]
    pub(crate) fn toggle_piece(&mut self, piece: Piece, sq: Square) {
        let key = ZOBRIST.piece(piece, sq);
        self.full ^= key;
        match piece.kind {
            PieceType::Pawn => self.pawn ^= key,
            PieceType::Knight | PieceType::Bishop => self.minor ^= key,
            PieceType::Rook | PieceType::Queen => self.major ^= key,
            PieceType::King => {
                self.minor ^= key;
                self.major ^= key;
            }
        }
        if piece.kind != PieceType::Pawn {
            self.non_pawn[piece.color.index()] ^= key;
        }
    }
}

/// One snapshot of the board. Copied on every make so unmake is a pop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionState {
    pub(crate) pieces: [Bitboard; 6],
    pub(crate) colors: [Bitboard; 2],
    pub(crate) mailbox: [Option<Piece>; 64],
    pub(crate) castling: CastlingRights,
    pub(crate) side_to_move: Color,
    pub(crate) halfmove_clock: u16,
    pub(crate) fullmove_number: u16,
    pub(crate) ep_square: Option<Square>,
    pub(crate) hashes: Hashes,
}

impl PositionState {
    pub(crate) fn empty() -> Self {
        PositionState {
            pieces: [Bitboard::EMPTY; 6],
            colors: [Bitboard::EMPTY; 2],
            mailbox: [None; 64],
            castling: CastlingRights::none(),
            side_to_move: Color::White,
            halfmove_clock: 0,
            fullmove_number: 1,
            ep_square: None,
            hashes: Hashes::default(),
        }
    }

    /// Place a piece on an empty square, updating masks, mailbox and hashes
    #[inline]
    pub(crate) fn put_piece(&mut self, piece: Piece, sq: Square) {
        let bb = Bitboard::from_square(sq);
        self.pieces[piece.kind.index()] |= bb;
        self.colors[piece.color.index()] |= bb;
        self.mailbox[sq.index()] = Some(piece);
        self.hashes.toggle_piece(piece, sq);
    }

    /// Lift whatever stands on `sq`, updating masks, mailbox and hashes
    #[inline]
    pub(crate) fn remove_piece(&mut self, sq: Square) -> Option<Piece> {
        let piece = self.mailbox[sq.index()].take()?;
        let bb = !Bitboard::from_square(sq);
        self.pieces[piece.kind.index()] &= bb;
        self.colors[piece.color.index()] &= bb;
        self.hashes.toggle_piece(piece, sq);
        Some(piece)
    }
}

/// A game position with its full history of snapshots.
///
/// `current` is the top of the stack; `history` holds every earlier snapshot
/// back to the position the game was loaded from.
#[derive(Clone, Debug)]
pub struct Position {
    pub(crate) current: PositionState,
    pub(crate) history: Vec<PositionState>,
}

impl Position {
    pub(crate) fn from_state(state: PositionState) -> Self {
        Position {
            current: state,
            history: Vec::with_capacity(256),
        }
    }

    /// The current snapshot
    #[inline]
    #[must_use]
    pub fn state(&self) -> &PositionState {
        &self.current
    }

    #[inline]
    #[must_use]
    pub fn side_to_move(&self) -> Color {
        self.current.side_to_move
    }

    #[inline]
    #[must_use]
    pub fn halfmove_clock(&self) -> u16 {
        self.current.halfmove_clock
    }

    #[inline]
    #[must_use]
    pub fn fullmove_number(&self) -> u16 {
        self.current.fullmove_number
    }

    #[inline]
    #[must_use]
    pub fn ep_square(&self) -> Option<Square> {
        self.current.ep_square
    }

    #[inline]
    #[must_use]
    pub fn castling_rights(&self) -> CastlingRights {
        self.current.castling
    }

    #[inline]
    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.current.mailbox[sq.index()]
    }

    /// Pieces of one type and color
    #[inline]
    #[must_use]
    pub fn pieces(&self, kind: PieceType, color: Color) -> Bitboard {
        self.current.pieces[kind.index()] & self.current.colors[color.index()]
    }

    /// Pieces of one type, both colors
    #[inline]
    #[must_use]
    pub fn pieces_of_type(&self, kind: PieceType) -> Bitboard {
        self.current.pieces[kind.index()]
    }

    #[inline]
    #[must_use]
    pub fn occupancy(&self, color: Color) -> Bitboard {
        self.current.colors[color.index()]
    }

    #[inline]
    #[must_use]
    pub fn occupied(&self) -> Bitboard {
        self.current.colors[0] | self.current.colors[1]
    }

    #[inline]
    #[must_use]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces(PieceType::King, color).lsb()
    }

    /// Whether `color` owns anything besides king and pawns
    #[inline]
    #[must_use]
    pub fn has_non_pawn_material(&self, color: Color) -> bool {
        let kings_and_pawns =
            self.pieces_of_type(PieceType::King) | self.pieces_of_type(PieceType::Pawn);
        (self.occupancy(color) & !kings_and_pawns).any()
    }

    #[inline]
    #[must_use]
    pub fn hashes(&self) -> Hashes {
        self.current.hashes
    }

    /// Full position hash
    #[inline]
    #[must_use]
    pub fn hash(&self) -> u64 {
        self.current.hashes.full
    }

    #[inline]
    #[must_use]
    pub fn pawn_hash(&self) -> u64 {
        self.current.hashes.pawn
    }

    #[inline]
    #[must_use]
    pub fn minor_hash(&self) -> u64 {
        self.current.hashes.minor
    }

    #[inline]
    #[must_use]
    pub fn major_hash(&self) -> u64 {
        self.current.hashes.major
    }

    #[inline]
    #[must_use]
    pub fn non_pawn_hash(&self, color: Color) -> u64 {
        self.current.hashes.non_pawn[color.index()]
    }

    /// Number of snapshots below the current one
    #[inline]
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Every piece of either color attacking `sq` given `occupied`
    #[must_use]
    pub fn attackers_to(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        let diagonal = self.pieces_of_type(PieceType::Bishop) | self.pieces_of_type(PieceType::Queen);
        let straight = self.pieces_of_type(PieceType::Rook) | self.pieces_of_type(PieceType::Queen);

        (pawn_attacks(Color::White, sq) & self.pieces(PieceType::Pawn, Color::Black))
            | (pawn_attacks(Color::Black, sq) & self.pieces(PieceType::Pawn, Color::White))
            | (knight_attacks(sq) & self.pieces_of_type(PieceType::Knight))
            | (king_attacks(sq) & self.pieces_of_type(PieceType::King))
            | (bishop_attacks(sq, occupied) & diagonal)
            | (rook_attacks(sq, occupied) & straight)
    }

    #[inline]
    #[must_use]
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        (self.attackers_to(sq, self.occupied()) & self.occupancy(by)).any()
    }

    /// Whether the king of `color` stands in check
    #[inline]
    #[must_use]
    pub fn is_king_attacked(&self, color: Color) -> bool {
        self.king_square(color)
            .is_some_and(|king| self.is_square_attacked(king, color.opponent()))
    }

    /// Whether the side to move is in check
    #[inline]
    #[must_use]
    pub fn in_check(&self) -> bool {
        self.is_king_attacked(self.side_to_move())
    }

    /// True when the current position occurred twice before.
    ///
    /// Positions before the last capture or pawn move cannot match, so only
    /// snapshots inside the half-move clock window are scanned. Equality is
    /// by full hash.
    #[must_use]
    pub fn is_threefold(&self) -> bool {
        let hash = self.current.hashes.full;
        let window = usize::from(self.current.halfmove_clock);
        self.history
            .iter()
            .rev()
            .take(window)
            .filter(|state| state.hashes.full == hash)
            .count()
            >= 2
    }

    /// Heuristic dead-material check: bare kings, or kings plus bishops of a
    /// single side. Any pawn, rook, queen or knight keeps the game alive.
    #[must_use]
    pub fn is_insufficient(&self) -> bool {
        let heavy = self.pieces_of_type(PieceType::Pawn)
            | self.pieces_of_type(PieceType::Rook)
            | self.pieces_of_type(PieceType::Queen);
        if heavy.any() {
            return false;
        }

        let white_bishops = self.pieces(PieceType::Bishop, Color::White);
        let black_bishops = self.pieces(PieceType::Bishop, Color::Black);
        if white_bishops.any() && black_bishops.any() {
            return false;
        }

        self.pieces_of_type(PieceType::Knight).is_empty()
    }

    /// Recompute every hash channel from the mailbox
    #[must_use]
    pub fn explicit_hashes(&self) -> Hashes {
        let state = &self.current;
        let mut hashes = Hashes::default();

        for sq in Square::all() {
            if let Some(piece) = state.mailbox[sq.index()] {
                hashes.toggle_piece(piece, sq);
            }
        }

        if state.side_to_move == Color::Black {
            hashes.full ^= ZOBRIST.black_to_move;
        }
        hashes.full ^= ZOBRIST.castling[state.castling.mask()];
        if let Some(ep) = state.ep_square {
            hashes.full ^= ZOBRIST.en_passant[ep.file()];
        }

        hashes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_hashes_match_recomputation() {
        let pos = Position::startpos();
        assert_eq!(pos.hashes(), pos.explicit_hashes());
        assert_ne!(pos.pawn_hash(), 0);
        assert_ne!(pos.non_pawn_hash(Color::White), pos.non_pawn_hash(Color::Black));
    }

    #[test]
    fn put_and_remove_are_inverse() {
        let mut state = PositionState::empty();
        let knight = Piece::new(PieceType::Knight, Color::Black);
        let sq: Square = "f6".parse().unwrap();
        state.put_piece(knight, sq);
        assert_ne!(state.hashes.minor, 0);
        assert_eq!(state.hashes.minor, state.hashes.non_pawn[1]);
        assert_eq!(state.remove_piece(sq), Some(knight));
        assert_eq!(state, PositionState::empty());
        assert_eq!(state.remove_piece(sq), None);
    }

    #[test]
    fn king_contributes_to_major_and_minor() {
        let mut state = PositionState::empty();
        state.put_piece(Piece::new(PieceType::King, Color::White), Square::E1);
        assert_eq!(state.hashes.major, state.hashes.minor);
        assert_eq!(state.hashes.major, state.hashes.full);
        assert_eq!(state.hashes.pawn, 0);
    }

    #[test]
    fn attackers_include_x_ray_free_sliders() {
        let pos = Position::from_fen("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1").unwrap();
        let d5: Square = "d5".parse().unwrap();
        let attackers = pos.attackers_to(d5, pos.occupied());
        assert!(attackers.contains(Square::D1));
        assert!(pos.is_square_attacked(Square::D1, Color::Black));
        assert!(!pos.in_check());
    }

    #[test]
    fn non_pawn_material_ignores_king_and_pawns() {
        let pos = Position::from_fen("4k3/pppp4/8/8/8/8/8/3NK3 w - - 0 1").unwrap();
        assert!(pos.has_non_pawn_material(Color::White));
        assert!(!pos.has_non_pawn_material(Color::Black));
    }
}
