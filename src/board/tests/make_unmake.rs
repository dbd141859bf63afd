//! Make/unmake correctness and hash channel maintenance.

use crate::board::{CastleSide, Color, Piece, PieceType, Position, Square};

fn sq(name: &str) -> Square {
    name.parse().unwrap()
}

fn play(pos: &mut Position, uci: &str) {
    let mv = pos.parse_legal_move(uci).expect("uci move not legal");
    pos.make_move(mv);
    assert_eq!(pos.hashes(), pos.explicit_hashes(), "hash drift after {uci}");
}

#[test]
fn test_unmake_restores_every_legal_move() {
    let fens = [
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
        "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1",
    ];
    for fen in fens {
        let mut pos = Position::from_fen(fen).unwrap();
        let before = *pos.state();
        for &mv in &pos.legal_moves() {
            pos.make_move(mv);
            assert_eq!(pos.hashes(), pos.explicit_hashes(), "{fen} {mv}");
            pos.unmake_move();
            assert_eq!(*pos.state(), before, "{fen} {mv}");
        }
    }
}

#[test]
fn test_castling_moves_rook_and_clears_rights() {
    let mut pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    play(&mut pos, "e1g1");
    assert_eq!(pos.piece_at(Square::G1), Some(Piece::new(PieceType::King, Color::White)));
    assert_eq!(pos.piece_at(Square::F1), Some(Piece::new(PieceType::Rook, Color::White)));
    assert_eq!(pos.piece_at(Square::H1), None);
    assert!(!pos.castling_rights().has(Color::White, CastleSide::King));
    assert!(!pos.castling_rights().has(Color::White, CastleSide::Queen));
    assert!(pos.castling_rights().has(Color::Black, CastleSide::Queen));

    play(&mut pos, "e8c8");
    assert_eq!(pos.piece_at(Square::C8), Some(Piece::new(PieceType::King, Color::Black)));
    assert_eq!(pos.piece_at(Square::D8), Some(Piece::new(PieceType::Rook, Color::Black)));
    assert_eq!(pos.to_fen(), "2kr3r/8/8/8/8/8/8/R4RK1 w - - 2 2");
}

#[test]
fn test_capturing_a_rook_removes_its_right() {
    let mut pos = Position::from_fen("r3k2r/8/8/8/8/8/6B1/R3K2R w KQkq - 0 1").unwrap();
    play(&mut pos, "g2a8");
    assert!(!pos.castling_rights().has(Color::Black, CastleSide::Queen));
    assert!(pos.castling_rights().has(Color::Black, CastleSide::King));
}

#[test]
fn test_en_passant_capture_removes_pawn() {
    let mut pos = Position::startpos();
    for uci in ["e2e4", "a7a6", "e4e5", "d7d5"] {
        play(&mut pos, uci);
    }
    assert_eq!(pos.ep_square(), Some(sq("d6")));
    play(&mut pos, "e5d6");
    assert_eq!(pos.piece_at(sq("d5")), None);
    assert_eq!(pos.piece_at(sq("d6")), Some(Piece::new(PieceType::Pawn, Color::White)));
    assert_eq!(pos.ep_square(), None);
}

#[test]
fn test_double_push_always_sets_ep_square() {
    let mut pos = Position::startpos();
    play(&mut pos, "a2a4");
    assert_eq!(pos.ep_square(), Some(sq("a3")));
    play(&mut pos, "h7h6");
    assert_eq!(pos.ep_square(), None);
}

#[test]
fn test_promotion_replaces_pawn() {
    let mut pos = Position::from_fen("1n6/P7/8/8/8/8/8/K1k5 w - - 0 1").unwrap();
    play(&mut pos, "a7b8n");
    assert_eq!(pos.piece_at(Square::B8), Some(Piece::new(PieceType::Knight, Color::White)));
    assert!(pos.pieces(PieceType::Pawn, Color::White).is_empty());
    assert!(pos.has_non_pawn_material(Color::White));
    assert!(!pos.has_non_pawn_material(Color::Black));
}

#[test]
fn test_null_move_flips_side_only() {
    let mut pos =
        Position::from_fen("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2").unwrap();
    let before = *pos.state();
    pos.make_null_move();
    assert_eq!(pos.side_to_move(), Color::Black);
    assert_eq!(pos.ep_square(), None);
    assert_eq!(pos.pawn_hash(), before.hashes.pawn);
    assert_eq!(pos.hashes(), pos.explicit_hashes());
    pos.unmake_move();
    assert_eq!(*pos.state(), before);
}

#[test]
fn test_hash_channels_route_by_piece_type() {
    let mut pos = Position::startpos();
    let start = pos.hashes();

    play(&mut pos, "g1f3");
    let after_knight = pos.hashes();
    assert_eq!(after_knight.pawn, start.pawn);
    assert_eq!(after_knight.major, start.major);
    assert_ne!(after_knight.minor, start.minor);
    assert_ne!(after_knight.non_pawn[Color::White.index()], start.non_pawn[Color::White.index()]);
    assert_eq!(after_knight.non_pawn[Color::Black.index()], start.non_pawn[Color::Black.index()]);

    play(&mut pos, "e7e5");
    let after_pawn = pos.hashes();
    assert_ne!(after_pawn.pawn, after_knight.pawn);
    assert_eq!(after_pawn.minor, after_knight.minor);
    assert_eq!(after_pawn.non_pawn, after_knight.non_pawn);
}

#[test]
fn test_transposition_gives_same_hash() {
    let mut a = Position::startpos();
    for uci in ["g1f3", "g8f6", "b1c3"] {
        play(&mut a, uci);
    }
    let mut b = Position::startpos();
    for uci in ["b1c3", "g8f6", "g1f3"] {
        play(&mut b, uci);
    }
    assert_eq!(a.hash(), b.hash());
    assert_eq!(a.minor_hash(), b.minor_hash());
}

#[test]
fn test_side_to_move_changes_hash() {
    let white = Position::from_fen("8/8/8/8/8/8/8/K1k5 w - - 0 1").unwrap();
    let black = Position::from_fen("8/8/8/8/8/8/8/K1k5 b - - 0 1").unwrap();
    assert_ne!(white.hash(), black.hash());
    assert_eq!(white.pawn_hash(), black.pawn_hash());
}
