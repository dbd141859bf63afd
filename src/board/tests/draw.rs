//! Draw detection tests.

use crate::board::Position;

fn apply_uci(pos: &mut Position, uci: &str) {
    let mv = pos.parse_legal_move(uci).expect("uci move not legal");
    pos.make_move(mv);
}

#[test]
fn test_fen_halfmove_parsing() {
    let pos = Position::from_fen("8/8/8/8/8/8/8/K1k5 w - - 57 1").unwrap();
    assert_eq!(pos.halfmove_clock(), 57);
    assert_eq!(pos.fullmove_number(), 1);
}

#[test]
fn test_halfmove_resets_on_pawn_move() {
    let mut pos = Position::from_fen("8/8/8/8/8/8/4P3/K1k5 w - - 99 1").unwrap();
    apply_uci(&mut pos, "e2e4");
    assert_eq!(pos.halfmove_clock(), 0);
}

#[test]
fn test_halfmove_resets_on_capture() {
    let mut pos = Position::from_fen("7k/8/8/8/8/3n4/4N3/K7 w - - 40 30").unwrap();
    apply_uci(&mut pos, "e2d4");
    assert_eq!(pos.halfmove_clock(), 41);
    apply_uci(&mut pos, "d3b2");
    assert_eq!(pos.halfmove_clock(), 42);
    apply_uci(&mut pos, "a1b2");
    assert_eq!(pos.halfmove_clock(), 0);
}

#[test]
fn test_threefold_repetition() {
    let mut pos = Position::startpos();
    for round in 0..2 {
        assert!(!pos.is_threefold(), "round {round}");
        apply_uci(&mut pos, "g1f3");
        apply_uci(&mut pos, "g8f6");
        apply_uci(&mut pos, "f3g1");
        apply_uci(&mut pos, "f6g8");
    }
    assert!(pos.is_threefold());
}

#[test]
fn test_two_occurrences_are_not_threefold() {
    let mut pos = Position::startpos();
    apply_uci(&mut pos, "g1f3");
    apply_uci(&mut pos, "g8f6");
    apply_uci(&mut pos, "f3g1");
    apply_uci(&mut pos, "f6g8");
    assert!(!pos.is_threefold());
}

#[test]
fn test_repetition_window_stops_at_irreversible_move() {
    let mut pos = Position::startpos();
    apply_uci(&mut pos, "g1f3");
    apply_uci(&mut pos, "g8f6");
    apply_uci(&mut pos, "f3g1");
    apply_uci(&mut pos, "f6g8");
    // A pawn move resets the clock; earlier snapshots can no longer match
    apply_uci(&mut pos, "e2e3");
    apply_uci(&mut pos, "e7e6");
    for _ in 0..2 {
        apply_uci(&mut pos, "g1f3");
        apply_uci(&mut pos, "g8f6");
        apply_uci(&mut pos, "f3g1");
        apply_uci(&mut pos, "f6g8");
    }
    assert!(pos.is_threefold());
    pos.unmake_move();
    assert!(!pos.is_threefold());
}

#[test]
fn test_insufficient_material() {
    let cases = [
        ("8/8/8/8/8/8/8/K1k5 w - - 0 1", true),
        ("8/8/8/8/8/8/5B2/K1k5 w - - 0 1", true),
        ("8/8/8/8/8/8/4BB2/K1k5 w - - 0 1", true),
        ("8/8/8/8/8/5b2/5B2/K1k5 w - - 0 1", false),
        ("8/8/8/8/8/8/6N1/K1k5 w - - 0 1", false),
        ("8/8/8/8/8/8/6P1/K1k5 w - - 0 1", false),
        ("8/8/8/8/8/8/6r1/K1k5 w - - 0 1", false),
        ("8/8/8/8/8/8/6q1/K1k5 w - - 0 1", false),
    ];
    for (fen, expected) in cases {
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.is_insufficient(), expected, "{fen}");
    }
}
