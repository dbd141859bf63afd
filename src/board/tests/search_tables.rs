//! Tests for search tables: history, correction and the transposition table.

use std::sync::Arc;
use std::thread;

use crate::board::nnue::DEFAULT_NETWORK;
use crate::board::search::{score_from_tt, score_to_tt, History, SearchConfig, Worker, MATE, MAX_CORR_HIST, MAX_HIST};
use crate::board::{Move, Position, Square};
use crate::engine::{Limiter, LimiterConfig, Silent};
use crate::tt::{NodeType, TranspositionTable};

fn mv(from: &str, to: &str) -> Move {
    Move::normal(from.parse::<Square>().unwrap(), to.parse::<Square>().unwrap())
}

// ============================================================================
// History Tests
// ============================================================================

#[test]
fn test_histories_stay_bounded_after_search() {
    let mut worker = Worker::new(
        Arc::new(TranspositionTable::new(2)),
        Arc::clone(&DEFAULT_NETWORK),
        SearchConfig::default(),
    );
    let fens = [
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
    ];
    for fen in fens {
        let pos = Position::from_fen(fen).unwrap();
        worker.go(&pos, Limiter::new(LimiterConfig::depth(6)), &mut Silent);
    }

    let (ordering, correction) = worker.history().max_abs();
    assert!(ordering > 0, "search should record some history");
    assert!(ordering <= MAX_HIST);
    assert!(correction <= MAX_CORR_HIST);

    worker.reset_history();
    assert_eq!(worker.history().max_abs(), (0, 0));
}

#[test]
fn test_penalties_pull_history_negative() {
    let mut history = History::new();
    let pos = Position::startpos();
    let stm = pos.side_to_move();
    history.update_quiet(stm, mv("e2", "e4"), 1200);
    history.update_quiet(stm, mv("d2", "d4"), -1200);
    assert!(history.quiet(stm, mv("e2", "e4")) > 0);
    assert!(history.quiet(stm, mv("d2", "d4")) < 0);
    for _ in 0..1000 {
        history.update_quiet(stm, mv("d2", "d4"), -2500);
    }
    assert!(history.quiet(stm, mv("d2", "d4")) >= -MAX_HIST);
}

#[test]
fn test_correction_is_per_side_to_move() {
    let config = SearchConfig::default();
    let white = Position::startpos();
    let black =
        Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1").unwrap();
    let mut history = History::new();
    for _ in 0..20 {
        history.update_correction(&white, MAX_CORR_HIST / 4);
    }
    assert!(history.corrected_eval(0, &white, &config) > 0);
    assert_eq!(history.corrected_eval(0, &black, &config), 0);
}

// ============================================================================
// Transposition Table Tests
// ============================================================================

#[test]
fn test_mate_scores_are_stored_relative_to_node() {
    let mate_in_3_from_ply_4 = MATE - 9;
    let stored = score_to_tt(mate_in_3_from_ply_4, 4);
    assert_eq!(stored, MATE - 5);
    // Probed from a shallower ply the mate is further away
    assert_eq!(score_from_tt(stored, 2), MATE - 7);
    assert_eq!(score_from_tt(score_to_tt(-(MATE - 6), 3), 3), -(MATE - 6));
    assert_eq!(score_to_tt(150, 12), 150);
}

#[test]
fn test_deeper_entries_survive_replacement() {
    let tt = TranspositionTable::new(1);
    // Five keys into one bucket of four
    let stride = 1u64 << 40;
    let keys: Vec<u64> = (1..=5).map(|i| 7 + i * stride).collect();
    for (i, &key) in keys.iter().take(4).enumerate() {
        let depth = if i == 0 { 2 } else { 20 };
        tt.add(key, mv("e2", "e4"), 10, depth, NodeType::Pv, false);
    }
    tt.add(keys[4], mv("d2", "d4"), 10, 5, NodeType::Cut, false);

    assert!(tt.probe(keys[0]).is_none(), "shallowest entry is replaced");
    for &key in &keys[1..] {
        assert!(tt.probe(key).is_some());
    }
}

#[test]
fn test_old_generation_is_replaced_first() {
    let tt = TranspositionTable::new(1);
    let stride = 1u64 << 40;
    let keys: Vec<u64> = (1..=5).map(|i| 3 + i * stride).collect();
    tt.add(keys[0], mv("e2", "e4"), 0, 12, NodeType::Pv, false);
    for _ in 0..8 {
        tt.new_search();
    }
    for &key in &keys[1..4] {
        tt.add(key, mv("e2", "e4"), 0, 12, NodeType::Pv, false);
    }
    tt.add(keys[4], mv("g1", "f3"), 0, 6, NodeType::All, false);
    assert!(tt.probe(keys[0]).is_none(), "stale entry is replaced");
    assert_eq!(tt.probe(keys[4]).map(|e| e.mv), Some(mv("g1", "f3")));
}

#[test]
fn test_concurrent_access_never_returns_foreign_entries() {
    let tt = Arc::new(TranspositionTable::new(1));
    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let tt = Arc::clone(&tt);
            thread::spawn(move || {
                for i in 0..20_000u64 {
                    let key = (i % 512).wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ t;
                    let depth = (key % 50) as i32;
                    tt.add(key, mv("e2", "e4"), (key % 1000) as i32, depth, NodeType::Cut, false);
                    if let Some(entry) = tt.probe(key) {
                        assert_eq!(i32::from(entry.depth), depth);
                        assert_eq!(entry.score, (key % 1000) as i32);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
