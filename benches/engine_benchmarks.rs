//! Benchmarks for move generation, NNUE inference and search.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chess_nnue::board::nnue::{Accumulator, Kernel, DEFAULT_NETWORK};
use chess_nnue::board::search::{SearchConfig, Worker};
use chess_nnue::{Position, TranspositionTable};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const MIDDLEGAME: &str = "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";

fn bench_perft(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");

    let mut startpos = Position::startpos();
    for depth in 1..=4 {
        group.bench_with_input(BenchmarkId::new("startpos", depth), &depth, |b, &depth| {
            b.iter(|| startpos.perft(black_box(depth)))
        });
    }

    let mut kiwipete = Position::from_fen(KIWIPETE).unwrap();
    for depth in 1..=3 {
        group.bench_with_input(BenchmarkId::new("kiwipete", depth), &depth, |b, &depth| {
            b.iter(|| kiwipete.perft(black_box(depth)))
        });
    }

    group.finish();
}

fn bench_movegen(c: &mut Criterion) {
    let mut group = c.benchmark_group("movegen");

    for (name, fen) in [("middlegame", MIDDLEGAME), ("kiwipete", KIWIPETE)] {
        let position = Position::from_fen(fen).unwrap();
        group.bench_function(BenchmarkId::new("all", name), |b| {
            b.iter(|| black_box(position.generate_moves()))
        });
        group.bench_function(BenchmarkId::new("captures", name), |b| {
            b.iter(|| black_box(position.generate_captures()))
        });
    }

    let mut position = Position::from_fen(KIWIPETE).unwrap();
    let moves = position.legal_moves();
    group.bench_function("make_unmake", |b| {
        b.iter(|| {
            for &mv in moves.iter() {
                position.make_move(mv);
                position.unmake_move();
            }
        })
    });

    group.finish();
}

fn bench_see(c: &mut Criterion) {
    let position = Position::from_fen(KIWIPETE).unwrap();
    let captures = position.generate_captures();
    c.bench_function("see_ge", |b| {
        b.iter(|| {
            captures
                .iter()
                .filter(|&&mv| position.see_ge(mv, black_box(0)))
                .count()
        })
    });
}

fn bench_nnue(c: &mut Criterion) {
    let mut group = c.benchmark_group("nnue");
    let net = &*DEFAULT_NETWORK;
    let position = Position::from_fen(MIDDLEGAME).unwrap();
    let acc = Accumulator::reset(&position, net);

    group.bench_function("refresh", |b| {
        b.iter(|| black_box(Accumulator::reset(&position, net)))
    });

    let mut legal = position.clone();
    let moves = legal.legal_moves();
    group.bench_function("incremental_update", |b| {
        b.iter(|| {
            for &mv in moves.iter() {
                black_box(acc.update(&position, mv, net));
            }
        })
    });

    for kernel in Kernel::ALL {
        group.bench_function(BenchmarkId::new("evaluate", format!("{kernel:?}")), |b| {
            b.iter(|| net.evaluate_with(&acc, position.side_to_move(), black_box(kernel)))
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);

    for (name, fen) in [("startpos", chess_nnue::board::START_FEN), ("middlegame", MIDDLEGAME)] {
        let position = Position::from_fen(fen).unwrap();
        for depth in [4, 6] {
            group.bench_with_input(BenchmarkId::new(name, depth), &depth, |b, &depth| {
                b.iter(|| {
                    let mut worker = Worker::new(
                        Arc::new(TranspositionTable::new(16)),
                        Arc::clone(&DEFAULT_NETWORK),
                        SearchConfig::default(),
                    );
                    worker.bench_search(&position, depth)
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_perft, bench_movegen, bench_see, bench_nnue, bench_search);
criterion_main!(benches);
