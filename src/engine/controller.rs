//! Engine controller implementation.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::Mutex;

use super::report::{Report, Reporter, Silent};
use super::time::{Limiter, LimiterConfig};
use crate::board::nnue::{Network, NetworkError, DEFAULT_NETWORK};
use crate::board::search::{SearchConfig, Worker};
use crate::board::{Color, Move, Position};
use crate::tt::TranspositionTable;

/// Search thread stack size (32 MB)
const SEARCH_STACK_SIZE: usize = 32 * 1024 * 1024;

/// Default transposition table size in MB
pub const DEFAULT_HASH_MB: usize = 32;

/// Depth cap for data generation searches
const DATAGEN_MAX_DEPTH: i32 = 10;

/// Positions searched by `bench`
pub const BENCH_FENS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
    "r2q1rk1/ppp2ppp/2n1bn2/2bpp3/4P3/2PP1NN1/PP1B1PPP/R2QKB1R w KQ - 0 8",
    "2rq1rk1/pp1bppbp/2np1np1/8/3NP3/1BN1BP2/PPPQ2PP/2KR3R b - - 4 11",
    "r1b2rk1/2q1bppp/p2p1n2/np2p3/3PP3/5N1P/PPBN1PP1/R1BQR1K1 w - - 0 13",
    "6k1/5p2/6p1/8/7p/8/6PP/6K1 b - - 0 1",
    "8/8/4k3/3p4/3P4/4K3/8/8 w - - 0 1",
    "4r1k1/r1q2ppp/ppp2n2/4P3/5Rb1/1N1BQ3/PPP3PP/R5K1 w - - 1 17",
    "2r3k1/pp3ppp/2n1p3/3pP3/3P4/P1R2N2/1P3PPP/6K1 b - - 0 25",
    "8/5pk1/6p1/1p1P3p/1P2PK2/8/8/8 w - - 0 48",
    "r1bq1rk1/pp2nppp/4n3/3ppP2/1b1P4/3BP3/PP2N1PP/R1BQNRK1 b - - 1 8",
];

/// Engine configuration applied through protocol options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Transposition table size in MB
    pub hash_mb: usize,
    /// Worker count; only the first worker searches
    pub threads: usize,
    /// Network file replacing the built-in network
    pub eval_file: Option<PathBuf>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            hash_mb: DEFAULT_HASH_MB,
            threads: 1,
            eval_file: None,
        }
    }
}

/// Totals from a benchmark run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchResult {
    pub nodes: u64,
    pub time_ms: u64,
    pub nps: u64,
}

/// Owns the game position, the shared tables and the search workers
pub struct Engine {
    position: Position,
    options: EngineOptions,
    config: SearchConfig,
    tt: Arc<TranspositionTable>,
    network: Arc<Network>,
    workers: Vec<Worker>,
    reporter: Box<dyn Reporter>,
    stop: Arc<AtomicBool>,
}

impl Engine {
    /// Create an engine, loading the configured network file if any
    pub fn new(options: EngineOptions, reporter: Box<dyn Reporter>) -> Result<Self, NetworkError> {
        Self::with_config(options, SearchConfig::default(), reporter)
    }

    pub fn with_config(
        options: EngineOptions,
        config: SearchConfig,
        reporter: Box<dyn Reporter>,
    ) -> Result<Self, NetworkError> {
        let network = match &options.eval_file {
            Some(path) => {
                let network = Arc::new(Network::load(path)?);
                log::info!("loaded network from {}", path.display());
                network
            }
            None => Arc::clone(&DEFAULT_NETWORK),
        };

        let tt = Arc::new(TranspositionTable::new(options.hash_mb));
        let stop = Arc::new(AtomicBool::new(false));
        let mut engine = Engine {
            position: Position::startpos(),
            options,
            config,
            tt,
            network,
            workers: Vec::new(),
            reporter,
            stop,
        };
        engine.rebuild_workers();
        Ok(engine)
    }

    fn rebuild_workers(&mut self) {
        let count = self.options.threads.max(1);
        self.workers = (0..count)
            .map(|_| {
                let mut worker = Worker::new(Arc::clone(&self.tt), Arc::clone(&self.network), self.config);
                worker.set_stop_flag(Arc::clone(&self.stop));
                worker
            })
            .collect();
    }

    fn main_worker(&mut self) -> &mut Worker {
        if self.workers.is_empty() {
            self.rebuild_workers();
        }
        &mut self.workers[0]
    }

    #[must_use]
    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn position_mut(&mut self) -> &mut Position {
        &mut self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    #[must_use]
    pub fn tt(&self) -> &Arc<TranspositionTable> {
        &self.tt
    }

    pub fn set_reporter(&mut self, reporter: Box<dyn Reporter>) {
        self.reporter = reporter;
    }

    /// Flag that aborts the running search when set
    #[must_use]
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Install a fresh stop flag on the engine and every worker
    pub fn set_stop_flag(&mut self, stop: Arc<AtomicBool>) {
        for worker in &mut self.workers {
            worker.set_stop_flag(Arc::clone(&stop));
        }
        self.stop = stop;
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Clear the transposition table and every history table
    pub fn new_game(&mut self) {
        self.tt.clear();
        for worker in &mut self.workers {
            worker.reset_history();
        }
        log::info!("new game");
    }

    /// Resize the transposition table, discarding its contents
    pub fn set_hash(&mut self, mb: usize) {
        self.options.hash_mb = mb.max(1);
        self.tt = Arc::new(TranspositionTable::new(self.options.hash_mb));
        for worker in &mut self.workers {
            worker.set_tt(Arc::clone(&self.tt));
        }
    }

    pub fn set_threads(&mut self, threads: usize) {
        self.options.threads = threads.max(1);
        self.rebuild_workers();
    }

    /// Replace the network with one read from `path`
    pub fn load_network(&mut self, path: PathBuf) -> Result<(), NetworkError> {
        let network = Arc::new(Network::load(&path)?);
        log::info!("loaded network from {}", path.display());
        self.network = Arc::clone(&network);
        self.options.eval_file = Some(path);
        for worker in &mut self.workers {
            worker.set_network(Arc::clone(&network));
        }
        Ok(())
    }

    /// Search the current position and report the result.
    ///
    /// Falls back to the first legal move when no depth completed. Returns
    /// `Move::NONE` only when the side to move has no legal move.
    pub fn go(&mut self, limits: LimiterConfig) -> Move {
        let position = self.position.clone();
        self.reporter.on_start(&position);
        self.tt.new_search();
        log::debug!("search started: {limits:?}");

        let limiter = Limiter::new(limits);
        let mut reporter = std::mem::replace(&mut self.reporter, Box::new(Silent));
        let report = self.main_worker().go(&position, limiter, reporter.as_mut());
        self.reporter = reporter;

        let report = report.unwrap_or_default();
        let mut best = report.best_move();
        if best.is_none() {
            let mut position = position;
            best = position.legal_moves().iter().next().copied().unwrap_or(Move::NONE);
        }

        self.reporter.on_completion(&report, best);
        best
    }

    /// Static evaluation of the current position, shown through the reporter
    pub fn eval(&mut self) -> i32 {
        let position = self.position.clone();
        let score = self.main_worker().eval(&position);
        self.reporter.show_position(&position, score);
        score
    }

    /// Fixed-depth search over [`BENCH_FENS`]
    pub fn bench(&mut self, depth: i32) -> BenchResult {
        self.new_game();
        let start = Instant::now();
        let mut nodes = 0;
        for fen in BENCH_FENS {
            let Ok(position) = Position::from_fen(fen) else {
                log::warn!("skipping malformed bench position {fen}");
                continue;
            };
            nodes += self.main_worker().bench_search(&position, depth);
        }
        let time_ms = start.elapsed().as_millis() as u64;
        BenchResult {
            nodes,
            time_ms,
            nps: Report::nps_for(nodes, time_ms),
        }
    }

    /// Node-limited search for training data.
    ///
    /// Returns the best move and its score from white's point of view.
    /// Only the per-position search lives here; driving self-play games
    /// (game count, threads, output directory) is out of scope for the engine.
    pub fn datagen_search(&mut self, position: &Position, soft_nodes: u64, hard_nodes: u64) -> Option<(Move, i32)> {
        let limits = LimiterConfig {
            max_depth: DATAGEN_MAX_DEPTH,
            ..LimiterConfig::nodes(hard_nodes, Some(soft_nodes))
        };
        self.tt.new_search();
        let report = self
            .main_worker()
            .go(position, Limiter::new(limits), &mut Silent)?;
        let best = report.best_move();
        if best.is_none() {
            return None;
        }
        let score = match position.side_to_move() {
            Color::White => report.score,
            Color::Black => -report.score,
        };
        Some((best, score))
    }

    /// Node count of a perft from the current position
    pub fn perft(&mut self, depth: u32) -> u64 {
        self.position.perft(depth)
    }

    /// Nodes searched by the main worker in the last search
    #[must_use]
    pub fn nodes(&self) -> u64 {
        self.workers.first().map_or(0, Worker::nodes)
    }
}

/// Search running on a background thread
pub struct SearchJob {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl SearchJob {
    /// Start `engine.go(limits)` on a dedicated thread.
    ///
    /// The engine stays locked for the whole search; only the stop flag is
    /// touched from outside.
    pub fn spawn(engine: &Arc<Mutex<Engine>>, limits: LimiterConfig) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        engine.lock().set_stop_flag(Arc::clone(&stop));

        let engine = Arc::clone(engine);
        let handle = thread::Builder::new()
            .name("search".to_string())
            .stack_size(SEARCH_STACK_SIZE)
            .spawn(move || {
                engine.lock().go(limits);
            })?;

        Ok(SearchJob { stop, handle })
    }

    /// Signal stop without waiting
    pub fn signal_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the search and wait for the thread to finish
    pub fn stop_and_wait(self) {
        self.signal_stop();
        self.wait();
    }

    /// Wait for the search to finish on its own
    pub fn wait(self) {
        if self.handle.join().is_err() {
            log::warn!("search thread panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::search::MATE_BOUND;

    fn engine() -> Engine {
        Engine::new(
            EngineOptions {
                hash_mb: 1,
                ..Default::default()
            },
            Box::new(Silent),
        )
        .unwrap()
    }

    #[test]
    fn go_returns_a_legal_move() {
        let mut engine = engine();
        let best = engine.go(LimiterConfig::depth(3));
        let mut position = Position::startpos();
        assert!(position.legal_moves().contains(best));
    }

    #[test]
    fn go_on_mated_position_returns_none() {
        let mut engine = engine();
        engine.set_position(
            Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").unwrap(),
        );
        assert!(engine.go(LimiterConfig::depth(2)).is_none());
    }

    #[test]
    fn preset_stop_still_yields_a_move() {
        let mut engine = engine();
        engine.stop();
        let best = engine.go(LimiterConfig::depth(20));
        assert!(!best.is_none());
    }

    #[test]
    fn datagen_score_is_white_relative() {
        let mut engine = engine();

        let white_mates = Position::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let (mv, score) = engine.datagen_search(&white_mates, 2_000, 50_000).unwrap();
        assert_eq!(mv, white_mates.move_from_uci("a1a8").unwrap());
        assert!(score >= MATE_BOUND);

        let black_mates = Position::from_fen("r5k1/8/8/8/8/8/5PPP/6K1 b - - 0 1").unwrap();
        let (mv, score) = engine.datagen_search(&black_mates, 2_000, 50_000).unwrap();
        assert_eq!(mv, black_mates.move_from_uci("a8a1").unwrap());
        assert!(score <= -MATE_BOUND);
    }

    #[test]
    fn hash_and_threads_options_apply() {
        let mut engine = engine();
        engine.set_hash(2);
        engine.set_threads(3);
        assert_eq!(engine.options().hash_mb, 2);
        assert_eq!(engine.options().threads, 3);
        assert_eq!(engine.workers.len(), 3);
        assert!(!engine.go(LimiterConfig::depth(2)).is_none());
    }

    #[test]
    fn missing_eval_file_is_an_error() {
        let options = EngineOptions {
            hash_mb: 1,
            eval_file: Some(PathBuf::from("/nonexistent/net.bin")),
            ..Default::default()
        };
        assert!(Engine::new(options, Box::new(Silent)).is_err());
    }

    #[test]
    fn background_search_stops_on_request() {
        let engine = Arc::new(Mutex::new(engine()));
        let limits = LimiterConfig {
            infinite: true,
            ..Default::default()
        };
        let job = SearchJob::spawn(&engine, limits).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(50));
        job.stop_and_wait();
        assert!(engine.lock().nodes() > 0);
    }
}
