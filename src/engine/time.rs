//! Time and node budgets for a search.
//!
//! A [`Limiter`] is configured once per `go` from a [`LimiterConfig`] and is
//! consulted cooperatively by the search: "approaching" checks decide whether
//! to start another iteration, "exceeded" checks abort the current one.

use std::time::{Duration, Instant};

use crate::board::search::MAX_SEARCH_PLY;
use crate::board::Move;

/// Soft limit scale when none of the nodes went to the best move
const MAX_STABILITY_SCALE: f64 = 2.5;

/// Scale reduction when every node went to the best move
const STABILITY_SPAN: f64 = 1.5;

/// Budgets for one search. Zero or `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterConfig {
    /// Abort once this many nodes are searched
    pub nodes: Option<u64>,
    /// Do not start another iteration past this many nodes
    pub soft_nodes: Option<u64>,
    /// Fixed time per move in milliseconds
    pub move_time: u64,
    /// Remaining clock time for the side to move in milliseconds
    pub time_left: u64,
    /// Increment per move in milliseconds
    pub increment: u64,
    /// Search until told to stop
    pub infinite: bool,
    /// Deepest iteration to run
    pub max_depth: i32,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        LimiterConfig {
            nodes: None,
            soft_nodes: None,
            move_time: 0,
            time_left: 0,
            increment: 0,
            infinite: false,
            max_depth: MAX_SEARCH_PLY as i32 - 1,
        }
    }
}

impl LimiterConfig {
    /// Depth-limited search with no clock
    #[must_use]
    pub fn depth(max_depth: i32) -> Self {
        LimiterConfig {
            max_depth: max_depth.clamp(1, MAX_SEARCH_PLY as i32 - 1),
            ..Default::default()
        }
    }

    /// Node-limited search with an optional soft budget
    #[must_use]
    pub fn nodes(hard: u64, soft: Option<u64>) -> Self {
        LimiterConfig {
            nodes: Some(hard),
            soft_nodes: soft,
            ..Default::default()
        }
    }

    /// Fixed time per move
    #[must_use]
    pub fn move_time(ms: u64) -> Self {
        LimiterConfig {
            move_time: ms,
            ..Default::default()
        }
    }
}

/// Cooperative budget checks for a running search
#[derive(Debug, Clone)]
pub struct Limiter {
    config: LimiterConfig,
    start_time: Instant,
    hard_limit: Option<Duration>,
    soft_limit: Option<Duration>,
    /// Nodes spent under each root move, indexed by from/to
    node_counts: Box<[u64; 4096]>,
}

impl Default for Limiter {
    fn default() -> Self {
        Limiter::new(LimiterConfig::default())
    }
}

impl Limiter {
    #[must_use]
    pub fn new(config: LimiterConfig) -> Self {
        Limiter {
            config,
            start_time: Instant::now(),
            hard_limit: None,
            soft_limit: None,
            node_counts: Box::new([0; 4096]),
        }
    }

    #[must_use]
    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    #[must_use]
    pub fn max_depth(&self) -> i32 {
        self.config.max_depth
    }

    /// Start the clock and derive the time limits.
    ///
    /// A move time sets only a hard limit. Otherwise, with a clock,
    /// `hard = max(1, time/20 + inc/2)` and `soft = max(1, hard * 5/8)`.
    pub fn start(&mut self) {
        self.start_time = Instant::now();
        self.node_counts.fill(0);
        self.hard_limit = None;
        self.soft_limit = None;

        if self.config.infinite {
            return;
        }
        if self.config.move_time > 0 {
            self.hard_limit = Some(Duration::from_millis(self.config.move_time));
        } else if self.config.time_left > 0 {
            let hard = (self.config.time_left / 20 + self.config.increment / 2).max(1);
            let soft = (hard * 5 / 8).max(1);
            self.hard_limit = Some(Duration::from_millis(hard));
            self.soft_limit = Some(Duration::from_millis(soft));
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Hard and soft limits in milliseconds, once started
    #[must_use]
    pub fn limits_ms(&self) -> (Option<u64>, Option<u64>) {
        let ms = |d: Duration| d.as_millis() as u64;
        (self.hard_limit.map(ms), self.soft_limit.map(ms))
    }

    /// Credit `nodes` to a root move
    pub fn add_root_nodes(&mut self, mv: Move, nodes: u64) {
        self.node_counts[mv.from_to()] += nodes;
    }

    #[must_use]
    pub fn root_nodes(&self, mv: Move) -> u64 {
        self.node_counts[mv.from_to()]
    }

    /// Soft time check, scaled by how settled the best move is
    #[must_use]
    pub fn time_approaching(&self, best_move: Move, nodes: u64) -> bool {
        let Some(soft) = self.soft_limit else {
            return false;
        };
        let share = if nodes == 0 {
            0.0
        } else {
            self.root_nodes(best_move) as f64 / nodes as f64
        };
        let scale = MAX_STABILITY_SCALE - share.clamp(0.0, 1.0) * STABILITY_SPAN;
        self.elapsed() >= soft.mul_f64(scale)
    }

    #[must_use]
    pub fn time_exceeded(&self) -> bool {
        self.hard_limit.is_some_and(|hard| self.elapsed() >= hard)
    }

    #[must_use]
    pub fn nodes_approaching(&self, nodes: u64) -> bool {
        self.config.soft_nodes.is_some_and(|soft| nodes >= soft)
    }

    #[must_use]
    pub fn nodes_exceeded(&self, nodes: u64) -> bool {
        self.config.nodes.is_some_and(|hard| nodes >= hard)
    }

    /// Whether another iteration should be skipped
    #[must_use]
    pub fn limits_approaching(&self, best_move: Move, nodes: u64) -> bool {
        self.time_approaching(best_move, nodes) || self.nodes_approaching(nodes)
    }

    /// Whether the current iteration must be abandoned
    #[must_use]
    pub fn limits_exceeded(&self, nodes: u64) -> bool {
        self.time_exceeded() || self.nodes_exceeded(nodes)
    }
}
