//! Search progress snapshots and the presentation interface.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::board::search::{mate_in, MATE_BOUND};
use crate::board::{Move, Position};

/// Result of one completed iteration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Report {
    pub depth: i32,
    pub seldepth: usize,
    /// Milliseconds since the search started
    pub time: u64,
    pub nodes: u64,
    pub nps: u64,
    /// Side-to-move relative score
    pub score: i32,
    pub line: Vec<Move>,
}

impl Report {
    /// First move of the principal variation, or `Move::NONE`
    #[must_use]
    pub fn best_move(&self) -> Move {
        self.line.first().copied().unwrap_or(Move::NONE)
    }

    #[must_use]
    pub fn is_mate(&self) -> bool {
        self.score.abs() >= MATE_BOUND
    }

    /// Signed mate distance in moves
    #[must_use]
    pub fn mate_in(&self) -> Option<i32> {
        mate_in(self.score)
    }

    /// Nodes per second for `nodes` over `time_ms`
    #[must_use]
    pub fn nps_for(nodes: u64, time_ms: u64) -> u64 {
        if time_ms > 0 {
            nodes * 1000 / time_ms
        } else {
            nodes
        }
    }
}

/// Presentation of search progress.
///
/// The search calls `on_update` once per completed depth; the engine calls
/// `on_start` and `on_completion` around each search.
pub trait Reporter: Send {
    fn on_start(&mut self, _position: &Position) {}

    fn on_update(&mut self, report: &Report);

    fn on_completion(&mut self, report: &Report, best_move: Move);

    /// Show a position and its static evaluation
    fn show_position(&mut self, position: &Position, eval: i32);
}

/// Reporter that prints nothing, for benchmarks and data generation
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Reporter for Silent {
    fn on_update(&mut self, _report: &Report) {}

    fn on_completion(&mut self, _report: &Report, _best_move: Move) {}

    fn show_position(&mut self, _position: &Position, _eval: i32) {}
}
