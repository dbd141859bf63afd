//! Search module implementing alpha-beta with iterative deepening.
//!
//! Features:
//! - Iterative deepening with aspiration windows
//! - Principal variation search with a transposition table
//! - Reverse futility, null move, late move, futility, SEE and history pruning
//! - Singular extensions and late move reductions
//! - Quiescence search with stand-pat and SEE filtering
//! - History heuristics and static evaluation correction

mod constants;
mod history;
mod iterative;
mod move_order;
mod params;
mod quiescence;
mod worker;

pub use constants::{is_mate_score, mate_in, DELTA, INF, MATE, MATE_BOUND, MAX_SEARCH_PLY};
pub(crate) use constants::{score_from_tt, score_to_tt, CHECK_INTERVAL};
pub use history::{bonus, History, MAX_CORR_HIST, MAX_HIST};
pub use params::SearchConfig;
pub use worker::{Progress, Worker};

use super::Move;

/// Principal variation collected bottom-up during search
#[derive(Clone)]
pub struct Line {
    len: usize,
    moves: [Move; MAX_SEARCH_PLY + 1],
}

impl Default for Line {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl Line {
    #[must_use]
    pub fn new() -> Self {
        Line {
            len: 0,
            moves: [Move::NONE; MAX_SEARCH_PLY + 1],
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, mv: Move) {
        if self.len < self.moves.len() {
            self.moves[self.len] = mv;
            self.len += 1;
        }
    }

    /// Replace this line with `mv` followed by `child`
    pub fn update(&mut self, mv: Move, child: &Line) {
        self.moves[0] = mv;
        let n = child.len.min(self.moves.len() - 1);
        self.moves[1..=n].copy_from_slice(&child.moves[..n]);
        self.len = n + 1;
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    #[must_use]
    pub fn first(&self) -> Option<Move> {
        self.as_slice().first().copied()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Move> {
        self.as_slice().to_vec()
    }
}
