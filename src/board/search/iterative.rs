use super::constants::{DELTA, INF};
use super::worker::Worker;
use super::Line;
use crate::board::Position;
use crate::engine::report::{Report, Reporter};
use crate::engine::time::Limiter;

impl Worker {
    /// Search the root at `depth` inside an aspiration window around `last_score`.
    ///
    /// The first depth uses a full window. On failure the half-width doubles
    /// and the window stays centred on `last_score`.
    pub(super) fn aspiration(&mut self, line: &mut Line, depth: i32, last_score: i32) -> i32 {
        let mut delta = DELTA;
        let (mut alpha, mut beta) = if depth == 1 {
            (-INF, INF)
        } else {
            ((last_score - delta).max(-INF), (last_score + delta).min(INF))
        };

        loop {
            let score = self.search(line, depth, 0, alpha, beta, false, true);
            if self.stopped || (score > alpha && score < beta) {
                return score;
            }
            if alpha <= -INF && beta >= INF {
                return score;
            }
            delta = delta.saturating_mul(2);
            alpha = last_score.saturating_sub(delta).max(-INF);
            beta = last_score.saturating_add(delta).min(INF);
        }
    }

    /// Iterative deepening from `position` under `limiter`.
    ///
    /// Reports every completed depth. An interrupted depth is discarded.
    /// Returns the last completed report, or `None` if not even depth 1 finished.
    pub fn go(&mut self, position: &Position, limiter: Limiter, reporter: &mut dyn Reporter) -> Option<Report> {
        self.set_position(position);
        self.limiter = limiter;
        self.limiter.start();
        self.reset_search_state();
        *self.progress.lock() = Default::default();

        let mut last: Option<Report> = None;
        let mut last_score = 0;
        let mut line = Line::new();

        for depth in 1..=self.limiter.max_depth() {
            self.seldepth = 0;
            let score = self.aspiration(&mut line, depth, last_score);
            if self.stopped {
                break;
            }

            let time = self.limiter.elapsed().as_millis() as u64;
            let nodes = self.nodes();
            let report = Report {
                depth,
                seldepth: self.seldepth,
                time,
                nodes,
                nps: Report::nps_for(nodes, time),
                score,
                line: line.to_vec(),
            };
            reporter.on_update(&report);
            self.progress.lock().depth = depth;

            last_score = score;
            let best = report.best_move();
            last = Some(report);

            if self.limiter.limits_approaching(best, nodes) {
                break;
            }
        }

        log::debug!(
            "search finished: depth {} nodes {} stopped {}",
            last.as_ref().map_or(0, |r| r.depth),
            self.nodes(),
            self.stopped
        );
        last
    }

    /// Fixed-depth full-window search of `position`, returning the node count
    pub fn bench_search(&mut self, position: &Position, depth: i32) -> u64 {
        self.set_position(position);
        self.limiter = Limiter::default();
        self.limiter.start();
        self.reset_search_state();
        let mut line = Line::new();
        self.search(&mut line, depth, 0, -INF, INF, false, true);
        self.nodes()
    }
}
