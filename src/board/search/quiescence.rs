use super::constants::{score_from_tt, score_to_tt, MAX_SEARCH_PLY};
use super::worker::Worker;
use super::Line;
use crate::board::Move;
use crate::tt::NodeType;

impl Worker {
    /// Capture-only search with stand pat on the raw network evaluation
    pub(super) fn quiesce(&mut self, pv: &mut Line, ply: usize, mut alpha: i32, beta: i32, pv_node: bool) -> i32 {
        pv.clear();
        if self.poll_stop() {
            return 0;
        }

        let entry = self.tt.probe(self.position.hash());
        if let Some(entry) = entry {
            let score = score_from_tt(entry.score, ply);
            let usable = match entry.node_type {
                NodeType::Pv => true,
                NodeType::All => score <= alpha,
                NodeType::Cut => score >= beta,
            };
            if usable {
                return score;
            }
        }

        let eval = self.evaluate();
        if ply >= MAX_SEARCH_PLY - 1 {
            return eval;
        }
        self.seldepth = self.seldepth.max(ply);

        let mut best = eval;
        if best > alpha {
            alpha = best;
            if best >= beta {
                return best;
            }
        }

        let tt_move = entry.map_or(Move::NONE, |e| e.mv);
        let tt_pv = entry.is_some_and(|e| e.tt_pv);
        let mut captures = self.score_moves(&self.position.generate_captures(), tt_move, None);
        let mut node_type = NodeType::All;
        let mut best_move = Move::NONE;

        let mut index = 0;
        while let Some(scored) = captures.pick_best(index) {
            index += 1;
            let mv = scored.mv;

            if !self.position.see_ge(mv, 0) {
                continue;
            }
            if !self.make_move(mv) {
                continue;
            }

            let nodes = self.add_node();
            if self.limiter.nodes_exceeded(nodes) {
                self.stopped = true;
                self.unmake_move();
                return 0;
            }

            let mut child = Line::new();
            let score = -self.quiesce(&mut child, ply + 1, -beta, -alpha, pv_node);
            self.unmake_move();

            if self.stopped {
                return 0;
            }

            best = best.max(score);
            if score > alpha {
                alpha = score;
                best_move = mv;
                node_type = NodeType::Pv;
                pv.update(mv, &child);

                if score >= beta {
                    node_type = NodeType::Cut;
                    break;
                }
            }
        }

        self.tt.add(
            self.position.hash(),
            best_move,
            score_to_tt(best, ply),
            0,
            node_type,
            pv_node || tt_pv,
        );

        best
    }
}
