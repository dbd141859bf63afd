//! Move ordering for the main search and quiescence.

use super::constants::{GOOD_CAPTURE_BONUS, KILLER_SCORE, TT_MOVE_SCORE};
use super::worker::Worker;
use crate::board::{Move, MoveList, ScoredMoveList, SEE_VALUES};

impl Worker {
    /// Score `moves` for incremental selection.
    ///
    /// Order: TT move, captures by MVV-LVA plus capture history (winning
    /// exchanges first), the killer, then quiets by combined history.
    /// Without a ply (quiescence) killers and continuation history are skipped.
    pub(super) fn score_moves(&self, moves: &MoveList, tt_move: Move, ply: Option<usize>) -> ScoredMoveList {
        let mut scored = ScoredMoveList::new();
        for &mv in moves.iter() {
            scored.push(mv, self.score_move(mv, tt_move, ply));
        }
        scored
    }

    fn score_move(&self, mv: Move, tt_move: Move, ply: Option<usize>) -> i32 {
        if mv == tt_move {
            return TT_MOVE_SCORE;
        }

        let Some(mover) = self.position.piece_at(mv.from()) else {
            return 0;
        };

        if let Some(victim) = self.victim_of(mv) {
            let mut score = SEE_VALUES[victim.kind.index()] * 10 - SEE_VALUES[mover.kind.index()];
            score += self.history.capture(mover, mv.to(), victim.kind);
            if self.position.see_ge(mv, 0) {
                score += GOOD_CAPTURE_BONUS;
            }
            return score;
        }

        let stm = self.position.side_to_move();
        let mut score = self.history.quiet(stm, mv)
            + self
                .history
                .pawn(stm, self.position.pawn_hash(), mover.kind, mv.to());

        if let Some(ply) = ply {
            if self.stack[ply].killer == mv {
                return KILLER_SCORE;
            }
            score += self.continuation_score(mover, mv, ply);
        }
        score
    }
}
