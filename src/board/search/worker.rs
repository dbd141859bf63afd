//! Alpha-beta search worker.
//!
//! A worker owns everything the hot path touches: its own position copy,
//! the accumulator stack mirrored to the position's history, the history
//! tables and the per-ply search stack. Only the transposition table and the
//! stop flag are shared.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::constants::{
    is_mate_score, score_from_tt, score_to_tt, CHECK_INTERVAL, INF, MATE, MATE_BOUND,
    MAX_SEARCH_PLY,
};
use super::history::{self, History, MAX_CORR_HIST};
use super::params::SearchConfig;
use super::Line;
use crate::board::nnue::{Accumulator, Kernel, Network};
use crate::board::{Move, MoveList, Piece, PieceType, Position};
use crate::engine::time::Limiter;
use crate::tt::{Entry, NodeType, TranspositionTable};

/// Per-ply search state
#[derive(Clone, Copy, Debug)]
pub(super) struct Frame {
    /// Corrected static eval, `-INF` when in check
    pub(super) eval: i32,
    /// Move being searched from this ply
    pub(super) mv: Move,
    /// Piece making `mv`; `None` for a null move
    pub(super) piece: Option<Piece>,
    pub(super) killer: Move,
    /// Move skipped during a singular verification search
    pub(super) excluded: Move,
}

impl Frame {
    const EMPTY: Frame = Frame {
        eval: -INF,
        mv: Move::NONE,
        piece: None,
        killer: Move::NONE,
        excluded: Move::NONE,
    };
}

/// Snapshot of a running search for observers
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub depth: i32,
    pub nodes: u64,
    pub line: Vec<Move>,
}

/// Single-threaded search worker
pub struct Worker {
    pub(super) position: Position,
    accumulators: Vec<Accumulator>,
    network: Arc<Network>,
    kernel: Kernel,
    pub(super) tt: Arc<TranspositionTable>,
    pub(super) history: History,
    pub(super) stack: Vec<Frame>,
    pub(super) config: SearchConfig,
    lmr: Box<[[i32; 64]; 64]>,
    pub(super) limiter: Limiter,
    stop: Arc<AtomicBool>,
    pub(super) stopped: bool,
    nodes: Arc<AtomicU64>,
    pub(super) seldepth: usize,
    pub(super) progress: Arc<Mutex<Progress>>,
}

impl Worker {
    #[must_use]
    pub fn new(tt: Arc<TranspositionTable>, network: Arc<Network>, config: SearchConfig) -> Self {
        let position = Position::startpos();
        let accumulators = vec![Accumulator::reset(&position, &network)];
        Worker {
            position,
            accumulators,
            network,
            kernel: Kernel::default(),
            tt,
            history: History::new(),
            stack: vec![Frame::EMPTY; MAX_SEARCH_PLY + 2],
            lmr: config.lmr_table(),
            config,
            limiter: Limiter::default(),
            stop: Arc::new(AtomicBool::new(false)),
            stopped: false,
            nodes: Arc::new(AtomicU64::new(0)),
            seldepth: 0,
            progress: Arc::new(Mutex::new(Progress::default())),
        }
    }

    /// Share an external stop flag
    pub fn set_stop_flag(&mut self, stop: Arc<AtomicBool>) {
        self.stop = stop;
    }

    pub fn set_network(&mut self, network: Arc<Network>) {
        self.network = network;
        self.reset_accumulators();
    }

    pub fn set_kernel(&mut self, kernel: Kernel) {
        self.kernel = kernel;
    }

    pub fn set_tt(&mut self, tt: Arc<TranspositionTable>) {
        self.tt = tt;
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Clear statistics at a new game
    pub fn reset_history(&mut self) {
        self.history.reset();
        self.stack.fill(Frame::EMPTY);
    }

    #[must_use]
    pub fn nodes(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }

    /// Shared handle to the node counter
    #[must_use]
    pub fn node_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.nodes)
    }

    /// Shared handle to the live progress snapshot
    #[must_use]
    pub fn progress(&self) -> Arc<Mutex<Progress>> {
        Arc::clone(&self.progress)
    }

    /// Whether the last search was cut short
    #[must_use]
    pub fn stopped(&self) -> bool {
        self.stopped
    }

    #[must_use]
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Copy `position` (with its history) into the worker
    pub fn set_position(&mut self, position: &Position) {
        self.position = position.clone();
        self.reset_accumulators();
    }

    fn reset_accumulators(&mut self) {
        self.accumulators.clear();
        self.accumulators.push(Accumulator::reset(&self.position, &self.network));
    }

    /// Static evaluation of `position` from scratch
    pub fn eval(&mut self, position: &Position) -> i32 {
        self.set_position(position);
        self.evaluate()
    }

    #[inline]
    fn accumulator(&self) -> &Accumulator {
        self.accumulators
            .last()
            .expect("accumulator stack is never empty")
    }

    #[inline]
    pub(super) fn evaluate(&self) -> i32 {
        self.network
            .evaluate_with(self.accumulator(), self.position.side_to_move(), self.kernel)
    }

    #[inline]
    pub(super) fn add_node(&mut self) -> u64 {
        self.nodes.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(super) fn reset_search_state(&mut self) {
        self.nodes.store(0, Ordering::Relaxed);
        self.stopped = false;
        self.seldepth = 0;
        for frame in &mut self.stack {
            frame.eval = -INF;
            frame.mv = Move::NONE;
            frame.piece = None;
            frame.excluded = Move::NONE;
        }
    }

    /// Poll the stop flag and clock every `CHECK_INTERVAL` nodes
    #[inline]
    pub(super) fn poll_stop(&mut self) -> bool {
        if !self.stopped && self.nodes() % CHECK_INTERVAL == 0 {
            if self.stop.load(Ordering::Relaxed) || self.limiter.time_exceeded() {
                self.stopped = true;
            }
        }
        self.stopped
    }

    /// Make `mv` and push its accumulator. Illegal moves are undone and rejected.
    pub(super) fn make_move(&mut self, mv: Move) -> bool {
        let us = self.position.side_to_move();
        let next = self.accumulator().update(&self.position, mv, &self.network);
        self.position.make_move(mv);
        if self.position.is_king_attacked(us) {
            self.position.unmake_move();
            return false;
        }
        self.accumulators.push(next);
        true
    }

    pub(super) fn unmake_move(&mut self) {
        self.position.unmake_move();
        self.accumulators.pop();
    }

    /// Piece removed by `mv`, if any
    pub(super) fn victim_of(&self, mv: Move) -> Option<Piece> {
        if mv.is_en_passant() {
            Some(Piece::new(PieceType::Pawn, self.position.side_to_move().opponent()))
        } else if mv.is_castling() {
            None
        } else {
            self.position.piece_at(mv.to())
        }
    }

    /// Continuation history against the moves one and two plies back
    pub(super) fn continuation_score(&self, piece: Piece, mv: Move, ply: usize) -> i32 {
        [1, 2]
            .into_iter()
            .filter_map(|back| ply.checked_sub(back))
            .filter_map(|p| {
                let frame = self.stack[p];
                frame.piece.map(|prev| (prev, frame.mv.to()))
            })
            .map(|(prev, prev_to)| self.history.continuation(piece, mv.to(), prev, prev_to))
            .sum()
    }

    fn update_continuation(&mut self, piece: Piece, mv: Move, ply: usize, bonus: i32) {
        for back in [1, 2] {
            let Some(p) = ply.checked_sub(back) else {
                continue;
            };
            let frame = self.stack[p];
            if let Some(prev) = frame.piece {
                self.history
                    .update_continuation(piece, mv.to(), prev, frame.mv.to(), bonus);
            }
        }
    }

    /// Combined history for pruning and reductions
    pub(super) fn history_score(&self, mover: Piece, victim: Option<Piece>, mv: Move, ply: usize) -> i32 {
        let stm = self.position.side_to_move();
        match victim {
            Some(victim) => self.history.capture(mover, mv.to(), victim.kind),
            None => {
                self.history.quiet(stm, mv)
                    + self.continuation_score(mover, mv, ply)
                    + self
                        .history
                        .pawn(stm, self.position.pawn_hash(), mover.kind, mv.to())
            }
        }
    }

    /// Reward the cutoff move and penalize the siblings searched before it
    fn update_histories(&mut self, best: Move, quiets: &MoveList, noisies: &MoveList, depth: i32, ply: usize) {
        let stm = self.position.side_to_move();
        let pawn_hash = self.position.pawn_hash();
        let bonus = history::bonus(depth);
        let Some(mover) = self.position.piece_at(best.from()) else {
            return;
        };

        match self.victim_of(best) {
            None => {
                self.stack[ply].killer = best;
                self.history.update_quiet(stm, best, bonus);
                self.update_continuation(mover, best, ply, bonus);
                self.history
                    .update_pawn(stm, pawn_hash, mover.kind, best.to(), bonus);

                for &mv in quiets.iter().filter(|&&mv| mv != best) {
                    let Some(piece) = self.position.piece_at(mv.from()) else {
                        continue;
                    };
                    self.history.update_quiet(stm, mv, -bonus);
                    self.update_continuation(piece, mv, ply, -bonus);
                    self.history
                        .update_pawn(stm, pawn_hash, piece.kind, mv.to(), -bonus);
                }
            }
            Some(victim) => {
                self.history
                    .update_capture(mover, best.to(), victim.kind, bonus);
            }
        }

        // Noisy moves that failed to cut are penalized either way
        for &mv in noisies.iter().filter(|&&mv| mv != best) {
            let (Some(piece), Some(victim)) = (self.position.piece_at(mv.from()), self.victim_of(mv)) else {
                continue;
            };
            self.history
                .update_capture(piece, mv.to(), victim.kind, -bonus);
        }
    }

    /// Publish the current root line to observers
    fn publish_root_line(&self, line: &Line) {
        let mut progress = self.progress.lock();
        progress.nodes = self.nodes();
        progress.line.clear();
        progress.line.extend_from_slice(line.as_slice());
    }

    fn has_legal_move(&mut self) -> bool {
        let us = self.position.side_to_move();
        let moves = self.position.generate_moves();
        moves.iter().any(|&mv| {
            self.position.make_move(mv);
            let legal = !self.position.is_king_attacked(us);
            self.position.unmake_move();
            legal
        })
    }

    /// Principal variation search.
    #[allow(clippy::too_many_arguments, clippy::too_many_lines)]
    pub(super) fn search(
        &mut self,
        pv: &mut Line,
        depth: i32,
        ply: usize,
        mut alpha: i32,
        beta: i32,
        cut_node: bool,
        pv_node: bool,
    ) -> i32 {
        pv.clear();
        if self.poll_stop() {
            return 0;
        }

        let in_check = self.position.in_check();

        if ply > 0 {
            if self.position.halfmove_clock() >= 100 {
                if in_check && !self.has_legal_move() {
                    return -MATE + ply as i32;
                }
                return 0;
            }
            if self.position.is_threefold() {
                return 0;
            }
        }

        if depth <= 0 {
            return self.quiesce(pv, ply, alpha, beta, pv_node);
        }
        if ply >= MAX_SEARCH_PLY - 1 {
            return self.evaluate();
        }
        self.seldepth = self.seldepth.max(ply);

        let excluded = self.stack[ply].excluded;
        let tt_entry: Option<Entry> = if excluded.is_none() {
            self.tt.probe(self.position.hash())
        } else {
            None
        };

        if let Some(entry) = tt_entry {
            let score = score_from_tt(entry.score, ply);
            let usable = match entry.node_type {
                NodeType::Pv => true,
                NodeType::All => score <= alpha,
                NodeType::Cut => score >= beta,
            };
            if ply > 0 && i32::from(entry.depth) >= depth && usable {
                return score;
            }
        }

        let cfg = self.config;

        let static_eval = if in_check {
            -INF
        } else {
            let raw = self.evaluate();
            self.history
                .corrected_eval(raw, &self.position, &cfg)
                .clamp(-MATE_BOUND + 1, MATE_BOUND - 1)
        };
        self.stack[ply].eval = static_eval;

        let tt_pv = tt_entry.is_some_and(|e| e.tt_pv);
        let improving = !in_check
            && ply > 1
            && self.stack[ply - 2].eval != -INF
            && static_eval > self.stack[ply - 2].eval;

        if !pv_node && !in_check && excluded.is_none() {
            // Reverse futility pruning
            let margin = (depth - i32::from(improving)).max(0) * cfg.rfp_margin;
            if depth <= cfg.rfp_max_depth && static_eval >= beta + margin {
                return static_eval;
            }

            // Null move pruning
            let after_null = ply > 0 && self.stack[ply - 1].piece.is_none();
            if depth >= cfg.nmp_min_depth
                && !after_null
                && static_eval >= beta
                && self.position.has_non_pawn_material(self.position.side_to_move())
            {
                let reduction = cfg.nmp_base_reduction + i32::from(improving);

                self.stack[ply].mv = Move::NONE;
                self.stack[ply].piece = None;

                self.position.make_null_move();
                let mut null_line = Line::new();
                let score = -self.search(
                    &mut null_line,
                    depth - reduction,
                    ply + 1,
                    -beta,
                    -beta + 1,
                    !cut_node,
                    false,
                );
                self.position.unmake_move();

                if self.stopped {
                    return 0;
                }
                if score >= beta {
                    return if is_mate_score(score) { beta } else { score };
                }
            }
        }

        let tt_move = tt_entry.map_or(Move::NONE, |e| e.mv);
        let mut moves = self.score_moves(&self.position.generate_moves(), tt_move, Some(ply));

        let mut best = -INF;
        let mut best_move = Move::NONE;
        let mut node_type = NodeType::All;
        let mut legal = 0i32;
        let mut quiets = MoveList::new();
        let mut noisies = MoveList::new();

        self.stack[ply].mv = Move::NONE;
        self.stack[ply].piece = None;

        let mut index = 0;
        while let Some(scored) = moves.pick_best(index) {
            index += 1;
            let mv = scored.mv;
            let Some(mover) = self.position.piece_at(mv.from()) else {
                continue;
            };
            let victim = self.victim_of(mv);
            let is_quiet = victim.is_none();

            if ply > 0 && best > -MATE_BOUND {
                // Late move pruning
                if is_quiet && legal >= cfg.lmp_base + depth * depth {
                    break;
                }

                // Futility pruning
                if !pv_node && is_quiet && !in_check && static_eval + depth * cfg.fp_margin <= alpha {
                    break;
                }

                let see_threshold = if is_quiet {
                    cfg.see_quiet_margin * depth
                } else {
                    cfg.see_noisy_margin * depth * depth
                };
                if !pv_node && !self.position.see_ge(mv, see_threshold) {
                    continue;
                }

                let history_margin = cfg.hist_prune_mult * depth + cfg.hist_prune_base;
                if !pv_node && is_quiet && self.history_score(mover, victim, mv, ply) <= history_margin {
                    continue;
                }
            }

            if mv == excluded {
                continue;
            }

            let mut extension = 0;
            if let Some(entry) = tt_entry {
                if ply > 0
                    && depth >= cfg.singular_min_depth
                    && mv == entry.mv
                    && i32::from(entry.depth) >= depth - cfg.singular_tt_depth_margin
                    && entry.node_type != NodeType::All
                {
                    let tt_score = score_from_tt(entry.score, ply);
                    let singular_beta = (tt_score - depth * cfg.singular_beta_mult).max(-INF + 1);
                    let singular_depth = (depth - 1) / 2;

                    self.stack[ply].excluded = mv;
                    let mut scratch = Line::new();
                    let score = self.search(
                        &mut scratch,
                        singular_depth,
                        ply,
                        singular_beta - 1,
                        singular_beta,
                        cut_node,
                        false,
                    );
                    self.stack[ply].excluded = Move::NONE;

                    if self.stopped {
                        return 0;
                    }

                    if score < singular_beta {
                        extension = if !pv_node && score < singular_beta - cfg.double_ext_margin {
                            2
                        } else {
                            1
                        };
                    } else if singular_beta >= beta && !is_mate_score(score) {
                        return singular_beta;
                    }
                }
            }

            if !self.make_move(mv) {
                continue;
            }

            let nodes = self.add_node();
            legal += 1;
            self.stack[ply].mv = mv;
            self.stack[ply].piece = Some(mover);

            if is_quiet {
                quiets.push(mv);
            } else {
                noisies.push(mv);
            }

            if self.limiter.nodes_exceeded(nodes) {
                self.stopped = true;
                self.unmake_move();
                self.stack[ply].mv = Move::NONE;
                self.stack[ply].piece = None;
                return 0;
            }

            let mut child = Line::new();
            let mut score = 0;
            let new_depth = depth - 1 + extension;

            if legal >= cfg.lmr_min_moves && depth >= cfg.lmr_min_depth {
                let mut reduction = self.lmr[depth.min(63) as usize][legal.min(63) as usize];
                reduction += i32::from(!improving);
                reduction += i32::from(!pv_node);
                reduction -= i32::from(tt_pv);
                reduction += 2 * i32::from(cut_node);
                reduction -= self.history_score(mover, victim, mv, ply) / cfg.lmr_hist_div;

                let reduced = (new_depth - reduction).max(1).min(new_depth);

                score = -self.search(&mut child, reduced, ply + 1, -alpha - 1, -alpha, true, false);
                if score > alpha && reduced < new_depth {
                    score = -self.search(&mut child, new_depth, ply + 1, -alpha - 1, -alpha, !cut_node, false);
                }
            } else if !pv_node || legal > 1 {
                score = -self.search(&mut child, new_depth, ply + 1, -alpha - 1, -alpha, !cut_node, false);
            }

            if pv_node && (legal == 1 || score > alpha) {
                score = -self.search(&mut child, new_depth, ply + 1, -beta, -alpha, false, true);
            }

            self.unmake_move();
            self.stack[ply].mv = Move::NONE;
            self.stack[ply].piece = None;

            if ply == 0 {
                self.limiter.add_root_nodes(mv, self.nodes() - nodes);
            }

            if self.stopped {
                return 0;
            }

            best = best.max(score);

            if score > alpha {
                alpha = score;
                best_move = mv;
                node_type = NodeType::Pv;
                pv.update(mv, &child);

                if ply == 0 {
                    self.publish_root_line(pv);
                }

                if score >= beta {
                    self.update_histories(mv, &quiets, &noisies, depth, ply);
                    node_type = NodeType::Cut;
                    break;
                }
            }
        }

        if legal == 0 {
            if !excluded.is_none() {
                return alpha;
            }
            return if in_check { -MATE + ply as i32 } else { 0 };
        }

        let best_is_noisy =
            !best_move.is_none() && (self.victim_of(best_move).is_some() || best_move.is_promotion());
        if !in_check
            && excluded.is_none()
            && !best_is_noisy
            && !(node_type == NodeType::Cut && best <= static_eval)
            && !(node_type == NodeType::All && best >= static_eval)
        {
            let diff = ((best - static_eval) * depth / 8).clamp(-MAX_CORR_HIST / 4, MAX_CORR_HIST / 4);
            self.history.update_correction(&self.position, diff);
        }

        if excluded.is_none() {
            self.tt.add(
                self.position.hash(),
                best_move,
                score_to_tt(best, ply),
                depth,
                node_type,
                pv_node || tt_pv,
            );
        }

        best
    }
}
