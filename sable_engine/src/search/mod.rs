//! The search driver: iterative deepening over a principal-variation
//! negamax with quiescence, a transposition table, and the full pruning and
//! extension toolbox: aspiration windows, null move with verification,
//! static futility, razoring, multi-cut, singular/check/recapture
//! extensions, late-move reductions, and MultiPV with root exclusion.
//!
//! The search cooperates with cancellation: it checks the stop flag and the
//! hard time ceiling at every node, unwinds without storing to the
//! transposition table when aborted, and reports the last fully completed
//! iteration.

pub mod eval;
pub mod stack;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use sable::tools::trace::{trace_emit, trace_enabled, TraceTopic};
use sable::{BitMove, Board, GenStage, MoveList, Piece, PieceType, Undo};

use crate::consts::*;
use crate::movepick::{
    cached_see, capture_margin, score_moves, select_best_move, OrderingContext, SeeCache,
};
use crate::params::Limits;
use crate::search::stack::SearchStack;
use crate::tables::{ButterflyHistory, ContinuationHistory, CounterHistory};
use crate::time::{compute_time_budget, elapsed_ms};
use crate::tt::{Entry, NodeBound, TranspositionTable};

/// Transposition-table budget of a standalone search call.
const DEFAULT_TT_MEGABYTES: usize = 16;

const QUIET_HISTORY_BONUS: i32 = 128;
const ASPIRATION_BASE: i32 = 64;
const ASPIRATION_SCALE: i32 = 16;
const STATIC_FUTILITY_SLACK: i32 = 128;
const RAZORING_SLACK: i32 = 512;
const QSEARCH_DELTA_MARGIN: i32 = 128;
const HISTORY_REDUCTION_SCALE: i32 = 8192;
const MAX_SINGULAR_WIDTH: usize = 24;

const MAX_LMR_DEPTH: usize = 64;
const MAX_LMR_MOVES: usize = 64;

/// Callback receiving a snapshot after every completed iteration.
pub type ProgressFn = dyn Fn(&SearchResult);
/// Callback invoked as each root move starts, with its 1-based index.
pub type CurrmoveFn = dyn Fn(BitMove, usize);

lazy_static! {
    /// log(depth) * log(moves) reduction planes, non-PV then PV.
    static ref LMR_TABLE: Box<[[[i32; MAX_LMR_MOVES]; MAX_LMR_DEPTH]; 2]> = build_lmr_table();

    /// Environment-gated diagnostic probe for quiescence delta pruning. The
    /// search behaves identically whether or not the variable is set.
    static ref QSEARCH_PROBE: bool = std::env::var_os("SABLE_QSEARCH_PROBE").is_some();
}

fn build_lmr_table() -> Box<[[[i32; MAX_LMR_MOVES]; MAX_LMR_DEPTH]; 2]> {
    let mut table = Box::new([[[0i32; MAX_LMR_MOVES]; MAX_LMR_DEPTH]; 2]);
    for pv in 0..2 {
        let divisor = if pv == 1 { 2.25 } else { 1.6 };
        let offset = if pv == 1 { 0.15 } else { 0.35 };
        for depth in 2..MAX_LMR_DEPTH {
            for moves in 2..MAX_LMR_MOVES {
                let reduction =
                    (depth as f64).ln() * (moves as f64).ln() / divisor + offset;
                if reduction > 0.0 {
                    table[pv][depth][moves] = reduction.round() as i32;
                }
            }
        }
    }
    table
}

/// One root line of a MultiPV search.
#[derive(Clone, Debug)]
pub struct PVLine {
    pub best: BitMove,
    pub line: Vec<BitMove>,
    pub eval: i32,
}

impl Default for PVLine {
    fn default() -> PVLine {
        PVLine {
            best: BitMove::null(),
            line: Vec::new(),
            eval: 0,
        }
    }
}

/// Everything a search run reports back: the chosen move, principal
/// variation(s), statistics, and one counter per pruning or extension
/// heuristic.
#[derive(Clone, Debug)]
pub struct SearchResult {
    pub best_move: BitMove,
    pub pv: Vec<BitMove>,
    pub lines: Vec<PVLine>,
    pub depth: i32,
    pub seldepth: i32,
    pub nodes: i64,
    pub eval: i32,
    pub elapsed_ms: i64,
    pub hashfull: u32,
    pub tt_hit: bool,
    pub primary_killer: BitMove,
    pub history_bonus: i32,
    pub aborted: bool,
    pub static_futility_prunes: i32,
    pub razor_prunes: i32,
    pub multi_cut_prunes: i32,
    pub null_prunes: i32,
    pub null_attempts: i32,
    pub null_verifications: i32,
    pub lmr_reductions: i32,
    pub recapture_extensions: i32,
    pub check_extensions: i32,
    pub quiet_penalties: i32,
}

impl Default for SearchResult {
    fn default() -> SearchResult {
        SearchResult {
            best_move: BitMove::null(),
            pv: Vec::new(),
            lines: Vec::new(),
            depth: 0,
            seldepth: 0,
            nodes: 0,
            eval: 0,
            elapsed_ms: 0,
            hashfull: 0,
            tt_hit: false,
            primary_killer: BitMove::null(),
            history_bonus: 0,
            aborted: false,
            static_futility_prunes: 0,
            razor_prunes: 0,
            multi_cut_prunes: 0,
            null_prunes: 0,
            null_attempts: 0,
            null_verifications: 0,
            lmr_reductions: 0,
            recapture_extensions: 0,
            check_extensions: 0,
            quiet_penalties: 0,
        }
    }
}

/// Triangular principal-variation table.
struct PvTable {
    moves: Vec<[BitMove; MAX_PLY]>,
    length: [usize; MAX_PLY],
}

impl PvTable {
    fn new() -> PvTable {
        PvTable {
            moves: vec![[BitMove::null(); MAX_PLY]; MAX_PLY],
            length: [0; MAX_PLY],
        }
    }

    fn clear(&mut self) {
        self.length = [0; MAX_PLY];
    }

    fn reset_row(&mut self, ply: usize) {
        if ply < MAX_PLY {
            self.length[ply] = 0;
        }
    }

    fn set(&mut self, ply: usize, mv: BitMove) {
        debug_assert!(ply < MAX_PLY);
        self.moves[ply][ply] = mv;
        let child = ply + 1;
        let child_length = if child < MAX_PLY { self.length[child] } else { 0 };
        if child_length > 0 {
            let child_row = self.moves[child];
            for idx in 0..child_length {
                self.moves[ply][ply + 1 + idx] = child_row[child + idx];
            }
        }
        self.length[ply] = child_length + 1;
    }

    fn extract(&self, ply: usize) -> Vec<BitMove> {
        if ply >= MAX_PLY {
            return Vec::new();
        }
        let count = self.length[ply].min(MAX_PLY - ply);
        self.moves[ply][ply..ply + count].to_vec()
    }
}

struct Searcher<'a> {
    board: &'a mut Board,
    tt: TranspositionTable,
    history: ButterflyHistory,
    counter_history: CounterHistory,
    continuation_history: ContinuationHistory,
    killers: [[BitMove; 2]; MAX_PLY],
    see_cache: SeeCache,
    stack: SearchStack,
    pv: PvTable,

    nodes: i64,
    node_cap: i64,
    seldepth: i32,
    aborted: bool,

    root_excludes: [BitMove; MAX_MOVES],
    root_exclude_count: usize,

    stop_flag: Option<&'a AtomicBool>,
    start_time: Instant,
    soft_time_ms: i64,
    hard_time_ms: i64,
    use_time: bool,
    currmove: Option<&'a CurrmoveFn>,

    // Heuristic configuration, clamped from the limits.
    lmr_min_depth: i32,
    lmr_min_move: i32,
    enable_static_futility: bool,
    static_futility_margin: i32,
    static_futility_depth: i32,
    enable_razoring: bool,
    razor_margin: i32,
    razor_depth: i32,
    enable_multi_cut: bool,
    multi_cut_min_depth: i32,
    multi_cut_reduction: i32,
    multi_cut_candidates: i32,
    multi_cut_threshold: i32,
    enable_null_move: bool,
    null_min_depth: i32,
    null_base_reduction: i32,
    null_depth_scale: i32,
    null_eval_margin: i32,
    null_verification_depth: i32,
    enable_recapture_extension: bool,
    enable_check_extension: bool,
    recapture_extension_depth: i32,
    check_extension_depth: i32,
    singular_margin: i32,

    // One counter per heuristic category.
    static_futility_prunes: i32,
    razor_prunes: i32,
    multi_cut_prunes: i32,
    null_prunes: i32,
    null_attempts: i32,
    null_verifications: i32,
    lmr_reductions: i32,
    recapture_extensions: i32,
    check_extensions: i32,
    quiet_penalties: i32,
}

impl<'a> Searcher<'a> {
    fn new(board: &'a mut Board, limits: &Limits, stop_flag: Option<&'a AtomicBool>,
           currmove: Option<&'a CurrmoveFn>) -> Searcher<'a> {
        Searcher {
            board,
            tt: TranspositionTable::new(DEFAULT_TT_MEGABYTES),
            history: ButterflyHistory::new(),
            counter_history: CounterHistory::new(),
            continuation_history: ContinuationHistory::new(),
            killers: [[BitMove::null(); 2]; MAX_PLY],
            see_cache: SeeCache::new(),
            stack: SearchStack::new(),
            pv: PvTable::new(),
            nodes: 0,
            node_cap: limits.nodes,
            seldepth: 0,
            aborted: false,
            root_excludes: [BitMove::null(); MAX_MOVES],
            root_exclude_count: 0,
            stop_flag,
            start_time: Instant::now(),
            soft_time_ms: 0,
            hard_time_ms: 0,
            use_time: false,
            currmove,
            lmr_min_depth: limits.lmr_min_depth.max(1),
            lmr_min_move: limits.lmr_min_move.max(1),
            enable_static_futility: limits.enable_static_futility,
            static_futility_margin: limits.static_futility_margin.clamp(0, 1024),
            static_futility_depth: limits.static_futility_depth.clamp(0, 3),
            enable_razoring: limits.enable_razoring,
            razor_margin: limits.razor_margin.clamp(0, 2048),
            razor_depth: limits.razor_depth.clamp(0, 3),
            enable_multi_cut: limits.enable_multi_cut,
            multi_cut_min_depth: limits.multi_cut_min_depth.clamp(0, 64),
            multi_cut_reduction: limits.multi_cut_reduction.clamp(0, 4),
            multi_cut_candidates: limits.multi_cut_candidates.clamp(0, 32),
            multi_cut_threshold: limits.multi_cut_threshold.clamp(0, 32),
            enable_null_move: limits.enable_null_move,
            null_min_depth: limits.null_min_depth.clamp(1, 64),
            null_base_reduction: limits.null_base_reduction.max(1),
            null_depth_scale: limits.null_depth_scale.max(1),
            null_eval_margin: limits.null_eval_margin.max(0),
            null_verification_depth: limits.null_verification_depth.max(0),
            enable_recapture_extension: limits.enable_recapture_extension,
            enable_check_extension: limits.enable_check_extension,
            recapture_extension_depth: limits.recapture_extension_depth.clamp(0, 16),
            check_extension_depth: limits.check_extension_depth.clamp(0, 16),
            singular_margin: limits.singular_margin.clamp(0, 10_000),
            static_futility_prunes: 0,
            razor_prunes: 0,
            multi_cut_prunes: 0,
            null_prunes: 0,
            null_attempts: 0,
            null_verifications: 0,
            lmr_reductions: 0,
            recapture_extensions: 0,
            check_extensions: 0,
            quiet_penalties: 0,
        }
    }

    /// Checks the stop flag and the clock. The soft target raises the stop
    /// flag so the outer loop finishes the iteration; the hard ceiling
    /// aborts on the spot.
    fn should_abort(&mut self) -> bool {
        if let Some(flag) = self.stop_flag {
            if flag.load(Ordering::Acquire) {
                self.aborted = true;
                return true;
            }
        }
        if self.use_time && self.hard_time_ms > 0 {
            let elapsed = elapsed_ms(self.start_time);
            if self.soft_time_ms > 0 && elapsed >= self.soft_time_ms && !self.aborted {
                if let Some(flag) = self.stop_flag {
                    flag.store(true, Ordering::Release);
                }
            }
            if elapsed >= self.hard_time_ms {
                self.aborted = true;
                return true;
            }
        }
        false
    }

    fn is_root_excluded(&self, mv: BitMove, ply: usize) -> bool {
        if ply != 0 || self.root_exclude_count == 0 {
            return false;
        }
        self.root_excludes[..self.root_exclude_count].contains(&mv)
    }

    /// Evaluates lazily and records the result in the stack frame so the
    /// improving trend is available.
    fn ensure_static_eval(&mut self, ply: usize, static_eval: &mut i32, have: &mut bool) {
        if !*have {
            *static_eval = eval::evaluate(self.board);
            *have = true;
        }
        if !self.stack.frame(ply).has_static_eval {
            self.stack.set_static_eval(ply, *static_eval);
        } else {
            *static_eval = self.stack.frame(ply).static_eval;
        }
    }

    fn update_killers(&mut self, ply: usize, mv: BitMove) {
        if mv.is_null() || ply >= MAX_PLY {
            return;
        }
        let slots = &mut self.killers[ply];
        if slots[0] == mv {
            return;
        }
        slots[1] = slots[0];
        slots[0] = mv;
    }

    /// Positive (or negative) quiet-move statistics, with the parent-keyed
    /// tables updated at half weight.
    fn update_quiet_stats(
        &mut self,
        side: sable::Player,
        mv: BitMove,
        parent_move: BitMove,
        parent_piece: Piece,
        bonus: i32,
    ) {
        if mv.is_null() {
            return;
        }
        self.history.add(side, mv, bonus);
        if !parent_move.is_null() {
            let scaled = if bonus >= 0 {
                (bonus / 2).max(1)
            } else {
                (bonus / 2).min(-1)
            };
            self.counter_history.add(parent_move, mv, scaled);
            if parent_piece != Piece::None {
                self.continuation_history.add(parent_piece, mv, scaled);
            }
        }
    }

    /// Re-searches every alternative to the TT move at reduced depth against
    /// a margin below the stored score; the TT move is singular when none of
    /// them reach it. History and killers are snapshotted around the probe
    /// so it leaves no trace.
    fn should_extend_singular(
        &mut self,
        moves: &MoveList,
        tt_entry: &Entry,
        depth: i32,
        ply: usize,
        previous_null: bool,
    ) -> bool {
        let tt_move = tt_entry.best_move;
        if previous_null || tt_move.is_null() || depth < 3 {
            return false;
        }
        if moves.len() <= 1 || moves.len() > MAX_SINGULAR_WIDTH {
            return false;
        }
        if tt_move.is_quiet() && depth < 5 {
            return false;
        }
        if tt_entry.bound != NodeBound::Lower {
            return false;
        }
        let mut margin = self.singular_margin;
        if margin <= 0 {
            return false;
        }
        if self.stack.frame(ply).captured != PieceType::None {
            margin = margin * 3 / 4;
        }
        if !self.stack.is_improving(ply) {
            margin = margin * 3 / 4;
        }
        margin = margin.max(16);
        let singular_beta = i32::from(tt_entry.score) - margin;
        let singular_alpha = singular_beta - 1;
        if singular_beta <= -INFINITE {
            return false;
        }

        let reduced_depth = (depth - 2).max(0);
        let history_snapshot = self.history.clone();
        let killers_snapshot = self.killers;

        let mut singular = true;
        for mv in moves.iter() {
            let mv = *mv;
            if mv == tt_move {
                continue;
            }
            let mut undo = Undo::default();
            self.board.make(mv, &mut undo);
            let captured_type = undo.captured.type_of();
            self.stack.prepare_child(ply, ply + 1, mv, captured_type);
            let score = -self.negamax(
                reduced_depth,
                -singular_beta,
                -singular_alpha,
                ply + 1,
                false,
                previous_null,
            );
            self.board.unmake(mv, &undo);
            if score >= singular_beta {
                singular = false;
                break;
            }
        }
        self.history = history_snapshot;
        self.killers = killers_snapshot;
        singular
    }

    /// The principal-variation negamax.
    fn negamax(
        &mut self,
        depth: i32,
        mut alpha: i32,
        beta: i32,
        ply: usize,
        in_pv: bool,
        previous_null: bool,
    ) -> i32 {
        self.nodes += 1;
        if self.node_cap >= 0 && self.nodes > self.node_cap {
            self.aborted = true;
            return alpha;
        }
        self.seldepth = self.seldepth.max(ply as i32 + 1);
        if self.should_abort() {
            return alpha;
        }
        let trace_search = trace_enabled(TraceTopic::Search);

        let mut static_eval: i32 = 0;
        let mut have_static_eval = false;

        if in_pv {
            self.pv.reset_row(ply);
        }
        if ply >= MAX_PLY - 1 {
            return eval::evaluate(self.board);
        }

        let alpha_orig = alpha;
        let zob = self.board.zobrist();
        let tt_entry = self.tt.probe(zob);
        let root_with_exclusions = ply == 0 && self.root_exclude_count > 0;
        if let Some(entry) = tt_entry {
            if i32::from(entry.depth) >= depth && !root_with_exclusions {
                let tt_score = i32::from(entry.score);
                let cutoff = match entry.bound {
                    NodeBound::Exact => true,
                    NodeBound::Lower => tt_score >= beta,
                    NodeBound::Upper => tt_score <= alpha,
                };
                if cutoff {
                    if trace_enabled(TraceTopic::TT) {
                        trace_emit(
                            TraceTopic::TT,
                            &format!(
                                "cutoff ply={} depth={} bound={:?} score={}",
                                ply, depth, entry.bound, tt_score
                            ),
                        );
                    }
                    return tt_score;
                }
            }
        }

        if depth <= 0 {
            return self.qsearch(alpha, beta, ply);
        }

        let in_check = self.board.in_check();

        // Static futility: frozen shallow nodes whose eval plus a margin
        // still cannot reach alpha are cut immediately.
        if !in_check
            && self.enable_static_futility
            && self.static_futility_depth > 0
            && ply > 0
            && !in_pv
            && !previous_null
            && depth <= self.static_futility_depth
        {
            self.ensure_static_eval(ply, &mut static_eval, &mut have_static_eval);
            if !self.stack.is_improving(ply) {
                let margin = self.static_futility_margin * depth.max(1);
                let futility_value =
                    (static_eval + margin - STATIC_FUTILITY_SLACK).clamp(-INFINITE, INFINITE);
                if futility_value <= alpha {
                    if trace_search {
                        trace_emit(
                            TraceTopic::Search,
                            &format!(
                                "static-futility ply={} depth={} alpha={} static={} value={}",
                                ply, depth, alpha, static_eval, futility_value
                            ),
                        );
                    }
                    self.static_futility_prunes += 1;
                    return futility_value;
                }
            }
        }

        // Razoring: hopeless shallow nodes drop into quiescence and keep
        // that score when it confirms the position is dead.
        if !in_check
            && self.enable_razoring
            && self.razor_depth > 0
            && ply > 0
            && !in_pv
            && !previous_null
            && depth <= self.razor_depth
        {
            self.ensure_static_eval(ply, &mut static_eval, &mut have_static_eval);
            if !self.stack.is_improving(ply) {
                let margin = self.razor_margin * depth.max(1);
                let threshold =
                    (static_eval + margin - RAZORING_SLACK).clamp(-INFINITE, INFINITE);
                if threshold <= alpha {
                    if trace_search {
                        trace_emit(
                            TraceTopic::Search,
                            &format!(
                                "razoring ply={} depth={} alpha={} static={}",
                                ply, depth, alpha, static_eval
                            ),
                        );
                    }
                    let razor_score = self.qsearch(alpha, beta, ply);
                    if self.aborted {
                        return razor_score;
                    }
                    if razor_score <= alpha + RAZORING_SLACK {
                        self.razor_prunes += 1;
                        return razor_score;
                    }
                }
            }
        }

        // Null move: hand the opponent a free tempo; if a reduced search
        // still clears beta the position is good enough to prune, after an
        // optional same-ply verification without the null-move right.
        if self.enable_null_move
            && !in_check
            && !previous_null
            && depth >= self.null_min_depth
            && self.has_null_material()
        {
            self.ensure_static_eval(ply, &mut static_eval, &mut have_static_eval);
            let eval_margin = static_eval - beta;
            let mut reduction = self.null_base_reduction;
            if depth > self.null_min_depth {
                reduction += (depth - self.null_min_depth) / self.null_depth_scale.max(1);
            }
            if eval_margin > self.null_eval_margin {
                reduction += 1;
            }
            reduction = reduction.clamp(self.null_base_reduction, depth - 1);
            let null_depth = depth - 1 - reduction;
            if null_depth >= 0 {
                self.null_attempts += 1;
                if trace_search {
                    trace_emit(
                        TraceTopic::Search,
                        &format!(
                            "null-attempt ply={} depth={} reduction={} null_depth={}",
                            ply, depth, reduction, null_depth
                        ),
                    );
                }
                let mut null_undo = Undo::default();
                self.stack
                    .prepare_child(ply, ply + 1, BitMove::null(), PieceType::None);
                self.board.make_null(&mut null_undo);
                let null_score =
                    -self.negamax(null_depth, -beta, -beta + 1, ply + 1, false, true);
                self.board.unmake_null(&null_undo);
                if self.aborted {
                    return beta;
                }
                if null_score >= beta {
                    let mut verified = false;
                    let allow_verification = !in_pv
                        && self.null_verification_depth > 0
                        && null_depth >= self.null_verification_depth;
                    if allow_verification {
                        self.null_verifications += 1;
                        let verify_score =
                            self.negamax(null_depth, beta - 1, beta, ply, false, true);
                        if self.aborted {
                            return beta;
                        }
                        if verify_score >= beta {
                            verified = true;
                        } else if trace_search {
                            trace_emit(
                                TraceTopic::Search,
                                &format!(
                                    "null-verify-fail ply={} depth={} score={} beta={}",
                                    ply, depth, verify_score, beta
                                ),
                            );
                        }
                    } else {
                        verified = true;
                    }
                    if verified {
                        self.null_prunes += 1;
                        if trace_search {
                            trace_emit(
                                TraceTopic::Search,
                                &format!(
                                    "null-prune ply={} depth={} beta={} score={}",
                                    ply, depth, beta, null_score
                                ),
                            );
                        }
                        return null_score;
                    }
                }
            }
        }

        if !self.stack.frame(ply).has_static_eval {
            self.ensure_static_eval(ply, &mut static_eval, &mut have_static_eval);
        }
        let improving = self.stack.is_improving(ply);

        let mut moves = MoveList::default();
        self.board.generate_moves(&mut moves, GenStage::All);
        if moves.is_empty() {
            return if in_check { mated_in(ply) } else { DRAW };
        }

        let tt_move = tt_entry.map(|e| e.best_move).unwrap_or_else(BitMove::null);
        let mut scores = [0i32; MAX_MOVES];
        {
            let ctx = OrderingContext {
                board: &*self.board,
                tt_move,
                killers: self.killers[ply],
                history: &self.history,
            };
            score_moves(&moves, &ctx, &mut self.see_cache, &mut scores);
        }

        // Multi-cut: when several of the best candidates already fail high
        // at reduced depth, trust beta without a full search.
        if !in_check
            && self.enable_multi_cut
            && self.multi_cut_threshold > 0
            && self.multi_cut_candidates > 0
            && self.multi_cut_min_depth > 0
            && !in_pv
            && !previous_null
            && ply > 0
            && depth >= self.multi_cut_min_depth
        {
            let reduced_depth = depth - 1 - self.multi_cut_reduction;
            if reduced_depth >= 0 {
                let move_count = moves.len();
                let candidates = (self.multi_cut_candidates as usize).min(move_count);
                if candidates > 0 {
                    let mut order: Vec<usize> = (0..move_count).collect();
                    order.sort_by(|&a, &b| scores[b].cmp(&scores[a]));
                    let history_snapshot = self.history.clone();
                    let killers_snapshot = self.killers;
                    let mut cut_count = 0;
                    for &move_idx in order.iter().take(candidates) {
                        if self.should_abort() {
                            self.history = history_snapshot;
                            self.killers = killers_snapshot;
                            return beta;
                        }
                        let mv = moves[move_idx];
                        if self.is_root_excluded(mv, ply) {
                            continue;
                        }
                        let mut undo = Undo::default();
                        self.board.make(mv, &mut undo);
                        let captured_type = undo.captured.type_of();
                        self.stack.prepare_child(ply, ply + 1, mv, captured_type);
                        let cut_score =
                            -self.negamax(reduced_depth, -beta, -beta + 1, ply + 1, false, false);
                        self.board.unmake(mv, &undo);
                        if self.aborted {
                            self.history = history_snapshot;
                            self.killers = killers_snapshot;
                            return beta;
                        }
                        if cut_score >= beta {
                            cut_count += 1;
                            if cut_count >= self.multi_cut_threshold {
                                self.history = history_snapshot;
                                self.killers = killers_snapshot;
                                if trace_search {
                                    trace_emit(
                                        TraceTopic::Search,
                                        &format!(
                                            "multi-cut ply={} depth={} beta={} cuts={}",
                                            ply, depth, beta, cut_count
                                        ),
                                    );
                                }
                                self.multi_cut_prunes += 1;
                                return beta;
                            }
                        }
                    }
                    self.history = history_snapshot;
                    self.killers = killers_snapshot;
                }
            }
        }

        let singular_extension = match tt_entry {
            Some(ref entry) => {
                self.should_extend_singular(&moves, entry, depth, ply, previous_null)
            }
            None => false,
        };

        let mut best_move = BitMove::null();
        let mut best_score = -INFINITE;
        let mut failed_quiets = [BitMove::null(); MAX_MOVES];
        let mut failed_quiet_count: usize = 0;

        let move_count = moves.len();
        let mut processed: usize = 0;
        for move_index in 0..move_count {
            if self.should_abort() {
                break;
            }
            select_best_move(&mut moves, &mut scores, move_index);
            let mv = moves[move_index];
            if self.is_root_excluded(mv, ply) {
                continue;
            }
            if ply == 0 {
                if let Some(cb) = self.currmove {
                    cb(mv, processed + 1);
                }
            }
            let is_primary = processed == 0;
            let moving_side = self.board.turn();
            let quiet = mv.is_quiet();
            let alpha_before = alpha;
            let cut_node = alpha > alpha_orig;
            let parent_move = self.stack.frame(ply).parent_move;
            let parent_piece = if parent_move.is_null() {
                Piece::None
            } else {
                self.board.piece_at_sq(parent_move.get_dest())
            };
            let parent_capture = self.stack.frame(ply).captured;
            let singular_hit = singular_extension && mv == tt_move;

            let mut undo = Undo::default();
            self.board.make(mv, &mut undo);
            let captured_type = undo.captured.type_of();
            let gives_check = self.board.in_check();

            let mut extension = 0;
            if singular_hit {
                extension = extension.max(1);
            }
            if self.enable_recapture_extension
                && depth <= self.recapture_extension_depth
                && !parent_move.is_null()
                && parent_capture != PieceType::None
                && mv.is_capture()
                && mv.get_dest() == parent_move.get_dest()
            {
                self.recapture_extensions += 1;
                if trace_search {
                    trace_emit(
                        TraceTopic::Search,
                        &format!("extend-recapture ply={} move={} depth={}", ply, mv, depth),
                    );
                }
                extension = extension.max(1);
            }
            if self.enable_check_extension && gives_check && depth <= self.check_extension_depth
            {
                self.check_extensions += 1;
                if trace_search {
                    trace_emit(
                        TraceTopic::Search,
                        &format!("extend-check ply={} move={} depth={}", ply, mv, depth),
                    );
                }
                extension = extension.max(1);
            }
            extension = extension.min(2);
            let next_depth = depth - 1 + extension;

            let root_node = ply == 0;
            let mut reduction = 0;
            let allow_lmr = !is_primary && !in_check && extension == 0 && (!in_pv || root_node);
            let allow_reduction = allow_lmr && !root_node && quiet;
            if allow_reduction
                && next_depth > 1
                && depth >= self.lmr_min_depth
                && processed as i32 + 1 >= self.lmr_min_move
            {
                let depth_idx = (depth as usize).min(MAX_LMR_DEPTH - 1);
                let move_order = (processed + 1).min(MAX_LMR_MOVES - 1);
                let history_score = self.history.get(moving_side, mv);
                let mut base = LMR_TABLE[usize::from(in_pv)][depth_idx][move_order];
                if !improving && base > 0 {
                    base += 1;
                }
                if cut_node {
                    base += 1;
                }
                if history_score > 0 {
                    base -= history_score / HISTORY_REDUCTION_SCALE;
                } else if history_score < 0 {
                    base += (-history_score) / HISTORY_REDUCTION_SCALE;
                }
                reduction = base.clamp(0, next_depth - 1);
            }

            self.stack.prepare_child(ply, ply + 1, mv, captured_type);
            if gives_check {
                reduction = 0;
            }

            let mut search_depth = next_depth;
            let lmr_used = reduction > 0;
            if lmr_used {
                search_depth = (next_depth - reduction).max(1);
                self.lmr_reductions += 1;
                if trace_search {
                    trace_emit(
                        TraceTopic::Search,
                        &format!(
                            "lmr-reduce ply={} move={} depth={} reduction={}",
                            ply, mv, depth, reduction
                        ),
                    );
                }
            }

            let mut score;
            let mut searched_full_window = false;
            if is_primary {
                score = -self.negamax(search_depth, -beta, -alpha, ply + 1, in_pv, false);
                searched_full_window = true;
            } else {
                let null_window_beta = (alpha + 1).min(INFINITE);
                score =
                    -self.negamax(search_depth, -null_window_beta, -alpha, ply + 1, false, false);
                if lmr_used && !self.aborted && score > alpha {
                    score = -self.negamax(
                        next_depth,
                        -null_window_beta,
                        -alpha,
                        ply + 1,
                        false,
                        false,
                    );
                }
                if !self.aborted && score > alpha && score < beta {
                    if trace_search {
                        trace_emit(
                            TraceTopic::Search,
                            &format!(
                                "pvs-research ply={} move={} alpha={} beta={} score={}",
                                ply, mv, alpha, beta, score
                            ),
                        );
                    }
                    score = -self.negamax(next_depth, -beta, -alpha, ply + 1, in_pv, false);
                    searched_full_window = true;
                }
            }
            self.board.unmake(mv, &undo);
            processed += 1;

            if quiet && score <= alpha_before && failed_quiet_count < failed_quiets.len() {
                failed_quiets[failed_quiet_count] = mv;
                failed_quiet_count += 1;
            }

            if self.aborted {
                break;
            }

            if score > best_score {
                best_score = score;
                best_move = mv;
                if searched_full_window && in_pv {
                    self.pv.set(ply, mv);
                }
            }

            if score > alpha {
                alpha = score;
                if quiet {
                    let bonus = QUIET_HISTORY_BONUS * depth * depth;
                    self.update_quiet_stats(moving_side, mv, parent_move, parent_piece, bonus);
                }
            }

            if alpha >= beta {
                if quiet {
                    self.update_killers(ply, mv);
                    let bonus = QUIET_HISTORY_BONUS * depth * depth;
                    self.update_quiet_stats(moving_side, mv, parent_move, parent_piece, bonus);
                }
                let penalty = QUIET_HISTORY_BONUS * depth;
                for idx in 0..failed_quiet_count {
                    self.update_quiet_stats(
                        moving_side,
                        failed_quiets[idx],
                        parent_move,
                        parent_piece,
                        -penalty,
                    );
                }
                self.quiet_penalties += failed_quiet_count as i32;
                break;
            }
        }

        if best_score == -INFINITE {
            // Nothing was searched: every move excluded or an abort hit
            // before the first child. Fall back to the static picture.
            self.ensure_static_eval(ply, &mut static_eval, &mut have_static_eval);
            best_score = static_eval;
            if in_pv {
                self.pv.reset_row(ply);
            }
        }

        let bound = if best_score <= alpha_orig {
            NodeBound::Upper
        } else if best_score >= beta {
            NodeBound::Lower
        } else {
            NodeBound::Exact
        };

        if self.aborted {
            return best_score;
        }

        let stored_eval = if have_static_eval { static_eval } else { best_score };
        self.tt.store(
            zob,
            Entry {
                key: 0,
                best_move,
                score: best_score as i16,
                eval: stored_eval as i16,
                depth: depth.clamp(0, 255) as u8,
                generation: 0,
                bound,
            },
        );

        best_score
    }

    /// Quiescence: resolves captures (and check evasions) until the position
    /// goes quiet.
    fn qsearch(&mut self, mut alpha: i32, beta: i32, ply: usize) -> i32 {
        self.nodes += 1;
        if self.node_cap >= 0 && self.nodes > self.node_cap {
            self.aborted = true;
            return alpha;
        }
        self.seldepth = self.seldepth.max(ply as i32 + 1);
        if self.should_abort() {
            return alpha;
        }
        if ply >= MAX_PLY - 1 {
            return eval::evaluate(self.board);
        }

        let in_check = self.board.in_check();
        if in_check {
            let mut evasions = MoveList::default();
            self.board.generate_moves(&mut evasions, GenStage::All);
            if evasions.is_empty() {
                return mated_in(ply);
            }
            let mut best = -INFINITE;
            let mut undo = Undo::default();
            for mv in evasions.iter() {
                self.board.make(*mv, &mut undo);
                let score = -self.qsearch(-beta, -alpha, ply + 1);
                self.board.unmake(*mv, &undo);
                if score > best {
                    best = score;
                }
                if score > alpha {
                    alpha = score;
                }
                if self.aborted || alpha >= beta {
                    break;
                }
            }
            return best;
        }

        let stand_pat = eval::evaluate(self.board);
        let trace_q = trace_enabled(TraceTopic::QSearch);
        if trace_q {
            trace_emit(
                TraceTopic::QSearch,
                &format!(
                    "node ply={} stand_pat={} alpha={} beta={}",
                    ply, stand_pat, alpha, beta
                ),
            );
        }
        if stand_pat >= beta {
            return stand_pat;
        }
        let mut best = stand_pat;
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let mut moves = MoveList::default();
        self.board.generate_moves(&mut moves, GenStage::Captures);
        if moves.is_empty() {
            return stand_pat;
        }

        let mut scores = [0i32; MAX_MOVES];
        {
            let ctx = OrderingContext {
                board: &*self.board,
                tt_move: BitMove::null(),
                killers: self.killers[ply],
                history: &self.history,
            };
            score_moves(&moves, &ctx, &mut self.see_cache, &mut scores);
        }

        let move_count = moves.len();
        let mut undo = Undo::default();
        for move_index in 0..move_count {
            select_best_move(&mut moves, &mut scores, move_index);
            let mv = moves[move_index];
            let margin = capture_margin(self.board, mv);
            let see_gain = cached_see(self.board, mv, &mut self.see_cache);
            let delta_pruned = stand_pat + see_gain + QSEARCH_DELTA_MARGIN < alpha;
            if *QSEARCH_PROBE {
                log::debug!(
                    "qsearch probe ply={} move={} margin={} see={} stand_pat={} alpha={} pruned={}",
                    ply,
                    mv,
                    margin,
                    see_gain,
                    stand_pat,
                    alpha,
                    delta_pruned
                );
            }
            if trace_q {
                trace_emit(
                    TraceTopic::QSearch,
                    &format!(
                        "candidate ply={} move={} margin={} see={} pruned={}",
                        ply,
                        mv,
                        margin,
                        see_gain,
                        u8::from(delta_pruned)
                    ),
                );
            }
            if delta_pruned {
                continue;
            }
            self.board.make(mv, &mut undo);
            let score = -self.qsearch(-beta, -alpha, ply + 1);
            self.board.unmake(mv, &undo);
            if score > best {
                best = score;
            }
            if score > alpha {
                alpha = score;
            }
            if self.aborted || alpha >= beta {
                break;
            }
        }

        best
    }

    /// Null moves need real material: the mover keeps at least one non-pawn
    /// piece and the board is not down to a single piece overall.
    fn has_null_material(&self) -> bool {
        let own = i32::from(self.board.non_pawn_piece_count(self.board.turn()));
        let opp = i32::from(self.board.non_pawn_piece_count(!self.board.turn()));
        own > 0 && own + opp > 1
    }
}

fn aspiration_margin(depth: i32) -> i32 {
    (ASPIRATION_BASE + ASPIRATION_SCALE * (depth - 1).max(0)).clamp(32, INFINITE)
}

/// Runs a search over `root` within `limits`.
///
/// `stop_flag` is the cooperative cancellation channel: the caller
/// release-stores `true` and the search acquire-loads it at every node.
/// `progress` fires after each completed iterative-deepening iteration;
/// `currmove` fires as each root move starts.
pub fn search(
    root: &mut Board,
    limits: &Limits,
    stop_flag: Option<&AtomicBool>,
    progress: Option<&ProgressFn>,
    currmove: Option<&CurrmoveFn>,
) -> SearchResult {
    let trace_search = trace_enabled(TraceTopic::Search);
    if trace_search {
        trace_emit(
            TraceTopic::Search,
            &format!(
                "start stm={} depth_limit={} node_limit={} movetime_ms={} zobrist={:#018x}",
                root.turn(),
                limits.depth,
                limits.nodes,
                limits.movetime_ms,
                root.zobrist()
            ),
        );
    }

    let time_budget = compute_time_budget(limits, root.turn());
    let mut searcher = Searcher::new(root, limits, stop_flag, currmove);
    searcher.see_cache.clear();
    searcher.hard_time_ms = time_budget.hard_ms;
    searcher.soft_time_ms = time_budget.soft_ms.min(time_budget.hard_ms);
    searcher.use_time = searcher.hard_time_ms > 0;
    if !searcher.use_time {
        searcher.soft_time_ms = 0;
    }
    searcher.start_time = Instant::now();

    // Depth never usefully exceeds the ply cap.
    let max_depth = if limits.depth > 0 {
        i32::from(limits.depth).min(MAX_PLY as i32 - 1)
    } else {
        1
    };
    let requested_multipv = limits.multipv.clamp(1, MAX_MOVES);

    let mut result = SearchResult::default();
    let mut last_completed = result.clone();
    let mut have_completed = false;

    let mut multipv_lines: Vec<PVLine> = vec![PVLine::default(); requested_multipv];
    let mut previous_scores: Vec<i32> = vec![0; requested_multipv];
    let mut have_previous: Vec<bool> = vec![false; requested_multipv];
    let mut active_multipv = requested_multipv;
    let mut generation: u8 = 0;

    'deepening: for current_depth in 1..=max_depth {
        generation = generation.wrapping_add(1);
        searcher.tt.set_generation(generation);
        result.depth = current_depth;
        let mut aborted_depth = false;
        let mut produced_lines: usize = 0;

        if let Some(flag) = stop_flag {
            if flag.load(Ordering::Acquire) {
                searcher.aborted = true;
                break 'deepening;
            }
        }

        for pv_index in 0..active_multipv {
            searcher.root_exclude_count = pv_index;
            for idx in 0..pv_index {
                searcher.root_excludes[idx] = multipv_lines[idx].best;
            }

            let mut alpha = -INFINITE;
            let mut beta = INFINITE;
            let mut window = aspiration_margin(current_depth);
            let mut score = 0;
            let mut use_aspiration = have_previous[pv_index];
            let previous_score = previous_scores[pv_index];

            if use_aspiration {
                alpha = (previous_score - window).max(-INFINITE);
                beta = (previous_score + window).min(INFINITE);
                if alpha >= beta {
                    alpha = -INFINITE;
                    beta = INFINITE;
                    use_aspiration = false;
                } else if trace_search {
                    trace_emit(
                        TraceTopic::Search,
                        &format!(
                            "aspiration start depth={} multipv={} alpha={} beta={} window={}",
                            current_depth,
                            pv_index + 1,
                            alpha,
                            beta,
                            window
                        ),
                    );
                }
            }

            loop {
                searcher.pv.clear();
                if searcher.should_abort() {
                    aborted_depth = true;
                    break;
                }
                searcher.stack.prepare_root();
                score = searcher.negamax(current_depth, alpha, beta, 0, true, false);
                if searcher.aborted {
                    aborted_depth = true;
                    break;
                }
                if !use_aspiration {
                    break;
                }

                if score <= alpha {
                    if trace_search {
                        trace_emit(
                            TraceTopic::Search,
                            &format!(
                                "aspiration fail-low depth={} multipv={} score={} alpha={} beta={}",
                                current_depth,
                                pv_index + 1,
                                score,
                                alpha,
                                beta
                            ),
                        );
                    }
                    if alpha <= -INFINITE {
                        use_aspiration = false;
                        alpha = -INFINITE;
                        beta = INFINITE;
                        continue;
                    }
                    window = (window * 2).min(INFINITE);
                    alpha = (score - window).max(-INFINITE);
                    beta = (score + window).min(INFINITE);
                    if alpha >= beta || (alpha <= -INFINITE && beta >= INFINITE) {
                        use_aspiration = false;
                        alpha = -INFINITE;
                        beta = INFINITE;
                    }
                    continue;
                }

                if score >= beta {
                    if trace_search {
                        trace_emit(
                            TraceTopic::Search,
                            &format!(
                                "aspiration fail-high depth={} multipv={} score={} alpha={} beta={}",
                                current_depth,
                                pv_index + 1,
                                score,
                                alpha,
                                beta
                            ),
                        );
                    }
                    if beta >= INFINITE {
                        use_aspiration = false;
                        alpha = -INFINITE;
                        beta = INFINITE;
                        continue;
                    }
                    window = (window * 2).min(INFINITE);
                    alpha = (score - window).max(-INFINITE);
                    beta = (score + window).min(INFINITE);
                    if alpha >= beta || (alpha <= -INFINITE && beta >= INFINITE) {
                        use_aspiration = false;
                        alpha = -INFINITE;
                        beta = INFINITE;
                    }
                    continue;
                }

                break;
            }

            let root_line = searcher.pv.extract(0);
            let line = PVLine {
                best: root_line.first().copied().unwrap_or_else(BitMove::null),
                line: root_line,
                eval: score,
            };
            let line_best = line.best;
            multipv_lines[pv_index] = line;
            previous_scores[pv_index] = score;
            have_previous[pv_index] = true;
            produced_lines += 1;

            if line_best.is_null() {
                if pv_index == 0 {
                    active_multipv = 1;
                } else {
                    active_multipv = pv_index;
                    produced_lines -= 1;
                }
                break;
            }
            if aborted_depth {
                break;
            }
        }

        searcher.root_exclude_count = 0;
        result.nodes = searcher.nodes;

        let available = active_multipv.min(produced_lines);
        if available > 0 {
            result.lines = multipv_lines[..available].to_vec();
            let primary = &result.lines[0];
            result.best_move = primary.best;
            result.pv = primary.line.clone();
            result.eval = primary.eval;
            result.seldepth = searcher.seldepth;
            result.hashfull = searcher.tt.hashfull();
            result.elapsed_ms = elapsed_ms(searcher.start_time);
            last_completed = result.clone();
            have_completed = true;
            if let Some(cb) = progress {
                cb(&result);
            }
        }

        if searcher.aborted || aborted_depth {
            break 'deepening;
        }
    }

    if searcher.aborted && have_completed {
        result = last_completed;
    }

    result.nodes = searcher.nodes;
    result.primary_killer = searcher.killers[0][0];
    result.history_bonus = if result.best_move.is_null() {
        0
    } else {
        searcher.history.get(searcher.board.turn(), result.best_move)
    };
    result.static_futility_prunes = searcher.static_futility_prunes;
    result.razor_prunes = searcher.razor_prunes;
    result.multi_cut_prunes = searcher.multi_cut_prunes;
    result.null_prunes = searcher.null_prunes;
    result.null_attempts = searcher.null_attempts;
    result.null_verifications = searcher.null_verifications;
    result.lmr_reductions = searcher.lmr_reductions;
    result.recapture_extensions = searcher.recapture_extensions;
    result.check_extensions = searcher.check_extensions;
    result.quiet_penalties = searcher.quiet_penalties;
    result.elapsed_ms = elapsed_ms(searcher.start_time);
    result.seldepth = searcher.seldepth;
    result.hashfull = searcher.tt.hashfull();

    // With no best move at all, fall back to any legal move, then to a TT
    // move at the root key.
    if result.best_move.is_null() {
        let moves = searcher.board.legal_moves(GenStage::All);
        if let Some(first) = moves.iter().next() {
            result.best_move = *first;
            result.pv = vec![*first];
            if result.lines.is_empty() {
                result.lines.push(PVLine {
                    best: *first,
                    line: result.pv.clone(),
                    eval: result.eval,
                });
            } else {
                result.lines[0].best = *first;
                if result.lines[0].line.is_empty() {
                    result.lines[0].line = result.pv.clone();
                }
            }
        }
    }

    let root_entry = searcher.tt.probe(searcher.board.zobrist());
    result.tt_hit = root_entry.is_some();
    if result.best_move.is_null() {
        if let Some(entry) = root_entry {
            if !entry.best_move.is_null() {
                result.best_move = entry.best_move;
                result.pv = vec![entry.best_move];
                if result.lines.is_empty() {
                    result.lines.push(PVLine {
                        best: entry.best_move,
                        line: result.pv.clone(),
                        eval: result.eval,
                    });
                }
            }
        }
    }
    result.aborted = searcher.aborted;

    if trace_search {
        trace_emit(
            TraceTopic::Search,
            &format!(
                "finish depth={} nodes={} eval={} best={}",
                result.depth,
                result.nodes,
                result.eval,
                result.best_move
            ),
        );
    }
    result
}
