//! Search configuration shared between the front-end, the driver, and the
//! time manager. Every pruning and extension heuristic is individually
//! switchable so tools can isolate their effects.

/// Default minimum depth before late-move reductions apply.
pub const LMR_MIN_DEPTH_DEFAULT: i32 = 2;
/// Default move index before late-move reductions apply.
pub const LMR_MIN_MOVE_DEFAULT: i32 = 2;

/// Limits and knobs for one `search` call.
///
/// Negative values mean "unset" for the clock fields; `depth` of -1 searches
/// to depth 1.
#[derive(Clone, Debug)]
pub struct Limits {
    pub movetime_ms: i64,
    pub nodes: i64,
    pub depth: i16,
    pub wtime_ms: i64,
    pub btime_ms: i64,
    pub winc_ms: i64,
    pub binc_ms: i64,
    pub movestogo: i32,
    pub mate: i32,
    pub multipv: usize,
    pub infinite: bool,

    pub lmr_min_depth: i32,
    pub lmr_min_move: i32,
    pub enable_static_futility: bool,
    pub static_futility_margin: i32,
    pub static_futility_depth: i32,
    pub enable_razoring: bool,
    pub razor_margin: i32,
    pub razor_depth: i32,
    pub enable_multi_cut: bool,
    pub multi_cut_min_depth: i32,
    pub multi_cut_reduction: i32,
    pub multi_cut_candidates: i32,
    pub multi_cut_threshold: i32,
    pub enable_null_move: bool,
    pub null_min_depth: i32,
    pub null_base_reduction: i32,
    pub null_depth_scale: i32,
    pub null_eval_margin: i32,
    pub null_verification_depth: i32,
    pub enable_recapture_extension: bool,
    pub enable_check_extension: bool,
    pub recapture_extension_depth: i32,
    pub check_extension_depth: i32,
    /// Margin for the singular-extension probe; 0 disables it. Injected here
    /// rather than held as process-wide state.
    pub singular_margin: i32,
}

impl Default for Limits {
    fn default() -> Limits {
        Limits {
            movetime_ms: -1,
            nodes: -1,
            depth: -1,
            wtime_ms: -1,
            btime_ms: -1,
            winc_ms: 0,
            binc_ms: 0,
            movestogo: -1,
            mate: -1,
            multipv: 1,
            infinite: false,
            lmr_min_depth: LMR_MIN_DEPTH_DEFAULT,
            lmr_min_move: LMR_MIN_MOVE_DEFAULT,
            enable_static_futility: true,
            static_futility_margin: 128,
            static_futility_depth: 1,
            enable_razoring: true,
            razor_margin: 256,
            razor_depth: 1,
            enable_multi_cut: true,
            multi_cut_min_depth: 4,
            multi_cut_reduction: 2,
            multi_cut_candidates: 8,
            multi_cut_threshold: 3,
            enable_null_move: true,
            null_min_depth: 2,
            null_base_reduction: 2,
            null_depth_scale: 4,
            null_eval_margin: 120,
            null_verification_depth: 1,
            enable_recapture_extension: true,
            enable_check_extension: true,
            recapture_extension_depth: 4,
            check_extension_depth: 3,
            singular_margin: 50,
        }
    }
}

impl Limits {
    /// A fixed-depth limit, the shape most tests want.
    pub fn depth(depth: i16) -> Limits {
        Limits {
            depth,
            ..Limits::default()
        }
    }

    /// A fixed move-time limit in milliseconds.
    pub fn movetime(ms: i64) -> Limits {
        Limits {
            movetime_ms: ms,
            depth: i16::MAX,
            ..Limits::default()
        }
    }

    /// An infinite search, stopped only by the stop flag.
    pub fn infinite() -> Limits {
        Limits {
            infinite: true,
            depth: i16::MAX,
            ..Limits::default()
        }
    }
}
