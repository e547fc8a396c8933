//! End-to-end search scenarios: forced captures, promotions, mates, the
//! stop protocol, node caps, MultiPV, and the aspiration-window tracing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use sable::tools::trace::{set_trace_topic, set_trace_writer, TraceTopic};
use sable::Board;
use sable_engine::consts::MATE_THRESHOLD;
use sable_engine::search::search;
use sable_engine::Limits;

#[test]
fn queen_takes_queen_at_depth_one() {
    let mut board = Board::from_fen("4k3/8/8/4q3/4Q3/8/8/4K3 w - - 0 1", true).unwrap();
    let result = search(&mut board, &Limits::depth(1), None, None, None);
    assert_eq!(result.best_move.stringify(), "e4e5");
    assert!(result.eval > 0, "winning a queen must score positive");
    assert!(!result.aborted);
    assert_eq!(result.depth, 1);
}

#[test]
fn capturing_promotion_at_depth_two() {
    let mut board = Board::from_fen("4k2r/6P1/8/8/8/8/8/4K3 w - - 0 1", true).unwrap();
    let result = search(&mut board, &Limits::depth(2), None, None, None);
    assert_eq!(result.best_move.stringify(), "g7h8q");
    assert!(result.eval > 0);
}

#[test]
fn finds_mate_in_one() {
    let mut board = Board::from_fen("4k3/8/4K3/8/8/8/8/7Q w - - 0 1", true).unwrap();
    let result = search(&mut board, &Limits::depth(3), None, None, None);
    let best = result.best_move.stringify();
    assert!(
        best == "h1h8" || best == "h1a8",
        "expected a mating queen lift, got {}",
        best
    );
    assert!(
        result.eval >= MATE_THRESHOLD,
        "mate must be reported as a mate score, got {}",
        result.eval
    );
}

#[test]
fn stalemate_scores_draw() {
    // Black to move, no legal moves, not in check.
    let mut board = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", true).unwrap();
    let result = search(&mut board, &Limits::depth(2), None, None, None);
    assert_eq!(result.eval, 0);
    assert!(result.best_move.is_null());
}

#[test]
fn node_cap_aborts_search() {
    let mut board = Board::start_pos();
    let mut limits = Limits::depth(12);
    limits.nodes = 500;
    let result = search(&mut board, &limits, None, None, None);
    assert!(result.aborted);
    assert!(result.nodes <= 1_000, "node cap ignored: {}", result.nodes);
}

#[test]
fn stop_flag_interrupts_infinite_search() {
    let mut board = Board::start_pos();
    let stop = Arc::new(AtomicBool::new(false));
    let stopper = Arc::clone(&stop);
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(80));
        stopper.store(true, Ordering::Release);
    });

    let begin = Instant::now();
    let result = search(&mut board, &Limits::infinite(), Some(&stop), None, None);
    let took = begin.elapsed();
    handle.join().unwrap();

    assert!(result.aborted);
    assert!(
        took < Duration::from_secs(5),
        "stop flag was not honoured within slack: {:?}",
        took
    );
    assert!(
        !result.best_move.is_null(),
        "completed iterations should have produced a move"
    );
}

#[test]
fn movetime_is_respected() {
    let mut board = Board::start_pos();
    let stop = AtomicBool::new(false);
    let begin = Instant::now();
    let result = search(&mut board, &Limits::movetime(60), Some(&stop), None, None);
    let took = begin.elapsed();
    assert!(
        took < Duration::from_secs(5),
        "hard time ceiling missed: {:?}",
        took
    );
    assert!(!result.best_move.is_null());
}

#[test]
fn multipv_produces_distinct_ranked_lines() {
    let mut board = Board::start_pos();
    let mut limits = Limits::depth(2);
    limits.multipv = 3;
    let result = search(&mut board, &limits, None, None, None);
    assert_eq!(result.lines.len(), 3);
    let bests: Vec<String> = result.lines.iter().map(|l| l.best.stringify()).collect();
    for (i, a) in bests.iter().enumerate() {
        for b in bests.iter().skip(i + 1) {
            assert_ne!(a, b, "multipv lines repeat a root move");
        }
    }
    assert!(bests.iter().all(|b| b != "0000"));
    assert_eq!(result.best_move, result.lines[0].best);
}

#[test]
fn progress_reports_every_iteration() {
    let mut board = Board::start_pos();
    let depths = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&depths);
    let progress = move |partial: &sable_engine::SearchResult| {
        sink.lock().unwrap().push(partial.depth);
    };
    let progress_ref: &sable_engine::search::ProgressFn = &progress;
    let result = search(&mut board, &Limits::depth(4), None, Some(progress_ref), None);
    assert!(!result.aborted);
    assert_eq!(*depths.lock().unwrap(), vec![1, 2, 3, 4]);
}

#[test]
fn currmove_reports_root_moves() {
    let mut board = Board::start_pos();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let currmove = move |mv: sable::BitMove, number: usize| {
        sink.lock().unwrap().push((mv.stringify(), number));
    };
    let currmove_ref: &sable_engine::search::CurrmoveFn = &currmove;
    search(&mut board, &Limits::depth(1), None, None, Some(currmove_ref));
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 20, "all root moves should be announced");
    assert_eq!(seen[0].1, 1, "currmove numbering is 1-based");
}

#[test]
fn aspiration_window_engages_and_fails() {
    // Black's passed pawn promotes on its first reply, which quiescence
    // cannot see; the score collapses between iterations by far more than
    // the aspiration window, forcing a re-search.
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lines);
    set_trace_writer(Some(Box::new(move |line: &str| {
        sink.lock().unwrap().push(line.to_string());
    })));
    set_trace_topic(TraceTopic::Search, true);

    let mut board = Board::from_fen("6k1/8/8/7K/8/8/p6P/8 w - - 0 1", true).unwrap();
    search(&mut board, &Limits::depth(4), None, None, None);

    set_trace_topic(TraceTopic::Search, false);
    set_trace_writer(None);

    let lines = lines.lock().unwrap();
    assert!(
        lines.iter().any(|l| l.contains("aspiration start")),
        "aspiration windows never opened"
    );
    assert!(
        lines
            .iter()
            .any(|l| l.contains("fail-low") || l.contains("fail-high")),
        "no aspiration fail event was traced"
    );
}

#[test]
fn search_leaves_board_intact() {
    let mut board = Board::from_fen(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        true,
    )
    .unwrap();
    let fen_before = board.to_fen();
    let key_before = board.zobrist();
    search(&mut board, &Limits::depth(3), None, None, None);
    assert_eq!(board.to_fen(), fen_before);
    assert_eq!(board.zobrist(), key_before);
}

#[test]
fn heuristic_counters_accumulate() {
    let mut board = Board::from_fen(
        "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
        true,
    )
    .unwrap();
    let result = search(&mut board, &Limits::depth(6), None, None, None);
    assert!(!result.aborted);
    assert!(result.nodes > 0);
    assert!(result.seldepth >= result.depth);
    // A depth-6 middlegame search exercises at least the cheap heuristics.
    assert!(
        result.null_attempts > 0 || result.lmr_reductions > 0 || result.static_futility_prunes > 0,
        "no pruning heuristic ever fired"
    );
}

#[test]
fn disabled_heuristics_stay_silent() {
    let mut board = Board::start_pos();
    let mut limits = Limits::depth(4);
    limits.enable_null_move = false;
    limits.enable_razoring = false;
    limits.enable_static_futility = false;
    limits.enable_multi_cut = false;
    let result = search(&mut board, &limits, None, None, None);
    assert_eq!(result.null_attempts, 0);
    assert_eq!(result.null_prunes, 0);
    assert_eq!(result.razor_prunes, 0);
    assert_eq!(result.static_futility_prunes, 0);
    assert_eq!(result.multi_cut_prunes, 0);
    assert!(!result.best_move.is_null());
}
