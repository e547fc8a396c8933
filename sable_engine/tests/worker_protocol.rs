//! The background search worker: command ordering, the stop protocol, the
//! snapshot, and the streamed info/bestmove lines.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use sable::Board;
use sable_engine::worker::SearchWorker;
use sable_engine::Limits;

fn collecting_worker() -> (SearchWorker, Arc<Mutex<Vec<String>>>) {
    let worker = SearchWorker::new();
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lines);
    worker.bind_writer(Box::new(move |line: &str| {
        sink.lock().unwrap().push(line.to_string());
    }));
    (worker, lines)
}

#[test]
fn fixed_depth_search_reports_and_idles() {
    let (mut worker, lines) = collecting_worker();
    worker.start(Board::start_pos(), Limits::depth(3));
    worker.wait_idle();

    let snapshot = worker.last_snapshot().expect("a search ran");
    assert!(!snapshot.stopped);
    assert!(!snapshot.result.best_move.is_null());
    assert_eq!(snapshot.result.depth, 3);

    let lines = lines.lock().unwrap();
    assert!(lines.iter().any(|l| l.starts_with("info ")));
    let best_line = lines
        .iter()
        .rev()
        .find(|l| l.starts_with("bestmove "))
        .expect("terminal bestmove line");
    assert_eq!(
        best_line,
        &format!("bestmove {}", snapshot.result.best_move.stringify())
    );
    drop(lines);
    worker.shutdown();
}

#[test]
fn stop_interrupts_infinite_search() {
    let (mut worker, lines) = collecting_worker();
    worker.start(Board::start_pos(), Limits::infinite());
    thread::sleep(Duration::from_millis(100));

    let begin = Instant::now();
    worker.request_stop();
    worker.wait_idle();
    assert!(
        begin.elapsed() < Duration::from_secs(5),
        "stop took too long"
    );

    let snapshot = worker.last_snapshot().expect("a search ran");
    assert!(snapshot.stopped);
    assert!(snapshot.result.aborted);
    assert!(
        !snapshot.result.best_move.is_null(),
        "an interrupted infinite search still reports its last best move"
    );
    assert!(lines
        .lock()
        .unwrap()
        .iter()
        .any(|l| l.starts_with("bestmove ")));
    worker.shutdown();
}

#[test]
fn sequential_starts_process_in_order() {
    let (mut worker, _lines) = collecting_worker();

    worker.start(Board::start_pos(), Limits::depth(2));
    worker.wait_idle();
    let first = worker.last_snapshot().unwrap();

    let kiwipete =
        Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1", true)
            .unwrap();
    worker.start(kiwipete.clone(), Limits::depth(2));
    worker.wait_idle();
    let second = worker.last_snapshot().unwrap();

    assert_eq!(first.board.to_fen(), Board::start_pos().to_fen());
    assert_eq!(second.board.to_fen(), kiwipete.to_fen());
    worker.shutdown();
}

#[test]
fn stop_while_idle_is_a_no_op() {
    let (mut worker, _lines) = collecting_worker();
    worker.request_stop();
    assert!(!worker.is_busy());

    // The worker still accepts and completes work afterwards.
    worker.start(Board::start_pos(), Limits::depth(1));
    worker.wait_idle();
    assert!(worker.last_snapshot().is_some());
    worker.shutdown();
}

#[test]
fn shutdown_is_idempotent() {
    let (mut worker, _lines) = collecting_worker();
    worker.start(Board::start_pos(), Limits::depth(1));
    worker.wait_idle();
    worker.shutdown();
    worker.shutdown();
}
