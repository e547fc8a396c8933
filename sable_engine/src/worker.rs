//! The background search worker: one dedicated thread owning a board and a
//! search, driven through a lock-free single-producer/single-consumer ring
//! buffer of commands.
//!
//! The control thread enqueues `Start`/`Stop`/`Quit`; the worker processes
//! them strictly in order. Cancellation happens through one atomic stop flag
//! that the control thread release-stores and the search acquire-loads at
//! every node. Progress and the terminal best-move line stream through an
//! injectable writer so a UCI front-end (or a test) can capture them.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use sable::{BitMove, Board};

use crate::consts::{MATE, MATE_THRESHOLD};
use crate::params::Limits;
use crate::search::{search, SearchResult};
use crate::sync::GuardedBool;

/// Capacity of the command ring; commands are tiny and drained quickly.
const QUEUE_CAPACITY: usize = 32;

/// Receives each output line (`info ...`, `bestmove ...`).
pub type LineWriter = Box<dyn Fn(&str) + Send + Sync>;

/// A copy of the most recent search, for controllers that poll.
#[derive(Clone)]
pub struct SearchSnapshot {
    pub board: Board,
    pub result: SearchResult,
    pub limits: Limits,
    pub stopped: bool,
}

enum Command {
    Start(Box<(Board, Limits)>),
    Stop,
    Quit,
}

/// Lock-free single-producer/single-consumer ring buffer.
///
/// # Safety
///
/// Exactly one thread may push and exactly one may pop; the head/tail
/// release/acquire pairs make the slot writes visible across that boundary.
struct SpscQueue<T> {
    buffer: Box<[UnsafeCell<Option<T>>]>,
    head: AtomicUsize,
    tail: AtomicUsize,
}

unsafe impl<T: Send> Send for SpscQueue<T> {}
unsafe impl<T: Send> Sync for SpscQueue<T> {}

impl<T> SpscQueue<T> {
    fn new(capacity: usize) -> SpscQueue<T> {
        assert!(capacity > 1);
        let mut buffer = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            buffer.push(UnsafeCell::new(None));
        }
        SpscQueue {
            buffer: buffer.into_boxed_slice(),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    #[inline]
    fn increment(&self, idx: usize) -> usize {
        (idx + 1) % self.buffer.len()
    }

    /// Producer side. Returns false when the ring is full.
    fn push(&self, item: T) -> Result<(), T> {
        let head = self.head.load(Ordering::Relaxed);
        let next = self.increment(head);
        if next == self.tail.load(Ordering::Acquire) {
            return Err(item);
        }
        unsafe {
            *self.buffer[head].get() = Some(item);
        }
        self.head.store(next, Ordering::Release);
        Ok(())
    }

    /// Consumer side.
    fn pop(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }
        let item = unsafe { (*self.buffer[tail].get()).take() };
        self.tail.store(self.increment(tail), Ordering::Release);
        item
    }
}

struct WorkerShared {
    queue: SpscQueue<Command>,
    stop_flag: AtomicBool,
    busy: GuardedBool,
    snapshot: Mutex<Option<SearchSnapshot>>,
    writer: Mutex<Option<LineWriter>>,
}

impl WorkerShared {
    fn write_line(&self, line: &str) {
        let guard = self.writer.lock().unwrap();
        if let Some(writer) = guard.as_ref() {
            writer(line);
        } else {
            println!("{}", line);
        }
    }
}

/// Owns the worker thread and the control-side handles.
pub struct SearchWorker {
    shared: Arc<WorkerShared>,
    handle: Option<thread::JoinHandle<()>>,
    shutdown_requested: AtomicBool,
}

impl SearchWorker {
    /// Spawns the worker thread, idle until the first `start`.
    pub fn new() -> SearchWorker {
        let shared = Arc::new(WorkerShared {
            queue: SpscQueue::new(QUEUE_CAPACITY),
            stop_flag: AtomicBool::new(false),
            busy: GuardedBool::new(false),
            snapshot: Mutex::new(None),
            writer: Mutex::new(None),
        });
        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("sable-search".to_string())
            .spawn(move || run_worker(thread_shared))
            .expect("worker thread spawns");
        SearchWorker {
            shared,
            handle: Some(handle),
            shutdown_requested: AtomicBool::new(false),
        }
    }

    /// Installs the writer receiving `info` and `bestmove` lines. With no
    /// writer installed, lines go to stdout.
    pub fn bind_writer(&self, writer: LineWriter) {
        *self.shared.writer.lock().unwrap() = Some(writer);
    }

    /// Enqueues a search over `board` under `limits`.
    pub fn start(&self, board: Board, limits: Limits) {
        self.shared.busy.set(true);
        self.push(Command::Start(Box::new((board, limits))));
    }

    /// Raises the stop flag. A no-op when the worker is idle.
    pub fn request_stop(&self) {
        self.shared.stop_flag.store(true, Ordering::Release);
        if !self.shared.busy.get() {
            return;
        }
        self.push(Command::Stop);
    }

    /// Blocks until the worker has no search in flight.
    pub fn wait_idle(&self) {
        self.shared.busy.wait(false);
    }

    /// Returns whether a search is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.shared.busy.get()
    }

    /// Returns a copy of the most recent completed search, if any.
    pub fn last_snapshot(&self) -> Option<SearchSnapshot> {
        self.shared.snapshot.lock().unwrap().clone()
    }

    /// Enqueues `Quit` and joins the worker thread. Idempotent.
    pub fn shutdown(&mut self) {
        if !self.shutdown_requested.swap(true, Ordering::AcqRel) {
            self.push(Command::Quit);
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
        }
    }

    fn push(&self, command: Command) {
        let mut pending = command;
        loop {
            match self.shared.queue.push(pending) {
                Ok(()) => return,
                Err(back) => {
                    pending = back;
                    thread::yield_now();
                }
            }
        }
    }
}

impl Default for SearchWorker {
    fn default() -> Self {
        SearchWorker::new()
    }
}

impl Drop for SearchWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(shared: Arc<WorkerShared>) {
    log::debug!("search worker thread started");
    loop {
        let command = match shared.queue.pop() {
            Some(command) => command,
            None => {
                thread::yield_now();
                continue;
            }
        };
        match command {
            Command::Start(payload) => {
                let (board, limits) = *payload;
                run_search(&shared, board, limits);
            }
            Command::Stop => {
                shared.stop_flag.store(true, Ordering::Release);
            }
            Command::Quit => {
                log::debug!("search worker thread quitting");
                return;
            }
        }
    }
}

fn run_search(shared: &Arc<WorkerShared>, mut board: Board, limits: Limits) {
    shared.busy.set(true);
    shared.stop_flag.store(false, Ordering::Release);

    let progress_shared = Arc::clone(shared);
    let progress = move |partial: &SearchResult| {
        for (idx, line) in partial.lines.iter().enumerate() {
            progress_shared.write_line(&format_info_line(partial, idx, line));
        }
    };
    let currmove_shared = Arc::clone(shared);
    let currmove = move |mv: BitMove, number: usize| {
        currmove_shared.write_line(&format!(
            "info currmove {} currmovenumber {}",
            mv.stringify(),
            number
        ));
    };

    let progress_ref: &crate::search::ProgressFn = &progress;
    let currmove_ref: &crate::search::CurrmoveFn = &currmove;
    let result = search(
        &mut board,
        &limits,
        Some(&shared.stop_flag),
        Some(progress_ref),
        Some(currmove_ref),
    );

    let stopped = shared.stop_flag.load(Ordering::Acquire);
    {
        let mut guard = shared.snapshot.lock().unwrap();
        *guard = Some(SearchSnapshot {
            board,
            result: result.clone(),
            limits,
            stopped,
        });
    }

    for (idx, line) in result.lines.iter().enumerate() {
        shared.write_line(&format_info_line(&result, idx, line));
    }

    if result.best_move.is_null() && stopped {
        shared.write_line("bestmove 0000");
    } else {
        shared.write_line(&format!("bestmove {}", result.best_move.stringify()));
    }

    shared.busy.set(false);
}

fn format_info_line(result: &SearchResult, idx: usize, line: &crate::search::PVLine) -> String {
    let mut info = format!(
        "info multipv {} depth {} seldepth {} nodes {}",
        idx + 1,
        result.depth,
        result.seldepth,
        result.nodes
    );
    if result.elapsed_ms > 0 {
        let nps = (result.nodes as u64).saturating_mul(1000) / result.elapsed_ms.max(1) as u64;
        info.push_str(&format!(" time {} nps {}", result.elapsed_ms, nps));
    }
    info.push_str(&format!(" hashfull {}", result.hashfull));
    info.push_str(&format_score(line.eval));
    if !line.line.is_empty() {
        info.push_str(" pv");
        for mv in line.line.iter() {
            info.push(' ');
            info.push_str(&mv.stringify());
        }
    }
    info
}

/// Renders a score in UCI terms: `cp` for centipawns, `mate` in moves for
/// mate-distance scores.
pub fn format_score(eval: i32) -> String {
    if eval >= MATE_THRESHOLD {
        let ply = MATE - eval;
        format!(" score mate {}", (ply + 1) / 2)
    } else if eval <= -MATE_THRESHOLD {
        let ply = MATE + eval;
        format!(" score mate -{}", (ply + 1) / 2)
    } else {
        format!(" score cp {}", eval)
    }
}
