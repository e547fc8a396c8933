//! Named diagnostic trace topics.
//!
//! Each topic can be toggled independently; when a topic is enabled, the
//! emitting code formats a human-readable line and hands it to the installed
//! writer. With no writer installed, lines are dropped. Disabled topics cost
//! one relaxed atomic load.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// The available trace topics.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum TraceTopic {
    Search = 0,
    QSearch = 1,
    TT = 2,
    Eval = 3,
    Moves = 4,
}

const TOPIC_CNT: usize = 5;

static TOPIC_NAMES: [&str; TOPIC_CNT] = ["search", "qsearch", "tt", "eval", "moves"];

static ENABLED: [AtomicBool; TOPIC_CNT] = [
    AtomicBool::new(false),
    AtomicBool::new(false),
    AtomicBool::new(false),
    AtomicBool::new(false),
    AtomicBool::new(false),
];

/// The function receiving formatted trace lines.
pub type TraceWriter = Box<dyn Fn(&str) + Send + Sync>;

lazy_static! {
    static ref WRITER: Mutex<Option<TraceWriter>> = Mutex::new(None);
}

/// Enables or disables a trace topic.
pub fn set_trace_topic(topic: TraceTopic, enabled: bool) {
    ENABLED[topic as usize].store(enabled, Ordering::Relaxed);
}

/// Returns whether a trace topic is currently enabled.
#[inline(always)]
pub fn trace_enabled(topic: TraceTopic) -> bool {
    ENABLED[topic as usize].load(Ordering::Relaxed)
}

/// Installs the writer that receives trace lines, replacing any previous one.
/// Passing `None` silences tracing entirely.
pub fn set_trace_writer(writer: Option<TraceWriter>) {
    *WRITER.lock().unwrap() = writer;
}

/// Emits a line on the given topic, if the topic is enabled and a writer is
/// installed. Callers should check [`trace_enabled`] first to avoid paying
/// for formatting.
pub fn trace_emit(topic: TraceTopic, line: &str) {
    if !trace_enabled(topic) {
        return;
    }
    let guard = WRITER.lock().unwrap();
    if let Some(writer) = guard.as_ref() {
        writer(&format!("trace {} {}", TOPIC_NAMES[topic as usize], line));
    }
}

/// Resolves a topic from its lowercase name.
pub fn trace_topic_from_str(token: &str) -> Option<TraceTopic> {
    match token {
        "search" => Some(TraceTopic::Search),
        "qsearch" => Some(TraceTopic::QSearch),
        "tt" => Some(TraceTopic::TT),
        "eval" => Some(TraceTopic::Eval),
        "moves" => Some(TraceTopic::Moves),
        _ => None,
    }
}

/// Returns the canonical name of a topic.
pub fn trace_topic_name(topic: TraceTopic) -> &'static str {
    TOPIC_NAMES[topic as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn toggling_and_emitting() {
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = Arc::clone(&count);
        set_trace_writer(Some(Box::new(move |line| {
            assert!(line.starts_with("trace moves"));
            count2.fetch_add(1, Ordering::SeqCst);
        })));

        assert!(!trace_enabled(TraceTopic::Moves));
        trace_emit(TraceTopic::Moves, "dropped");
        set_trace_topic(TraceTopic::Moves, true);
        trace_emit(TraceTopic::Moves, "counted");
        set_trace_topic(TraceTopic::Moves, false);
        set_trace_writer(None);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn topic_names_round_trip() {
        for topic in [
            TraceTopic::Search,
            TraceTopic::QSearch,
            TraceTopic::TT,
            TraceTopic::Eval,
            TraceTopic::Moves,
        ] {
            assert_eq!(trace_topic_from_str(trace_topic_name(topic)), Some(topic));
        }
        assert_eq!(trace_topic_from_str("nonsense"), None);
    }
}
