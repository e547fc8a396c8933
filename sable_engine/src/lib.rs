//! An alpha-beta chess searcher built on the `sable` board library.
//!
//! The crate provides the searching half of an engine: a tapered evaluator,
//! a transposition table, move ordering with static exchange evaluation,
//! the iterative-deepening principal-variation searcher with its pruning and
//! extension heuristics, time management, and a background worker thread
//! that owns a search and streams progress lines to an injectable writer.
//!
//! The UCI command parser itself is not here; front-ends drive the engine
//! through [`search::search`] or through a [`worker::SearchWorker`].

#[macro_use]
extern crate lazy_static;

pub mod consts;
pub mod movepick;
pub mod params;
pub mod search;
pub mod sync;
pub mod tables;
pub mod time;
pub mod tt;
pub mod worker;

pub use crate::consts::*;
pub use crate::params::Limits;
pub use crate::search::{search, SearchResult};
