//! Statically-computed lookup tables: leaper and slider attacks, the
//! between/line relations, and the Zobrist hash keys. Everything here is
//! immutable after first use and shared freely.

pub mod boards;
pub mod magic;
pub mod prelude;
pub mod zobrist;
