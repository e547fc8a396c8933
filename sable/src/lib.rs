//! A chessboard library built on bitboards.
//!
//! This crate holds the board representation and everything needed to drive
//! it: primitive types ([`SQ`], [`BitBoard`], [`Player`], [`PieceType`],
//! [`BitMove`]), precomputed attack tables, Zobrist keys, FEN I/O, legal move
//! generation, and perft. The searching AI lives in the companion crate,
//! `sable_engine`.
//!
//! # Usage
//!
//! A [`Board`] starts from the standard position or from a FEN string:
//!
//! ```
//! use sable::Board;
//!
//! let board = Board::start_pos();
//! let mut moves = sable::MoveList::default();
//! board.generate_moves(&mut moves, sable::GenStage::All);
//! assert_eq!(moves.len(), 20);
//! ```
//!
//! Applying and undoing moves works through explicit undo records:
//!
//! ```
//! use sable::{Board, GenStage, MoveList, Undo};
//!
//! let mut board = Board::start_pos();
//! let mut moves = MoveList::default();
//! board.generate_moves(&mut moves, GenStage::All);
//!
//! let mut undo = Undo::default();
//! board.make(moves[0], &mut undo);
//! board.unmake(moves[0], &undo);
//! assert_eq!(board.to_fen(), Board::start_pos().to_fen());
//! ```
//!
//! # Safety
//!
//! A [`BitMove`] is only meaningful for the position that generated it.
//! Applying a move to any other board is undefined in release builds; debug
//! builds trap on the violated invariant.

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate failure_derive;

pub mod board;
pub mod core;
pub mod helper;
pub mod tools;

#[doc(no_inline)]
pub use crate::board::fen::FenBuildError;
#[doc(no_inline)]
pub use crate::board::{Board, Undo};
#[doc(no_inline)]
pub use crate::core::bitboard::BitBoard;
#[doc(no_inline)]
pub use crate::core::move_list::MoveList;
#[doc(no_inline)]
pub use crate::core::piece_move::BitMove;
#[doc(no_inline)]
pub use crate::core::sq::SQ;
#[doc(no_inline)]
pub use crate::core::{File, GenStage, Piece, PieceType, Player, Rank};
