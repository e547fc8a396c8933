//! Free-function facade over the precomputed tables.
//!
//! The tables initialize themselves lazily on first use; [`init_statics`]
//! forces them eagerly, which front-ends call once at startup so the first
//! search doesn't pay for table generation.

use super::{boards, magic, zobrist};

use crate::core::bitboard::BitBoard;
use crate::core::sq::SQ;
use crate::core::{PieceType, Player};

use std::sync::atomic::{AtomicBool, Ordering};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Eagerly builds every lookup table. Idempotent and thread-safe; invoking
/// queries without calling this first is also fine.
pub fn init_statics() {
    if !INITIALIZED.swap(true, Ordering::AcqRel) {
        zobrist::init_zobrist();
        magic::init_magics();
        boards::init_boards();
    }
}

// MAGIC FUNCTIONS

/// Bishop attacks from `sq` against `occupied`.
#[inline(always)]
pub fn bishop_moves(occupied: BitBoard, sq: SQ) -> BitBoard {
    debug_assert!(sq.is_okay());
    BitBoard(magic::bishop_attacks(occupied.0, sq.0))
}

/// Rook attacks from `sq` against `occupied`.
#[inline(always)]
pub fn rook_moves(occupied: BitBoard, sq: SQ) -> BitBoard {
    debug_assert!(sq.is_okay());
    BitBoard(magic::rook_attacks(occupied.0, sq.0))
}

/// Queen attacks from `sq` against `occupied`.
#[inline(always)]
pub fn queen_moves(occupied: BitBoard, sq: SQ) -> BitBoard {
    debug_assert!(sq.is_okay());
    BitBoard(magic::queen_attacks(occupied.0, sq.0))
}

// BOARD FUNCTIONS

/// Knight attacks from `sq`.
#[inline(always)]
pub fn knight_moves(sq: SQ) -> BitBoard {
    BitBoard(boards::knight_moves(sq))
}

/// King attacks from `sq`.
#[inline(always)]
pub fn king_moves(sq: SQ) -> BitBoard {
    BitBoard(boards::king_moves(sq))
}

/// Squares a pawn of `player` on `sq` attacks.
#[inline(always)]
pub fn pawn_attacks_from(sq: SQ, player: Player) -> BitBoard {
    BitBoard(boards::pawn_attacks_from(sq, player))
}

/// Chebyshev distance of two squares.
#[inline(always)]
pub fn distance_of_sqs(sq_one: SQ, sq_two: SQ) -> u8 {
    boards::distance_of_sqs(sq_one, sq_two)
}

/// The full line (rank, file, or diagonal) both squares lie on, if any.
#[inline(always)]
pub fn line_bb(sq_one: SQ, sq_two: SQ) -> BitBoard {
    BitBoard(boards::line_bb(sq_one, sq_two))
}

/// The squares strictly between two squares, if they are aligned.
#[inline(always)]
pub fn between_bb(sq_one: SQ, sq_two: SQ) -> BitBoard {
    BitBoard(boards::between_bb(sq_one, sq_two))
}

/// Returns if three squares share a rank, file, or diagonal.
#[inline(always)]
pub fn aligned(s1: SQ, s2: SQ, s3: SQ) -> bool {
    boards::aligned(s1, s2, s3)
}

// ZOBRIST FUNCTIONS

/// Zobrist key for a piece on a square.
#[inline(always)]
pub fn z_piece_sq(player: Player, piece_type: PieceType, sq: SQ) -> u64 {
    zobrist::z_piece_sq(player, piece_type, sq)
}

/// Zobrist key for a castling-rights byte.
#[inline(always)]
pub fn z_castle(castling: u8) -> u64 {
    zobrist::z_castle(castling)
}

/// Zobrist key for the file of an en-passant square.
#[inline(always)]
pub fn z_ep(sq: SQ) -> u64 {
    zobrist::z_ep(sq)
}

/// Zobrist key for the side to move being Black.
#[inline(always)]
pub fn z_side() -> u64 {
    zobrist::z_side()
}
