//! Zobrist hash keys.
//!
//! A splitmix64 generator with a fixed seed produces, in a fixed order: the
//! piece-square cube (color x piece type x square), one key per
//! castling-rights byte, one key per en-passant file, and the side-to-move
//! key. The order never changes, so hashes are reproducible across builds.

use crate::core::masks::*;
use crate::core::sq::SQ;
use crate::core::{PieceType, Player};
use crate::tools::prng::SplitMix64;

/// Seed for the Zobrist table generator.
const ZOBRIST_SEED: u64 = 0xBADC_0FFE_E0DD_F00D;

struct ZobristTables {
    piece_sq: [[[u64; SQ_CNT]; 6]; PLAYER_CNT],
    castling: [u64; CASTLING_CNT],
    ep_file: [u64; FILE_CNT],
    side: u64,
}

lazy_static! {
    static ref ZOBRIST: ZobristTables = ZobristTables::build();
}

/// Forces table construction. Idempotent and thread-safe.
#[cold]
pub fn init_zobrist() {
    lazy_static::initialize(&ZOBRIST);
}

impl ZobristTables {
    #[cold]
    fn build() -> ZobristTables {
        let mut rng = SplitMix64::init(ZOBRIST_SEED);
        let mut t = ZobristTables {
            piece_sq: [[[0; SQ_CNT]; 6]; PLAYER_CNT],
            castling: [0; CASTLING_CNT],
            ep_file: [0; FILE_CNT],
            side: 0,
        };
        for color in 0..PLAYER_CNT {
            for piece in 0..6 {
                for sq in 0..SQ_CNT {
                    t.piece_sq[color][piece][sq] = rng.next();
                }
            }
        }
        for key in t.castling.iter_mut() {
            *key = rng.next();
        }
        for key in t.ep_file.iter_mut() {
            *key = rng.next();
        }
        t.side = rng.next();
        t
    }
}

/// Key for a piece of `player` and `piece_type` sitting on `sq`.
#[inline(always)]
pub fn z_piece_sq(player: Player, piece_type: PieceType, sq: SQ) -> u64 {
    debug_assert!(sq.is_okay());
    debug_assert!(piece_type.is_some());
    ZOBRIST.piece_sq[player as usize][piece_type as usize - 1][sq.0 as usize]
}

/// Key for a castling-rights byte.
#[inline(always)]
pub fn z_castle(castling: u8) -> u64 {
    debug_assert!((castling as usize) < CASTLING_CNT);
    ZOBRIST.castling[castling as usize]
}

/// Key for the file of an en-passant square.
#[inline(always)]
pub fn z_ep(sq: SQ) -> u64 {
    debug_assert!(sq.is_okay());
    ZOBRIST.ep_file[sq.file_idx_of_sq() as usize]
}

/// Key for the side to move being Black.
#[inline(always)]
pub fn z_side() -> u64 {
    ZOBRIST.side
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_distinct_and_stable() {
        let a = z_piece_sq(Player::White, PieceType::P, SQ::A1);
        let b = z_piece_sq(Player::White, PieceType::P, SQ::B1);
        let c = z_piece_sq(Player::Black, PieceType::P, SQ::A1);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, z_piece_sq(Player::White, PieceType::P, SQ::A1));
        assert_ne!(z_side(), 0);
    }

    #[test]
    fn castling_keys_cover_all_bytes() {
        let mut seen = std::collections::HashSet::new();
        for byte in 0..16u8 {
            assert!(seen.insert(z_castle(byte)));
        }
    }
}
