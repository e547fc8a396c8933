//! Engine-wide constants: score encoding and the material scale shared by
//! SEE and MVV-LVA.

use sable::PieceType;

/// Maximum search depth in plies.
pub const MAX_PLY: usize = 128;

/// Maximum number of moves in any position; sizes the per-node score arrays.
pub const MAX_MOVES: usize = 256;

/// Value considered infinite by the search windows.
pub const INFINITE: i32 = 30_000;

/// Base mate score; mate-in-n is `MATE - n`.
pub const MATE: i32 = INFINITE - 512;

/// Scores at or beyond this magnitude encode a mate distance.
pub const MATE_THRESHOLD: i32 = MATE - MAX_PLY as i32;

/// The draw score.
pub const DRAW: i32 = 0;

/// Score for delivering mate at the given ply.
#[inline(always)]
pub fn mate_in(ply: usize) -> i32 {
    MATE - ply as i32
}

/// Score for being mated at the given ply.
#[inline(always)]
pub fn mated_in(ply: usize) -> i32 {
    -MATE + ply as i32
}

/// Material scale used by SEE and MVV-LVA ordering. These are ordering
/// weights, not evaluation terms.
#[inline]
pub fn piece_value(piece_type: PieceType) -> i32 {
    match piece_type {
        PieceType::P => 100,
        PieceType::N => 320,
        PieceType::B => 330,
        PieceType::R => 500,
        PieceType::Q => 900,
        PieceType::K => 10_000,
        PieceType::None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mate_encoding() {
        assert!(mate_in(3) > MATE_THRESHOLD);
        assert!(mated_in(3) < -MATE_THRESHOLD);
        assert!(mate_in(3) < INFINITE);
        assert_eq!(mate_in(0), MATE);
        assert_eq!(mated_in(0), -MATE);
        assert!(mate_in(5) < mate_in(3));
    }
}
