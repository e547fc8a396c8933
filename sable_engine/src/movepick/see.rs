//! Static exchange evaluation: the expected material outcome of a capture
//! sequence on one square, assuming both sides always recapture with their
//! least valuable attacker.
//!
//! The simulation runs on local scratch bitboards so the real board is never
//! touched. As pieces are peeled off the target square, slider attacks are
//! refreshed only when the removed piece sat on a ray through the square,
//! which is what makes x-ray discoveries appear.

use sable::core::masks::PIECE_TYPE_CNT;
use sable::helper::prelude::*;
use sable::{BitBoard, BitMove, Board, Piece, PieceType, Player, SQ};

use crate::consts::piece_value;

const SEE_ORDER: [PieceType; 6] = [
    PieceType::P,
    PieceType::N,
    PieceType::B,
    PieceType::R,
    PieceType::Q,
    PieceType::K,
];

/// Material gained by the promotion encoded in `mv`, zero when none.
#[inline]
pub fn promotion_delta(mv: BitMove) -> i32 {
    let promo = mv.promo_piece();
    if promo == PieceType::None {
        0
    } else {
        piece_value(promo) - piece_value(PieceType::P)
    }
}

/// The piece captured by `mv`, accounting for en-passant.
#[inline]
pub fn capture_victim(board: &Board, mv: BitMove) -> Piece {
    let to = mv.get_dest();
    if mv.is_en_passant() {
        let behind = SQ((to.0 as i8 - board.turn().pawn_push()) as u8);
        board.piece_at_sq(behind)
    } else {
        board.piece_at_sq(to)
    }
}

/// Victim value plus promotion delta; the quiescence delta-pruning margin.
#[inline]
pub fn capture_margin(board: &Board, mv: BitMove) -> i32 {
    piece_value(capture_victim(board, mv).type_of()) + promotion_delta(mv)
}

struct SeeState {
    pieces: [[u64; PIECE_TYPE_CNT]; 2],
    occ: u64,
}

impl SeeState {
    fn from_board(board: &Board) -> SeeState {
        let mut state = SeeState {
            pieces: [[0; PIECE_TYPE_CNT]; 2],
            occ: board.occupied().0,
        };
        for player in [Player::White, Player::Black] {
            for pt in sable::core::ALL_PIECE_TYPES {
                state.pieces[player as usize][pt as usize] = board.piece_bb(player, pt).0;
            }
        }
        state
    }

    fn remove(&mut self, player: Player, pt: PieceType, sq: SQ) {
        let mask = sq.to_bb().0;
        self.occ &= !mask;
        self.pieces[player as usize][pt as usize] &= !mask;
    }

    fn place(&mut self, player: Player, pt: PieceType, sq: SQ) {
        let mask = sq.to_bb().0;
        self.occ |= mask;
        self.pieces[player as usize][pt as usize] |= mask;
    }

    #[inline]
    fn of(&self, player: Player, pt: PieceType) -> u64 {
        self.pieces[player as usize][pt as usize]
    }
}

/// Returns the expected material gain (from the mover's point of view) of
/// playing `mv` and letting both sides exchange optimally on the destination
/// square. Non-captures that aren't promotions score zero.
pub fn see(board: &Board, mv: BitMove) -> i32 {
    if mv.is_null() {
        return 0;
    }
    if !mv.is_capture() && mv.promo_piece() == PieceType::None {
        return 0;
    }

    let from = mv.get_src();
    let to = mv.get_dest();
    let moving = board.piece_at_sq(from);
    debug_assert!(!moving.is_none());
    let us = moving.player_lossy();
    let them = !us;
    let moving_type = moving.type_of();
    let promotion = mv.promo_piece();

    let victim = if mv.is_en_passant() {
        Piece::make(them, PieceType::P)
    } else {
        board.piece_at_sq(to)
    };

    let mut gains = [0i32; 32];
    let mut depth: usize = 0;
    gains[0] = piece_value(victim.type_of()) + promotion_delta(mv);

    let mut state = SeeState::from_board(board);
    state.remove(us, moving_type, from);
    if mv.is_en_passant() {
        let ep_pawn = SQ((to.0 as i8 - us.pawn_push()) as u8);
        state.remove(them, PieceType::P, ep_pawn);
    } else if !victim.is_none() {
        state.remove(them, victim.type_of(), to);
    }

    let mut current_type = if promotion != PieceType::None {
        promotion
    } else {
        moving_type
    };
    let mut current_color = us;
    state.place(current_color, current_type, to);

    // Leaper attackers only shrink, so track them separately; slider masks
    // are refreshed when an uncovered ray can matter.
    let compute_non_sliders = |state: &SeeState, side: Player| -> u64 {
        (pawn_attacks_from(to, !side).0 & state.of(side, PieceType::P))
            | (knight_moves(to).0 & state.of(side, PieceType::N))
            | (king_moves(to).0 & state.of(side, PieceType::K))
    };
    let mut non_sliders = [
        compute_non_sliders(&state, Player::White),
        compute_non_sliders(&state, Player::Black),
    ];

    let bishop_rays = bishop_moves(BitBoard::EMPTY, to).0;
    let rook_rays = rook_moves(BitBoard::EMPTY, to).0;
    let mut bishop_mask = bishop_moves(BitBoard(state.occ), to).0;
    let mut rook_mask = rook_moves(BitBoard(state.occ), to).0;

    let compute_attackers =
        |state: &SeeState, non_sliders: &[u64; 2], side: Player, b_mask: u64, r_mask: u64| -> u64 {
            let idx = side as usize;
            let bishop_like = state.of(side, PieceType::B) | state.of(side, PieceType::Q);
            let rook_like = state.of(side, PieceType::R) | state.of(side, PieceType::Q);
            non_sliders[idx] | (b_mask & bishop_like) | (r_mask & rook_like)
        };

    let mut attackers = [0u64; 2];
    let mut dirty = [true, true];
    let mut side = them;

    loop {
        let side_idx = side as usize;
        if dirty[side_idx] {
            attackers[side_idx] =
                compute_attackers(&state, &non_sliders, side, bishop_mask, rook_mask);
            dirty[side_idx] = false;
        }
        let side_attackers = attackers[side_idx];
        if side_attackers == 0 {
            break;
        }

        // Least valuable attacker first.
        let mut attacker_type = PieceType::None;
        let mut attacker_sq = SQ::NONE;
        for candidate in SEE_ORDER {
            let pool = state.of(side, candidate) & side_attackers;
            if pool != 0 {
                attacker_sq = BitBoard(pool).bit_scan_forward();
                attacker_type = candidate;
                break;
            }
        }
        if attacker_type == PieceType::None {
            break;
        }

        depth += 1;
        debug_assert!(depth < gains.len());
        gains[depth] = piece_value(current_type) - gains[depth - 1];

        state.remove(current_color, current_type, to);
        let from_mask = attacker_sq.to_bb().0;
        state.remove(side, attacker_type, attacker_sq);
        if matches!(attacker_type, PieceType::P | PieceType::N | PieceType::K) {
            non_sliders[side_idx] &= !from_mask;
        }

        current_color = side;
        current_type = attacker_type;
        state.place(current_color, current_type, to);

        side = !side;
        let touches_diag = from_mask & bishop_rays != 0;
        let touches_orth = from_mask & rook_rays != 0;
        if touches_diag {
            bishop_mask = bishop_moves(BitBoard(state.occ), to).0;
        }
        if touches_orth {
            rook_mask = rook_moves(BitBoard(state.occ), to).0;
        }
        if touches_diag || touches_orth {
            dirty = [true, true];
        }
    }

    // Fold the exchange back: at every depth the side to move may stand pat.
    for idx in (1..=depth).rev() {
        gains[idx - 1] = -std::cmp::max(-gains[idx - 1], gains[idx]);
    }
    gains[0]
}

const SEE_CACHE_SIZE: usize = 2048;

#[derive(Copy, Clone)]
struct SeeCacheEntry {
    key: u64,
    mv: BitMove,
    value: i32,
    valid: bool,
}

/// A small direct-mapped memo of SEE results keyed by (zobrist, move).
/// Cleared at the start of every top-level search.
pub struct SeeCache {
    entries: Box<[SeeCacheEntry]>,
}

impl SeeCache {
    pub fn new() -> SeeCache {
        SeeCache {
            entries: vec![
                SeeCacheEntry {
                    key: 0,
                    mv: BitMove::null(),
                    value: 0,
                    valid: false,
                };
                SEE_CACHE_SIZE
            ]
            .into_boxed_slice(),
        }
    }

    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.valid = false;
        }
    }

    #[inline]
    fn index(key: u64, mv: BitMove) -> usize {
        let mixed = key ^ (key >> 17) ^ (key << 13) ^ (u64::from(mv.get_raw()) << 1);
        mixed as usize & (SEE_CACHE_SIZE - 1)
    }

    fn probe(&self, key: u64, mv: BitMove) -> Option<i32> {
        let entry = &self.entries[SeeCache::index(key, mv)];
        if entry.valid && entry.key == key && entry.mv == mv {
            Some(entry.value)
        } else {
            None
        }
    }

    fn store(&mut self, key: u64, mv: BitMove, value: i32) {
        self.entries[SeeCache::index(key, mv)] = SeeCacheEntry {
            key,
            mv,
            value,
            valid: true,
        };
    }
}

impl Default for SeeCache {
    fn default() -> Self {
        SeeCache::new()
    }
}

/// SEE through the memo cache.
pub fn cached_see(board: &Board, mv: BitMove, cache: &mut SeeCache) -> i32 {
    let key = board.zobrist();
    if let Some(value) = cache.probe(key, mv) {
        return value;
    }
    let value = see(board, mv);
    cache.store(key, mv, value);
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uci(board: &Board, text: &str) -> BitMove {
        let mv = board.uci_to_move(text);
        assert!(!mv.is_null(), "move {} not legal here", text);
        mv
    }

    #[test]
    fn pawn_takes_free_knight() {
        let board = Board::from_fen("4k3/8/8/3n4/4P3/8/8/4K3 w - - 0 1", true).unwrap();
        let gain = see(&board, uci(&board, "e4d5"));
        assert!(gain > 0, "free knight should gain, got {}", gain);
        assert_eq!(gain, piece_value(PieceType::N));
    }

    #[test]
    fn queen_takes_defended_pawn() {
        let board = Board::from_fen("4k3/8/4p3/3p4/4Q3/8/8/4K3 w - - 0 1", true).unwrap();
        let gain = see(&board, uci(&board, "e4d5"));
        assert!(gain < 0, "queen loses itself for a pawn, got {}", gain);
        assert_eq!(gain, piece_value(PieceType::P) - piece_value(PieceType::Q));
    }

    #[test]
    fn en_passant_capture_gains() {
        let board = Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1", true).unwrap();
        let gain = see(&board, uci(&board, "e5d6"));
        assert!(gain > 0, "undefended ep capture should gain, got {}", gain);
    }

    #[test]
    fn xray_recapture_is_seen() {
        // After Rd2xd5 and ...Rd8xd5, the rook on d1 recaptures through the
        // square its partner just vacated. The exchange only breaks even
        // because that x-ray is found.
        let board =
            Board::from_fen("3r2k1/8/8/3p4/8/8/3R4/3R2K1 w - - 0 1", true).unwrap();
        let mv = uci(&board, "d2d5");
        let gain = see(&board, mv);
        assert_eq!(gain, piece_value(PieceType::P));
    }

    #[test]
    fn doubly_defended_pawn_is_a_losing_grab() {
        // Two attackers against two defenders on d5: the second defender
        // (x-rayed behind the first) turns the grab into a loss.
        let board =
            Board::from_fen("3r2k1/3r4/8/3p4/8/8/3R4/3R2K1 w - - 0 1", true).unwrap();
        let gain = see(&board, uci(&board, "d2d5"));
        assert!(gain < 0, "expected losing exchange, got {}", gain);
    }

    #[test]
    fn quiet_moves_score_zero() {
        let board = Board::start_pos();
        assert_eq!(see(&board, uci(&board, "e2e4")), 0);
        assert_eq!(see(&board, BitMove::null()), 0);
    }

    #[test]
    fn cache_round_trips() {
        let board = Board::from_fen("4k3/8/8/3n4/4P3/8/8/4K3 w - - 0 1", true).unwrap();
        let mv = uci(&board, "e4d5");
        let mut cache = SeeCache::new();
        let first = cached_see(&board, mv, &mut cache);
        let second = cached_see(&board, mv, &mut cache);
        assert_eq!(first, second);
        cache.clear();
        assert_eq!(cached_see(&board, mv, &mut cache), first);
    }
}
