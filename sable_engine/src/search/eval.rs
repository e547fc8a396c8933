//! The static evaluator: tapered material plus piece-square tables, scored
//! from the side to move's point of view.
//!
//! The weights are the classic simplified-evaluation set. The search only
//! relies on the evaluator being deterministic and side-to-move relative;
//! the numbers themselves are free to change.

use sable::tools::trace::{trace_emit, trace_enabled, TraceTopic};
use sable::{BitBoard, Board, PieceType, Player};

/// Midgame/endgame component pair, from White's point of view, exposed for
/// diagnostics.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalTrace {
    pub midgame: i32,
    pub endgame: i32,
}

const PAWN_VALUE: i32 = 100;
const KNIGHT_VALUE: i32 = 320;
const BISHOP_VALUE: i32 = 330;
const ROOK_VALUE: i32 = 500;
const QUEEN_VALUE: i32 = 900;

// Phase weights; 24 = all minor and major pieces still on the board.
const TOTAL_PHASE: i32 = 24;

#[rustfmt::skip]
const PAWN_PST: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    50, 50, 50, 50, 50, 50, 50, 50,
    10, 10, 20, 30, 30, 20, 10, 10,
     5,  5, 10, 25, 25, 10,  5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5, -5,-10,  0,  0,-10, -5,  5,
     5, 10, 10,-20,-20, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_PST: [i32; 64] = [
   -50,-40,-30,-30,-30,-30,-40,-50,
   -40,-20,  0,  0,  0,  0,-20,-40,
   -30,  0, 10, 15, 15, 10,  0,-30,
   -30,  5, 15, 20, 20, 15,  5,-30,
   -30,  0, 15, 20, 20, 15,  0,-30,
   -30,  5, 10, 15, 15, 10,  5,-30,
   -40,-20,  0,  5,  5,  0,-20,-40,
   -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP_PST: [i32; 64] = [
   -20,-10,-10,-10,-10,-10,-10,-20,
   -10,  0,  0,  0,  0,  0,  0,-10,
   -10,  0,  5, 10, 10,  5,  0,-10,
   -10,  5,  5, 10, 10,  5,  5,-10,
   -10,  0, 10, 10, 10, 10,  0,-10,
   -10, 10, 10, 10, 10, 10, 10,-10,
   -10,  5,  0,  0,  0,  0,  5,-10,
   -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK_PST: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_PST: [i32; 64] = [
   -20,-10,-10, -5, -5,-10,-10,-20,
   -10,  0,  0,  0,  0,  0,  0,-10,
   -10,  0,  5,  5,  5,  5,  0,-10,
    -5,  0,  5,  5,  5,  5,  0, -5,
     0,  0,  5,  5,  5,  5,  0, -5,
   -10,  5,  5,  5,  5,  5,  0,-10,
   -10,  0,  5,  0,  0,  0,  0,-10,
   -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_MG_PST: [i32; 64] = [
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -20,-30,-30,-40,-40,-30,-30,-20,
   -10,-20,-20,-20,-20,-20,-20,-10,
    20, 20,  0,  0,  0,  0, 20, 20,
    20, 30, 10,  0,  0, 10, 30, 20,
];

#[rustfmt::skip]
const KING_EG_PST: [i32; 64] = [
   -50,-40,-30,-20,-20,-30,-40,-50,
   -30,-20,-10,  0,  0,-10,-20,-30,
   -30,-10, 20, 30, 30, 20,-10,-30,
   -30,-10, 30, 40, 40, 30,-10,-30,
   -30,-10, 30, 40, 40, 30,-10,-30,
   -30,-10, 20, 30, 30, 20,-10,-30,
   -30,-30,  0,  0,  0,  0,-30,-30,
   -50,-30,-30,-30,-30,-30,-50,-50,
];

#[inline]
fn material(piece_type: PieceType) -> i32 {
    match piece_type {
        PieceType::P => PAWN_VALUE,
        PieceType::N => KNIGHT_VALUE,
        PieceType::B => BISHOP_VALUE,
        PieceType::R => ROOK_VALUE,
        PieceType::Q => QUEEN_VALUE,
        _ => 0,
    }
}

#[inline]
fn phase_weight(piece_type: PieceType) -> i32 {
    match piece_type {
        PieceType::N | PieceType::B => 1,
        PieceType::R => 2,
        PieceType::Q => 4,
        _ => 0,
    }
}

// The tables above read visually, rank 8 first; White indexes through a rank
// flip, Black directly.
#[inline]
fn pst_sq(player: Player, sq: u8) -> usize {
    match player {
        Player::White => (sq ^ 56) as usize,
        Player::Black => sq as usize,
    }
}

fn accumulate(board: &Board, player: Player) -> (i32, i32, i32) {
    let mut mg = 0;
    let mut eg = 0;
    let mut phase = 0;
    for pt in sable::core::ALL_PIECE_TYPES {
        let mut bb: BitBoard = board.piece_bb(player, pt);
        while let Some(sq) = bb.pop_some_lsb() {
            let value = material(pt);
            let idx = pst_sq(player, sq.0);
            let (pst_mg, pst_eg) = match pt {
                PieceType::P => (PAWN_PST[idx], PAWN_PST[idx]),
                PieceType::N => (KNIGHT_PST[idx], KNIGHT_PST[idx]),
                PieceType::B => (BISHOP_PST[idx], BISHOP_PST[idx]),
                PieceType::R => (ROOK_PST[idx], ROOK_PST[idx]),
                PieceType::Q => (QUEEN_PST[idx], QUEEN_PST[idx]),
                PieceType::K => (KING_MG_PST[idx], KING_EG_PST[idx]),
                PieceType::None => (0, 0),
            };
            mg += value + pst_mg;
            eg += value + pst_eg;
            phase += phase_weight(pt);
        }
    }
    (mg, eg, phase)
}

/// Evaluates the position from the side to move's point of view, optionally
/// reporting the White-relative midgame/endgame components.
pub fn evaluate_with_trace(board: &Board, trace: Option<&mut EvalTrace>) -> i32 {
    let (white_mg, white_eg, white_phase) = accumulate(board, Player::White);
    let (black_mg, black_eg, black_phase) = accumulate(board, Player::Black);

    let mg = white_mg - black_mg;
    let eg = white_eg - black_eg;
    let phase = (white_phase + black_phase).min(TOTAL_PHASE);
    let blended = (mg * phase + eg * (TOTAL_PHASE - phase)) / TOTAL_PHASE;

    if let Some(t) = trace {
        t.midgame = mg;
        t.endgame = eg;
    }

    let score = match board.turn() {
        Player::White => blended,
        Player::Black => -blended,
    };

    if trace_enabled(TraceTopic::Eval) {
        trace_emit(
            TraceTopic::Eval,
            &format!(
                "node mg={} eg={} phase={} stm_score={}",
                mg, eg, phase, score
            ),
        );
    }
    score
}

/// Evaluates the position from the side to move's point of view.
#[inline]
pub fn evaluate(board: &Board) -> i32 {
    evaluate_with_trace(board, None)
}
