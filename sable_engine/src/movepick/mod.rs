//! Move ordering: every generated move gets an integer score once per node,
//! and the search then selection-sorts the best remaining move to the front
//! on demand, so nodes that cut early never pay for a full sort.
//!
//! Score composition (summed):
//!
//! | contribution        | condition                              |
//! |---------------------|----------------------------------------|
//! | transposition move  | move equals the TT hit's best move     |
//! | capture + MVV-LVA   | capture-like flag                      |
//! | bad-capture penalty | a "needs SEE" capture with SEE < 0     |
//! | promotion bonus     | promotion, graded Q > R > B > N        |
//! | killer bonuses      | first / second killer of the ply       |
//! | history             | quiet moves only, scaled and clamped   |

pub mod see;

pub use self::see::{cached_see, capture_margin, promotion_delta, see, SeeCache};

use self::see::capture_victim;

use sable::{BitMove, Board, MoveList, PieceType};

use crate::consts::{piece_value, MAX_MOVES};
use crate::tables::ButterflyHistory;

const TT_SCORE: i32 = 1_000_000;
const CAPTURE_BASE: i32 = 100_000;
const PROMOTION_BASE: i32 = 90_000;
const KILLER_PRIMARY: i32 = 80_000;
const KILLER_SECONDARY: i32 = 60_000;
const BAD_CAPTURE_PENALTY: i32 = 40_000;
const HISTORY_SCALE: i32 = 2;

/// A capture whose victim outweighs its attacker by at least this margin
/// skips SEE entirely.
const GUARANTEED_WIN_MARGIN: i32 = 300;

/// Everything the scorer reads about the node.
pub struct OrderingContext<'a> {
    pub board: &'a Board,
    pub tt_move: BitMove,
    pub killers: [BitMove; 2],
    pub history: &'a ButterflyHistory,
}

fn promotion_bonus(mv: BitMove) -> i32 {
    if !mv.is_promo() {
        return 0;
    }
    match mv.promo_piece() {
        PieceType::Q => PROMOTION_BASE + 8_000,
        PieceType::R => PROMOTION_BASE + 5_000,
        PieceType::B => PROMOTION_BASE + 2_000,
        PieceType::N => PROMOTION_BASE + 1_000,
        _ => PROMOTION_BASE,
    }
}

/// Scores every move in `list` into `scores`. Runs once per node; the SEE
/// cache carries results to the quiescence margins of the same search.
pub fn score_moves(
    list: &MoveList,
    ctx: &OrderingContext,
    cache: &mut SeeCache,
    scores: &mut [i32; MAX_MOVES],
) {
    let board = ctx.board;
    for (idx, mv) in list.iter().enumerate() {
        let mv = *mv;
        let mut score: i32 = 0;

        if !ctx.tt_move.is_null() && mv == ctx.tt_move {
            score += TT_SCORE;
        }

        if mv.is_capture() {
            let victim = capture_victim(board, mv);
            let attacker = board.piece_at_sq(mv.get_src());
            let victim_value = piece_value(victim.type_of());
            let attacker_value = piece_value(attacker.type_of());
            score += CAPTURE_BASE + victim_value * 16 - attacker_value;

            let margin = victim_value - attacker_value;
            let needs_see = mv.promo_piece() != PieceType::None
                || mv.is_en_passant()
                || attacker_value >= victim_value;
            if margin < GUARANTEED_WIN_MARGIN && needs_see {
                let see_value = cached_see(board, mv, cache);
                if see_value < 0 {
                    score -= BAD_CAPTURE_PENALTY;
                }
            }
        }

        score += promotion_bonus(mv);

        if mv == ctx.killers[0] {
            score += KILLER_PRIMARY;
        } else if mv == ctx.killers[1] {
            score += KILLER_SECONDARY;
        } else if !mv.is_capture() {
            score += ctx.history.get(board.turn(), mv) * HISTORY_SCALE;
        }

        scores[idx] = score;
    }
}

/// Swaps the best-scored move in `list[start..]` into position `start`.
/// Ties break on the smaller raw move value, keeping selection
/// deterministic.
pub fn select_best_move(list: &mut MoveList, scores: &mut [i32; MAX_MOVES], start: usize) {
    let end = list.len();
    let mut best = start;
    for idx in start + 1..end {
        if scores[idx] > scores[best]
            || (scores[idx] == scores[best] && list[idx].get_raw() < list[best].get_raw())
        {
            best = idx;
        }
    }
    if best != start {
        scores.swap(start, best);
        list.swap(start, best);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable::GenStage;

    fn score_all(board: &Board, tt_move: BitMove, killers: [BitMove; 2]) -> (MoveList, [i32; MAX_MOVES]) {
        let list = board.legal_moves(GenStage::All);
        let history = ButterflyHistory::new();
        let ctx = OrderingContext {
            board,
            tt_move,
            killers,
            history: &history,
        };
        let mut cache = SeeCache::new();
        let mut scores = [0i32; MAX_MOVES];
        score_moves(&list, &ctx, &mut cache, &mut scores);
        (list, scores)
    }

    #[test]
    fn tt_move_selected_first() {
        let board = Board::start_pos();
        let tt_move = board.uci_to_move("a2a3");
        let (mut list, mut scores) = score_all(&board, tt_move, [BitMove::null(); 2]);
        select_best_move(&mut list, &mut scores, 0);
        assert_eq!(list[0], tt_move);
    }

    #[test]
    fn killers_outrank_plain_quiets() {
        let board = Board::start_pos();
        let killer = board.uci_to_move("g1f3");
        let (mut list, mut scores) =
            score_all(&board, BitMove::null(), [killer, BitMove::null()]);
        select_best_move(&mut list, &mut scores, 0);
        assert_eq!(list[0], killer);
    }

    #[test]
    fn winning_capture_outranks_losing_capture() {
        // Queen takes defended pawn is demoted below pawn takes knight.
        let board =
            Board::from_fen("4k3/8/4p3/3p2n1/4Q2P/8/8/4K3 w - - 0 1", true).unwrap();
        let winning = board.uci_to_move("h4g5");
        let losing = board.uci_to_move("e4d5");
        let (list, scores) = score_all(&board, BitMove::null(), [BitMove::null(); 2]);
        let score_of = |mv: BitMove| {
            let idx = list.iter().position(|m| *m == mv).unwrap();
            scores[idx]
        };
        assert!(score_of(winning) > score_of(losing));
        assert!(score_of(losing) < CAPTURE_BASE, "bad capture not demoted");
    }

    #[test]
    fn queen_promotion_outranks_under_promotions() {
        let board = Board::from_fen("4k3/6P1/8/8/8/8/8/4K3 w - - 0 1", true).unwrap();
        let queen = board.uci_to_move("g7g8q");
        let rook = board.uci_to_move("g7g8r");
        let (list, scores) = score_all(&board, BitMove::null(), [BitMove::null(); 2]);
        let score_of = |mv: BitMove| {
            let idx = list.iter().position(|m| *m == mv).unwrap();
            scores[idx]
        };
        assert!(score_of(queen) > score_of(rook));
    }

    #[test]
    fn selection_sort_is_deterministic_on_ties() {
        let board = Board::start_pos();
        let (mut list_a, mut scores_a) = score_all(&board, BitMove::null(), [BitMove::null(); 2]);
        let (mut list_b, mut scores_b) = score_all(&board, BitMove::null(), [BitMove::null(); 2]);
        for start in 0..list_a.len() {
            select_best_move(&mut list_a, &mut scores_a, start);
            select_best_move(&mut list_b, &mut scores_b, start);
            assert_eq!(list_a[start], list_b[start]);
        }
    }

    #[test]
    fn history_breaks_quiet_ties() {
        let board = Board::start_pos();
        let list = board.legal_moves(GenStage::All);
        let mut history = ButterflyHistory::new();
        let favoured = board.uci_to_move("d2d4");
        history.add(board.turn(), favoured, 4_000);
        let ctx = OrderingContext {
            board: &board,
            tt_move: BitMove::null(),
            killers: [BitMove::null(); 2],
            history: &history,
        };
        let mut cache = SeeCache::new();
        let mut scores = [0i32; MAX_MOVES];
        score_moves(&list, &ctx, &mut cache, &mut scores);
        let mut list = list;
        select_best_move(&mut list, &mut scores, 0);
        assert_eq!(list[0], favoured);
    }
}
