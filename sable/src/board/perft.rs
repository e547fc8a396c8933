//! Perft: counts the leaves of the legal move tree to a fixed depth. The
//! canonical move-generation correctness check.

use crate::core::move_list::MoveList;
use crate::core::GenStage;

use super::{Board, Undo};

/// Returns the number of leaf nodes of the legal move tree rooted at
/// `board`, `depth` plies deep.
pub fn perft(board: &mut Board, depth: u16) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut moves = MoveList::default();
    board.generate_moves(&mut moves, GenStage::All);
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut count: u64 = 0;
    let mut undo = Undo::default();
    for mv in moves.iter() {
        board.make(*mv, &mut undo);
        count += perft(board, depth - 1);
        board.unmake(*mv, &undo);
    }
    count
}

/// Perft split by root move, for pinpointing generator disagreements.
pub fn perft_divide(board: &mut Board, depth: u16) -> Vec<(String, u64)> {
    let mut moves = MoveList::default();
    board.generate_moves(&mut moves, GenStage::All);
    let mut out = Vec::with_capacity(moves.len());
    let mut undo = Undo::default();
    for mv in moves.iter() {
        board.make(*mv, &mut undo);
        let count = if depth <= 1 {
            1
        } else {
            perft(board, depth - 1)
        };
        board.unmake(*mv, &undo);
        out.push((mv.stringify(), count));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perft_startpos_shallow() {
        let mut b = Board::start_pos();
        assert_eq!(perft(&mut b, 1), 20);
        assert_eq!(perft(&mut b, 2), 400);
        assert_eq!(perft(&mut b, 3), 8_902);
    }

    #[test]
    fn divide_sums_to_perft() {
        let mut b = Board::start_pos();
        let split = perft_divide(&mut b, 3);
        let total: u64 = split.iter().map(|(_, n)| n).sum();
        assert_eq!(total, perft(&mut b, 3));
    }
}
