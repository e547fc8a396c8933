//! Make/unmake round-trip law: after `make(m); unmake(m)` the board must be
//! identical to what it was, Zobrist hash included, for every legal move at
//! every position reached during a deep pseudo-random walk.

use sable::board::fen::ALL_FENS;
use sable::tools::prng::SplitMix64;
use sable::{Board, GenStage, MoveList, Undo};

fn assert_round_trip(board: &Board) {
    let mut moves = MoveList::default();
    board.generate_moves(&mut moves, GenStage::All);
    for mv in moves.iter() {
        let mut scratch = board.clone();
        let mut undo = Undo::default();
        scratch.make(*mv, &mut undo);
        assert!(scratch.is_sane().is_ok(), "insane after {}: {:?}", mv, scratch.is_sane());
        assert_eq!(
            scratch.zobrist(),
            scratch.recompute_zobrist(),
            "incremental hash drifted after {}",
            mv
        );
        scratch.unmake(*mv, &undo);
        assert_eq!(
            &scratch, board,
            "make/unmake of {} did not restore the position",
            mv
        );
        assert_eq!(scratch.zobrist(), board.zobrist());
        assert_eq!(scratch.to_fen(), board.to_fen());
    }
}

#[test]
fn round_trip_along_random_walks() {
    let mut rng = SplitMix64::init(0xC0DE_D00D);
    for fen in ALL_FENS.iter() {
        let mut board = Board::from_fen(fen, true).unwrap();
        for _ply in 0..40 {
            assert_round_trip(&board);
            let mut moves = MoveList::default();
            board.generate_moves(&mut moves, GenStage::All);
            if moves.is_empty() {
                break;
            }
            let pick = (rng.next() % moves.len() as u64) as usize;
            let mut undo = Undo::default();
            board.make(moves[pick], &mut undo);
        }
    }
}

#[test]
fn null_move_round_trip_everywhere() {
    for fen in ALL_FENS.iter() {
        let mut board = Board::from_fen(fen, true).unwrap();
        if board.in_check() {
            continue;
        }
        let before = board.clone();
        let mut undo = Undo::default();
        board.make_null(&mut undo);
        assert_eq!(board.turn(), !before.turn());
        board.unmake_null(&undo);
        assert_eq!(board, before);
        assert_eq!(board.zobrist(), before.zobrist());
    }
}

#[test]
fn zobrist_transposes() {
    // Two move orders reaching the same position must hash identically.
    let mut a = Board::start_pos();
    let mut u = Undo::default();
    for text in ["g1f3", "g8f6", "b1c3", "b8c6"] {
        let mv = a.uci_to_move(text);
        assert!(!mv.is_null());
        a.make(mv, &mut u);
    }
    let mut b = Board::start_pos();
    for text in ["b1c3", "b8c6", "g1f3", "g8f6"] {
        let mv = b.uci_to_move(text);
        assert!(!mv.is_null());
        b.make(mv, &mut u);
    }
    assert_eq!(a.zobrist(), b.zobrist());
    assert_eq!(a.to_fen(), b.to_fen());
}
