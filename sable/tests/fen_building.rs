//! FEN parsing and emission.

use sable::board::fen::{ALL_FENS, START_FEN};
use sable::{Board, FenBuildError, Player, SQ};

#[test]
fn round_trip_all_fens() {
    for fen in ALL_FENS.iter() {
        let board = Board::from_fen(fen, true).unwrap();
        assert_eq!(&board.to_fen(), fen, "round trip failed");
        let again = Board::from_fen(&board.to_fen(), true).unwrap();
        assert_eq!(board.to_fen(), again.to_fen());
        assert_eq!(board.zobrist(), again.zobrist());
    }
}

#[test]
fn missing_counters_default() {
    let board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - -", true).unwrap();
    assert_eq!(board.rule_50(), 0);
    assert_eq!(board.full_moves(), 1);
    assert_eq!(board.to_fen(), "4k3/8/8/8/8/8/8/4K3 w - - 0 1");
}

#[test]
fn four_fields_required() {
    match Board::from_fen("4k3/8/8/8/8/8/8/4K3 w -", true) {
        Err(FenBuildError::NotEnoughSections { sections }) => assert_eq!(sections, 3),
        other => panic!("expected NotEnoughSections, got {:?}", other.map(|b| b.to_fen())),
    }
}

#[test]
fn bad_piece_letter_rejected() {
    assert!(matches!(
        Board::from_fen("4kx2/8/8/8/8/8/8/4K3 w - - 0 1", true),
        Err(FenBuildError::UnrecognizedPiece { .. })
    ));
}

#[test]
fn bad_rank_count_rejected() {
    assert!(matches!(
        Board::from_fen("8/8/8/8/8/8/8 w - - 0 1", true),
        Err(FenBuildError::IncorrectRankAmounts { ranks: 7 })
    ));
}

#[test]
fn unknown_castle_letter_strict_vs_lenient() {
    let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQxq - 0 1";
    assert!(matches!(
        Board::from_fen(fen, true),
        Err(FenBuildError::UnrecognizedCastle { castle: 'x' })
    ));
    let board = Board::from_fen(fen, false).unwrap();
    assert_eq!(board.castling().pretty_string(), "KQq");
}

#[test]
fn invalid_ep_strict_vs_lenient() {
    // e6 names an en-passant target with no black pawn on e5 behind it.
    let fen = "4k3/8/8/8/8/8/8/4K3 w - e6 0 1";
    assert!(matches!(
        Board::from_fen(fen, true),
        Err(FenBuildError::EPSquareInvalid { .. })
    ));
    let board = Board::from_fen(fen, false).unwrap();
    assert_eq!(board.ep_square(), SQ::NONE);
}

#[test]
fn unreadable_ep_square() {
    assert!(matches!(
        Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - zz 0 1", true),
        Err(FenBuildError::EPSquareUnreadable { .. })
    ));
}

#[test]
fn side_to_move_parsing() {
    let board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 1", true).unwrap();
    assert_eq!(board.turn(), Player::Black);
    assert!(matches!(
        Board::from_fen("4k3/8/8/8/8/8/8/4K3 x - - 0 1", true),
        Err(FenBuildError::UnrecognizedTurn { .. })
    ));
}

#[test]
fn start_pos_matches_constant() {
    assert_eq!(Board::start_pos().to_fen(), START_FEN);
}

#[test]
fn errors_format_usefully() {
    let err = Board::from_fen("bogus", true).unwrap_err();
    assert!(err.to_string().contains("sections"));
}
