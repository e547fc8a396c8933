//! FEN support: the parse error type and a handful of well-known positions
//! used by the test suites.

use std::num;

/// The standard chess starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A grab-bag of positions exercising unusual board states: castling in all
/// combinations, en-passant targets, promotions pending, and heavy tactics.
pub static ALL_FENS: [&str; 10] = [
    START_FEN,
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    "4k3/8/8/4q3/4Q3/8/8/4K3 w - - 0 1",
    "4k2r/6P1/8/8/8/8/8/4K3 w - - 0 1",
    "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
    "4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1",
];

/// Errors encountered while building a `Board` from a FEN string.
#[derive(Fail, Debug)]
pub enum FenBuildError {
    #[fail(display = "invalid number of fen sections: {}, expected at least 4", sections)]
    NotEnoughSections { sections: usize },
    #[fail(display = "invalid number of ranks: {}, expected 8", ranks)]
    IncorrectRankAmounts { ranks: usize },
    #[fail(display = "invalid turn: {}, expected 'w' or 'b'", turn)]
    UnrecognizedTurn { turn: String },
    #[fail(display = "unrecognized piece: {}", piece)]
    UnrecognizedPiece { piece: char },
    #[fail(display = "unrecognized castling character: {}", castle)]
    UnrecognizedCastle { castle: char },
    #[fail(display = "unreadable en-passant square: {}", ep )]
    EPSquareUnreadable { ep: String },
    #[fail(display = "invalid en-passant square: {}", ep)]
    EPSquareInvalid { ep: String },
    #[fail(display = "unreadable move counters: {}", _0)]
    UnreadableMoves(num::ParseIntError),
    #[fail(display = "rank {} does not describe 8 squares", rank)]
    BadRankLength { rank: usize },
}

impl From<num::ParseIntError> for FenBuildError {
    fn from(err: num::ParseIntError) -> FenBuildError {
        FenBuildError::UnreadableMoves(err)
    }
}
