//! Compile-time constants and masks used across the board representation.

/// Number of players.
pub const PLAYER_CNT: usize = 2;
/// Number of piece-type slots, including the `None` slot at index zero.
pub const PIECE_TYPE_CNT: usize = 7;
/// Number of squares on a chessboard.
pub const SQ_CNT: usize = 64;
/// Number of files on a chessboard.
pub const FILE_CNT: usize = 8;
/// Number of ranks on a chessboard.
pub const RANK_CNT: usize = 8;
/// Number of distinct castling-rights bytes.
pub const CASTLING_CNT: usize = 16;
/// Upper bound on the number of legal moves in any position.
pub const MAX_MOVES: usize = 256;

pub const FILE_A: u64 = 0x0101_0101_0101_0101;
pub const FILE_B: u64 = FILE_A << 1;
pub const FILE_C: u64 = FILE_A << 2;
pub const FILE_D: u64 = FILE_A << 3;
pub const FILE_E: u64 = FILE_A << 4;
pub const FILE_F: u64 = FILE_A << 5;
pub const FILE_G: u64 = FILE_A << 6;
pub const FILE_H: u64 = FILE_A << 7;

pub const RANK_1: u64 = 0x0000_0000_0000_00FF;
pub const RANK_2: u64 = RANK_1 << 8;
pub const RANK_3: u64 = RANK_1 << 16;
pub const RANK_4: u64 = RANK_1 << 24;
pub const RANK_5: u64 = RANK_1 << 32;
pub const RANK_6: u64 = RANK_1 << 40;
pub const RANK_7: u64 = RANK_1 << 48;
pub const RANK_8: u64 = RANK_1 << 56;

/// File bitboards, indexed by file number.
pub static FILE_BB: [u64; FILE_CNT] = [
    FILE_A, FILE_B, FILE_C, FILE_D, FILE_E, FILE_F, FILE_G, FILE_H,
];

/// Rank bitboards, indexed by rank number.
pub static RANK_BB: [u64; RANK_CNT] = [
    RANK_1, RANK_2, RANK_3, RANK_4, RANK_5, RANK_6, RANK_7, RANK_8,
];

// Castling-rights bits, one per right.
pub const C_WHITE_K_MASK: u8 = 0b0001;
pub const C_WHITE_Q_MASK: u8 = 0b0010;
pub const C_BLACK_K_MASK: u8 = 0b0100;
pub const C_BLACK_Q_MASK: u8 = 0b1000;

// Home squares that carry castling rights.
pub const ROOK_WHITE_KSIDE_START: u8 = 7;
pub const ROOK_WHITE_QSIDE_START: u8 = 0;
pub const ROOK_BLACK_KSIDE_START: u8 = 63;
pub const ROOK_BLACK_QSIDE_START: u8 = 56;
pub const WHITE_KING_START: u8 = 4;
pub const BLACK_KING_START: u8 = 60;

/// Characters used to display each file.
pub static FILE_DISPLAYS: [char; FILE_CNT] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];

/// Characters used to display each rank.
pub static RANK_DISPLAYS: [char; RANK_CNT] = ['1', '2', '3', '4', '5', '6', '7', '8'];

/// Algebraic names for every square, indexed by square number.
pub static SQ_DISPLAY: [&str; SQ_CNT] = [
    "a1", "b1", "c1", "d1", "e1", "f1", "g1", "h1",
    "a2", "b2", "c2", "d2", "e2", "f2", "g2", "h2",
    "a3", "b3", "c3", "d3", "e3", "f3", "g3", "h3",
    "a4", "b4", "c4", "d4", "e4", "f4", "g4", "h4",
    "a5", "b5", "c5", "d5", "e5", "f5", "g5", "h5",
    "a6", "b6", "c6", "d6", "e6", "f6", "g6", "h6",
    "a7", "b7", "c7", "d7", "e7", "f7", "g7", "h7",
    "a8", "b8", "c8", "d8", "e8", "f8", "g8", "h8",
];
