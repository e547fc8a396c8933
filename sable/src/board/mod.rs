//! This module contains [`Board`], the object representing the current state
//! of a chess game, together with the [`Undo`] records that let moves be
//! reversed exactly.
//!
//! All mutation flows through [`Board::make`] / [`Board::unmake`] (and their
//! null-move variants); everything else is a query. The mailbox, the
//! per-piece bitboards, the aggregate occupancies, the cached king squares,
//! and the Zobrist hash are kept mutually consistent incrementally.

pub mod castle_rights;
pub mod fen;
pub mod movegen;
pub mod perft;

use crate::core::bitboard::BitBoard;
use crate::core::masks::*;
use crate::core::piece_move::{BitMove, MoveFlag};
use crate::core::sq::{NO_SQ, SQ};
use crate::core::{Piece, PieceType, Player};
use crate::helper::prelude::*;

use self::castle_rights::Castling;
use self::fen::{FenBuildError, START_FEN};

use std::fmt;

/// Everything needed to reverse one `make`: the pre-move hash, the move, the
/// captured piece, and the irreversible state (castling rights, halfmove
/// clock, en-passant square).
#[derive(Copy, Clone, Debug)]
pub struct Undo {
    pub key: u64,
    pub bit_move: BitMove,
    pub captured: Piece,
    pub castling: Castling,
    pub rule_50: u8,
    pub ep_square: SQ,
}

impl Default for Undo {
    fn default() -> Undo {
        Undo {
            key: 0,
            bit_move: BitMove::null(),
            captured: Piece::None,
            castling: Castling::empty(),
            rule_50: 0,
            ep_square: NO_SQ,
        }
    }
}

/// Represents a chessboard.
///
/// The exact mapping from squares to bits is LSB = a1 increasing file-first,
/// so bit 7 is h1 and bit 63 is h8.
#[derive(Clone)]
pub struct Board {
    squares: [Piece; SQ_CNT],
    bit_boards: [[BitBoard; PIECE_TYPE_CNT]; PLAYER_CNT],
    occ: [BitBoard; PLAYER_CNT],
    occ_all: BitBoard,
    kings: [SQ; PLAYER_CNT],
    turn: Player,
    castling: Castling,
    ep_square: SQ,
    rule_50: u8,
    full_moves: u16,
    zobrist: u64,
}

impl Board {
    /// Constructs an empty board: no pieces, White to move.
    fn blank() -> Board {
        Board {
            squares: [Piece::None; SQ_CNT],
            bit_boards: [[BitBoard::EMPTY; PIECE_TYPE_CNT]; PLAYER_CNT],
            occ: [BitBoard::EMPTY; PLAYER_CNT],
            occ_all: BitBoard::EMPTY,
            kings: [NO_SQ; PLAYER_CNT],
            turn: Player::White,
            castling: Castling::empty(),
            ep_square: NO_SQ,
            rule_50: 0,
            full_moves: 1,
            zobrist: 0,
        }
    }

    /// Constructs a board from the starting position.
    pub fn start_pos() -> Board {
        init_statics();
        Board::from_fen(START_FEN, true).expect("start position FEN parses")
    }

    /// Constructs a board from a FEN string.
    ///
    /// The first four fields are mandatory; the halfmove clock and fullmove
    /// number default to 0 and 1. In lenient mode (`strict == false`)
    /// unknown castling letters are dropped and an invalid en-passant square
    /// is cleared instead of failing.
    pub fn from_fen(fen: &str, strict: bool) -> Result<Board, FenBuildError> {
        init_statics();
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(FenBuildError::NotEnoughSections {
                sections: fields.len(),
            });
        }

        let mut b = Board::blank();

        // Piece placement, rank 8 down to rank 1.
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenBuildError::IncorrectRankAmounts { ranks: ranks.len() });
        }
        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx;
            let mut file: usize = 0;
            for c in rank_str.chars() {
                if let Some(d) = c.to_digit(10) {
                    file += d as usize;
                } else {
                    let piece = Piece::from_character(c);
                    if piece.is_none() {
                        return Err(FenBuildError::UnrecognizedPiece { piece: c });
                    }
                    if file >= 8 {
                        return Err(FenBuildError::BadRankLength { rank: 8 - rank_idx });
                    }
                    b.put_piece(piece, SQ((rank * 8 + file) as u8));
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenBuildError::BadRankLength { rank: 8 - rank_idx });
            }
        }

        // Side to move.
        b.turn = match fields[1] {
            "w" => Player::White,
            "b" => Player::Black,
            other => {
                return Err(FenBuildError::UnrecognizedTurn {
                    turn: other.to_string(),
                })
            }
        };

        // Castling rights.
        if fields[2] != "-" {
            for c in fields[2].chars() {
                if !b.castling.add_castling_char(c) && strict {
                    return Err(FenBuildError::UnrecognizedCastle { castle: c });
                }
            }
        }

        // En passant.
        if fields[3] != "-" {
            let ep = SQ::from_string(fields[3]);
            if !ep.is_okay() {
                if strict {
                    return Err(FenBuildError::EPSquareUnreadable {
                        ep: fields[3].to_string(),
                    });
                }
            } else if b.ep_square_is_plausible(ep) {
                b.ep_square = ep;
            } else if strict {
                return Err(FenBuildError::EPSquareInvalid {
                    ep: fields[3].to_string(),
                });
            }
        }

        // Clocks. Both are optional and default to 0 / 1.
        if fields.len() >= 5 {
            b.rule_50 = fields[4].parse::<u8>()?;
        }
        if fields.len() >= 6 {
            b.full_moves = fields[5].parse::<u16>()?;
        }

        b.zobrist = b.recompute_zobrist();
        Ok(b)
    }

    /// Creates the FEN string of the board.
    pub fn to_fen(&self) -> String {
        let mut s = String::with_capacity(90);
        for rank in (0..8).rev() {
            let mut blanks = 0;
            for file in 0..8 {
                let piece = self.squares[rank * 8 + file];
                if piece.is_none() {
                    blanks += 1;
                } else {
                    if blanks != 0 {
                        s.push(char::from_digit(blanks, 10).unwrap());
                        blanks = 0;
                    }
                    s.push(piece.character());
                }
            }
            if blanks != 0 {
                s.push(char::from_digit(blanks, 10).unwrap());
            }
            if rank > 0 {
                s.push('/');
            }
        }
        s.push(' ');
        s.push(match self.turn {
            Player::White => 'w',
            Player::Black => 'b',
        });
        s.push(' ');
        s.push_str(&self.castling.pretty_string());
        s.push(' ');
        if self.ep_square == NO_SQ {
            s.push('-');
        } else {
            s.push_str(&self.ep_square.to_string());
        }
        s.push(' ');
        s.push_str(&self.rule_50.to_string());
        s.push(' ');
        s.push_str(&self.full_moves.to_string());
        s
    }

    // ------- ACCESSORS -------

    /// The player whose turn it is to move.
    #[inline(always)]
    pub fn turn(&self) -> Player {
        self.turn
    }

    /// The current Zobrist hash.
    #[inline(always)]
    pub fn zobrist(&self) -> u64 {
        self.zobrist
    }

    /// The current en-passant target square, `NO_SQ` if unavailable.
    #[inline(always)]
    pub fn ep_square(&self) -> SQ {
        self.ep_square
    }

    /// The castling rights still available.
    #[inline(always)]
    pub fn castling(&self) -> Castling {
        self.castling
    }

    /// Plies since the last pawn move or capture.
    #[inline(always)]
    pub fn rule_50(&self) -> u8 {
        self.rule_50
    }

    /// The fullmove counter, starting at 1 and bumped after Black moves.
    #[inline(always)]
    pub fn full_moves(&self) -> u16 {
        self.full_moves
    }

    /// The square of the given player's king.
    #[inline(always)]
    pub fn king_sq(&self, player: Player) -> SQ {
        self.kings[player as usize]
    }

    /// The piece standing on the given square.
    #[inline(always)]
    pub fn piece_at_sq(&self, sq: SQ) -> Piece {
        debug_assert!(sq.is_okay());
        self.squares[sq.0 as usize]
    }

    /// The piece being moved by `mv`.
    #[inline(always)]
    pub fn moved_piece(&self, mv: BitMove) -> Piece {
        self.piece_at_sq(mv.get_src())
    }

    /// The bitboard of all occupied squares.
    #[inline(always)]
    pub fn occupied(&self) -> BitBoard {
        self.occ_all
    }

    /// The bitboard of squares occupied by one player.
    #[inline(always)]
    pub fn occupied_player(&self, player: Player) -> BitBoard {
        self.occ[player as usize]
    }

    /// The bitboard for one player's pieces of one type.
    #[inline(always)]
    pub fn piece_bb(&self, player: Player, piece_type: PieceType) -> BitBoard {
        debug_assert!(piece_type.is_some());
        self.bit_boards[player as usize][piece_type as usize]
    }

    /// The union of two piece types for one player.
    #[inline(always)]
    pub fn piece_bb_two(&self, player: Player, pt1: PieceType, pt2: PieceType) -> BitBoard {
        self.piece_bb(player, pt1) | self.piece_bb(player, pt2)
    }

    /// Number of non-pawn, non-king pieces a player has on the board.
    #[inline]
    pub fn non_pawn_piece_count(&self, player: Player) -> u8 {
        (self.piece_bb_two(player, PieceType::N, PieceType::B)
            | self.piece_bb_two(player, PieceType::R, PieceType::Q))
        .count_bits()
    }

    // ------- ATTACK QUERIES -------

    /// All pieces of either color attacking `sq`, with sliders computed
    /// against the given occupancy. This is the single attack oracle used by
    /// check detection and castling legality.
    pub fn attackers_to(&self, sq: SQ, occupied: BitBoard) -> BitBoard {
        (pawn_attacks_from(sq, Player::Black) & self.piece_bb(Player::White, PieceType::P))
            | (pawn_attacks_from(sq, Player::White) & self.piece_bb(Player::Black, PieceType::P))
            | (knight_moves(sq)
                & (self.piece_bb(Player::White, PieceType::N)
                    | self.piece_bb(Player::Black, PieceType::N)))
            | (king_moves(sq)
                & (self.piece_bb(Player::White, PieceType::K)
                    | self.piece_bb(Player::Black, PieceType::K)))
            | (bishop_moves(occupied, sq)
                & (self.piece_bb_two(Player::White, PieceType::B, PieceType::Q)
                    | self.piece_bb_two(Player::Black, PieceType::B, PieceType::Q)))
            | (rook_moves(occupied, sq)
                & (self.piece_bb_two(Player::White, PieceType::R, PieceType::Q)
                    | self.piece_bb_two(Player::Black, PieceType::R, PieceType::Q)))
    }

    /// Returns true if any piece of color `by` attacks `sq` given the
    /// current occupancy.
    #[inline]
    pub fn is_square_attacked(&self, sq: SQ, by: Player) -> bool {
        (self.attackers_to(sq, self.occ_all) & self.occ[by as usize]).is_not_empty()
    }

    /// Returns true if the side to move is in check.
    #[inline]
    pub fn in_check(&self) -> bool {
        self.is_square_attacked(self.kings[self.turn as usize], !self.turn)
    }

    /// The enemy pieces currently giving check to the side to move.
    #[inline]
    pub fn checkers(&self) -> BitBoard {
        self.attackers_to(self.kings[self.turn as usize], self.occ_all)
            & self.occ[(!self.turn) as usize]
    }

    // ------- MAKE / UNMAKE -------

    /// Applies a move to the board, filling `undo` with everything needed to
    /// reverse it.
    ///
    /// # Safety
    ///
    /// The move must be legal for this position. Debug builds trap on an
    /// empty source square and on broken invariants afterwards.
    pub fn make(&mut self, mv: BitMove, undo: &mut Undo) {
        debug_assert!(!mv.is_null());
        let from = mv.get_src();
        let to = mv.get_dest();
        let us = self.turn;
        let mut moving = self.piece_at_sq(from);
        debug_assert!(!moving.is_none(), "make on empty square {}", from);
        debug_assert_eq!(moving.player_lossy(), us);
        let is_pawn_move = moving.type_of() == PieceType::P;

        undo.key = self.zobrist;
        undo.bit_move = mv;
        undo.castling = self.castling;
        undo.rule_50 = self.rule_50;
        undo.ep_square = self.ep_square;
        undo.captured = Piece::None;

        let flag = mv.flag();
        self.set_en_passant(NO_SQ);

        // Resolve and remove the captured piece, if any.
        if flag == MoveFlag::EnPassant {
            let cap_sq = sq_shift(to, -us.pawn_push());
            undo.captured = self.piece_at_sq(cap_sq);
            debug_assert_eq!(undo.captured.type_of(), PieceType::P);
            self.remove_piece(undo.captured, cap_sq);
        } else {
            let on_dest = self.piece_at_sq(to);
            if !on_dest.is_none() {
                undo.captured = on_dest;
                self.remove_piece(on_dest, to);
            }
        }

        if mv.is_promo() {
            self.remove_piece(moving, from);
            moving = Piece::make(us, mv.promo_piece());
            self.put_piece(moving, to);
        } else {
            // Fused from^to relocation; this is the fast path for quiet
            // moves and double pushes, and also serves every other plain
            // relocation.
            self.move_piece(moving, from, to);
        }

        if mv.is_castle() {
            let rank_base = to.0 & 0b11_1000;
            let (r_from, r_to) = if flag == MoveFlag::KingCastle {
                (SQ(rank_base + 7), SQ(rank_base + 5))
            } else {
                (SQ(rank_base), SQ(rank_base + 3))
            };
            let rook = self.piece_at_sq(r_from);
            debug_assert_eq!(rook.type_of(), PieceType::R);
            self.move_piece(rook, r_from, r_to);
        }

        if flag == MoveFlag::DoublePush {
            self.set_en_passant(sq_shift(from, us.pawn_push()));
        }

        // Castling rights: movement or capture touching a rook corner or the
        // king's home square strips the matching rights.
        if !self.castling.is_empty() {
            let old_bits = self.castling.bits();
            self.castling.update_for_move(from, to);
            if moving.type_of() == PieceType::K {
                match us {
                    Player::White => self.castling.remove(Castling::WHITE_ALL),
                    Player::Black => self.castling.remove(Castling::BLACK_ALL),
                }
            }
            if old_bits != self.castling.bits() {
                self.zobrist ^= z_castle(old_bits) ^ z_castle(self.castling.bits());
            }
        }

        if is_pawn_move || !undo.captured.is_none() {
            self.rule_50 = 0;
        } else {
            self.rule_50 = self.rule_50.wrapping_add(1);
        }
        if us == Player::Black {
            self.full_moves += 1;
        }

        self.turn = !us;
        self.zobrist ^= z_side();

        debug_assert!(self.is_sane().is_ok(), "{:?}", self.is_sane());
    }

    /// Exactly reverses a [`Board::make`], restoring every field including
    /// the Zobrist hash.
    pub fn unmake(&mut self, mv: BitMove, undo: &Undo) {
        debug_assert_eq!(mv, undo.bit_move);
        self.turn = !self.turn;
        let us = self.turn;
        let from = mv.get_src();
        let to = mv.get_dest();

        if mv.is_castle() {
            let rank_base = to.0 & 0b11_1000;
            let (r_home, r_landed) = if mv.flag() == MoveFlag::KingCastle {
                (SQ(rank_base + 7), SQ(rank_base + 5))
            } else {
                (SQ(rank_base), SQ(rank_base + 3))
            };
            let rook = self.piece_at_sq(r_landed);
            self.move_piece(rook, r_landed, r_home);
        }

        let mut moving = self.piece_at_sq(to);
        debug_assert!(!moving.is_none());
        if mv.is_promo() {
            self.remove_piece(moving, to);
            moving = Piece::make(us, PieceType::P);
            self.put_piece(moving, from);
        } else {
            self.move_piece(moving, to, from);
        }

        if mv.is_en_passant() {
            let cap_sq = sq_shift(to, -us.pawn_push());
            self.put_piece(undo.captured, cap_sq);
        } else if !undo.captured.is_none() {
            self.put_piece(undo.captured, to);
        }

        self.castling = undo.castling;
        self.ep_square = undo.ep_square;
        self.rule_50 = undo.rule_50;
        if us == Player::Black {
            self.full_moves -= 1;
        }
        self.zobrist = undo.key;

        debug_assert!(self.is_sane().is_ok(), "{:?}", self.is_sane());
    }

    /// Swaps the side to move without moving a piece. Only the search's
    /// null-move heuristic may use this.
    ///
    /// # Safety
    ///
    /// Must not be called while in check; debug builds trap.
    pub fn make_null(&mut self, undo: &mut Undo) {
        debug_assert!(!self.in_check());
        undo.key = self.zobrist;
        undo.bit_move = BitMove::null();
        undo.captured = Piece::None;
        undo.castling = self.castling;
        undo.rule_50 = self.rule_50;
        undo.ep_square = self.ep_square;

        self.set_en_passant(NO_SQ);
        self.rule_50 = self.rule_50.wrapping_add(1);
        self.turn = !self.turn;
        self.zobrist ^= z_side();
    }

    /// Reverses a [`Board::make_null`].
    pub fn unmake_null(&mut self, undo: &Undo) {
        debug_assert!(undo.bit_move.is_null());
        self.turn = !self.turn;
        self.ep_square = undo.ep_square;
        self.rule_50 = undo.rule_50;
        self.zobrist = undo.key;
    }

    /// Verifies a move's legality the slow way: apply it and look at the
    /// mover's king. Used for en-passant, whose discovered-check patterns
    /// evade the pin masks.
    pub fn is_legal_slow(&self, mv: BitMove) -> bool {
        let mut scratch = self.clone();
        let mut undo = Undo::default();
        let us = self.turn;
        scratch.make(mv, &mut undo);
        !scratch.is_square_attacked(scratch.king_sq(us), scratch.turn())
    }

    /// Resolves UCI coordinate notation (e.g. `e2e4`, `a7a8q`) against the
    /// legal moves of this position. Returns the null move when nothing
    /// matches.
    pub fn uci_to_move(&self, text: &str) -> BitMove {
        let mut moves = crate::core::move_list::MoveList::default();
        self.generate_moves(&mut moves, crate::core::GenStage::All);
        for mv in moves.iter() {
            if mv.stringify() == text {
                return *mv;
            }
        }
        BitMove::null()
    }

    // ------- INVARIANT CHECKING -------

    /// Defensively re-derives occupancies, king squares, and the Zobrist
    /// hash, returning a short diagnostic on the first mismatch.
    pub fn is_sane(&self) -> Result<(), String> {
        for player in [Player::White, Player::Black] {
            let mut derived = BitBoard::EMPTY;
            for pt in crate::core::ALL_PIECE_TYPES {
                derived |= self.piece_bb(player, pt);
            }
            if derived != self.occ[player as usize] {
                return Err(format!("occupancy for {} out of sync", player));
            }
            let king_bb = self.piece_bb(player, PieceType::K);
            if king_bb.count_bits() != 1 {
                return Err(format!("{} has {} kings", player, king_bb.count_bits()));
            }
            if king_bb.bit_scan_forward() != self.kings[player as usize] {
                return Err(format!("cached king square for {} is stale", player));
            }
        }
        if self.occ[0] | self.occ[1] != self.occ_all {
            return Err("aggregate occupancy out of sync".to_string());
        }
        if (self.occ[0] & self.occ[1]).is_not_empty() {
            return Err("players overlap".to_string());
        }
        for sq in 0..SQ_CNT {
            let piece = self.squares[sq];
            let bb = SQ(sq as u8).to_bb();
            if piece.is_none() {
                if (bb & self.occ_all).is_not_empty() {
                    return Err(format!("square {} occupied but mailbox empty", SQ(sq as u8)));
                }
            } else if (self.piece_bb(piece.player_lossy(), piece.type_of()) & bb).is_empty() {
                return Err(format!("mailbox and bitboards disagree at {}", SQ(sq as u8)));
            }
        }
        if self.ep_square != NO_SQ && !self.ep_square_is_plausible(self.ep_square) {
            return Err(format!("implausible en-passant square {}", self.ep_square));
        }
        let recomputed = self.recompute_zobrist();
        if recomputed != self.zobrist {
            return Err(format!(
                "zobrist drift: stored {:#018x}, recomputed {:#018x}",
                self.zobrist, recomputed
            ));
        }
        Ok(())
    }

    /// Recomputes the Zobrist hash from scratch.
    pub fn recompute_zobrist(&self) -> u64 {
        let mut zob: u64 = 0;
        let mut occ = self.occ_all;
        while let Some(sq) = occ.pop_some_lsb() {
            let piece = self.piece_at_sq(sq);
            zob ^= z_piece_sq(piece.player_lossy(), piece.type_of(), sq);
        }
        zob ^= z_castle(self.castling.bits());
        if self.ep_square != NO_SQ {
            zob ^= z_ep(self.ep_square);
        }
        if self.turn == Player::Black {
            zob ^= z_side();
        }
        zob
    }

    /// Renders the board as an 8x8 diagram for debugging.
    pub fn pretty_string(&self) -> String {
        let mut s = String::with_capacity(186);
        for rank in (0..8).rev() {
            for file in 0..8 {
                s.push_str(&self.squares[rank * 8 + file].to_string());
                s.push(' ');
            }
            s.push('\n');
        }
        s.push_str(if self.turn == Player::White {
            "white to move\n"
        } else {
            "black to move\n"
        });
        s
    }

    // ------- PRIVATE MUTATORS -------

    /// Places a piece on an empty square, updating bitboards, the mailbox,
    /// king cache, and hash.
    fn put_piece(&mut self, piece: Piece, sq: SQ) {
        debug_assert!(self.piece_at_sq(sq).is_none());
        let player = piece.player_lossy();
        let pt = piece.type_of();
        let bb = sq.to_bb();
        self.squares[sq.0 as usize] = piece;
        self.bit_boards[player as usize][pt as usize] |= bb;
        self.occ[player as usize] |= bb;
        self.occ_all |= bb;
        if pt == PieceType::K {
            self.kings[player as usize] = sq;
        }
        self.zobrist ^= z_piece_sq(player, pt, sq);
    }

    /// Removes a known piece from its square.
    fn remove_piece(&mut self, piece: Piece, sq: SQ) {
        debug_assert_eq!(self.piece_at_sq(sq), piece);
        let player = piece.player_lossy();
        let pt = piece.type_of();
        let bb = sq.to_bb();
        self.squares[sq.0 as usize] = Piece::None;
        self.bit_boards[player as usize][pt as usize] ^= bb;
        self.occ[player as usize] ^= bb;
        self.occ_all ^= bb;
        if pt == PieceType::K {
            self.kings[player as usize] = NO_SQ;
        }
        self.zobrist ^= z_piece_sq(player, pt, sq);
    }

    /// Relocates a piece with one fused from^to XOR per bitboard.
    fn move_piece(&mut self, piece: Piece, from: SQ, to: SQ) {
        debug_assert_ne!(from, to);
        debug_assert_eq!(self.piece_at_sq(from), piece);
        debug_assert!(self.piece_at_sq(to).is_none());
        let player = piece.player_lossy();
        let pt = piece.type_of();
        let comb = from.to_bb() | to.to_bb();
        self.squares[from.0 as usize] = Piece::None;
        self.squares[to.0 as usize] = piece;
        self.bit_boards[player as usize][pt as usize] ^= comb;
        self.occ[player as usize] ^= comb;
        self.occ_all ^= comb;
        if pt == PieceType::K {
            self.kings[player as usize] = to;
        }
        self.zobrist ^= z_piece_sq(player, pt, from) ^ z_piece_sq(player, pt, to);
    }

    /// Sets the en-passant square, folding the file keys in and out of the
    /// hash.
    fn set_en_passant(&mut self, sq: SQ) {
        if self.ep_square != NO_SQ {
            self.zobrist ^= z_ep(self.ep_square);
        }
        self.ep_square = sq;
        if self.ep_square != NO_SQ {
            self.zobrist ^= z_ep(self.ep_square);
        }
    }

    /// An en-passant target is plausible when it sits on the right relative
    /// rank and the just-pushed enemy pawn stands directly behind it.
    fn ep_square_is_plausible(&self, ep: SQ) -> bool {
        let them = !self.turn;
        let expected_rank = match self.turn {
            Player::White => crate::core::Rank::R6,
            Player::Black => crate::core::Rank::R3,
        };
        if ep.rank() != expected_rank {
            return false;
        }
        let pawn_sq = sq_shift(ep, -self.turn.pawn_push());
        self.piece_at_sq(pawn_sq) == Piece::make(them, PieceType::P)
    }
}

/// Offsets a square index by a signed delta.
#[inline(always)]
fn sq_shift(sq: SQ, delta: i8) -> SQ {
    SQ((sq.0 as i8 + delta) as u8)
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.pretty_string())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Board {{ fen: {} }}", self.to_fen())
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Board) -> bool {
        self.turn == other.turn
            && self.squares[..] == other.squares[..]
            && self.castling == other.castling
            && self.ep_square == other.ep_square
            && self.rule_50 == other.rule_50
            && self.full_moves == other.full_moves
            && self.zobrist == other.zobrist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::move_list::MoveList;
    use crate::core::GenStage;

    #[test]
    fn start_pos_is_sane() {
        let b = Board::start_pos();
        assert!(b.is_sane().is_ok());
        assert_eq!(b.to_fen(), START_FEN);
        assert_eq!(b.king_sq(Player::White), SQ::E1);
        assert_eq!(b.king_sq(Player::Black), SQ::E8);
        assert!(!b.in_check());
    }

    #[test]
    fn null_move_round_trip() {
        let mut b = Board::from_fen(
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
            true,
        )
        .unwrap();
        let before = b.clone();
        let mut undo = Undo::default();
        b.make_null(&mut undo);
        assert_ne!(b.zobrist(), before.zobrist());
        assert_eq!(b.ep_square(), NO_SQ);
        b.unmake_null(&undo);
        assert_eq!(b, before);
    }

    #[test]
    fn uci_move_resolution() {
        let b = Board::start_pos();
        let mv = b.uci_to_move("e2e4");
        assert!(!mv.is_null());
        assert_eq!(mv.get_src(), SQ::E2);
        assert_eq!(mv.get_dest(), SQ::E4);
        assert!(mv.is_double_push());
        assert!(b.uci_to_move("e2e5").is_null());
        assert!(b.uci_to_move("junk").is_null());
    }

    #[test]
    fn castle_make_unmake() {
        let mut b =
            Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", true).unwrap();
        let before = b.clone();
        let mv = b.uci_to_move("e1g1");
        assert!(mv.is_castle());
        let mut undo = Undo::default();
        b.make(mv, &mut undo);
        assert_eq!(b.piece_at_sq(SQ::G1), Piece::WhiteKing);
        assert_eq!(b.piece_at_sq(SQ::F1), Piece::WhiteRook);
        assert!(b.castling().pretty_string().contains('k'));
        assert!(!b.castling().pretty_string().contains('K'));
        b.unmake(mv, &undo);
        assert_eq!(b, before);
    }

    #[test]
    fn ep_capture_round_trip() {
        let mut b = Board::from_fen(
            "rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 2",
            true,
        )
        .unwrap();
        let before = b.clone();
        let mv = b.uci_to_move("d4e3");
        assert!(mv.is_en_passant());
        let mut undo = Undo::default();
        b.make(mv, &mut undo);
        assert!(b.piece_at_sq(SQ::E4).is_none());
        assert_eq!(b.piece_at_sq(SQ::E3), Piece::BlackPawn);
        b.unmake(mv, &undo);
        assert_eq!(b, before);
    }

    #[test]
    fn promotion_resets_halfmove_clock() {
        let mut b = Board::from_fen("4k3/6P1/8/8/8/8/8/4K3 w - - 12 40", true).unwrap();
        let mv = b.uci_to_move("g7g8q");
        assert!(mv.is_promo());
        let mut undo = Undo::default();
        b.make(mv, &mut undo);
        assert_eq!(b.piece_at_sq(SQ::G8), Piece::WhiteQueen);
        assert_eq!(b.rule_50(), 0);
    }

    #[test]
    fn stage_filtering() {
        let b = Board::from_fen(
            "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2",
            true,
        )
        .unwrap();
        let mut caps = MoveList::default();
        let mut quiets = MoveList::default();
        let mut all = MoveList::default();
        b.generate_moves(&mut caps, GenStage::Captures);
        b.generate_moves(&mut quiets, GenStage::Quiets);
        b.generate_moves(&mut all, GenStage::All);
        assert_eq!(caps.len() + quiets.len(), all.len());
        assert!(caps.iter().all(|m| m.is_capture()));
        assert!(quiets.iter().all(|m| !m.is_capture()));
        assert!(caps.contains(b.uci_to_move("e4d5")));
    }
}
