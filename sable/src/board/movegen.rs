//! Move generation: a pseudo-legal pass over every piece, followed by a
//! legality refinement built on checkers and pin masks.
//!
//! The pseudo-legal pass emits every move that obeys piece-movement rules.
//! The refinement rejects moves leaving the mover's king attacked: king
//! steps are verified against the occupancy with the king removed, non-king
//! moves while in check must land on the capture-or-block mask, pinned
//! pieces may only travel along the line through their king, and en-passant
//! always falls back to a make/unmake probe because removing the captured
//! pawn can expose the king horizontally.
//!
//! Emission order within one call is deterministic but unspecified; callers
//! order moves themselves.

use crate::core::bitboard::BitBoard;
use crate::core::masks::*;
use crate::core::move_list::MoveList;
use crate::core::piece_move::{BitMove, MoveFlag};
use crate::core::sq::{NO_SQ, SQ};
use crate::core::{GenStage, PieceType, Player, Rank};
use crate::helper::prelude::*;
use crate::tools::trace::{trace_emit, trace_enabled, TraceTopic};

use super::Board;

#[inline(always)]
fn north(b: u64) -> u64 {
    b << 8
}

#[inline(always)]
fn south(b: u64) -> u64 {
    b >> 8
}

#[inline(always)]
fn north_east(b: u64) -> u64 {
    (b << 9) & !FILE_A
}

#[inline(always)]
fn north_west(b: u64) -> u64 {
    (b << 7) & !FILE_H
}

#[inline(always)]
fn south_east(b: u64) -> u64 {
    (b >> 7) & !FILE_A
}

#[inline(always)]
fn south_west(b: u64) -> u64 {
    (b >> 9) & !FILE_H
}

const PROMO_KINDS: [PieceType; 4] = [PieceType::Q, PieceType::R, PieceType::B, PieceType::N];

impl Board {
    /// Generates the legal moves of the side to move, filtered by `stage`.
    pub fn generate_moves(&self, out: &mut MoveList, stage: GenStage) {
        let mut pseudo = MoveList::default();
        self.generate_pseudo_legal(&mut pseudo);
        out.clear();

        let us = self.turn();
        let them = !us;
        let ksq = self.king_sq(us);
        debug_assert!(ksq.is_okay(), "side to move has no king");

        let checkers = self.attackers_to(ksq, self.occupied()) & self.occupied_player(them);
        let double_check = checkers.more_than_one();
        let pinned = self.pinned_pieces(us);
        let check_mask = if checkers.is_not_empty() && !double_check {
            let csq = checkers.bit_scan_forward();
            checkers | between_bb(ksq, csq)
        } else {
            BitBoard::ALL
        };

        for mv in pseudo.iter() {
            match stage {
                GenStage::Captures if !mv.is_capture() => continue,
                GenStage::Quiets if mv.is_capture() => continue,
                _ => {}
            }
            if self.refine_legality(*mv, ksq, checkers, double_check, pinned, check_mask) {
                out.push(*mv);
            }
        }

        if trace_enabled(TraceTopic::Moves) {
            trace_emit(
                TraceTopic::Moves,
                &format!(
                    "generated stage={:?} pseudo={} legal={} checkers={} pinned={}",
                    stage,
                    pseudo.len(),
                    out.len(),
                    checkers.count_bits(),
                    pinned.count_bits()
                ),
            );
        }
    }

    /// Convenience wrapper returning a fresh list.
    pub fn legal_moves(&self, stage: GenStage) -> MoveList {
        let mut out = MoveList::default();
        self.generate_moves(&mut out, stage);
        out
    }

    /// The pieces of `player` pinned to their own king by an enemy slider.
    pub fn pinned_pieces(&self, player: Player) -> BitBoard {
        let ksq = self.king_sq(player);
        let them = !player;
        let mut pinned = BitBoard::EMPTY;

        let mut snipers = (rook_moves(BitBoard::EMPTY, ksq)
            & self.piece_bb_two(them, PieceType::R, PieceType::Q))
            | (bishop_moves(BitBoard::EMPTY, ksq)
                & self.piece_bb_two(them, PieceType::B, PieceType::Q));

        while let Some(sniper) = snipers.pop_some_lsb() {
            let blockers = between_bb(ksq, sniper) & self.occupied();
            if !blockers.more_than_one() && (blockers & self.occupied_player(player)).is_not_empty()
            {
                pinned |= blockers;
            }
        }
        pinned
    }

    /// Applies the king-safety rules to one pseudo-legal move.
    fn refine_legality(
        &self,
        mv: BitMove,
        ksq: SQ,
        checkers: BitBoard,
        double_check: bool,
        pinned: BitBoard,
        check_mask: BitBoard,
    ) -> bool {
        let from = mv.get_src();
        let to = mv.get_dest();
        let them = !self.turn();

        // Removing the captured pawn can open a rank or diagonal onto the
        // king, so en-passant is always probed the slow way.
        if mv.is_en_passant() {
            return self.is_legal_slow(mv);
        }

        if from == ksq {
            if mv.is_castle() {
                // Transit attacks were rejected during emission; a castle
                // only remains illegal here when the king starts in check.
                return checkers.is_empty();
            }
            let occ_no_king = self.occupied() ^ from.to_bb();
            let attackers =
                self.attackers_to(to, occ_no_king) & self.occupied_player(them) & !to.to_bb();
            return attackers.is_empty();
        }

        if double_check {
            return false;
        }
        if !check_mask.contains(to) {
            return false;
        }
        if pinned.contains(from) && !line_bb(ksq, from).contains(to) {
            return false;
        }
        true
    }

    /// Emits every move satisfying piece-movement rules, king safety
    /// unchecked.
    pub fn generate_pseudo_legal(&self, out: &mut MoveList) {
        out.clear();
        let us = self.turn();
        let them = !us;
        let ours = self.occupied_player(us).0;
        let theirs = self.occupied_player(them).0;
        let occ = self.occupied().0;
        let empty = !occ;

        self.gen_pawn_moves(out, us, theirs, empty);
        self.gen_leapers_and_sliders(out, us, ours, theirs);
        self.gen_castling(out, us);
    }

    fn gen_pawn_moves(&self, out: &mut MoveList, us: Player, theirs: u64, empty: u64) {
        let pawns = self.piece_bb(us, PieceType::P).0;

        let (promo_rank, double_target_rank) = match us {
            Player::White => (RANK_8, RANK_4),
            Player::Black => (RANK_1, RANK_5),
        };
        let up: fn(u64) -> u64 = match us {
            Player::White => north,
            Player::Black => south,
        };
        let up_west: fn(u64) -> u64 = match us {
            Player::White => north_west,
            Player::Black => south_west,
        };
        let up_east: fn(u64) -> u64 = match us {
            Player::White => north_east,
            Player::Black => south_east,
        };
        let push = us.pawn_push();

        // Single and double pushes.
        let single = up(pawns) & empty;
        let mut quiet_pushes = BitBoard(single & !promo_rank);
        while let Some(to) = quiet_pushes.pop_some_lsb() {
            out.push(BitMove::make_quiet(shifted(to, -push), to));
        }
        let mut doubles = BitBoard(up(single) & empty & double_target_rank);
        while let Some(to) = doubles.pop_some_lsb() {
            out.push(BitMove::make_pawn_push(shifted(to, -2 * push), to));
        }

        // Quiet promotions.
        let mut promo_pushes = BitBoard(single & promo_rank);
        while let Some(to) = promo_pushes.pop_some_lsb() {
            let from = shifted(to, -push);
            for promo in PROMO_KINDS {
                out.push(BitMove::make(from, to, MoveFlag::Promotion, promo));
            }
        }

        // Captures, with the promotion variants split off.
        let west_caps = up_west(pawns) & theirs;
        let east_caps = up_east(pawns) & theirs;
        let west_delta: i8 = match us {
            Player::White => -7,
            Player::Black => 9,
        };
        let east_delta: i8 = match us {
            Player::White => -9,
            Player::Black => 7,
        };
        for (caps, delta) in [(west_caps, west_delta), (east_caps, east_delta)] {
            let mut plain = BitBoard(caps & !promo_rank);
            while let Some(to) = plain.pop_some_lsb() {
                out.push(BitMove::make_capture(shifted(to, delta), to));
            }
            let mut promos = BitBoard(caps & promo_rank);
            while let Some(to) = promos.pop_some_lsb() {
                let from = shifted(to, delta);
                for promo in PROMO_KINDS {
                    out.push(BitMove::make(from, to, MoveFlag::PromotionCapture, promo));
                }
            }
        }

        // En passant.
        let ep = self.ep_square();
        if ep != NO_SQ {
            debug_assert_eq!(
                ep.rank(),
                if us == Player::White { Rank::R6 } else { Rank::R3 }
            );
            let mut ep_attackers =
                BitBoard(pawn_attacks_from(ep, !us).0 & self.piece_bb(us, PieceType::P).0);
            while let Some(from) = ep_attackers.pop_some_lsb() {
                out.push(BitMove::make_ep_capture(from, ep));
            }
        }
    }

    fn gen_leapers_and_sliders(&self, out: &mut MoveList, us: Player, ours: u64, theirs: u64) {
        let occ = self.occupied();

        let mut emit_from_bb = |from: SQ, mut targets: BitBoard| {
            while let Some(to) = targets.pop_some_lsb() {
                if theirs & to.to_bb().0 != 0 {
                    out.push(BitMove::make_capture(from, to));
                } else {
                    out.push(BitMove::make_quiet(from, to));
                }
            }
        };

        let mut knights = self.piece_bb(us, PieceType::N);
        while let Some(from) = knights.pop_some_lsb() {
            emit_from_bb(from, BitBoard(knight_moves(from).0 & !ours));
        }

        let mut bishops = self.piece_bb(us, PieceType::B);
        while let Some(from) = bishops.pop_some_lsb() {
            emit_from_bb(from, BitBoard(bishop_moves(occ, from).0 & !ours));
        }

        let mut rooks = self.piece_bb(us, PieceType::R);
        while let Some(from) = rooks.pop_some_lsb() {
            emit_from_bb(from, BitBoard(rook_moves(occ, from).0 & !ours));
        }

        let mut queens = self.piece_bb(us, PieceType::Q);
        while let Some(from) = queens.pop_some_lsb() {
            emit_from_bb(from, BitBoard(queen_moves(occ, from).0 & !ours));
        }

        let from = self.king_sq(us);
        if from.is_okay() {
            emit_from_bb(from, BitBoard(king_moves(from).0 & !ours));
        }
    }

    /// Castling is emitted only when the right survives, the squares between
    /// king and rook are empty, and neither the king's square nor the two
    /// squares it crosses are attacked.
    fn gen_castling(&self, out: &mut MoveList, us: Player) {
        use crate::core::CastleType;

        if self.no_remaining_rights(us) {
            return;
        }
        let occ = self.occupied().0;
        let them = !us;

        match us {
            Player::White => {
                if self.castling().castle_rights(Player::White, CastleType::KingSide)
                    && occ & (SQ::F1.to_bb().0 | SQ::G1.to_bb().0) == 0
                    && !self.is_square_attacked(SQ::E1, them)
                    && !self.is_square_attacked(SQ::F1, them)
                    && !self.is_square_attacked(SQ::G1, them)
                {
                    out.push(BitMove::make(
                        SQ::E1,
                        SQ::G1,
                        MoveFlag::KingCastle,
                        PieceType::None,
                    ));
                }
                if self.castling().castle_rights(Player::White, CastleType::QueenSide)
                    && occ & (SQ::D1.to_bb().0 | SQ::C1.to_bb().0 | SQ::B1.to_bb().0) == 0
                    && !self.is_square_attacked(SQ::E1, them)
                    && !self.is_square_attacked(SQ::D1, them)
                    && !self.is_square_attacked(SQ::C1, them)
                {
                    out.push(BitMove::make(
                        SQ::E1,
                        SQ::C1,
                        MoveFlag::QueenCastle,
                        PieceType::None,
                    ));
                }
            }
            Player::Black => {
                if self.castling().castle_rights(Player::Black, CastleType::KingSide)
                    && occ & (SQ::F8.to_bb().0 | SQ::G8.to_bb().0) == 0
                    && !self.is_square_attacked(SQ::E8, them)
                    && !self.is_square_attacked(SQ::F8, them)
                    && !self.is_square_attacked(SQ::G8, them)
                {
                    out.push(BitMove::make(
                        SQ::E8,
                        SQ::G8,
                        MoveFlag::KingCastle,
                        PieceType::None,
                    ));
                }
                if self.castling().castle_rights(Player::Black, CastleType::QueenSide)
                    && occ & (SQ::D8.to_bb().0 | SQ::C8.to_bb().0 | SQ::B8.to_bb().0) == 0
                    && !self.is_square_attacked(SQ::E8, them)
                    && !self.is_square_attacked(SQ::D8, them)
                    && !self.is_square_attacked(SQ::C8, them)
                {
                    out.push(BitMove::make(
                        SQ::E8,
                        SQ::C8,
                        MoveFlag::QueenCastle,
                        PieceType::None,
                    ));
                }
            }
        }
    }

    /// Castling never emits when no right survives; cheap pre-filter.
    #[inline]
    fn no_remaining_rights(&self, us: Player) -> bool {
        let relevant = match us {
            Player::White => super::castle_rights::Castling::WHITE_ALL,
            Player::Black => super::castle_rights::Castling::BLACK_ALL,
        };
        (self.castling() & relevant).is_empty()
    }
}

/// Offsets a square index by a signed delta.
#[inline(always)]
fn shifted(sq: SQ, delta: i8) -> SQ {
    SQ((sq.0 as i8 + delta) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fen::ALL_FENS;

    #[test]
    fn startpos_has_twenty_moves() {
        let b = Board::start_pos();
        let moves = b.legal_moves(GenStage::All);
        assert_eq!(moves.len(), 20);
    }

    #[test]
    fn legal_is_subset_of_pseudo() {
        for fen in ALL_FENS.iter() {
            let b = Board::from_fen(fen, true).unwrap();
            let mut pseudo = MoveList::default();
            b.generate_pseudo_legal(&mut pseudo);
            let legal = b.legal_moves(GenStage::All);
            assert!(legal.len() <= pseudo.len());
            for mv in legal.iter() {
                assert!(pseudo.contains(*mv), "{} missing from pseudo set", mv);
            }
        }
    }

    #[test]
    fn every_generated_move_is_legal() {
        for fen in ALL_FENS.iter() {
            let b = Board::from_fen(fen, true).unwrap();
            for mv in b.legal_moves(GenStage::All).iter() {
                assert!(b.is_legal_slow(*mv), "illegal move {} from {}", mv, fen);
            }
        }
    }

    #[test]
    fn every_legal_pseudo_move_is_generated() {
        for fen in ALL_FENS.iter() {
            let b = Board::from_fen(fen, true).unwrap();
            let mut pseudo = MoveList::default();
            b.generate_pseudo_legal(&mut pseudo);
            let legal = b.legal_moves(GenStage::All);
            for mv in pseudo.iter() {
                if b.is_legal_slow(*mv) {
                    assert!(legal.contains(*mv), "legal move {} dropped from {}", mv, fen);
                }
            }
        }
    }

    #[test]
    fn double_check_only_king_moves() {
        // Knight on f6 and rook on e1 both give check; only the king may move.
        let b = Board::from_fen("4k3/8/5N2/8/8/8/8/4RK2 b - - 0 1", true).unwrap();
        let moves = b.legal_moves(GenStage::All);
        assert!(!moves.is_empty());
        for mv in moves.iter() {
            assert_eq!(mv.get_src(), b.king_sq(Player::Black));
        }
    }

    #[test]
    fn pinned_piece_moves_along_pin_only() {
        // White bishop on d2 is pinned by the rook on d8 against the king on d1.
        let b = Board::from_fen("3r2k1/8/8/8/8/8/3B4/3K4 w - - 0 1", true).unwrap();
        let moves = b.legal_moves(GenStage::All);
        for mv in moves.iter() {
            if mv.get_src() == SQ::D2 {
                panic!("pinned bishop moved: {}", mv);
            }
        }
        assert_eq!(b.pinned_pieces(Player::White), SQ::D2.to_bb());
    }

    #[test]
    fn ep_discovered_check_is_rejected() {
        // Capturing en passant would remove both pawns from the fifth rank
        // and expose the white king to the rook on h5.
        let b = Board::from_fen("8/8/8/KPp4r/8/8/8/4k3 w - c6 0 2", true).unwrap();
        let moves = b.legal_moves(GenStage::All);
        for mv in moves.iter() {
            assert!(!mv.is_en_passant(), "illegal ep allowed: {}", mv);
        }
    }

    #[test]
    fn king_cannot_retreat_along_checking_ray() {
        // Rook checks along the e-file; e2 stays attacked once the king moves.
        let b = Board::from_fen("4r3/8/8/8/8/8/4K3/8 w - - 0 1", true).unwrap();
        let moves = b.legal_moves(GenStage::All);
        for mv in moves.iter() {
            assert_ne!(mv.get_dest(), SQ::E1, "retreat along ray allowed");
        }
    }
}
