//! Pseudo-legal move generation and the legality test
//
//  Copyright 2021 Michael Leany
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use super::*;

impl Board {
    /// Generates the pseudo-legal moves of the side to move into `moves`.
    ///
    /// Pseudo-legal moves obey the movement rules of the pieces but may leave
    /// the mover's king attacked; use
    /// [`is_pseudolegal_legal`](#method.is_pseudolegal_legal) to finish the
    /// job. With `noisy_only` set, only captures and promotions are
    /// generated. With `underpromotions` clear, promotions are generated to
    /// queens only.
    ///
    /// Castling is emitted whenever the rights exist and the squares between
    /// king and rook are empty; the attacked-square conditions are deferred
    /// to the legality test.
    pub fn pseudolegal_moves(&self, moves: &mut Vec<Move>, noisy_only: bool, underpromotions: bool) {
        moves.clear();

        let us = self.turn();
        let enemy = !us;
        let occ = self.occupied();
        let them = self.occupied_by(enemy);
        let forward = if us == White { 1 } else { -1 };

        let mask = if noisy_only { them } else { !self.occupied_by(us) };

        // en passant
        if let Some(ep) = self.en_passant_square() {
            let capturers = pawn_attacks(enemy, ep) & self.occupied_by_piece(us, Pawn);

            for from in capturers {
                moves.push(Move::new(from, ep, MoveFlag::EnPassant));
            }
        }

        for from in self.occupied_by_piece(us, Pawn) {
            let (unmoved, will_promote) = match from.rank() {
                Rank::R2 => (us == White, us == Black),
                Rank::R7 => (us == Black, us == White),
                _ => (false, false),
            };

            // captures
            for to in pawn_attacks(us, from) & them {
                if will_promote {
                    push_promotions(moves, from, to, underpromotions);
                } else {
                    moves.push(Move::new(from, to, MoveFlag::Pawn));
                }
            }

            let one_up = from.offset(0, forward).expect("INFALLIBLE");
            if occ.contains(one_up) {
                continue;
            }

            if will_promote {
                push_promotions(moves, from, one_up, underpromotions);
                continue;
            }

            if noisy_only {
                continue;
            }

            moves.push(Move::new(from, one_up, MoveFlag::Pawn));

            if unmoved {
                let two_up = one_up.offset(0, forward).expect("INFALLIBLE");

                if !occ.contains(two_up) {
                    moves.push(Move::new(from, two_up, MoveFlag::PawnTwoUp));
                }
            }
        }

        for from in self.occupied_by_piece(us, Knight) {
            for to in knight_attacks(from) & mask {
                moves.push(Move::new(from, to, MoveFlag::Knight));
            }
        }

        for from in self.occupied_by_piece(us, Bishop) {
            for to in bishop_attacks(from, occ) & mask {
                moves.push(Move::new(from, to, MoveFlag::Bishop));
            }
        }

        for from in self.occupied_by_piece(us, Rook) {
            for to in rook_attacks(from, occ) & mask {
                moves.push(Move::new(from, to, MoveFlag::Rook));
            }
        }

        for from in self.occupied_by_piece(us, Queen) {
            for to in queen_attacks(from, occ) & mask {
                moves.push(Move::new(from, to, MoveFlag::Queen));
            }
        }

        let king_sq = self.king_location(us);
        for to in king_attacks(king_sq) & mask {
            moves.push(Move::new(king_sq, to, MoveFlag::King));
        }

        // castling
        if !noisy_only && !self.in_check() {
            let rights = self.state().castling;

            let short_rook = short_castle_rook(us);
            if rights.contains(short_rook) && (occ & between(king_sq, short_rook)).is_empty() {
                let to = king_sq.offset(2, 0).expect("INFALLIBLE");
                moves.push(Move::new(king_sq, to, MoveFlag::Castling));
            }

            let long_rook = long_castle_rook(us);
            if rights.contains(long_rook) && (occ & between(king_sq, long_rook)).is_empty() {
                let to = king_sq.offset(-2, 0).expect("INFALLIBLE");
                moves.push(Move::new(king_sq, to, MoveFlag::Castling));
            }
        }
    }

    /// Returns `true` if a pseudo-legal move is fully legal.
    ///
    /// `pinned` must be the bitboard returned by [`pinned`](#method.pinned)
    /// for the current position; it is taken as a parameter so one
    /// computation serves a whole move loop.
    pub fn is_pseudolegal_legal(&self, mv: Move, pinned: Bitboard) -> bool {
        let from = mv.origin();
        let to = mv.destination();
        let enemy = !self.turn();

        if mv.flag() == MoveFlag::Castling {
            // the king's path must not pass through an attacked square; the
            // origin is already known safe since castling is never generated
            // while in check
            let step = if to > from { 1 } else { -1 };
            let first = from.offset(step, 0).expect("INFALLIBLE");
            let second = first.offset(step, 0).expect("INFALLIBLE");

            return !self.is_attacked(first, enemy, self.occupied())
                && !self.is_attacked(second, enemy, self.occupied());
        }

        let king_sq = self.king_location(self.turn());

        if mv.flag() == MoveFlag::EnPassant {
            // three squares change at once, so probe the sliders directly
            let captured_sq = behind(to, self.turn());
            let occ_after =
                self.occupied() ^ Bitboard::from(from) ^ captured_sq.into() ^ to.into();

            let bishops_queens = self.pieces(Bishop) | self.pieces(Queen);
            let rooks_queens = self.pieces(Rook) | self.pieces(Queen);

            let mut sliders = bishop_attacks(king_sq, occ_after) & bishops_queens;
            sliders |= rook_attacks(king_sq, occ_after) & rooks_queens;

            return (sliders & self.occupied_by(enemy)).is_empty();
        }

        if mv.piece() == King {
            return !self.is_attacked(to, enemy, self.occupied() ^ from.into());
        }

        // in double check only the king may move
        if self.checkers().len() > 1 {
            return false;
        }

        if pinned.contains(from) && !line_through(from, to).contains(king_sq) {
            return false;
        }

        if let Some(checker_sq) = self.checkers().peek() {
            return (between(king_sq, checker_sq) | self.checkers()).contains(to);
        }

        true
    }

    /// Returns `true` if the side to move has at least one legal move,
    /// without enumerating them all.
    ///
    /// Together with [`in_check`](#method.in_check) this distinguishes
    /// checkmate from stalemate.
    pub fn has_legal_move(&self) -> bool {
        let us = self.turn();
        let enemy = !us;
        let occ = self.occupied();
        let us_bb = self.occupied_by(us);
        let king_sq = self.king_location(us);

        // the king is lifted off the board so squares behind it along a
        // checking ray still count as attacked
        let their_attacks = self.attacks(enemy, occ ^ king_sq.into());

        if !(king_attacks(king_sq) & !us_bb & !their_attacks).is_empty() {
            return true;
        }

        let num_checkers = self.checkers().len();
        debug_assert!(num_checkers <= 2);

        // in double check only king moves could have helped
        if num_checkers > 1 {
            return false;
        }

        let mut movable = !Bitboard::new();

        if num_checkers == 1 {
            movable = self.checkers();

            let sliders = self.pieces(Bishop) | self.pieces(Rook) | self.pieces(Queen);
            if self.checkers().intersects(sliders) {
                let checker_sq = self.checkers().peek().expect("INFALLIBLE");
                movable |= between(king_sq, checker_sq);
            }
        }

        // castling
        if num_checkers == 0 {
            let rights = self.state().castling;

            if rights.contains(short_castle_rook(us)) {
                let f = king_sq.offset(1, 0).expect("INFALLIBLE");
                let g = king_sq.offset(2, 0).expect("INFALLIBLE");
                let through = Bitboard::from(f) | g.into();

                if (occ & through).is_empty() && (their_attacks & through).is_empty() {
                    return true;
                }
            }

            if rights.contains(long_castle_rook(us)) {
                let d = king_sq.offset(-1, 0).expect("INFALLIBLE");
                let c = king_sq.offset(-2, 0).expect("INFALLIBLE");
                let b = king_sq.offset(-3, 0).expect("INFALLIBLE");
                let through = Bitboard::from(d) | c.into() | b.into();

                // the rook's transit square may be attacked, only the king's
                // path matters
                if (occ & through).is_empty()
                    && (their_attacks & (through ^ b.into())).is_empty()
                {
                    return true;
                }
            }
        }

        // pins along ranks and files, found by x-raying through our own men
        let mut pinned_orthogonal = Bitboard::new();
        let rook_att = rook_attacks(king_sq, occ);
        let xray_rook = rook_att ^ rook_attacks(king_sq, occ ^ (us_bb & rook_att));
        let pinners = (self.pieces(Rook) | self.pieces(Queen)) & xray_rook & self.occupied_by(enemy);
        for pinner_sq in pinners {
            pinned_orthogonal |= between(pinner_sq, king_sq) & us_bb;
        }

        // pins along diagonals
        let mut pinned_diagonal = Bitboard::new();
        let bishop_att = bishop_attacks(king_sq, occ);
        let xray_bishop = bishop_att ^ bishop_attacks(king_sq, occ ^ (us_bb & bishop_att));
        let pinners =
            (self.pieces(Bishop) | self.pieces(Queen)) & xray_bishop & self.occupied_by(enemy);
        for pinner_sq in pinners {
            pinned_diagonal |= between(pinner_sq, king_sq) & us_bb;
        }

        let pinned_any = pinned_diagonal | pinned_orthogonal;

        for from in self.occupied_by_piece(us, Knight) & !pinned_any {
            if !(knight_attacks(from) & !us_bb & movable).is_empty() {
                return true;
            }
        }

        for from in self.occupied_by_piece(us, Bishop) & !pinned_orthogonal {
            let mut dests = bishop_attacks(from, occ) & !us_bb & movable;

            if pinned_diagonal.contains(from) {
                dests &= line_through(king_sq, from);
            }
            if !dests.is_empty() {
                return true;
            }
        }

        for from in self.occupied_by_piece(us, Rook) & !pinned_diagonal {
            let mut dests = rook_attacks(from, occ) & !us_bb & movable;

            if pinned_orthogonal.contains(from) {
                dests &= line_through(king_sq, from);
            }
            if !dests.is_empty() {
                return true;
            }
        }

        for from in self.occupied_by_piece(us, Queen) {
            let mut dests = queen_attacks(from, occ) & !us_bb & movable;

            if pinned_any.contains(from) {
                dests &= line_through(king_sq, from);
            }
            if !dests.is_empty() {
                return true;
            }
        }

        // en passant gets the full three-square probe
        if let Some(ep) = self.en_passant_square() {
            for from in self.occupied_by_piece(us, Pawn) & pawn_attacks(enemy, ep) {
                let mv = Move::new(from, ep, MoveFlag::EnPassant);

                if self.is_pseudolegal_legal(mv, pinned_any) {
                    return true;
                }
            }
        }

        let forward = if us == White { 1 } else { -1 };

        for from in self.occupied_by_piece(us, Pawn) {
            // captures
            let mut attacks = pawn_attacks(us, from) & self.occupied_by(enemy) & movable;
            if pinned_any.contains(from) {
                attacks &= line_through(king_sq, from);
            }
            if !attacks.is_empty() {
                return true;
            }

            // pushes
            if pinned_diagonal.contains(from) {
                continue;
            }
            if pinned_orthogonal.contains(from) && from.rank() == king_sq.rank() {
                continue;
            }

            let one_up = from.offset(0, forward).expect("INFALLIBLE");
            if occ.contains(one_up) {
                continue;
            }
            if movable.contains(one_up) {
                return true;
            }

            let unmoved_rank = if us == White { Rank::R2 } else { Rank::R7 };
            if from.rank() == unmoved_rank {
                let two_up = one_up.offset(0, forward).expect("INFALLIBLE");

                if movable.contains(two_up) && !occ.contains(two_up) {
                    return true;
                }
            }
        }

        false
    }
}

fn push_promotions(moves: &mut Vec<Move>, from: Square, to: Square, underpromotions: bool) {
    moves.push(Move::new(from, to, MoveFlag::QueenPromotion));

    if underpromotions {
        moves.push(Move::new(from, to, MoveFlag::RookPromotion));
        moves.push(Move::new(from, to, MoveFlag::BishopPromotion));
        moves.push(Move::new(from, to, MoveFlag::KnightPromotion));
    }
}
