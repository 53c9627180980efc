//! Contains the board, its history of states, and the game rules
//
//  Copyright 2021 Michael Leany
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::convert::TryInto;
use std::fmt;
use std::str::FromStr;
use super::*;
use crate::bitboard::*;
use crate::moves::{Move, MoveFlag};

use Color::*;
use Piece::*;

mod cuckoo;
mod movegen;
mod zobrist;
pub use zobrist::Zobrist;

/// The standard starting position in Forsyth-Edwards Notation
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

////////////////////////////////////////////////////////////////////////////////////////////////////
/// One snapshot of the game: piece placement, castling and en passant rights,
/// counters, and the incrementally maintained hashes
///
/// `Board` keeps one of these per half-move played; making a move copies the
/// top snapshot and edits the copy, and unmaking a move pops it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct State {
    turn: Color,
    by_color: [Bitboard; Color::COUNT],
    by_piece: [Bitboard; Piece::COUNT],

    /// rook squares whose side may still castle with them; always a subset
    /// of the four corner squares
    castling: Bitboard,
    ep_square: Option<Square>,

    /// half-moves since the last pawn move or capture (fifty-move counter)
    draw_plies: u8,
    /// full-move number, incremented after each black move
    move_num: u16,

    /// opposing pieces currently giving check to the side to move
    checkers: Bitboard,

    zobrist: Zobrist,
    pawns_zobrist: Zobrist,
    non_pawns_zobrist: [Zobrist; Color::COUNT],

    /// the move that produced this state; `None` for the first state and
    /// after a null move
    last_move: Option<Move>,
    /// the piece captured by `last_move`, if any
    captured: Option<Piece>,
}

impl State {
    fn empty() -> State {
        State {
            turn: White,
            by_color: [Bitboard::new(); Color::COUNT],
            by_piece: [Bitboard::new(); Piece::COUNT],
            castling: Bitboard::new(),
            ep_square: None,
            draw_plies: 0,
            move_num: 1,
            checkers: Bitboard::new(),
            zobrist: Zobrist::new(),
            pawns_zobrist: Zobrist::new(),
            non_pawns_zobrist: [Zobrist::new(); Color::COUNT],
            last_move: None,
            captured: None,
        }
    }

    fn occupied(&self) -> Bitboard {
        self.by_color[White as usize] | self.by_color[Black as usize]
    }

    fn piece_at(&self, sq: Square) -> Option<Piece> {
        if !self.occupied().contains(sq) {
            return None;
        }

        Piece::ALL
            .iter()
            .copied()
            .find(|&piece| self.by_piece[piece as usize].contains(sq))
    }

    fn place(&mut self, color: Color, piece: Piece, sq: Square) {
        debug_assert!(!self.occupied().contains(sq));

        self.by_color[color as usize].insert(sq);
        self.by_piece[piece as usize].insert(sq);
        self.update_hashes(color, piece, sq);
    }

    fn remove(&mut self, color: Color, piece: Piece, sq: Square) {
        debug_assert!((self.by_color[color as usize] & self.by_piece[piece as usize]).contains(sq));

        self.by_color[color as usize].toggle(sq);
        self.by_piece[piece as usize].toggle(sq);
        self.update_hashes(color, piece, sq);
    }

    fn update_hashes(&mut self, color: Color, piece: Piece, sq: Square) {
        self.zobrist.toggle_piece_placement(color, piece, sq);

        if piece == Pawn {
            self.pawns_zobrist.toggle_piece_placement(color, piece, sq);
        } else {
            self.non_pawns_zobrist[color as usize].toggle_piece_placement(color, piece, sq);
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A chess position together with the history that led to it
///
/// The board owns an append-only sequence of state snapshots. All queries
/// refer to the newest snapshot; [`make`](#method.make) pushes a new one and
/// [`undo`](#method.undo) pops it, so unmaking a move is exact by
/// construction. The history is also what powers repetition detection.
///
/// # Instantiation
/// A `Board` can be created with [`new`](#method.new) (the standard starting
/// position) or parsed from [Forsyth-Edwards Notation
/// (FEN)](https://en.wikipedia.org/wiki/Forsyth%E2%80%93Edwards_Notation)
/// with [`from_fen_str`](#method.from_fen_str) or `str::parse`.
///
/// # Generating moves
/// [`pseudolegal_moves`](#method.pseudolegal_moves) enumerates candidate
/// moves quickly;
/// [`is_pseudolegal_legal`](#method.is_pseudolegal_legal) validates one
/// candidate without making it. A typical loop looks like this:
///
/// ```rust
/// use chess::Board;
///
/// let mut board = Board::new();
/// let mut moves = Vec::new();
/// board.pseudolegal_moves(&mut moves, false, true);
///
/// let pinned = board.pinned();
/// for mv in moves {
///     if board.is_pseudolegal_legal(mv, pinned) {
///         board.make(mv);
///         // do something useful
///         board.undo();
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    states: Vec<State>,
}

impl Board {
    /// Returns a board with the standard starting position.
    pub fn new() -> Board {
        START_FEN.parse().expect("INFALLIBLE")
    }

    /// Parses a board from a string containing [Forsyth-Edwards
    /// Notation (FEN)](https://en.wikipedia.org/wiki/Forsyth%E2%80%93Edwards_Notation).
    ///
    /// The halfmove-clock and fullmove-number fields may be omitted, in
    /// which case they default to 0 and 1.
    pub fn from_fen_str(s: &str) -> Result<Board> {
        let mut st = State::empty();
        let mut fields = s.trim().split_whitespace();

        // parse the piece placement
        let placement = fields.next().ok_or(Error::ParseError)?;
        let mut rank = Rank::COUNT - 1;
        let mut file = 0;

        for c in placement.chars() {
            match c {
                '1'..='8' => {
                    file += c.to_digit(10).expect("INFALLIBLE") as usize;
                    if file > File::COUNT {
                        return Err(Error::ParseError);
                    }
                },
                '/' => {
                    if file == File::COUNT && rank > 0 {
                        rank -= 1;
                        file = 0;
                    } else {
                        return Err(Error::ParseError);
                    }
                },
                _ => {
                    if file >= File::COUNT {
                        return Err(Error::ParseError);
                    }

                    let sq = Square::from_coord(
                        file.try_into().expect("INFALLIBLE"),
                        rank.try_into().expect("INFALLIBLE"),
                    );
                    let color = if c.is_uppercase() { White } else { Black };
                    st.place(color, Piece::from_char(c)?, sq);

                    file += 1;
                }
            }
        }
        if rank > 0 || file < File::COUNT {
            return Err(Error::ParseError);
        }

        // parse the turn
        st.turn = fields.next().ok_or(Error::ParseError)?.parse()?;
        if st.turn == Black {
            st.zobrist.toggle_turn();
        }

        // parse the castling rights; a right is only accepted if the king
        // and the rook actually stand on their home squares
        match fields.next() {
            Some("-") => { },
            Some(rights) => {
                for c in rights.chars() {
                    let (color, rook_sq) = match c {
                        'K' => (White, Square::H1),
                        'Q' => (White, Square::A1),
                        'k' => (Black, Square::H8),
                        'q' => (Black, Square::A8),
                        _ => return Err(Error::ParseError),
                    };

                    let king_sq = if color == White { Square::E1 } else { Square::E8 };
                    let kings = st.by_color[color as usize] & st.by_piece[King as usize];
                    let rooks = st.by_color[color as usize] & st.by_piece[Rook as usize];

                    if !kings.contains(king_sq) || !rooks.contains(rook_sq) {
                        return Err(Error::ParseError);
                    }

                    st.castling.insert(rook_sq);
                }

                st.zobrist.toggle_castling_rights(st.castling);
            },
            None => return Err(Error::ParseError),
        }

        // parse the en passant square
        match fields.next() {
            Some("-") => { },
            Some(ep) => {
                let ep: Square = ep.parse()?;
                let expected_rank = if st.turn == White { Rank::R6 } else { Rank::R3 };

                if ep.rank() != expected_rank {
                    return Err(Error::ParseError);
                }

                // the jumped-over square must sit right behind an enemy pawn
                let pawn_sq = behind(ep, st.turn);
                let enemy_pawns = st.by_color[!st.turn as usize] & st.by_piece[Pawn as usize];

                if !enemy_pawns.contains(pawn_sq) {
                    return Err(Error::ParseError);
                }

                st.ep_square = Some(ep);
                st.zobrist.toggle_ep_file(ep.file());
            },
            None => return Err(Error::ParseError),
        }

        // parse the halfmove clock and move number, if present
        if let Some(plies) = fields.next() {
            st.draw_plies = plies.parse().map_err(|_| Error::ParseError)?;
        }
        if let Some(move_num) = fields.next() {
            st.move_num = move_num.parse().map_err(|_| Error::ParseError)?;
        }

        let mut states = Vec::with_capacity(512);
        states.push(st);
        let mut board = Board { states };

        board.validate()?;

        let checkers = board.attackers(board.king_location(board.turn()), board.occupied())
            & board.occupied_by(!board.turn());
        board.state_mut().checkers = checkers;

        Ok(board)
    }

    /// Checks the basic legality of a freshly parsed position.
    fn validate(&self) -> Result<()> {
        for &color in &[White, Black] {
            if self.occupied_by_piece(color, King).len() != 1 {
                return Err(Error::InvalidPosition);
            }
        }

        let back_ranks = Bitboard::from(Rank::R1) | Rank::R8.into();
        if self.pieces(Pawn).intersects(back_ranks) {
            return Err(Error::InvalidPosition);
        }

        // the player who just moved must not have left their king in check
        let king_sq = self.king_location(!self.turn());
        if self.is_attacked(king_sq, self.turn(), self.occupied()) {
            return Err(Error::InvalidPosition);
        }

        Ok(())
    }

    /// Converts the current position to a FEN string.
    pub fn to_fen_str(&self) -> String {
        let st = self.state();
        let mut fen = String::new();

        for rank in (0..Rank::COUNT).rev() {
            let mut empty = 0;

            for file in 0..File::COUNT {
                let sq = Square::from_coord(
                    file.try_into().expect("INFALLIBLE"),
                    rank.try_into().expect("INFALLIBLE"),
                );

                match self.piece_at(sq) {
                    Some((color, piece)) => {
                        if empty > 0 {
                            fen += &empty.to_string();
                            empty = 0;
                        }

                        let mut c = piece.to_char();
                        if color == Black {
                            c = c.to_ascii_lowercase();
                        }
                        fen.push(c);
                    },
                    None => empty += 1,
                }
            }

            if empty > 0 {
                fen += &empty.to_string();
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen += if st.turn == Black { " b " } else { " w " };

        let mut rights = String::new();
        if st.castling.contains(Square::H1) { rights.push('K'); }
        if st.castling.contains(Square::A1) { rights.push('Q'); }
        if st.castling.contains(Square::H8) { rights.push('k'); }
        if st.castling.contains(Square::A8) { rights.push('q'); }
        if rights.is_empty() {
            rights.push('-');
        }
        fen += &rights;

        match st.ep_square {
            Some(ep) => fen += &format!(" {}", ep),
            None => fen += " -",
        }

        fen += &format!(" {} {}", st.draw_plies, st.move_num);

        fen
    }

    fn state(&self) -> &State {
        self.states.last().expect("INFALLIBLE")
    }

    fn state_mut(&mut self) -> &mut State {
        self.states.last_mut().expect("INFALLIBLE")
    }

    /// Returns the player whose turn it is.
    pub fn turn(&self) -> Color {
        self.state().turn
    }

    /// Returns the set of occupied squares.
    pub fn occupied(&self) -> Bitboard {
        self.state().occupied()
    }

    /// Returns the squares occupied by the given player.
    pub fn occupied_by(&self, color: Color) -> Bitboard {
        self.state().by_color[color as usize]
    }

    /// Returns the squares occupied by pieces of the given type, regardless
    /// of color.
    pub fn pieces(&self, piece: Piece) -> Bitboard {
        self.state().by_piece[piece as usize]
    }

    /// Returns the squares occupied by the given player's pieces of the
    /// given type.
    pub fn occupied_by_piece(&self, color: Color, piece: Piece) -> Bitboard {
        self.occupied_by(color) & self.pieces(piece)
    }

    /// Returns the color and type of the piece at `sq`, if any.
    pub fn piece_at(&self, sq: Square) -> Option<(Color, Piece)> {
        let piece = self.state().piece_at(sq)?;
        let color = if self.occupied_by(White).contains(sq) { White } else { Black };

        Some((color, piece))
    }

    /// Returns the location of the given player's king.
    pub fn king_location(&self, color: Color) -> Square {
        self.occupied_by_piece(color, King).peek().expect("INFALLIBLE")
    }

    /// Returns the opposing pieces currently giving check.
    pub fn checkers(&self) -> Bitboard {
        self.state().checkers
    }

    /// Returns `true` if the side to move is in check.
    pub fn in_check(&self) -> bool {
        !self.checkers().is_empty()
    }

    /// Returns the position's Zobrist key.
    pub fn zobrist_key(&self) -> Zobrist {
        self.state().zobrist
    }

    /// Returns the Zobrist key of the pawn structure alone.
    pub fn pawns_key(&self) -> Zobrist {
        self.state().pawns_zobrist
    }

    /// Returns the Zobrist key of the given player's non-pawn pieces.
    pub fn non_pawns_key(&self, color: Color) -> Zobrist {
        self.state().non_pawns_zobrist[color as usize]
    }

    /// Returns the en passant target square, if any.
    pub fn en_passant_square(&self) -> Option<Square> {
        self.state().ep_square
    }

    /// Returns the number of half-moves since the last pawn move or capture.
    pub fn halfmove_clock(&self) -> usize {
        self.state().draw_plies as usize
    }

    /// Returns the full-move number.
    pub fn move_number(&self) -> usize {
        self.state().move_num as usize
    }

    /// Returns the move that produced the current position, if the position
    /// was produced by a move.
    pub fn last_move(&self) -> Option<Move> {
        self.state().last_move
    }

    /// Returns the piece captured by the last move, if any.
    pub fn captured(&self) -> Option<Piece> {
        self.state().captured
    }

    /// Returns `true` if the given player has at least one piece besides
    /// king and pawns.
    pub fn has_non_pawn_material(&self, color: Color) -> bool {
        let minors_and_majors =
            self.pieces(Knight) | self.pieces(Bishop) | self.pieces(Rook) | self.pieces(Queen);

        self.occupied_by(color).intersects(minors_and_majors)
    }

    /// Returns `true` if the move captures a piece.
    pub fn is_capture(&self, mv: Move) -> bool {
        self.occupied().contains(mv.destination()) || mv.flag() == MoveFlag::EnPassant
    }

    /// Returns the piece the move would capture, if any.
    pub fn capture_of(&self, mv: Move) -> Option<Piece> {
        if mv.flag() == MoveFlag::EnPassant {
            Some(Pawn)
        } else {
            self.state().piece_at(mv.destination())
        }
    }

    /// Makes a move, pushing a new state onto the history.
    ///
    /// The move must be legal in the current position.
    pub fn make(&mut self, mv: Move) {
        let mut st = self.state().clone();
        st.last_move = Some(mv);

        let us = st.turn;
        let them = !us;
        let from = mv.origin();
        let to = mv.destination();
        let piece = mv.piece();

        st.remove(us, piece, from);

        match mv.flag() {
            MoveFlag::Castling => {
                st.place(us, King, to);
                let (rook_from, rook_to) = castling_rook_path(to);
                st.remove(us, Rook, rook_from);
                st.place(us, Rook, rook_to);
                st.captured = None;
            },
            MoveFlag::EnPassant => {
                st.remove(them, Pawn, behind(to, us));
                st.place(us, Pawn, to);
                st.captured = Some(Pawn);
            },
            _ => {
                st.captured = st.piece_at(to);
                if let Some(captured) = st.captured {
                    st.remove(them, captured, to);
                }

                st.place(us, mv.promotion().unwrap_or(piece), to);
            },
        }

        // update the castling rights, hashing the old rights out and the new
        // rights in
        st.zobrist.toggle_castling_rights(st.castling);
        if piece == King {
            st.castling &= !(Bitboard::from(short_castle_rook(us)) | long_castle_rook(us).into());
        }
        st.castling.remove(from);
        st.castling.remove(to);
        st.zobrist.toggle_castling_rights(st.castling);

        // the old en passant square expires; a double pawn push sets a new one
        if let Some(ep) = st.ep_square.take() {
            st.zobrist.toggle_ep_file(ep.file());
        }
        if mv.flag() == MoveFlag::PawnTwoUp {
            let ep = behind(to, us);
            st.ep_square = Some(ep);
            st.zobrist.toggle_ep_file(ep.file());
        }

        st.turn = them;
        st.zobrist.toggle_turn();

        if piece == Pawn || st.captured.is_some() {
            st.draw_plies = 0;
        } else {
            st.draw_plies = st.draw_plies.saturating_add(1);
        }
        if st.turn == White {
            st.move_num += 1;
        }

        self.states.push(st);

        let checkers = self.attackers(self.king_location(self.turn()), self.occupied())
            & self.occupied_by(!self.turn());
        self.state_mut().checkers = checkers;
    }

    /// Passes the turn to the opponent without moving a piece.
    ///
    /// Null moves are not legal chess, but are useful to the engine. The
    /// side to move must not be in check; this also means the checkers of
    /// the new state stay empty.
    pub fn make_null(&mut self) {
        debug_assert!(!self.in_check());

        let mut st = self.state().clone();
        st.last_move = None;
        st.captured = None;

        if let Some(ep) = st.ep_square.take() {
            st.zobrist.toggle_ep_file(ep.file());
        }

        st.turn = !st.turn;
        st.zobrist.toggle_turn();

        st.draw_plies = st.draw_plies.saturating_add(1);
        if st.turn == White {
            st.move_num += 1;
        }

        self.states.push(st);
    }

    /// Unmakes the last (possibly null) move, popping the top of the history.
    pub fn undo(&mut self) {
        debug_assert!(self.states.len() >= 2);
        self.states.pop();
    }

    /// Returns all pieces of either color which attack `sq`, given the
    /// occupancy `occ`.
    pub fn attackers(&self, sq: Square, occ: Bitboard) -> Bitboard {
        let bishops_queens = self.pieces(Bishop) | self.pieces(Queen);
        let rooks_queens = self.pieces(Rook) | self.pieces(Queen);

        let mut attackers =
            self.occupied_by_piece(Black, Pawn) & pawn_attacks(White, sq);
        attackers |= self.occupied_by_piece(White, Pawn) & pawn_attacks(Black, sq);

        attackers |= self.pieces(Knight) & knight_attacks(sq);
        attackers |= bishops_queens & bishop_attacks(sq, occ);
        attackers |= rooks_queens & rook_attacks(sq, occ);
        attackers |= self.pieces(King) & king_attacks(sq);

        attackers
    }

    /// Returns `true` if `sq` is attacked by the given player, given the
    /// occupancy `occ`.
    pub fn is_attacked(&self, sq: Square, by: Color, occ: Bitboard) -> bool {
        // a "super piece" on sq attacks exactly the pieces which attack sq
        if pawn_attacks(!by, sq).intersects(self.occupied_by_piece(by, Pawn)) {
            return true;
        }
        if knight_attacks(sq).intersects(self.occupied_by_piece(by, Knight)) {
            return true;
        }

        let bishops_queens = self.occupied_by_piece(by, Bishop) | self.occupied_by_piece(by, Queen);
        if bishop_attacks(sq, occ).intersects(bishops_queens) {
            return true;
        }

        let rooks_queens = self.occupied_by_piece(by, Rook) | self.occupied_by_piece(by, Queen);
        if rook_attacks(sq, occ).intersects(rooks_queens) {
            return true;
        }

        king_attacks(sq).intersects(self.occupied_by_piece(by, King))
    }

    /// Returns every square attacked by the given player, given the
    /// occupancy `occ`.
    pub fn attacks(&self, color: Color, occ: Bitboard) -> Bitboard {
        let mut attacks = Bitboard::new();

        for sq in self.occupied_by_piece(color, Pawn) {
            attacks |= pawn_attacks(color, sq);
        }
        for sq in self.occupied_by_piece(color, Knight) {
            attacks |= knight_attacks(sq);
        }
        for sq in self.occupied_by(color) & (self.pieces(Bishop) | self.pieces(Queen)) {
            attacks |= bishop_attacks(sq, occ);
        }
        for sq in self.occupied_by(color) & (self.pieces(Rook) | self.pieces(Queen)) {
            attacks |= rook_attacks(sq, occ);
        }

        attacks | king_attacks(self.king_location(color))
    }

    /// Returns the side to move's pieces which are pinned to their own king.
    pub fn pinned(&self) -> Bitboard {
        let us = self.occupied_by(self.turn());
        let them = self.occupied_by(!self.turn());
        let king_sq = self.king_location(self.turn());

        let their_bishops_queens = them & (self.pieces(Bishop) | self.pieces(Queen));
        let their_rooks_queens = them & (self.pieces(Rook) | self.pieces(Queen));

        // sliding over our own pieces finds the potential pinners
        let mut potential = their_bishops_queens & bishop_attacks(king_sq, them);
        potential |= their_rooks_queens & rook_attacks(king_sq, them);

        let mut pinned = Bitboard::new();

        for attacker_sq in potential {
            let maybe_pinned = us & between(attacker_sq, king_sq);

            if maybe_pinned.len() == 1 {
                pinned |= maybe_pinned;
            }
        }

        pinned
    }

    /// Statically evaluates the exchange sequence started by `mv`, and
    /// returns `true` if its final material balance, from the mover's point
    /// of view, is at least `threshold`.
    ///
    /// Each side always replies with its least valuable attacker, and x-ray
    /// attackers are added to the exchange as the pieces in front of them
    /// leave the board. If a side's only remaining attacker is its king and
    /// the opponent still has defenders, that side cannot actually continue
    /// the exchange.
    pub fn see(&self, mv: Move, threshold: i32) -> bool {
        const SEE_PIECE_VALUES: [i32; Piece::COUNT] = [100, 300, 300, 500, 900, 0];

        let mut score = -threshold;

        if let Some(captured) = self.capture_of(mv) {
            score += SEE_PIECE_VALUES[captured as usize];
        }

        let promotion = mv.promotion();
        if let Some(promotion) = promotion {
            score += SEE_PIECE_VALUES[promotion as usize] - SEE_PIECE_VALUES[Pawn as usize];
        }

        if score < 0 {
            return false;
        }

        let mut next = promotion.unwrap_or_else(|| mv.piece());
        score -= SEE_PIECE_VALUES[next as usize];

        if score >= 0 {
            return true;
        }

        let from = mv.origin();
        let square = mv.destination();

        let bishops_queens = self.pieces(Bishop) | self.pieces(Queen);
        let rooks_queens = self.pieces(Rook) | self.pieces(Queen);

        let mut occ = self.occupied() ^ from.into() ^ square.into();
        let mut attackers = self.attackers(square, occ);
        let mut us = !self.turn();

        loop {
            let our_attackers = attackers & self.occupied_by(us);

            if our_attackers.is_empty() {
                break;
            }

            // pull our least valuable attacker off the square
            next = Piece::ALL
                .iter()
                .copied()
                .find(|&piece| our_attackers.intersects(self.pieces(piece)))
                .expect("INFALLIBLE");
            let sq = (our_attackers & self.pieces(next)).peek().expect("INFALLIBLE");
            occ.toggle(sq);

            // vacating the square may uncover an x-ray attacker behind it
            if next == Pawn || next == Bishop || next == Queen {
                attackers |= bishop_attacks(square, occ) & bishops_queens;
            }
            if next == Rook || next == Queen {
                attackers |= rook_attacks(square, occ) & rooks_queens;
            }

            attackers &= occ;
            score = -score - 1 - SEE_PIECE_VALUES[next as usize];
            us = !us;

            if score >= 0 {
                // if our only attacker is our king, but the opponent still
                // has defenders, we cannot take back
                if next == King && attackers.intersects(self.occupied_by(us)) {
                    us = !us;
                }

                break;
            }
        }

        self.turn() != us
    }

    /// Returns `true` if the current position repeats an earlier one.
    ///
    /// The history is scanned backward in two-ply steps, no further than the
    /// last irreversible move. `search_ply` says how many of the newest
    /// states lie above the search root: a single repetition above the root
    /// counts, while positions at or below the root must occur twice.
    pub fn is_repetition(&self, search_ply: usize) -> bool {
        let n = self.states.len();
        let st = self.state();

        if n <= 4 || st.draw_plies < 4 {
            return false;
        }

        let oldest = n.saturating_sub(st.draw_plies as usize + 1);
        let root = n as isize - search_ply as isize - 1;

        let mut count = 0;
        let mut i = n as isize - 3;

        while i >= oldest as isize {
            if self.states[i as usize].zobrist == st.zobrist {
                if i > root {
                    return true;
                }

                count += 1;
                if count == 2 {
                    return true;
                }
            }

            i -= 2;
        }

        false
    }

    /// Returns `true` if the side to move has a reversible move that leads
    /// directly to a repetition of a position in the history.
    ///
    /// The candidate moves are looked up in the cuckoo tables by the XOR of
    /// the current hash with each historic hash at an odd distance. A hit
    /// above the search root is enough; at or below the root the historic
    /// position must itself repeat once more, mirroring
    /// [`is_repetition`](#method.is_repetition).
    pub fn has_upcoming_repetition(&self, ply: usize) -> bool {
        let n = self.states.len();
        let st = self.state();

        let end = (st.draw_plies as usize).min(n - 1);
        if end < 3 {
            return false;
        }

        let occ = self.occupied();

        let mut i = 3;
        while i <= end {
            let move_key = u64::from(st.zobrist) ^ u64::from(self.states[n - 1 - i].zobrist);

            let mut slot = cuckoo::h1(move_key);
            if cuckoo::key(slot) != move_key {
                slot = cuckoo::h2(move_key);
            }

            if cuckoo::key(slot) == move_key {
                let mv = cuckoo::reversible_move(slot).expect("INFALLIBLE");
                let from = mv.origin();
                let to = mv.destination();

                if (between(from, to) & occ).is_empty() {
                    if ply > i {
                        return true;
                    }

                    // at or below the root the repeating move must belong to
                    // the side to move, and the position must already have
                    // occurred twice
                    let piece_sq = if occ.contains(from) { from } else { to };
                    let color = if self.occupied_by(White).contains(piece_sq) { White } else { Black };

                    if color == st.turn {
                        let mut j = i + 4;
                        while j <= end {
                            if self.states[n - 1 - i].zobrist == self.states[n - 1 - j].zobrist {
                                return true;
                            }
                            j += 2;
                        }
                    }
                }
            }

            i += 2;
        }

        false
    }

    /// Returns `true` if the position is drawn by the fifty-move rule,
    /// insufficient material (bare kings, or king and one minor piece
    /// against king) or repetition.
    pub fn is_draw(&self, search_ply: usize) -> bool {
        if self.state().draw_plies >= 100 {
            return true;
        }

        let num_pieces = self.occupied().len();
        if num_pieces == 2 {
            return true;
        }
        if num_pieces == 3 && !(self.pieces(Knight) | self.pieces(Bishop)).is_empty() {
            return true;
        }

        self.is_repetition(search_ply)
    }

    /// Parses a move in coordinate notation (`e2e4`, `e7e8q`, castling as
    /// the king move `e1g1`) and validates it against the current position.
    pub fn move_from_uci(&self, s: &str) -> Result<Move> {
        if s.len() != 4 && s.len() != 5 {
            return Err(Error::ParseError);
        }

        let from: Square = s.get(0..2).ok_or(Error::ParseError)?.parse()?;
        let to: Square = s.get(2..4).ok_or(Error::ParseError)?.parse()?;

        let piece = match self.piece_at(from) {
            Some((color, piece)) if color == self.turn() => piece,
            _ => return Err(Error::IllegalMove),
        };

        let flag = if let Some(promotion) = s.get(4..5) {
            match promotion {
                "n" => MoveFlag::KnightPromotion,
                "b" => MoveFlag::BishopPromotion,
                "r" => MoveFlag::RookPromotion,
                "q" => MoveFlag::QueenPromotion,
                _ => return Err(Error::ParseError),
            }
        } else if piece == King && (to as i32 - from as i32).abs() == 2 {
            MoveFlag::Castling
        } else if piece == Pawn {
            let distance = (to as i32 - from as i32).abs();

            if distance == 16 {
                MoveFlag::PawnTwoUp
            } else if distance != 8 && !self.occupied().contains(to) {
                MoveFlag::EnPassant
            } else {
                MoveFlag::Pawn
            }
        } else {
            MoveFlag::for_piece(piece)
        };

        let mv = Move::new(from, to, flag);

        // only moves the generator agrees with are accepted
        let mut moves = Vec::new();
        self.pseudolegal_moves(&mut moves, false, true);

        if moves.contains(&mv) && self.is_pseudolegal_legal(mv, self.pinned()) {
            Ok(mv)
        } else {
            Err(Error::IllegalMove)
        }
    }
}

impl Default for Board {
    fn default() -> Board {
        Board::new()
    }
}

impl FromStr for Board {
    type Err = Error;

    fn from_str(s: &str) -> Result<Board> {
        Board::from_fen_str(s)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_fen_str().fmt(f)
    }
}

/// Returns the square one rank behind `sq` from `color`'s point of view.
fn behind(sq: Square, color: Color) -> Square {
    let ranks = if color == White { -1 } else { 1 };

    sq.offset(0, ranks).expect("INFALLIBLE")
}

/// Returns the rook whose presence on its home square allows the short castle.
fn short_castle_rook(color: Color) -> Square {
    if color == White { Square::H1 } else { Square::H8 }
}

/// Returns the rook whose presence on its home square allows the long castle.
fn long_castle_rook(color: Color) -> Square {
    if color == White { Square::A1 } else { Square::A8 }
}

/// Returns the rook's origin and destination for a castling move given the
/// king's destination.
fn castling_rook_path(king_dest: Square) -> (Square, Square) {
    match king_dest {
        Square::G1 => (Square::H1, Square::F1),
        Square::C1 => (Square::A1, Square::D1),
        Square::G8 => (Square::H8, Square::F8),
        Square::C8 => (Square::A8, Square::D8),
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    #[test]
    fn fen_round_trips() {
        for fen in &[
            START_FEN,
            KIWIPETE,
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
            "4k3/8/8/8/8/8/4P3/4K3 w - - 5 39",
        ] {
            let board = Board::from_fen_str(fen).unwrap();
            assert_eq!(&board.to_fen_str(), fen);

            let reparsed = Board::from_fen_str(&board.to_fen_str()).unwrap();
            assert_eq!(reparsed.zobrist_key(), board.zobrist_key());
        }

        assert!(Board::from_fen_str("rubbish").is_err());
        assert!(Board::from_fen_str("8/8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(Board::from_fen_str("k7/8/8/8/8/8/8/K7 q - - 0 1").is_err());
    }

    #[test]
    fn make_and_undo_restore_the_board() {
        let mut board = Board::new();
        let initial = board.clone();

        let line = ["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "g8f6", "e1g1", "f6e4"];
        let mut moves = Vec::new();

        for mv_str in &line {
            let mv = board.move_from_uci(mv_str).unwrap();
            moves.push(mv);
            board.make(mv);
        }

        for _ in &moves {
            board.undo();
        }

        assert_eq!(board, initial);
    }

    #[test]
    fn incremental_hashes_match_recomputation() {
        let mut board = Board::new();

        for mv_str in &["d2d4", "d7d5", "c2c4", "d5c4", "e2e4", "b7b5", "e4e5", "c8b7"] {
            let mv = board.move_from_uci(mv_str).unwrap();
            board.make(mv);

            let reparsed = Board::from_fen_str(&board.to_fen_str()).unwrap();
            assert_eq!(reparsed.zobrist_key(), board.zobrist_key());
            assert_eq!(reparsed.pawns_key(), board.pawns_key());
            assert_eq!(reparsed.non_pawns_key(White), board.non_pawns_key(White));
            assert_eq!(reparsed.non_pawns_key(Black), board.non_pawns_key(Black));
        }
    }

    #[test]
    fn checkers_match_attackers() {
        let mut board = Board::new();

        for mv_str in &["e2e4", "d7d5", "e4d5", "d8d5", "b1c3", "d5e5"] {
            let mv = board.move_from_uci(mv_str).unwrap();
            board.make(mv);

            let expected = board.attackers(board.king_location(board.turn()), board.occupied())
                & board.occupied_by(!board.turn());
            assert_eq!(board.checkers(), expected);
        }

        assert!(board.in_check());
        assert_eq!(board.checkers().len(), 1);
    }

    #[test]
    fn en_passant_and_castling() {
        let mut board = Board::new();

        for mv_str in &["e2e4", "g8f6", "e4e5", "d7d5"] {
            let mv = board.move_from_uci(mv_str).unwrap();
            board.make(mv);
        }

        assert_eq!(board.en_passant_square(), Some(Square::D6));
        let ep = board.move_from_uci("e5d6").unwrap();
        assert_eq!(ep.flag(), MoveFlag::EnPassant);
        board.make(ep);
        assert_eq!(board.captured(), Some(Pawn));
        assert!(board.occupied_by_piece(White, Pawn).contains(Square::D6));
        assert!(!board.occupied().contains(Square::D5));

        let mut board: Board = KIWIPETE.parse().unwrap();
        let castle = board.move_from_uci("e1g1").unwrap();
        assert_eq!(castle.flag(), MoveFlag::Castling);
        board.make(castle);
        assert!(board.occupied_by_piece(White, King).contains(Square::G1));
        assert!(board.occupied_by_piece(White, Rook).contains(Square::F1));
        assert!(!board.occupied().contains(Square::H1));
        assert!(board.move_from_uci("e8c8").is_ok());
    }

    #[test]
    fn static_exchange_evaluation() {
        // winning a pawn with a rook on an open file
        let board: Board = "1k1r4/1pp4p/p7/4p3/8/P5P1/1PP4P/2K1R3 w - - 0 1".parse().unwrap();
        let mv = board.move_from_uci("e1e5").unwrap();
        assert!(board.see(mv, 0));
        assert!(board.see(mv, 100));
        assert!(!board.see(mv, 101));

        // the knight grabs a pawn but is lost to the recapture
        let board: Board = "1k1r3q/1ppn3p/p4b2/4p3/8/P2N2P1/1PP1R1BP/2K1Q3 w - - 0 1"
            .parse()
            .unwrap();
        let mv = board.move_from_uci("d3e5").unwrap();
        assert!(!board.see(mv, 0));

        // taking a defended rook with the queen loses material
        let board: Board = "4k3/8/4q3/8/4R3/5P2/8/4K3 b - - 0 1".parse().unwrap();
        let mv = board.move_from_uci("e6e4").unwrap();
        assert!(!board.see(mv, 0));
    }

    #[test]
    fn repetition_detection() {
        let mut board = Board::new();

        for mv_str in &["g1f3", "g8f6", "f3g1", "f6g8"] {
            let mv = board.move_from_uci(mv_str).unwrap();
            board.make(mv);
        }

        // seen once more in the game history: a draw by the game-history rule,
        // but not within a search whose root is the current position
        assert!(board.is_repetition(100_000));
        assert!(!board.is_repetition(0));

        for mv_str in &["g1f3", "g8f6", "f3g1", "f6g8"] {
            let mv = board.move_from_uci(mv_str).unwrap();
            board.make(mv);
        }

        // now seen twice before, which counts from anywhere
        assert!(board.is_repetition(0));
        assert!(board.is_draw(0));
    }

    #[test]
    fn upcoming_repetition_detection() {
        let mut board = Board::new();

        for mv_str in &["g1f3", "g8f6", "f3g1"] {
            let mv = board.move_from_uci(mv_str).unwrap();
            board.make(mv);
        }

        // ...ng8 would repeat the starting position
        assert!(board.has_upcoming_repetition(4));
        assert!(!board.has_upcoming_repetition(0));

        assert!(!Board::new().has_upcoming_repetition(10));
    }

    #[test]
    fn insufficient_material() {
        assert!(Board::from_fen_str("7k/8/8/8/8/8/8/K7 w - - 0 1").unwrap().is_draw(0));
        assert!(Board::from_fen_str("7k/8/8/8/8/8/8/KN6 w - - 0 1").unwrap().is_draw(0));
        assert!(Board::from_fen_str("7k/8/8/8/8/8/8/KB6 b - - 0 1").unwrap().is_draw(0));
        assert!(!Board::from_fen_str("7k/8/8/8/8/8/8/KR6 w - - 0 1").unwrap().is_draw(0));
        assert!(!Board::new().is_draw(0));
    }

    #[test]
    fn null_moves() {
        let mut board: Board = KIWIPETE.parse().unwrap();
        let before = board.clone();

        board.make_null();
        assert_eq!(board.turn(), Black);
        assert_eq!(board.last_move(), None);
        assert_ne!(board.zobrist_key(), before.zobrist_key());

        board.undo();
        assert_eq!(board, before);
    }

    #[test]
    fn uci_moves_are_validated() {
        let board = Board::new();

        assert!(board.move_from_uci("e2e5").is_err());
        assert!(board.move_from_uci("e7e5").is_err());
        assert!(board.move_from_uci("e1g1").is_err());
        assert!(board.move_from_uci("e2").is_err());
        assert!(board.move_from_uci("xyzw").is_err());

        let mv = board.move_from_uci("e2e4").unwrap();
        assert_eq!(mv.flag(), MoveFlag::PawnTwoUp);

        let board: Board = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8"
            .parse()
            .unwrap();
        let mv = board.move_from_uci("d7c8q").unwrap();
        assert_eq!(mv.promotion(), Some(Queen));
    }
}
