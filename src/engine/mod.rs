//! The engine
//
//  Copyright 2021 Michael Leany
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
//! The search is an iteratively deepened alpha-beta (negamax) with a
//! quiescence extension at the leaves. One worker walks the tree by making
//! and unmaking moves on a single board, keeping the network accumulator in
//! step, probing and feeding the transposition table, and polling the clock
//! and the client every 1024 nodes.

use std::cmp::max;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use log::debug;
use lazy_static::lazy_static;
use chess::{Board, Color, File, Move, MoveFlag, Piece, Square};
use crate::protocol::{Protocol, SearchAction, SearchLimits};

mod eval;
mod hash;
mod nnue;
mod ordering;

pub use eval::Score;
pub use nnue::{Accumulator, Network, DEFAULT_NET_FILE, HIDDEN_SIZE};
use eval::evaluate;
use hash::{Bound, HashEntry, HashMove, HashTable};
use ordering::{HistoryTable, PlyData};

/// The deepest ply the search will ever reach
pub const MAX_PLY: usize = 128;

lazy_static! {
    // reductions grow with the logarithms of the depth and the move count
    static ref LMR_TABLE: Vec<[i32; 64]> = {
        let mut table = vec![[0; 64]; MAX_PLY + 1];

        for (depth, row) in table.iter_mut().enumerate().skip(1) {
            for (count, reduction) in row.iter_mut().enumerate().skip(1) {
                *reduction =
                    (0.8 + (depth as f64).ln() * (count as f64).ln() * 0.4).round() as i32;
            }
        }

        table
    };
}

fn lmr_reduction(depth: i32, move_count: usize) -> i32 {
    LMR_TABLE[(depth.max(0) as usize).min(MAX_PLY)][move_count.min(63)]
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Thinking output: what the search has found so far
#[derive(Debug, Clone)]
pub struct Thinking {
    score: Score,
    depth: usize,
    seldepth: usize,
    time: Duration,
    nodes: u64,
    pv: Vec<Move>,
}

impl Thinking {
    fn new() -> Self {
        Thinking {
            score: -Score::infinity(),
            depth: 0,
            seldepth: 0,
            time: Duration::from_secs(0),
            nodes: 0,
            pv: Vec::new(),
        }
    }

    /// Returns the estimated score of the principal variation.
    pub fn score(&self) -> Score {
        self.score
    }

    /// Returns the search depth that was completed.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the deepest ply that was reached, counting the quiescence
    /// search.
    pub fn seldepth(&self) -> usize {
        self.seldepth
    }

    /// Returns the amount of time used for the search.
    pub fn time(&self) -> Duration {
        self.time
    }

    /// Returns the number of nodes searched.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Returns the average number of nodes searched per second.
    pub fn nps(&self) -> u64 {
        self.nodes * 1000 / max(self.time.as_millis() as u64, 1)
    }

    /// Returns the principal variation.
    pub fn pv(&self) -> &[Move] {
        &self.pv
    }

    /// Returns the best move found in the search, if the position had any
    /// legal moves.
    pub fn best_move(&self) -> Option<Move> {
        self.pv.first().copied()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// The engine
#[derive(Debug)]
pub struct Engine<T> where T: Protocol {
    protocol: T,

    net: Network,
    tt: HashTable,
    tt_megabytes: usize,
    search_count: u16,

    board: Board,
    plies: Vec<PlyData>,
    accumulators: Vec<Accumulator>,
    history: HistoryTable,

    start_time: Instant,
    hard_stop: Option<Instant>,
    max_nodes: u64,
    max_depth: usize,

    nodes: u64,
    seldepth: usize,
    root_best: Option<Move>,

    stop: AtomicBool,
    abort: bool,
}

impl<T> Engine<T> where T: Protocol {
    /// Creates a new engine speaking the given protocol and evaluating with
    /// the given network.
    pub fn new(protocol: T, net: Network) -> Self {
        Engine {
            protocol,
            net,
            tt: HashTable::new(16),
            tt_megabytes: 16,
            search_count: 0,
            board: Board::new(),
            plies: (0..=MAX_PLY).map(|_| PlyData::new()).collect(),
            accumulators: Vec::with_capacity(MAX_PLY + 1),
            history: HistoryTable::new(),
            start_time: Instant::now(),
            hard_stop: None,
            max_nodes: u64::max_value(),
            max_depth: MAX_PLY,
            nodes: 0,
            seldepth: 0,
            root_best: None,
            stop: AtomicBool::new(false),
            abort: false,
        }
    }

    /// Runs the engine until the client asks it to quit.
    pub fn run(&mut self) {
        while self.protocol.wait_for_search() {
            let options = self.protocol.options();
            if options.hash_megabytes != self.tt_megabytes {
                self.tt = HashTable::new(options.hash_megabytes);
                self.tt_megabytes = options.hash_megabytes;
            } else if options.clear_hash {
                self.tt.clear();
            }

            self.board = self.protocol.board().clone();
            let limits = self.protocol.limits();
            self.configure(&limits);

            if let Some(thinking) = self.search_root() {
                self.protocol.send_move(&thinking);
            }

            if self.abort {
                break;
            }
        }
    }

    /// Applies the limits of the next search.
    fn configure(&mut self, limits: &SearchLimits) {
        self.start_time = Instant::now();
        self.max_depth = limits.depth.unwrap_or(MAX_PLY).max(1).min(MAX_PLY);
        self.max_nodes = limits.nodes.unwrap_or(u64::max_value());

        self.hard_stop = if let Some(movetime) = limits.movetime {
            Some(self.start_time + movetime)
        } else if let Some(time) = limits.time {
            let inc = limits.increment;
            let budget = if time > inc * 6 { time / 30 + inc } else { time / 5 };

            Some(self.start_time + budget)
        } else {
            None
        };
    }

    /// Searches the protocol's position with iterative deepening, reporting
    /// each completed iteration. Returns `None` only when the search was
    /// aborted entirely.
    fn search_root(&mut self) -> Option<Thinking> {
        self.search_count = self.search_count.wrapping_add(1);
        self.nodes = 0;
        self.seldepth = 0;
        self.root_best = None;
        self.abort = false;
        self.stop.store(false, Ordering::Relaxed);

        self.history.clear();
        self.accumulators.clear();
        self.accumulators.push(Accumulator::from_board(&self.net, &self.board));

        for ply_data in &mut self.plies {
            ply_data.pv.clear();
            ply_data.killers = [None; 2];
        }

        debug!("searching: {}", self.board);
        let mut thinking = Thinking::new();

        for depth in 1..=self.max_depth {
            self.seldepth = 0;

            let score = self.search(depth as i32, 0, -Score::infinity(), Score::infinity());

            // keep the last completed iteration's result
            if self.stopped() {
                break;
            }

            thinking.score = score;
            thinking.depth = depth;
            thinking.seldepth = self.seldepth;
            thinking.nodes = self.nodes;
            thinking.time = self.start_time.elapsed();
            thinking.pv = self.plies[0].pv.clone();

            self.protocol.send_thinking(&thinking);
        }

        thinking.nodes = self.nodes;
        thinking.time = self.start_time.elapsed();

        if thinking.pv.is_empty() {
            if let Some(mv) = self.root_best {
                thinking.pv.push(mv);
            }
        }

        if self.abort { None } else { Some(thinking) }
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Checks whether the search must stop, polling the clock, the node
    /// budget and the client. Cheap enough to call at every node.
    fn should_stop(&mut self) -> bool {
        if self.stopped() {
            return true;
        }

        // always search long enough to have a move to play
        if self.root_best.is_none() {
            return false;
        }

        if self.nodes >= self.max_nodes {
            self.stop.store(true, Ordering::Relaxed);
            return true;
        }

        if self.nodes % 1024 == 0 {
            if let Some(deadline) = self.hard_stop {
                if Instant::now() >= deadline {
                    self.stop.store(true, Ordering::Relaxed);
                    return true;
                }
            }

            match self.protocol.check_input() {
                Some(SearchAction::Stop) => self.stop.store(true, Ordering::Relaxed),
                Some(SearchAction::Abort) => {
                    self.abort = true;
                    self.stop.store(true, Ordering::Relaxed);
                },
                None => { },
            }
        }

        self.stopped()
    }

    fn evaluate(&self) -> Score {
        let acc = self.accumulators.last().expect("INFALLIBLE");

        evaluate(&self.net, acc, self.board.turn())
    }

    /// Makes a move on the board and mirrors it into a pushed copy of the
    /// accumulator. Keeping both stacks behind one entry point is what makes
    /// unmaking exact.
    fn make_move(&mut self, mv: Move, ply: usize) {
        let us = self.board.turn();
        let them = !us;
        let from = mv.origin();
        let to = mv.destination();
        let piece = mv.piece();

        let net = &self.net;
        let mut acc = self.accumulators.last().expect("INFALLIBLE").clone();

        match mv.flag() {
            MoveFlag::Castling => {
                acc.deactivate(net, us, Piece::King, from);
                acc.activate(net, us, Piece::King, to);

                let rank = to.rank();
                let (rook_from, rook_to) = if to.file() == File::G {
                    (Square::from_coord(File::H, rank), Square::from_coord(File::F, rank))
                } else {
                    (Square::from_coord(File::A, rank), Square::from_coord(File::D, rank))
                };
                acc.deactivate(net, us, Piece::Rook, rook_from);
                acc.activate(net, us, Piece::Rook, rook_to);
            },
            MoveFlag::EnPassant => {
                let ranks = if us == Color::White { -1 } else { 1 };
                let captured_sq = to.offset(0, ranks).expect("INFALLIBLE");

                acc.deactivate(net, us, Piece::Pawn, from);
                acc.deactivate(net, them, Piece::Pawn, captured_sq);
                acc.activate(net, us, Piece::Pawn, to);
            },
            _ => {
                acc.deactivate(net, us, piece, from);

                if let Some(captured) = self.board.capture_of(mv) {
                    acc.deactivate(net, them, captured, to);
                }

                acc.activate(net, us, mv.promotion().unwrap_or(piece), to);
            },
        }

        self.accumulators.push(acc);
        self.board.make(mv);
        self.nodes += 1;

        if ply + 1 < self.plies.len() {
            self.plies[ply + 1].pv.clear();
        }
    }

    /// Passes the turn, pushing an unchanged accumulator.
    fn make_null(&mut self, ply: usize) {
        let acc = self.accumulators.last().expect("INFALLIBLE").clone();

        self.accumulators.push(acc);
        self.board.make_null();
        self.nodes += 1;

        if ply + 1 < self.plies.len() {
            self.plies[ply + 1].pv.clear();
        }
    }

    /// Unmakes the last (possibly null) move on both stacks.
    fn unmake(&mut self) {
        self.accumulators.pop();
        self.board.undo();
    }

    /// Searches the current position to `depth`, `ply` levels below the
    /// root, looking for a score inside the `(alpha, beta)` window.
    fn search(&mut self, depth: i32, ply: usize, mut alpha: Score, beta: Score) -> Score {
        if self.should_stop() {
            return Score::draw();
        }

        if depth <= 0 {
            return self.qsearch(ply, alpha, beta);
        }

        self.seldepth = max(self.seldepth, ply);
        if ply >= MAX_PLY {
            return self.evaluate();
        }

        let root = ply == 0;

        if !root {
            if self.board.is_draw(ply) {
                return Score::draw();
            }

            // a reversible move straight back into a known position is
            // always available, so the mover can hold a draw
            if alpha < Score::draw() && self.board.has_upcoming_repetition(ply) {
                alpha = Score::draw();
                if alpha >= beta {
                    return alpha;
                }
            }
        }

        let mut tt_move = None;
        if let Some(entry) = self.tt.get(self.board.zobrist_key(), ply) {
            tt_move = entry.best_move().map(HashMove::decode);

            if !root && i32::from(entry.depth()) >= depth {
                let score = entry.score();

                match entry.bound() {
                    Bound::Exact => return score,
                    Bound::Lower if score >= beta => return score,
                    Bound::Upper if score <= alpha => return score,
                    _ => { },
                }
            }
        }

        let in_check = self.board.in_check();

        if let Some(eval) = if in_check { None } else { Some(self.evaluate()) } {
            // reverse futility: a position this far above beta will not
            // fall back below it with so little depth left
            if !root && depth <= 8 && !beta.is_mate() && eval - (80 * depth) as i16 >= beta {
                return eval;
            }

            // null move pruning: hand the opponent a free tempo, and if the
            // reduced search still fails high the real moves will too
            if !root
                && depth >= 3
                && eval >= beta
                && self.board.last_move().is_some()
                && self.board.has_non_pawn_material(self.board.turn())
            {
                let reduction = 3 + depth / 3;

                self.make_null(ply);
                let score = -self.search(depth - 1 - reduction, ply + 1, -beta, -beta + 1);
                self.unmake();

                if self.stopped() {
                    return Score::draw();
                }
                if score >= beta {
                    // an unproven mate from a null search is not reliable
                    return if score.is_mate() { beta } else { score };
                }
            }
        }

        {
            let Engine { plies, board, history, .. } = self;
            plies[ply].generate(board, false, tt_move, history);
        }

        let pinned = self.board.pinned();
        let alpha_orig = alpha;
        let mut best_score = -Score::infinity();
        let mut best_move: Option<Move> = None;
        let mut legal_moves = 0;

        while let Some((mv, _)) = self.plies[ply].next_move() {
            if !self.board.is_pseudolegal_legal(mv, pinned) {
                continue;
            }
            legal_moves += 1;

            let quiet = !self.board.is_capture(mv) && mv.promotion().is_none();

            self.make_move(mv, ply);

            let score = if self.board.is_repetition(ply) {
                Score::draw()
            } else {
                let gives_check = self.board.in_check();
                let new_depth = depth - 1 + i32::from(gives_check);

                if legal_moves == 1 {
                    -self.search(new_depth, ply + 1, -beta, -alpha)
                } else {
                    // late quiet moves are tried with reduced depth first
                    let reduction =
                        if depth >= 3 && legal_moves >= 4 && quiet && !in_check && !gives_check {
                            lmr_reduction(depth, legal_moves).min(new_depth - 1).max(0)
                        } else {
                            0
                        };

                    // principal variation search: probe with a null window,
                    // re-search on improvement
                    let mut score =
                        -self.search(new_depth - reduction, ply + 1, -alpha - 1, -alpha);

                    if score > alpha && reduction > 0 {
                        score = -self.search(new_depth, ply + 1, -alpha - 1, -alpha);
                    }
                    if score > alpha && score < beta {
                        score = -self.search(new_depth, ply + 1, -beta, -alpha);
                    }

                    score
                }
            };

            self.unmake();

            if self.stopped() {
                return Score::draw();
            }

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }

            if score <= alpha {
                continue;
            }
            alpha = score;

            // extend the principal variation with the improved move
            let (head, tail) = self.plies.split_at_mut(ply + 1);
            let pv = &mut head[ply].pv;
            pv.clear();
            pv.push(mv);
            pv.extend_from_slice(&tail[0].pv);

            if root {
                self.root_best = Some(mv);
            }

            if score < beta {
                continue;
            }

            // fail high: remember quiet refutations for ordering
            if quiet {
                self.plies[ply].insert_killer(mv);
                self.history.reward(self.board.turn(), mv, depth);
            }
            break;
        }

        if legal_moves == 0 {
            return if in_check { Score::mated_in(ply) } else { Score::draw() };
        }

        let bound = if best_score >= beta {
            Bound::Lower
        } else if best_score > alpha_orig {
            Bound::Exact
        } else {
            Bound::Upper
        };

        let key = self.board.zobrist_key();
        let entry = match (bound, best_move) {
            (Bound::Upper, _) | (_, None) => HashEntry::new_without_move(
                key, self.search_count, depth as u8, bound, best_score),
            (_, Some(mv)) => HashEntry::new(
                key, self.search_count, depth as u8, bound, best_score, mv.into()),
        };
        self.tt.insert(entry, ply);

        best_score
    }

    /// Searches only captures and promotions until the position goes quiet,
    /// so the static evaluation is never taken in the middle of an exchange.
    fn qsearch(&mut self, ply: usize, mut alpha: Score, beta: Score) -> Score {
        if self.should_stop() {
            return Score::draw();
        }

        self.seldepth = max(self.seldepth, ply);
        if ply >= MAX_PLY {
            return self.evaluate();
        }

        // stand pat: the side to move can usually do at least as well as
        // doing nothing
        let eval = self.evaluate();
        if eval >= beta {
            return eval;
        }
        if eval > alpha {
            alpha = eval;
        }

        {
            let Engine { plies, board, history, .. } = self;
            plies[ply].generate(board, true, None, history);
        }

        let pinned = self.board.pinned();
        let mut best_score = eval;

        while let Some((mv, move_score)) = self.plies[ply].next_move() {
            // the rest of the list loses material by the exchange count
            if move_score < 0 {
                break;
            }

            if !self.board.is_pseudolegal_legal(mv, pinned) {
                continue;
            }

            self.make_move(mv, ply);
            let score = -self.qsearch(ply + 1, -beta, -alpha);
            self.unmake();

            if self.stopped() {
                return Score::draw();
            }

            if score <= best_score {
                continue;
            }
            best_score = score;

            if best_score >= beta {
                break;
            }
            if best_score > alpha {
                alpha = best_score;
            }
        }

        best_score
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use crate::protocol::Options;
    use super::*;

    /// A protocol that never speaks, for driving the search directly.
    #[derive(Debug)]
    struct Silent {
        board: Board,
    }

    impl Protocol for Silent {
        fn wait_for_search(&mut self) -> bool { false }
        fn board(&self) -> &Board { &self.board }
        fn limits(&self) -> SearchLimits { SearchLimits::default() }
        fn options(&mut self) -> Options { Options::default() }
        fn check_input(&mut self) -> Option<SearchAction> { None }
        fn send_thinking(&mut self, _thinking: &Thinking) { }
        fn send_move(&mut self, _thinking: &Thinking) { }
    }

    fn engine_at(fen: &str) -> Engine<Silent> {
        let board: Board = fen.parse().unwrap();
        let mut engine = Engine::new(Silent { board: board.clone() }, Network::zeroed());
        engine.board = board;

        engine
    }

    fn search(engine: &mut Engine<Silent>, limits: SearchLimits) -> Thinking {
        engine.configure(&limits);
        engine.search_root().expect("search was not aborted")
    }

    #[test]
    fn finds_a_legal_opening_move() {
        let mut engine = engine_at(chess::position::START_FEN);
        let limits = SearchLimits { depth: Some(1), ..Default::default() };

        let thinking = search(&mut engine, limits);
        let best = thinking.best_move().unwrap();

        // any of the twenty openings will do, but it must be legal
        assert!(engine.board.move_from_uci(&best.to_string()).is_ok());
        assert_eq!(thinking.depth(), 1);
    }

    #[test]
    fn finds_mate_in_one() {
        let mut engine = engine_at("k7/8/1K6/8/8/8/8/7R w - - 0 1");
        let limits = SearchLimits { depth: Some(3), ..Default::default() };

        let thinking = search(&mut engine, limits);

        assert_eq!(thinking.score(), Score::mates_in(1));
        assert_eq!(thinking.best_move().unwrap().to_string(), "h1h8");
    }

    #[test]
    fn finds_a_forced_mate_in_two() {
        // a rook ladder: 1.Rg7 Kb8 2.Rh8#
        let mut engine = engine_at("k7/8/8/8/8/8/6R1/K6R w - - 0 1");
        let limits = SearchLimits { depth: Some(5), ..Default::default() };

        let thinking = search(&mut engine, limits);
        assert!(thinking.score().is_mate());
        assert!(thinking.score() > Score::draw());
        assert_eq!(thinking.score().moves_until_mate(), 2);
    }

    #[test]
    fn recognizes_stalemate() {
        let mut engine = engine_at("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        let limits = SearchLimits { depth: Some(3), ..Default::default() };

        let thinking = search(&mut engine, limits);

        assert_eq!(thinking.score(), Score::draw());
        assert_eq!(thinking.best_move(), None);
    }

    #[test]
    fn already_mated_position() {
        // fool's mate, black has delivered mate and white has no moves
        let mut engine = engine_at(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        let limits = SearchLimits { depth: Some(2), ..Default::default() };

        let thinking = search(&mut engine, limits);

        assert_eq!(thinking.best_move(), None);
        assert!(thinking.score() < Score::draw());
        assert!(thinking.score().is_mate());
    }

    #[test]
    fn respects_the_node_limit() {
        let mut engine = engine_at(chess::position::START_FEN);
        let limits = SearchLimits { nodes: Some(2_000), ..Default::default() };

        let thinking = search(&mut engine, limits);

        assert!(thinking.nodes() <= 2_100);
        assert!(thinking.best_move().is_some());
    }

    #[test]
    fn respects_a_movetime_budget() {
        let mut engine = engine_at(chess::position::START_FEN);
        let limits = SearchLimits {
            movetime: Some(Duration::from_millis(100)),
            ..Default::default()
        };

        let start = Instant::now();
        let thinking = search(&mut engine, limits);

        assert!(start.elapsed() < Duration::from_millis(150));
        assert!(thinking.best_move().is_some());
    }

    #[test]
    fn searches_a_tactical_position_to_depth() {
        // queens face each other down an open file; exercises captures,
        // checks and the quiescence search deep in the tree
        let mut engine = engine_at("3qk3/8/8/8/8/8/8/3QK3 w - - 0 1");
        let limits = SearchLimits { depth: Some(4), ..Default::default() };

        let thinking = search(&mut engine, limits);
        assert!(thinking.best_move().is_some());
        assert!(thinking.depth() >= 4);
    }

    #[test]
    fn accumulator_stays_in_sync_with_the_board() {
        let kiwipete = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let board: Board = kiwipete.parse().unwrap();

        let mut engine = Engine::new(Silent { board: board.clone() }, Network::patterned());
        engine.board = board;
        engine.accumulators.push(Accumulator::from_board(&engine.net, &engine.board));

        let initial = engine.accumulators.last().unwrap().clone();

        // a capture, a pawn capture, a castle and a knight move
        for mv_str in &["e2a6", "b4c3", "e1g1", "b6c4"] {
            let mv = engine.board.move_from_uci(mv_str).unwrap();
            engine.make_move(mv, 0);

            let fresh = Accumulator::from_board(&engine.net, &engine.board);
            assert_eq!(engine.accumulators.last().unwrap(), &fresh);
        }

        for _ in 0..4 {
            engine.unmake();
        }
        assert_eq!(engine.accumulators.last().unwrap(), &initial);

        // promotions update the accumulator with the new piece
        let board: Board = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8"
            .parse()
            .unwrap();
        engine.board = board;
        engine.accumulators.clear();
        engine.accumulators.push(Accumulator::from_board(&engine.net, &engine.board));

        let mv = engine.board.move_from_uci("d7c8q").unwrap();
        engine.make_move(mv, 0);
        let fresh = Accumulator::from_board(&engine.net, &engine.board);
        assert_eq!(engine.accumulators.last().unwrap(), &fresh);

        // and en passant removes the bypassed pawn
        let board: Board = "4k3/8/8/8/4Pp2/8/8/4K3 b - e3 0 1".parse().unwrap();
        engine.board = board;
        engine.accumulators.clear();
        engine.accumulators.push(Accumulator::from_board(&engine.net, &engine.board));

        let mv = engine.board.move_from_uci("f4e3").unwrap();
        engine.make_move(mv, 0);
        let fresh = Accumulator::from_board(&engine.net, &engine.board);
        assert_eq!(engine.accumulators.last().unwrap(), &fresh);
    }

    #[test]
    fn repeated_positions_evaluate_as_draws() {
        let mut engine = engine_at(chess::position::START_FEN);

        for mv_str in &["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"] {
            let mv = engine.board.move_from_uci(mv_str).unwrap();
            engine.board.make(mv);
        }

        let limits = SearchLimits { depth: Some(4), ..Default::default() };
        let thinking = search(&mut engine, limits);

        // the root position has now occurred three times
        assert!(engine.board.is_draw(0));
        assert!(thinking.best_move().is_some());
    }
}
