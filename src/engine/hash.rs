//! The transposition table
//
//  Copyright 2021 Michael Leany
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::mem::size_of;
use std::num::NonZeroU16;
use chess::{Move, Zobrist};
use crate::engine::Score;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A move stored in a hash entry
///
/// The packed move's flag bits are never zero, so `Option<HashMove>` is
/// guaranteed to be only 16 bits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HashMove(NonZeroU16);

impl HashMove {
    /// Recovers the move.
    pub fn decode(self) -> Move {
        Move::from_bits(self.0.get()).expect("INFALLIBLE")
    }
}

impl From<Move> for HashMove {
    fn from(mv: Move) -> HashMove {
        HashMove(NonZeroU16::new(mv.bits()).expect("INFALLIBLE"))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Indicates the kind of bound a hash entry's score places on the true score.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Bound {
    Lower,
    Exact,
    Upper,
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// An entry in the transposition table.
///
/// It is guaranteed to be exactly 16 bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HashEntry {
    // 8 bytes
    zobrist: Zobrist,
    // 2 bytes
    when: u16,
    // 1 byte
    depth: u8,
    // 1 byte
    bound: Bound,
    // 2 bytes
    score: Score,
    // 2 bytes
    best_move: Option<HashMove>,
}

impl HashEntry {
    /// Creates an entry holding a best move.
    pub fn new(
        zobrist: Zobrist,
        now: u16, depth: u8,
        bound: Bound, score: Score,
        best_move: HashMove)
    -> HashEntry {
        HashEntry {
            zobrist,
            when: now,
            depth,
            bound,
            score,
            best_move: Some(best_move),
        }
    }

    /// Creates an entry with no best move, as stored after a fail-low.
    pub fn new_without_move(
        zobrist: Zobrist,
        now: u16, depth: u8,
        bound: Bound, score: Score)
    -> HashEntry {
        HashEntry {
            zobrist,
            when: now,
            depth,
            bound,
            score,
            best_move: None,
        }
    }

    /// Returns the full key of the stored position.
    pub fn zobrist(&self) -> Zobrist {
        self.zobrist
    }

    /// Returns the search counter at the time the entry was stored.
    pub fn when(&self) -> u16 {
        self.when
    }

    /// Returns the depth the stored score was searched to.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Returns the kind of bound the stored score represents.
    pub fn bound(&self) -> Bound {
        self.bound
    }

    /// Returns the stored score, adjusted to the probing ply by
    /// [`HashTable::get`](struct.HashTable.html#method.get).
    pub fn score(&self) -> Score {
        self.score
    }

    /// Returns the stored best move, if any.
    pub fn best_move(&self) -> Option<HashMove> {
        self.best_move
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A fixed-size, lossy cache of search results keyed by position hash
///
/// Probes index a bucket list with the low bits of the key and verify the
/// full stored key, so a colliding entry reads as a miss rather than as
/// wrong data. Within a bucket list, replacement prefers the shallowest and
/// oldest entry.
///
/// Mate scores are normalized on the way in and out: a stored mate score is
/// relative to the entry's own position, while the search works with scores
/// relative to the root. The conversion adds the probing ply on store and
/// removes it on load, which keeps mate distances correct when the same
/// position is reached by paths of different lengths.
#[derive(Debug)]
pub struct HashTable(Vec<BucketList>);
type BucketList = [Option<HashEntry>; HashTable::BUCKETS];

impl HashTable {
    const BUCKETS: usize = 4;

    /// Creates a table using close to, but no more than, `megabytes` of
    /// memory.
    pub fn new(megabytes: usize) -> HashTable {
        let bytes = megabytes.max(1) << 20;
        let mut elems = (bytes / size_of::<BucketList>()).next_power_of_two();

        if elems * size_of::<BucketList>() > bytes {
            elems /= 2;
        }

        HashTable(vec![[None; Self::BUCKETS]; elems.max(1)])
    }

    /// Looks up a position, translating any mate score to be relative to the
    /// root of the current search.
    pub fn get(&self, zobrist: Zobrist, cur_ply: usize) -> Option<HashEntry> {
        let index = u64::from(zobrist) as usize & (self.0.len() - 1);

        for bucket in 0..Self::BUCKETS {
            match self.0[index][bucket] {
                Some(mut entry) if zobrist == entry.zobrist => {
                    if entry.score.is_mate() {
                        if entry.score > Score::draw() {
                            entry.score = entry.score - cur_ply as i16;
                        } else {
                            entry.score = entry.score + cur_ply as i16;
                        }
                    }

                    return Some(entry);
                },
                _ => { },
            }
        }

        None
    }

    /// Stores an entry, translating any mate score to be relative to the
    /// entry's own position.
    pub fn insert(&mut self, mut new_entry: HashEntry, cur_ply: usize) {
        let index = u64::from(new_entry.zobrist) as usize & (self.0.len() - 1);

        if new_entry.score.is_mate() {
            if new_entry.score > Score::draw() {
                new_entry.score = new_entry.score + cur_ply as i16;
            } else {
                new_entry.score = new_entry.score - cur_ply as i16;
            }
        }

        let mut lowest_draft = u32::max_value();
        let mut bucket = 0;
        for b in 0..Self::BUCKETS {
            match self.0[index][b] {
                Some(entry) if new_entry.zobrist == entry.zobrist => {
                    bucket = b;
                    break;
                },
                Some(entry) => {
                    let draft = u32::from(entry.depth) + u32::from(entry.when);
                    if draft < lowest_draft {
                        lowest_draft = draft;
                        bucket = b;
                    }
                },
                None => {
                    bucket = b;
                    break;
                },
            }
        }

        self.0[index][bucket] = Some(new_entry);
    }

    /// Empties the table without changing its size.
    pub fn clear(&mut self) {
        let len = self.0.len();
        self.0.clear();
        self.0.resize(len, [None; Self::BUCKETS]);
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod test {
    use chess::{Board, MoveFlag, Square};
    use super::*;

    #[test]
    fn hash_entry_size() {
        use std::mem::size_of;
        assert_eq!(size_of::<Option<HashEntry>>(), 16);
    }

    #[test]
    fn store_and_probe() {
        let mut table = HashTable::new(1);
        let board = Board::new();
        let mv = Move::new(Square::G1, Square::F3, MoveFlag::Knight);

        assert!(table.get(board.zobrist_key(), 0).is_none());

        let entry = HashEntry::new(
            board.zobrist_key(), 1, 8, Bound::Exact, Score::from(25), mv.into());
        table.insert(entry, 0);

        let found = table.get(board.zobrist_key(), 0).unwrap();
        assert_eq!(found.depth(), 8);
        assert_eq!(found.bound(), Bound::Exact);
        assert_eq!(found.score(), Score::from(25));
        assert_eq!(found.best_move().map(HashMove::decode), Some(mv));

        table.clear();
        assert!(table.get(board.zobrist_key(), 0).is_none());
    }

    #[test]
    fn mate_scores_are_ply_relative() {
        let mut table = HashTable::new(1);
        let board = Board::new();

        // a mate five plies from the root, stored from a node two plies deep
        let entry = HashEntry::new_without_move(
            board.zobrist_key(), 1, 10, Bound::Exact, Score::mates_in(5));
        table.insert(entry, 2);

        // probed from four plies deep, the same mate is seven plies away
        // relative to that root-distance
        let found = table.get(board.zobrist_key(), 4).unwrap();
        assert_eq!(found.score(), Score::mates_in(5) + 2 - 4);

        // probing at the storing ply round-trips exactly
        let found = table.get(board.zobrist_key(), 2).unwrap();
        assert_eq!(found.score(), Score::mates_in(5));
    }

    #[test]
    fn lookups_verify_the_full_key() {
        let mut table = HashTable::new(1);
        let board = Board::new();
        let other: Board = "4k3/8/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();

        let entry = HashEntry::new_without_move(
            board.zobrist_key(), 1, 4, Bound::Lower, Score::from(50));
        table.insert(entry, 0);

        assert!(table.get(board.zobrist_key(), 0).is_some());
        assert!(table.get(other.zobrist_key(), 0).is_none());
    }
}
