//! Contains structure and data for Zobrist hash keys
//
//  Copyright 2021 Michael Leany
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::fmt;
use lazy_static::lazy_static;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::bitboard::Bitboard;
use crate::{Color, File, Piece, Square};

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A 64-bit hash key generated from a position
///
/// The key is updated incrementally as pieces are placed and removed, and is
/// used for repetition detection and as the transposition table key. Castling
/// rights are folded in by XORing the rights bitboard itself, which is unique
/// per rights combination since only the four corner bits can ever be set.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Zobrist(u64);

impl Zobrist {
    /// Creates a new zobrist key
    pub fn new() -> Zobrist {
        Zobrist(0)
    }

    /// Toggles piece placement
    pub fn toggle_piece_placement(&mut self, c: Color, p: Piece, sq: Square) {
        self.0 ^= piece_key(c, p, sq);
    }

    /// Toggles the file of an en passant square
    pub fn toggle_ep_file(&mut self, file: File) {
        self.0 ^= KEYS.ep_file[file as usize];
    }

    /// Toggles a set of castling rights, given as the bitboard of rook
    /// squares which retain their rights
    pub fn toggle_castling_rights(&mut self, rights: Bitboard) {
        self.0 ^= u64::from(rights);
    }

    /// Toggles whose turn it is
    pub fn toggle_turn(&mut self) {
        self.0 ^= KEYS.black_move;
    }
}

impl fmt::Display for Zobrist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::UpperHex for Zobrist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::LowerHex for Zobrist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Zobrist> for u64 {
    /// Allows using the key to get a hash table index
    fn from(key: Zobrist) -> Self {
        key.0
    }
}

/// Returns the raw key for a `(color, piece, square)` placement
///
/// Exposed within the crate so the cuckoo tables can be built from the same
/// keys the board hashes with.
pub(crate) fn piece_key(c: Color, p: Piece, sq: Square) -> u64 {
    KEYS.pieces[c as usize][p as usize][sq as usize]
}

/// Returns the raw key toggled when the turn passes to the other player
pub(crate) fn turn_key() -> u64 {
    KEYS.black_move
}

struct Keys {
    pieces: [[[u64; Square::COUNT]; Piece::COUNT]; Color::COUNT],
    black_move: u64,
    ep_file: [u64; File::COUNT],
}

impl Keys {
    fn generate() -> Keys {
        // a fixed seed keeps hashes deterministic across runs, which makes
        // hash mismatches reproducible under test
        let mut rng = StdRng::seed_from_u64(0x1f6e_22cd_11ac_35c7);

        let mut keys = Keys {
            pieces: [[[0; Square::COUNT]; Piece::COUNT]; Color::COUNT],
            black_move: rng.gen(),
            ep_file: [0; File::COUNT],
        };

        for color in &mut keys.pieces {
            for piece in color.iter_mut() {
                for sq in piece.iter_mut() {
                    *sq = rng.gen();
                }
            }
        }

        for key in &mut keys.ep_file {
            *key = rng.gen();
        }

        keys
    }
}

lazy_static! {
    static ref KEYS: Keys = Keys::generate();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_is_involutive() {
        let mut key = Zobrist::new();

        key.toggle_piece_placement(Color::White, Piece::Knight, Square::G1);
        key.toggle_turn();
        assert_ne!(key, Zobrist::new());

        key.toggle_turn();
        key.toggle_piece_placement(Color::White, Piece::Knight, Square::G1);
        assert_eq!(key, Zobrist::new());
    }

    #[test]
    fn keys_are_distinct() {
        assert_ne!(
            piece_key(Color::White, Piece::Pawn, Square::E2),
            piece_key(Color::Black, Piece::Pawn, Square::E2)
        );
        assert_ne!(
            piece_key(Color::White, Piece::Pawn, Square::E2),
            piece_key(Color::White, Piece::Pawn, Square::E4)
        );
        assert_ne!(turn_key(), 0);
    }
}
