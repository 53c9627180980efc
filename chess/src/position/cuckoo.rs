//! Hash tables of reversible-move key deltas for upcoming-repetition detection
//
//  Copyright 2021 Michael Leany
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
//! Every reversible move by a non-pawn piece has a characteristic Zobrist
//! delta: the XOR of the placement keys of its two endpoints and the turn
//! key. The tables below index all such deltas with cuckoo hashing, so the
//! board can ask in O(1) whether the XOR of two position hashes corresponds
//! to a single reversible move, which is the heart of detecting a repetition
//! that is one move away.
use std::convert::TryFrom;
use std::mem;
use lazy_static::lazy_static;
use super::zobrist;
use crate::bitboard::{self, Bitboard};
use crate::moves::{Move, MoveFlag};
use crate::{Color, Piece, Square};

const TABLE_SIZE: usize = 8192;

/// First candidate slot for a move key
#[inline]
pub fn h1(key: u64) -> usize {
    (key & 0x1fff) as usize
}

/// Second candidate slot for a move key
#[inline]
pub fn h2(key: u64) -> usize {
    ((key >> 16) & 0x1fff) as usize
}

/// Returns the move key stored in `slot`, or zero if the slot is empty
#[inline]
pub fn key(slot: usize) -> u64 {
    TABLES.keys[slot]
}

/// Returns the reversible move stored in `slot`
#[inline]
pub fn reversible_move(slot: usize) -> Option<Move> {
    TABLES.moves[slot]
}

struct Tables {
    keys: [u64; TABLE_SIZE],
    moves: [Option<Move>; TABLE_SIZE],
}

impl Tables {
    fn build() -> Tables {
        let mut tables = Tables {
            keys: [0; TABLE_SIZE],
            moves: [None; TABLE_SIZE],
        };

        for &color in &[Color::White, Color::Black] {
            for &piece in &[Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen, Piece::King] {
                for from in 0..Square::COUNT {
                    let from = Square::try_from(from).expect("INFALLIBLE");

                    for to in from as usize + 1..Square::COUNT {
                        let to = Square::try_from(to).expect("INFALLIBLE");

                        if !attacks_on_empty_board(piece, from).contains(to) {
                            continue;
                        }

                        let mut key = zobrist::piece_key(color, piece, from)
                            ^ zobrist::piece_key(color, piece, to)
                            ^ zobrist::turn_key();
                        let mut mv = Some(Move::new(from, to, MoveFlag::for_piece(piece)));

                        // cuckoo insertion: displace until an empty slot is
                        // found, alternating between each key's two slots
                        let mut slot = h1(key);
                        loop {
                            mem::swap(&mut tables.keys[slot], &mut key);
                            mem::swap(&mut tables.moves[slot], &mut mv);

                            if mv.is_none() {
                                break;
                            }

                            slot = if slot == h1(key) { h2(key) } else { h1(key) };
                        }
                    }
                }
            }
        }

        tables
    }
}

fn attacks_on_empty_board(piece: Piece, sq: Square) -> Bitboard {
    let empty = Bitboard::new();

    match piece {
        Piece::Knight => bitboard::knight_attacks(sq),
        Piece::Bishop => bitboard::bishop_attacks(sq, empty),
        Piece::Rook => bitboard::rook_attacks(sq, empty),
        Piece::Queen => bitboard::queen_attacks(sq, empty),
        Piece::King => bitboard::king_attacks(sq),
        Piece::Pawn => unreachable!("pawn moves are not reversible"),
    }
}

lazy_static! {
    static ref TABLES: Tables = Tables::build();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_holds_every_reversible_move() {
        // 3668 reversible (piece, from, to) combinations exist per side pair
        let count = TABLES.moves.iter().filter(|mv| mv.is_some()).count();
        assert_eq!(count, 3668);
    }

    #[test]
    fn lookup_finds_a_known_move() {
        let key = zobrist::piece_key(Color::White, Piece::Knight, Square::G1)
            ^ zobrist::piece_key(Color::White, Piece::Knight, Square::F3)
            ^ zobrist::turn_key();

        let mut slot = h1(key);
        if super::key(slot) != key {
            slot = h2(key);
        }
        assert_eq!(super::key(slot), key);

        let mv = reversible_move(slot).unwrap();
        assert_eq!(mv.piece(), Piece::Knight);
        assert!(
            (mv.origin() == Square::G1 && mv.destination() == Square::F3)
                || (mv.origin() == Square::F3 && mv.destination() == Square::G1)
        );
    }
}
