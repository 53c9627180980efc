//! Provides data and functions used to compute attacks
//
//  Copyright 2021 Michael Leany
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::convert::TryFrom;
use lazy_static::lazy_static;
use super::*;

/// The precomputed attack data, built once on first use and shared for the
/// lifetime of the process
struct Tables {
    knight: [Bitboard; Square::COUNT],
    king: [Bitboard; Square::COUNT],
    pawn: [[Bitboard; Square::COUNT]; Color::COUNT],

    // sliding-piece masks with the origin square excluded
    diag_mask: [Bitboard; Square::COUNT],
    anti_mask: [Bitboard; Square::COUNT],
    file_mask: [Bitboard; Square::COUNT],

    // first-rank attacks indexed by file and the six inner occupancy bits
    rank_attacks: [[u8; 64]; File::COUNT],

    between: [[Bitboard; Square::COUNT]; Square::COUNT],
    line: [[Bitboard; Square::COUNT]; Square::COUNT],
}

lazy_static! {
    static ref TABLES: Tables = Tables::build();
}

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1), (1, 1), (1, 0), (1, -1), (0, -1), (-1, -1), (-1, 0), (-1, 1),
];

const ORTHOGONALS: [(i8, i8); 2] = [(1, 0), (0, 1)];
const DIAGONALS: [(i8, i8); 2] = [(1, 1), (1, -1)];

impl Tables {
    fn build() -> Tables {
        let mut tables = Tables {
            knight: [Bitboard::new(); Square::COUNT],
            king: [Bitboard::new(); Square::COUNT],
            pawn: [[Bitboard::new(); Square::COUNT]; Color::COUNT],
            diag_mask: [Bitboard::new(); Square::COUNT],
            anti_mask: [Bitboard::new(); Square::COUNT],
            file_mask: [Bitboard::new(); Square::COUNT],
            rank_attacks: [[0; 64]; File::COUNT],
            between: [[Bitboard::new(); Square::COUNT]; Square::COUNT],
            line: [[Bitboard::new(); Square::COUNT]; Square::COUNT],
        };

        for index in 0..Square::COUNT {
            let sq = Square::try_from(index).expect("INFALLIBLE");

            for &(x, y) in &KNIGHT_OFFSETS {
                if let Some(dest) = sq.offset(x, y) {
                    tables.knight[index].insert(dest);
                }
            }

            for &(x, y) in &KING_OFFSETS {
                if let Some(dest) = sq.offset(x, y) {
                    tables.king[index].insert(dest);
                }
            }

            for &x in &[-1, 1] {
                if let Some(dest) = sq.offset(x, 1) {
                    tables.pawn[Color::White as usize][index].insert(dest);
                }
                if let Some(dest) = sq.offset(x, -1) {
                    tables.pawn[Color::Black as usize][index].insert(dest);
                }
            }

            tables.diag_mask[index] = ray(sq, 1, 1) | ray(sq, -1, -1);
            tables.anti_mask[index] = ray(sq, 1, -1) | ray(sq, -1, 1);
            tables.file_mask[index] = ray(sq, 0, 1) | ray(sq, 0, -1);
        }

        // between: for each square and direction, walk outward accumulating
        // the squares passed over
        for index in 0..Square::COUNT {
            let sq = Square::try_from(index).expect("INFALLIBLE");

            for &(x, y) in &KING_OFFSETS {
                let mut passed = Bitboard::new();
                let mut next = sq.offset(x, y);

                while let Some(dest) = next {
                    tables.between[index][dest as usize] = passed;
                    passed.insert(dest);
                    next = dest.offset(x, y);
                }
            }
        }

        // line: every pair of squares sharing a rank, file or diagonal maps
        // to the full line through them, extended to the board edges
        for index in 0..Square::COUNT {
            let sq = Square::try_from(index).expect("INFALLIBLE");

            for &(x, y) in ORTHOGONALS.iter().chain(DIAGONALS.iter()) {
                let line = ray(sq, x, y) | ray(sq, -x, -y) | sq.into();

                for dest in line {
                    if dest != sq {
                        tables.line[index][dest as usize] = line;
                    }
                }
            }
        }

        for file in 0..File::COUNT {
            for inner in 0..64 {
                let occ = (inner as u8) << 1;
                let mut att: u8 = 0;

                let mut f = file + 1;
                while f < 8 {
                    att |= 1 << f;
                    if occ & (1 << f) != 0 {
                        break;
                    }
                    f += 1;
                }

                let mut f = file as i32 - 1;
                while f >= 0 {
                    att |= 1 << f;
                    if occ & (1 << f) != 0 {
                        break;
                    }
                    f -= 1;
                }

                tables.rank_attacks[file][inner] = att;
            }
        }

        tables
    }
}

/// Returns the squares reached from `sq` walking in the given direction until
/// the edge of the board, excluding `sq` itself
fn ray(sq: Square, x: i8, y: i8) -> Bitboard {
    let mut bd = Bitboard::new();
    let mut next = sq.offset(x, y);

    while let Some(dest) = next {
        bd.insert(dest);
        next = dest.offset(x, y);
    }

    bd
}

/// Computes sliding attacks along `mask` using the hyperbola quintessence
/// o^(o-2r) trick; `mask` must hold at most one square per rank, which holds
/// for files and diagonals in the rank-major layout
fn hyperbola(sq: Square, occ: Bitboard, mask: Bitboard) -> Bitboard {
    let sq_mask = u64::from(Bitboard::from(sq));
    let mask = u64::from(mask);
    let masked = u64::from(occ) & mask;

    let forward = masked.wrapping_sub(sq_mask.wrapping_mul(2));
    let reverse = masked
        .swap_bytes()
        .wrapping_sub(sq_mask.swap_bytes().wrapping_mul(2))
        .swap_bytes();

    Bitboard::from((forward ^ reverse) & mask)
}

/// Computes sliding attacks along the rank of `sq` based on the occupied squares
/// given by `occ`
///
/// This function is similar to [`rook_attacks`](fn.rook_attacks.html), but only computes attacks
/// along a single rank, which is useful for determining if the space is clear between the king
/// and a rook.
pub fn rank_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    let shift = sq.rank() as usize * 8;
    let inner = ((u64::from(occ) >> (shift + 1)) & 0o77) as usize;

    Bitboard::from((TABLES.rank_attacks[sq.file() as usize][inner] as u64) << shift)
}

/// Computes knight-like attacks to or from `sq`
///
/// See the crate-level documentation for more information about
/// [this function](index.html#direct-attacks-knights-kings-and-pawns) and
/// [other attack functions](index.html#moves-and-attacks).
#[inline]
pub fn knight_attacks(sq: Square) -> Bitboard {
    TABLES.knight[sq as usize]
}

/// Computes king-like attacks to or from `sq`
#[inline]
pub fn king_attacks(sq: Square) -> Bitboard {
    TABLES.king[sq as usize]
}

/// Computes the squares attacked by a pawn of the given color on `sq`
///
/// These are the capture targets only; pawn advances are not attacks.
#[inline]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    TABLES.pawn[color as usize][sq as usize]
}

/// Computes bishop-like attacks to or from `sq` based on the occupied squares
/// given by `occ`
pub fn bishop_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    hyperbola(sq, occ, TABLES.diag_mask[sq as usize])
        | hyperbola(sq, occ, TABLES.anti_mask[sq as usize])
}

/// Computes rook-like attacks to or from `sq` based on the occupied squares
/// given by `occ`
pub fn rook_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    hyperbola(sq, occ, TABLES.file_mask[sq as usize]) | rank_attacks(sq, occ)
}

/// Computes queen-like attacks to or from `sq` based on the occupied squares
/// given by `occ`
#[inline]
pub fn queen_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    rook_attacks(sq, occ) | bishop_attacks(sq, occ)
}

/// Returns the squares strictly between `a` and `b` if they share a rank,
/// file or diagonal, and an empty bitboard otherwise
#[inline]
pub fn between(a: Square, b: Square) -> Bitboard {
    TABLES.between[a as usize][b as usize]
}

/// Returns the full line through `a` and `b` (including both squares),
/// extended to the board edges, or an empty bitboard if the squares are not
/// colinear
#[inline]
pub fn line_through(a: Square, b: Square) -> Bitboard {
    TABLES.line[a as usize][b as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_attacks() {
        assert_eq!(knight_attacks(Square::A1), Bitboard::from(Square::B3) | Square::C2.into());
        assert_eq!(king_attacks(Square::A1).len(), 3);
        assert_eq!(king_attacks(Square::E4).len(), 8);
        assert_eq!(knight_attacks(Square::E4).len(), 8);

        assert_eq!(
            pawn_attacks(Color::White, Square::E2),
            Bitboard::from(Square::D3) | Square::F3.into()
        );
        assert_eq!(
            pawn_attacks(Color::Black, Square::A7),
            Bitboard::from(Square::B6)
        );
    }

    #[test]
    fn sliding_attacks() {
        let empty = Bitboard::new();

        assert_eq!(rook_attacks(Square::A1, empty).len(), 14);
        assert_eq!(bishop_attacks(Square::A1, empty).len(), 7);
        assert_eq!(bishop_attacks(Square::D4, empty).len(), 13);
        assert_eq!(queen_attacks(Square::D4, empty).len(), 27);

        // blockers stop the ray but are included in the attack set
        let occ = Bitboard::from(Square::D3) | Square::F4.into();
        let attacks = rook_attacks(Square::D4, occ);
        assert!(attacks.contains(Square::D3));
        assert!(!attacks.contains(Square::D2));
        assert!(attacks.contains(Square::F4));
        assert!(!attacks.contains(Square::G4));
        assert!(attacks.contains(Square::A4));
        assert!(attacks.contains(Square::D8));

        let occ = Bitboard::from(Square::F6);
        let attacks = bishop_attacks(Square::D4, occ);
        assert!(attacks.contains(Square::F6));
        assert!(!attacks.contains(Square::G7));
        assert!(attacks.contains(Square::A1));
        assert!(attacks.contains(Square::A7));
    }

    #[test]
    fn rays() {
        assert_eq!(between(Square::E1, Square::H1), Bitboard::from(Square::F1) | Square::G1.into());
        assert_eq!(between(Square::E1, Square::A1).len(), 3);
        assert_eq!(between(Square::A1, Square::H8).len(), 6);
        assert_eq!(between(Square::A1, Square::B3), Bitboard::new());
        assert_eq!(between(Square::C3, Square::C4), Bitboard::new());

        assert!(line_through(Square::A1, Square::C3).contains(Square::H8));
        assert!(line_through(Square::A1, Square::C3).contains(Square::A1));
        assert_eq!(line_through(Square::A1, Square::C3).len(), 8);
        assert_eq!(line_through(Square::B2, Square::C4), Bitboard::new());
        assert_eq!(line_through(Square::A4, Square::D4).len(), 8);
    }
}
