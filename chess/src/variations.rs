//! Counting of the variations from a position to a fixed depth (perft)
//
//  Copyright 2021 Michael Leany
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
//! Walking every legal variation to a fixed depth and counting the leaves is
//! the standard way to validate a move generator: the counts for well-known
//! positions are published and must match exactly.
use crate::Board;

/// Returns the number of leaf nodes reachable from the current position in
/// exactly `depth` half-moves.
///
/// The board is used as scratch space and is restored before returning.
pub fn count(board: &mut Board, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut moves = Vec::new();
    board.pseudolegal_moves(&mut moves, false, true);
    let pinned = board.pinned();

    let mut nodes = 0;

    // at the horizon the legal moves only need to be counted, not made
    if depth == 1 {
        for &mv in &moves {
            if board.is_pseudolegal_legal(mv, pinned) {
                nodes += 1;
            }
        }

        return nodes;
    }

    for &mv in &moves {
        if board.is_pseudolegal_legal(mv, pinned) {
            board.make(mv);
            nodes += count(board, depth - 1);
            board.undo();
        }
    }

    nodes
}

/// Like [`count`](fn.count.html), but prints the subtree count of every root
/// move before returning the total.
pub fn print(board: &mut Board, depth: usize) -> u64 {
    if depth == 0 {
        return 0;
    }

    let mut moves = Vec::new();
    board.pseudolegal_moves(&mut moves, false, true);
    let pinned = board.pinned();

    let mut total = 0;

    for &mv in &moves {
        if board.is_pseudolegal_legal(mv, pinned) {
            board.make(mv);
            let nodes = count(board, depth - 1);
            board.undo();

            println!("{}:\t{:12}", mv, nodes);
            total += nodes;
        }
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_counts() {
        let mut board = Board::new();

        assert_eq!(count(&mut board, 0), 1);
        assert_eq!(count(&mut board, 1), 20);
        assert_eq!(count(&mut board, 2), 400);
        assert_eq!(count(&mut board, 3), 8_902);
        assert_eq!(count(&mut board, 4), 197_281);

        // the board comes back untouched
        assert_eq!(board, Board::new());
    }
}
