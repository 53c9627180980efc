//! Scores and the static evaluation of a position
//
//  Copyright 2021 Michael Leany
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::ops;
use chess::Color;
use super::nnue::{Accumulator, Network};

/// The number of plies reserved below infinity for mate scores
const MATE_RANGE: i16 = 256;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A search score in centipawns, always from the point of view of the side
/// to move
///
/// Scores within [`MATE_RANGE`] plies of infinity encode forced mates, with
/// the distance to mate folded into the value so that shorter mates compare
/// as better.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score(i16);

impl Score {
    /// Returns the greatest possible score
    pub fn infinity() -> Self {
        Score(32_000)
    }

    /// Returns the score for a draw
    pub fn draw() -> Self {
        Score(0)
    }

    /// Returns the score for checkmating in `n` plies
    pub fn mates_in(n: usize) -> Self {
        Score::infinity() - n as i16
    }

    /// Returns the score for being checkmated in `n` plies
    pub fn mated_in(n: usize) -> Self {
        -Score::infinity() + n as i16
    }

    /// Returns `true` if the score encodes a forced mate for either side
    pub fn is_mate(self) -> bool {
        self.0.abs() >= 32_000 - MATE_RANGE
    }

    /// Returns the number of full moves until mate, negative if the side to
    /// move is the one being mated
    ///
    /// Only meaningful if [`is_mate`](#method.is_mate) returns `true`.
    pub fn moves_until_mate(self) -> i32 {
        let plies = 32_000 - i32::from(self.0.abs());
        let moves = (plies + 1) / 2;

        if self.0 > 0 { moves } else { -moves }
    }

    /// Returns the score as a plain centipawn value
    pub fn centipawns(self) -> i16 {
        self.0
    }

    /// Clamps a raw centipawn value into the non-mate score range
    pub fn from_centipawns(cp: i32) -> Score {
        let limit = i32::from(32_000 - MATE_RANGE) - 1;

        Score(cp.max(-limit).min(limit) as i16)
    }
}

impl ops::Neg for Score {
    type Output = Score;

    fn neg(self) -> Self {
        Score(-self.0)
    }
}

impl ops::Add<i16> for Score {
    type Output = Score;

    fn add(self, rhs: i16) -> Self {
        Score(self.0 + rhs)
    }
}

impl ops::Sub<i16> for Score {
    type Output = Score;

    fn sub(self, rhs: i16) -> Self {
        Score(self.0 - rhs)
    }
}

impl From<i16> for Score {
    fn from(val: i16) -> Self {
        Score(val)
    }
}

impl From<Score> for i16 {
    fn from(val: Score) -> Self {
        val.0
    }
}

/// Returns the static score of the accumulator's position for the side to
/// move.
pub fn evaluate(net: &Network, acc: &Accumulator, turn: Color) -> Score {
    Score::from_centipawns(net.evaluate(acc, turn))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mate_scores() {
        assert!(Score::mates_in(3) > Score::mates_in(5));
        assert!(Score::mated_in(3) < Score::mated_in(5));
        assert!(Score::mates_in(3) > Score::from(500));
        assert!(Score::mated_in(3) < Score::from(-500));

        assert!(Score::mates_in(1).is_mate());
        assert!(Score::mated_in(7).is_mate());
        assert!(!Score::draw().is_mate());
        assert!(!Score::from(2_500).is_mate());

        assert_eq!(Score::mates_in(1).moves_until_mate(), 1);
        assert_eq!(Score::mates_in(2).moves_until_mate(), 1);
        assert_eq!(Score::mates_in(3).moves_until_mate(), 2);
        assert_eq!(Score::mated_in(4).moves_until_mate(), -2);
    }

    #[test]
    fn negation_and_arithmetic() {
        assert_eq!(-Score::mates_in(5), Score::mated_in(5));
        assert_eq!(-Score::draw(), Score::draw());
        assert_eq!(Score::from(10) + 5, Score::from(15));
        assert_eq!(Score::from(10) - 25, Score::from(-15));
    }

    #[test]
    fn clamping() {
        assert_eq!(Score::from_centipawns(100), Score::from(100));
        assert!(!Score::from_centipawns(1_000_000).is_mate());
        assert!(!Score::from_centipawns(-1_000_000).is_mate());
    }
}
