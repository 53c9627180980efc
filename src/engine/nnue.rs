//! The efficiently updatable neural network evaluation
//
//  Copyright 2021 Michael Leany
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
//! The network sees the board as 768 binary features (color x piece type x
//! square), feeds them through one hidden layer of [`HIDDEN_SIZE`] units per
//! perspective, and combines the side-to-move and opponent perspectives into
//! a single centipawn output. Because a move changes at most four features,
//! the hidden layer is maintained incrementally in an
//! [`Accumulator`](struct.Accumulator.html) rather than recomputed.
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use log::info;
use chess::{Board, Color, Piece, Square};

/// The number of hidden units per perspective
pub const HIDDEN_SIZE: usize = 128;

/// The number of input features: two colors, six piece types, 64 squares
const FEATURES: usize = 768;

/// The file the network weights are loaded from
pub const DEFAULT_NET_FILE: &str = "scarecrow.nnue";

/// Scaling from network output to centipawns
const SCALE: i32 = 400;

/// The product of the two quantization factors baked into the weights
const Q: i32 = 255 * 64;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// The network weights, read from a binary blob of little-endian integers
/// laid out as `featureWeights[768 * H] i16 | featureBiases[H] i16 |
/// outputWeights[2 * H] i8 | outputBias i16`
pub struct Network {
    feature_weights: Vec<i16>,
    feature_biases: [i16; HIDDEN_SIZE],
    output_weights: [i8; 2 * HIDDEN_SIZE],
    output_bias: i16,
}

impl Network {
    /// Reads the network from the given file.
    ///
    /// Fails if the file is missing or holds fewer weights than the
    /// architecture requires.
    pub fn load(path: &Path) -> io::Result<Network> {
        let mut file = File::open(path)?;

        let feature_weights = read_i16s(&mut file, FEATURES * HIDDEN_SIZE)?;

        let mut feature_biases = [0; HIDDEN_SIZE];
        feature_biases.copy_from_slice(&read_i16s(&mut file, HIDDEN_SIZE)?);

        let mut output_weights = [0; 2 * HIDDEN_SIZE];
        output_weights.copy_from_slice(&read_i8s(&mut file, 2 * HIDDEN_SIZE)?);

        let output_bias = read_i16s(&mut file, 1)?[0];

        info!("evaluation network loaded from {}", path.display());

        Ok(Network {
            feature_weights,
            feature_biases,
            output_weights,
            output_bias,
        })
    }

    /// Returns a network whose every weight is zero, which evaluates every
    /// position as dead equal. Useful for tests and benchmarks that need an
    /// engine without a weights file.
    pub fn zeroed() -> Network {
        Network {
            feature_weights: vec![0; FEATURES * HIDDEN_SIZE],
            feature_biases: [0; HIDDEN_SIZE],
            output_weights: [0; 2 * HIDDEN_SIZE],
            output_bias: 0,
        }
    }

    /// Returns the hidden-layer column for one input feature.
    fn column(&self, feature: usize) -> &[i16] {
        &self.feature_weights[feature * HIDDEN_SIZE..(feature + 1) * HIDDEN_SIZE]
    }

    /// Computes the network output in centipawns from the side to move's
    /// point of view.
    pub fn evaluate(&self, acc: &Accumulator, turn: Color) -> i32 {
        let (us, them) = match turn {
            Color::White => (&acc.white, &acc.black),
            Color::Black => (&acc.black, &acc.white),
        };

        let mut sum = i32::from(self.output_bias);

        for i in 0..HIDDEN_SIZE {
            sum += crelu(us[i]) * i32::from(self.output_weights[i]);
            sum += crelu(them[i]) * i32::from(self.output_weights[HIDDEN_SIZE + i]);
        }

        sum * SCALE / Q
    }

    #[cfg(test)]
    pub(crate) fn patterned() -> Network {
        let mut net = Network::zeroed();

        for (i, weight) in net.feature_weights.iter_mut().enumerate() {
            *weight = (i % 23) as i16 - 11;
        }
        for (i, bias) in net.feature_biases.iter_mut().enumerate() {
            *bias = (i % 7) as i16;
        }
        for (i, weight) in net.output_weights.iter_mut().enumerate() {
            *weight = (i % 5) as i8 - 2;
        }
        net.output_bias = 31;

        net
    }
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Network {{ hidden: {} }}", HIDDEN_SIZE)
    }
}

/// The clipped ReLU activation, clamping a hidden value to `0..=255`.
fn crelu(x: i16) -> i32 {
    i32::from(x).max(0).min(255)
}

fn read_i16s(file: &mut File, count: usize) -> io::Result<Vec<i16>> {
    let mut bytes = vec![0; count * 2];
    file.read_exact(&mut bytes)?;

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

fn read_i8s(file: &mut File, count: usize) -> io::Result<Vec<i8>> {
    let mut bytes = vec![0; count];
    file.read_exact(&mut bytes)?;

    Ok(bytes.into_iter().map(|byte| byte as i8).collect())
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// The incrementally maintained hidden layer, one vector per perspective
///
/// Black's perspective sees the board mirrored by rank, so the same weights
/// serve both sides. Placing or removing a piece adds or subtracts one
/// feature column from each vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accumulator {
    white: [i16; HIDDEN_SIZE],
    black: [i16; HIDDEN_SIZE],
}

impl Accumulator {
    /// Returns the accumulator of an empty board: just the biases.
    pub fn new(net: &Network) -> Accumulator {
        Accumulator {
            white: net.feature_biases,
            black: net.feature_biases,
        }
    }

    /// Builds the accumulator of a full position from scratch.
    pub fn from_board(net: &Network, board: &Board) -> Accumulator {
        let mut acc = Accumulator::new(net);

        for &color in &[Color::White, Color::Black] {
            for &piece in &Piece::ALL {
                for sq in board.occupied_by_piece(color, piece) {
                    acc.activate(net, color, piece, sq);
                }
            }
        }

        acc
    }

    /// Adds the feature column of a newly placed piece to both perspectives.
    pub fn activate(&mut self, net: &Network, color: Color, piece: Piece, sq: Square) {
        let (white_feature, black_feature) = feature_indices(color, piece, sq);

        for (value, weight) in self.white.iter_mut().zip(net.column(white_feature)) {
            *value += weight;
        }
        for (value, weight) in self.black.iter_mut().zip(net.column(black_feature)) {
            *value += weight;
        }
    }

    /// Subtracts the feature column of a removed piece from both perspectives.
    pub fn deactivate(&mut self, net: &Network, color: Color, piece: Piece, sq: Square) {
        let (white_feature, black_feature) = feature_indices(color, piece, sq);

        for (value, weight) in self.white.iter_mut().zip(net.column(white_feature)) {
            *value -= weight;
        }
        for (value, weight) in self.black.iter_mut().zip(net.column(black_feature)) {
            *value -= weight;
        }
    }
}

/// Maps a piece placement to its input feature from each perspective.
fn feature_indices(color: Color, piece: Piece, sq: Square) -> (usize, usize) {
    let white = color as usize * 384 + piece as usize * 64 + sq as usize;
    let black = (1 - color as usize) * 384 + piece as usize * 64 + (sq as usize ^ 56);

    (white, black)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_mirroring() {
        // a white pawn on e2 from white's view is a black pawn on e7 from black's
        let (white, black) = feature_indices(Color::White, Piece::Pawn, Square::E2);
        assert_eq!(white, Square::E2 as usize);
        assert_eq!(black, 384 + Square::E7 as usize);

        let (white, black) = feature_indices(Color::Black, Piece::King, Square::G8);
        assert_eq!(white, 384 + 5 * 64 + Square::G8 as usize);
        assert_eq!(black, 5 * 64 + Square::G1 as usize);
    }

    #[test]
    fn activation_is_reversible() {
        let net = Network::patterned();
        let baseline = Accumulator::new(&net);

        let mut acc = baseline.clone();
        acc.activate(&net, Color::White, Piece::Queen, Square::D1);
        acc.activate(&net, Color::Black, Piece::Knight, Square::B8);
        assert_ne!(acc, baseline);

        acc.deactivate(&net, Color::Black, Piece::Knight, Square::B8);
        acc.deactivate(&net, Color::White, Piece::Queen, Square::D1);
        assert_eq!(acc, baseline);
    }

    #[test]
    fn from_board_matches_incremental_construction() {
        let net = Network::patterned();
        let board = Board::new();

        let from_board = Accumulator::from_board(&net, &board);

        let mut incremental = Accumulator::new(&net);
        for sq in board.occupied() {
            let (color, piece) = board.piece_at(sq).unwrap();
            incremental.activate(&net, color, piece, sq);
        }

        assert_eq!(from_board, incremental);
    }

    #[test]
    fn zeroed_network_sees_equality() {
        let net = Network::zeroed();
        let board = Board::new();
        let acc = Accumulator::from_board(&net, &board);

        assert_eq!(net.evaluate(&acc, Color::White), 0);
        assert_eq!(net.evaluate(&acc, Color::Black), 0);
    }

    #[test]
    fn evaluation_is_bounded() {
        let net = Network::patterned();
        let board = Board::new();
        let acc = Accumulator::from_board(&net, &board);

        // crelu caps each hidden contribution, so the output cannot leave
        // the i32 range by a wide margin
        let eval = net.evaluate(&acc, Color::White);
        assert!(eval.abs() < 100_000);
    }
}
