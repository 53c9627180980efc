//! Supported chess protocols
//
//  Copyright 2021 Michael Leany
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::time::Duration;
use chess::Board;
use crate::engine::Thinking;

pub mod io;
pub mod uci;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// An action that should be taken regarding the current search.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SearchAction {
    /// The engine should stop thinking and report its best move.
    Stop,

    /// The engine should stop thinking and exit without reporting a move.
    Abort,
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Limits on a requested search; a limit of `None` means unlimited.
#[derive(Debug, Copy, Clone, Default)]
pub struct SearchLimits {
    /// The maximum depth in plies.
    pub depth: Option<usize>,

    /// The maximum number of nodes to search.
    pub nodes: Option<u64>,

    /// The exact amount of time to think.
    pub movetime: Option<Duration>,

    /// The time remaining on the side to move's clock.
    pub time: Option<Duration>,

    /// The side to move's increment per move.
    pub increment: Duration,
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Engine options which the client can change between searches.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Options {
    /// The size of the transposition table in megabytes.
    pub hash_megabytes: usize,

    /// The number of search threads. Only a single searching worker is
    /// supported, so any request is clamped to one.
    pub threads: usize,

    /// Set when the client asked for the transposition table to be cleared;
    /// reading the options resets it.
    pub clear_hash: bool,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            hash_megabytes: 16,
            threads: 1,
            clear_hash: false,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Trait used for structures that implement the engine side of a chess
/// protocol
pub trait Protocol {
    /// Waits until the engine should begin searching or should exit.
    ///
    /// Returns true if the engine should begin searching, or false if it
    /// should exit.
    fn wait_for_search(&mut self) -> bool;

    /// Returns the position to search, as set up by the client.
    fn board(&self) -> &Board;

    /// Returns the limits of the requested search.
    fn limits(&self) -> SearchLimits;

    /// Returns the current option values and resets any one-shot requests
    /// they carry.
    fn options(&mut self) -> Options;

    /// Allows the protocol to check the input during a search.
    ///
    /// If the search should end for any reason, returns how it should end.
    fn check_input(&mut self) -> Option<SearchAction>;

    /// Sends the engine's thinking to the client.
    fn send_thinking(&mut self, thinking: &Thinking);

    /// Sends the engine's move to the client.
    fn send_move(&mut self, thinking: &Thinking);
}
