//! Implements the [Universal Chess Interface](https://www.chessprogramming.org/UCI),
//! the line-oriented text protocol spoken over stdin and stdout.
//
//  Copyright 2021 Michael Leany
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use std::time::Duration;
use log::{debug, error};
use lazy_static::lazy_static;
use regex::{Regex, RegexSet};
use chess::{Board, Color, Move};
use super::{io, Options, Protocol, SearchAction, SearchLimits};
use crate::engine::{Score, Thinking};

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Current state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Quitting,
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Implementation of the UCI protocol
#[derive(Debug)]
pub struct Uci {
    client: io::Client,

    board: Board,
    limits: SearchLimits,
    options: Options,

    state: State,
}

impl Uci {
    /// Starts the UCI interface.
    pub fn new() -> Self {
        Uci {
            client: io::Client::connect(),
            board: Board::new(),
            limits: SearchLimits::default(),
            options: Options::default(),
            state: State::Idle,
        }
    }

    /// Responds to the `uci` handshake with the engine's identity and the
    /// options it supports.
    fn identify(&self) {
        Response::IdName(format!("Scarecrow {}", env!("CARGO_PKG_VERSION"))).send();
        Response::IdAuthor("Mike Leany".to_string()).send();
        Response::SpinOption { name: "Hash", default: 16, min: 1, max: 4096 }.send();
        Response::SpinOption { name: "Threads", default: 1, min: 1, max: 1 }.send();
        Response::UciOk.send();
    }

    fn set_option(&mut self, name: &str, value: Option<&str>) {
        match name.to_ascii_lowercase().as_str() {
            "hash" => match value.and_then(|v| v.parse::<usize>().ok()) {
                Some(megabytes) => {
                    self.options.hash_megabytes = megabytes.max(1).min(4096);
                },
                None => error!("setoption Hash: missing or invalid value"),
            },
            "threads" => {
                // a single searching worker; the option exists so clients
                // that insist on setting it are not met with an error
                self.options.threads = 1;
            },
            _ => debug!("setoption: unknown option {}", name),
        }
    }

    /// Rebuilds the board from a `position` command.
    ///
    /// A malformed FEN discards the command; an illegal move discards it and
    /// the rest of the move list.
    fn set_position(&mut self, fen: Option<&str>, moves: &str) {
        let mut board = match fen {
            None => Board::new(),
            Some(fen) => match Board::from_fen_str(fen) {
                Ok(board) => board,
                Err(err) => {
                    error!("position: {}: {}", err, fen);
                    return;
                },
            },
        };

        for move_str in moves.split_whitespace() {
            match board.move_from_uci(move_str) {
                Ok(mv) => board.make(mv),
                Err(err) => {
                    error!("position: {} {} in {}", move_str, err, board);
                    break;
                },
            }
        }

        self.board = board;
    }

    /// Converts the parameters of a `go` command into search limits for the
    /// side to move.
    fn set_limits(&mut self, params: GoParams) {
        let (time, inc) = match self.board.turn() {
            Color::White => (params.wtime, params.winc),
            Color::Black => (params.btime, params.binc),
        };

        self.limits = SearchLimits {
            depth: params.depth,
            nodes: params.nodes,
            movetime: params.movetime.map(Duration::from_millis),
            time: time.map(Duration::from_millis),
            increment: Duration::from_millis(inc.unwrap_or(0)),
        };
    }
}

impl Default for Uci {
    fn default() -> Self {
        Uci::new()
    }
}

impl Protocol for Uci {
    fn wait_for_search(&mut self) -> bool {
        use Command::*;

        while self.state == State::Idle {
            let line = match self.client.recv() {
                Ok(line) => line,
                Err(_) => return false,
            };

            match line.parse() {
                Ok(cmd) => match cmd {
                    Uci => self.identify(),
                    Debug(_) => { },
                    IsReady => Response::ReadyOk.send(),
                    SetOption { name, value } => self.set_option(&name, value.as_deref()),
                    UciNewGame => {
                        self.options.clear_hash = true;
                        self.board = Board::new();
                    },
                    Position { fen, moves } => self.set_position(fen.as_deref(), &moves),
                    Go(params) => {
                        self.set_limits(params);
                        return true;
                    },
                    Stop => { },
                    Quit => self.state = State::Quitting,
                },
                // unknown commands are ignored
                Err(_) => debug!("unknown command: {}", line),
            }
        }

        false
    }

    fn board(&self) -> &Board {
        &self.board
    }

    fn limits(&self) -> SearchLimits {
        self.limits
    }

    fn options(&mut self) -> Options {
        let options = self.options;
        self.options.clear_hash = false;

        options
    }

    fn check_input(&mut self) -> Option<SearchAction> {
        while let Ok(line) = self.client.try_recv() {
            match line.parse() {
                Ok(Command::Stop) => return Some(SearchAction::Stop),
                Ok(Command::Quit) => {
                    self.state = State::Quitting;
                    return Some(SearchAction::Abort);
                },
                Ok(Command::IsReady) => Response::ReadyOk.send(),
                _ => { },
            }
        }

        None
    }

    fn send_thinking(&mut self, thinking: &Thinking) {
        let pv = thinking
            .pv()
            .iter()
            .map(Move::to_string)
            .collect::<Vec<_>>()
            .join(" ");

        Response::Info {
            depth: thinking.depth(),
            seldepth: thinking.seldepth(),
            score: score_string(thinking.score()),
            nodes: thinking.nodes(),
            nps: thinking.nps(),
            time: thinking.time().as_millis() as u64,
            pv,
        }
        .send();
    }

    fn send_move(&mut self, thinking: &Thinking) {
        Response::BestMove(thinking.best_move()).send();
    }
}

/// Formats a score the way the `info` line wants it: centipawns, or full
/// moves until mate from the engine's point of view.
fn score_string(score: Score) -> String {
    if score.is_mate() {
        format!("mate {}", score.moves_until_mate())
    } else {
        format!("cp {}", score.centipawns())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Commands that can be received from the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Asks the engine to identify itself and its options, ending with
    /// `uciok`.
    ///
    /// ```text
    /// uci
    /// ```
    Uci,

    /// Turns debug output on or off.
    ///
    /// ```text
    /// debug [on|off]
    /// ```
    Debug(bool),

    /// Asks for a `readyok` response once the engine has caught up.
    ///
    /// ```text
    /// isready
    /// ```
    IsReady,

    /// Changes an engine option.
    ///
    /// ```text
    /// setoption name <NAME> [value <VALUE>]
    /// ```
    SetOption {
        /// The option's name, as declared in the `uci` response.
        name: String,
        /// The new value, absent for button options.
        value: Option<String>,
    },

    /// Announces that the next search belongs to a new game. The engine
    /// clears its transposition table.
    ///
    /// ```text
    /// ucinewgame
    /// ```
    UciNewGame,

    /// Sets up the position to search.
    ///
    /// ```text
    /// position [startpos | fen <FEN>] [moves <m1> <m2> ...]
    /// ```
    Position {
        /// The base position; `None` means the standard starting position.
        fen: Option<String>,
        /// Moves applied on top, in coordinate notation, space separated.
        moves: String,
    },

    /// Starts searching the current position.
    ///
    /// ```text
    /// go [depth <D>] [nodes <N>] [movetime <T>]
    ///    [wtime <T>] [btime <T>] [winc <T>] [binc <T>] [infinite]
    /// ```
    Go(GoParams),

    /// Stops the current search; the engine reports its best move.
    ///
    /// ```text
    /// stop
    /// ```
    Stop,

    /// Exits the engine.
    ///
    /// ```text
    /// quit
    /// ```
    Quit,
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// The parameters of a `go` command; times are in milliseconds.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct GoParams {
    /// Maximum search depth in plies.
    pub depth: Option<usize>,
    /// Maximum number of nodes to search.
    pub nodes: Option<u64>,
    /// Exact time to think, in milliseconds.
    pub movetime: Option<u64>,
    /// White's remaining clock time, in milliseconds.
    pub wtime: Option<u64>,
    /// Black's remaining clock time, in milliseconds.
    pub btime: Option<u64>,
    /// White's increment per move, in milliseconds.
    pub winc: Option<u64>,
    /// Black's increment per move, in milliseconds.
    pub binc: Option<u64>,
}

impl FromStr for Command {
    type Err = UciError;

    fn from_str(s: &str) -> Result<Self, UciError> {
        use Command::*;

        if let Some(ind) = COMMAND_SET.matches(s).iter().next() {
            let args = COMMAND_VEC[ind].captures(s).expect("INFALLIBLE");

            match ind {
                0 => Ok(Uci),
                1 => Ok(Debug(args.get(1).expect("INFALLIBLE").as_str() == "on")),
                2 => Ok(IsReady),
                3 => {
                    let name = args.get(1).expect("INFALLIBLE").as_str().to_string();
                    let value = args.get(2).map(|value| value.as_str().to_string());

                    Ok(SetOption { name, value })
                },
                4 => Ok(UciNewGame),
                5 => {
                    let fen = args.get(1).map(|fen| fen.as_str().to_string());
                    let moves = args
                        .get(2)
                        .map(|moves| moves.as_str().to_string())
                        .unwrap_or_default();

                    Ok(Position { fen, moves })
                },
                6 => {
                    let rest = args.get(1).map(|rest| rest.as_str()).unwrap_or("");

                    Ok(Go(parse_go_params(rest)?))
                },
                7 => Ok(Stop),
                8 => Ok(Quit),
                _ => unreachable!(),
            }
        } else {
            Err(UciError)
        }
    }
}

fn parse_go_params(args: &str) -> Result<GoParams, UciError> {
    let mut params = GoParams::default();
    let mut tokens = args.split_whitespace();

    while let Some(token) = tokens.next() {
        let mut number = || -> Result<u64, UciError> {
            tokens.next().ok_or(UciError)?.parse().map_err(UciError::from)
        };

        match token {
            "depth" => params.depth = Some(number()? as usize),
            "nodes" => params.nodes = Some(number()?),
            "movetime" => params.movetime = Some(number()?),
            "wtime" => params.wtime = Some(number()?),
            "btime" => params.btime = Some(number()?),
            "winc" => params.winc = Some(number()?),
            "binc" => params.binc = Some(number()?),
            "infinite" => { },
            // unsupported search modes are ignored rather than rejected
            _ => { },
        }
    }

    Ok(params)
}

const COMMANDS: [&str; 9] = [
    r"^uci\s*$",
    r"^debug\s+(on|off)\b",
    r"^isready\s*$",
    r"^setoption\s+name\s+(.+?)(?:\s+value\s+(.+?))?\s*$",
    r"^ucinewgame\s*$",
    r"^position\s+(?:startpos|fen\s+(.+?))(?:\s+moves\s+(.+?))?\s*$",
    r"^go\b(.*)$",
    r"^stop\s*$",
    r"^quit\s*$",
];

lazy_static! {
    static ref COMMAND_SET: RegexSet = RegexSet::new(&COMMANDS).expect("INFALLIBLE");
    static ref COMMAND_VEC: Vec<Regex> = {
        let mut cmd_vec = Vec::new();
        for cmd in &COMMANDS {
            cmd_vec.push(Regex::new(cmd).expect("INFALLIBLE"));
        }
        cmd_vec
    };
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Responses from the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The engine's name, sent in response to `uci`.
    ///
    /// ```text
    /// id name <NAME>
    /// ```
    IdName(String),

    /// The engine's author, sent in response to `uci`.
    ///
    /// ```text
    /// id author <AUTHOR>
    /// ```
    IdAuthor(String),

    /// Declares an integer option and its range.
    ///
    /// ```text
    /// option name <NAME> type spin default <D> min <MIN> max <MAX>
    /// ```
    SpinOption {
        /// The option's name.
        name: &'static str,
        /// The value used if the client never sets the option.
        default: usize,
        /// The smallest accepted value.
        min: usize,
        /// The largest accepted value.
        max: usize,
    },

    /// Ends the identification started by `uci`.
    ///
    /// ```text
    /// uciok
    /// ```
    UciOk,

    /// Tells the client the engine is ready for the next command.
    ///
    /// ```text
    /// readyok
    /// ```
    ReadyOk,

    /// Reports on a completed search iteration.
    ///
    /// ```text
    /// info depth <D> seldepth <S> score {cp <V>|mate <N>} nodes <N> nps <X>
    ///      time <MS> pv <m1> <m2> ...
    /// ```
    Info {
        /// The completed iteration depth.
        depth: usize,
        /// The deepest ply reached, counting quiescence.
        seldepth: usize,
        /// The score, already formatted as `cp <v>` or `mate <n>`.
        score: String,
        /// Nodes searched so far.
        nodes: u64,
        /// Average nodes per second.
        nps: u64,
        /// Elapsed milliseconds.
        time: u64,
        /// The principal variation in coordinate notation.
        pv: String,
    },

    /// Reports the move the engine has settled on. `None` (printed as
    /// `0000`) means the position had no legal moves.
    ///
    /// ```text
    /// bestmove <MOVE>
    /// ```
    BestMove(Option<Move>),
}

impl Response {
    fn send(&self) {
        io::Client::send(&self.to_string());
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Response::*;

        match self {
            IdName(name) => format!("id name {}", name).fmt(f),
            IdAuthor(author) => format!("id author {}", author).fmt(f),
            SpinOption { name, default, min, max } => format!(
                "option name {} type spin default {} min {} max {}",
                name, default, min, max
            )
            .fmt(f),
            UciOk => "uciok".fmt(f),
            ReadyOk => "readyok".fmt(f),
            Info { depth, seldepth, score, nodes, nps, time, pv } => {
                let mut s = format!(
                    "info depth {} seldepth {} score {} nodes {} nps {} time {}",
                    depth, seldepth, score, nodes, nps, time
                );
                if !pv.is_empty() {
                    s += &format!(" pv {}", pv);
                }
                s.fmt(f)
            },
            BestMove(Some(mv)) => format!("bestmove {}", mv).fmt(f),
            BestMove(None) => "bestmove 0000".fmt(f),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// An unrecognized or malformed command
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UciError;

impl fmt::Display for UciError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "unrecognized or malformed command".fmt(f)
    }
}

impl std::error::Error for UciError { }

impl From<ParseIntError> for UciError {
    fn from(_: ParseIntError) -> UciError {
        UciError
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use chess::{MoveFlag, Square};
    use super::*;

    #[test]
    fn parse_simple_commands() {
        assert_eq!("uci".parse(), Ok(Command::Uci));
        assert_eq!("isready".parse(), Ok(Command::IsReady));
        assert_eq!("ucinewgame".parse(), Ok(Command::UciNewGame));
        assert_eq!("stop".parse(), Ok(Command::Stop));
        assert_eq!("quit".parse(), Ok(Command::Quit));
        assert_eq!("debug on".parse(), Ok(Command::Debug(true)));
        assert_eq!("debug off".parse(), Ok(Command::Debug(false)));

        assert_eq!("xyzzy".parse::<Command>(), Err(UciError));
        assert_eq!("".parse::<Command>(), Err(UciError));
    }

    #[test]
    fn parse_setoption() {
        assert_eq!(
            "setoption name Hash value 64".parse(),
            Ok(Command::SetOption {
                name: "Hash".to_string(),
                value: Some("64".to_string()),
            })
        );
        assert_eq!(
            "setoption name Clear Hash".parse(),
            Ok(Command::SetOption {
                name: "Clear Hash".to_string(),
                value: None,
            })
        );
    }

    #[test]
    fn parse_position() {
        assert_eq!(
            "position startpos".parse(),
            Ok(Command::Position { fen: None, moves: String::new() })
        );
        assert_eq!(
            "position startpos moves e2e4 e7e5".parse(),
            Ok(Command::Position {
                fen: None,
                moves: "e2e4 e7e5".to_string(),
            })
        );
        assert_eq!(
            "position fen 4k3/8/8/8/8/8/R7/4K3 w - - 0 1 moves a2a8".parse(),
            Ok(Command::Position {
                fen: Some("4k3/8/8/8/8/8/R7/4K3 w - - 0 1".to_string()),
                moves: "a2a8".to_string(),
            })
        );
        assert_eq!(
            "position fen 4k3/8/8/8/8/8/R7/4K3 w - - 0 1".parse(),
            Ok(Command::Position {
                fen: Some("4k3/8/8/8/8/8/R7/4K3 w - - 0 1".to_string()),
                moves: String::new(),
            })
        );
    }

    #[test]
    fn parse_go() {
        assert_eq!("go".parse(), Ok(Command::Go(GoParams::default())));
        assert_eq!("go infinite".parse(), Ok(Command::Go(GoParams::default())));
        assert_eq!(
            "go depth 12".parse(),
            Ok(Command::Go(GoParams { depth: Some(12), ..Default::default() }))
        );
        assert_eq!(
            "go movetime 100".parse(),
            Ok(Command::Go(GoParams { movetime: Some(100), ..Default::default() }))
        );
        assert_eq!(
            "go wtime 300000 btime 300000 winc 2000 binc 2000".parse(),
            Ok(Command::Go(GoParams {
                wtime: Some(300_000),
                btime: Some(300_000),
                winc: Some(2_000),
                binc: Some(2_000),
                ..Default::default()
            }))
        );
        assert_eq!(
            "go nodes 5000 depth 9".parse(),
            Ok(Command::Go(GoParams {
                nodes: Some(5_000),
                depth: Some(9),
                ..Default::default()
            }))
        );
    }

    #[test]
    fn format_responses() {
        assert_eq!(Response::UciOk.to_string(), "uciok");
        assert_eq!(Response::ReadyOk.to_string(), "readyok");
        assert_eq!(
            Response::IdName("Scarecrow 0.1.0".to_string()).to_string(),
            "id name Scarecrow 0.1.0"
        );
        assert_eq!(
            Response::SpinOption { name: "Hash", default: 16, min: 1, max: 4096 }.to_string(),
            "option name Hash type spin default 16 min 1 max 4096"
        );

        let mv = Move::new(Square::E2, Square::E4, MoveFlag::PawnTwoUp);
        assert_eq!(Response::BestMove(Some(mv)).to_string(), "bestmove e2e4");
        assert_eq!(Response::BestMove(None).to_string(), "bestmove 0000");

        let info = Response::Info {
            depth: 8,
            seldepth: 12,
            score: "cp 35".to_string(),
            nodes: 123_456,
            nps: 1_000_000,
            time: 123,
            pv: "e2e4 e7e5".to_string(),
        };
        assert_eq!(
            info.to_string(),
            "info depth 8 seldepth 12 score cp 35 nodes 123456 nps 1000000 time 123 pv e2e4 e7e5"
        );
    }

    #[test]
    fn score_strings() {
        assert_eq!(score_string(Score::from(35)), "cp 35");
        assert_eq!(score_string(Score::from(-250)), "cp -250");
        assert_eq!(score_string(Score::mates_in(3)), "mate 2");
        assert_eq!(score_string(Score::mated_in(2)), "mate -1");
    }
}
