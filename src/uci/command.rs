//! UCI command parsing.

use std::str::FromStr;

use super::UciError;
use crate::board::{Color, Position};
use crate::engine::LimiterConfig;

/// Default `bench` depth
pub const DEFAULT_BENCH_DEPTH: i32 = 10;

/// Default `perft` depth
pub const DEFAULT_PERFT_DEPTH: u32 = 6;

/// Search limits given to `go`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoParams {
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movetime: Option<u64>,
    pub depth: Option<i32>,
    pub nodes: Option<u64>,
    pub infinite: bool,
}

impl GoParams {
    /// Limiter configuration for the side to move
    #[must_use]
    pub fn limits(&self, stm: Color) -> LimiterConfig {
        let (time, inc) = match stm {
            Color::White => (self.wtime, self.winc),
            Color::Black => (self.btime, self.binc),
        };
        let mut config = match self.depth {
            Some(depth) => LimiterConfig::depth(depth),
            None => LimiterConfig::default(),
        };
        config.nodes = self.nodes;
        config.move_time = self.movetime.unwrap_or(0);
        config.time_left = time.unwrap_or(0);
        config.increment = inc.unwrap_or(0);
        config.infinite = self.infinite;
        config
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    SetOption { name: String, value: Option<String> },
    Position { fen: Option<String>, moves: Vec<String> },
    Go(GoParams),
    Stop,
    Quit,
    Pretty,
    Bench(i32),
    Perft(u32),
    Eval,
    Fen,
    Display,
}

impl UciCommand {
    /// Resolve a `Position` command against the rules
    pub fn build_position(fen: Option<&str>, moves: &[String]) -> Result<Position, UciError> {
        let mut position = match fen {
            Some(fen) => Position::from_fen(fen)?,
            None => Position::startpos(),
        };
        for text in moves {
            let mv = position
                .parse_legal_move(text)
                .map_err(|error| UciError::InvalidMove {
                    move_str: text.clone(),
                    error,
                })?;
            position.make_move(mv);
        }
        Ok(position)
    }
}

fn parse_value<T: FromStr>(name: &str, value: Option<&&str>) -> Result<T, UciError> {
    let value = value.ok_or(UciError::MissingParts)?;
    value.parse().map_err(|_| UciError::InvalidValue {
        name: name.to_string(),
        value: (*value).to_string(),
    })
}

fn parse_optional<T: FromStr>(name: &str, value: Option<&&str>, default: T) -> Result<T, UciError> {
    match value {
        Some(_) => parse_value(name, value),
        None => Ok(default),
    }
}

fn parse_go(parts: &[&str]) -> Result<GoParams, UciError> {
    let mut params = GoParams::default();
    let mut iter = parts.iter();
    while let Some(&token) = iter.next() {
        match token {
            "wtime" => params.wtime = Some(parse_value(token, iter.next())?),
            "btime" => params.btime = Some(parse_value(token, iter.next())?),
            "winc" => params.winc = Some(parse_value(token, iter.next())?),
            "binc" => params.binc = Some(parse_value(token, iter.next())?),
            "movetime" => params.movetime = Some(parse_value(token, iter.next())?),
            "depth" => params.depth = Some(parse_value(token, iter.next())?),
            "nodes" => params.nodes = Some(parse_value(token, iter.next())?),
            "infinite" => params.infinite = true,
            other => {
                return Err(UciError::InvalidValue {
                    name: "go".to_string(),
                    value: other.to_string(),
                })
            }
        }
    }
    Ok(params)
}

fn parse_position(parts: &[&str]) -> Result<UciCommand, UciError> {
    let moves_at = parts.iter().position(|&p| p == "moves");
    let (head, tail) = match moves_at {
        Some(i) => (&parts[..i], &parts[i + 1..]),
        None => (parts, &[][..]),
    };
    let moves = tail.iter().map(|m| (*m).to_string()).collect();

    match head.first() {
        Some(&"startpos") => Ok(UciCommand::Position { fen: None, moves }),
        Some(&"fen") if head.len() > 1 => Ok(UciCommand::Position {
            fen: Some(head[1..].join(" ")),
            moves,
        }),
        _ => Err(UciError::MissingParts),
    }
}

fn parse_setoption(parts: &[&str]) -> Result<UciCommand, UciError> {
    let mut name_parts: Vec<&str> = Vec::new();
    let mut value_parts: Vec<&str> = Vec::new();
    let mut in_value = false;
    let mut seen_name = false;

    for &part in parts {
        match part {
            "name" if !seen_name => seen_name = true,
            "value" if seen_name && !in_value => in_value = true,
            _ if in_value => value_parts.push(part),
            _ if seen_name => name_parts.push(part),
            _ => {}
        }
    }

    if name_parts.is_empty() {
        return Err(UciError::MissingParts);
    }
    Ok(UciCommand::SetOption {
        name: name_parts.join(" "),
        value: (!value_parts.is_empty()).then(|| value_parts.join(" ")),
    })
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_uci_command(line: &str) -> Result<Option<UciCommand>, UciError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some((&keyword, args)) = parts.split_first() else {
        return Ok(None);
    };

    let cmd = match keyword {
        "uci" => UciCommand::Uci,
        "isready" => UciCommand::IsReady,
        "ucinewgame" => UciCommand::UciNewGame,
        "setoption" => parse_setoption(args)?,
        "position" => parse_position(args)?,
        "go" => UciCommand::Go(parse_go(args)?),
        "stop" => UciCommand::Stop,
        "quit" => UciCommand::Quit,
        "pretty" => UciCommand::Pretty,
        "bench" => UciCommand::Bench(parse_optional("bench", args.first(), DEFAULT_BENCH_DEPTH)?),
        "perft" => UciCommand::Perft(parse_optional("perft", args.first(), DEFAULT_PERFT_DEPTH)?),
        "eval" => UciCommand::Eval,
        "fen" => UciCommand::Fen,
        "display" | "d" => UciCommand::Display,
        other => return Err(UciError::UnknownCommand(other.to_string())),
    };
    Ok(Some(cmd))
}
