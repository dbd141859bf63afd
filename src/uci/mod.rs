//! Universal Chess Interface (UCI) protocol implementation.
//!
//! Handles communication with chess GUIs following the UCI specification,
//! plus a few interactive extras (`pretty`, `bench`, `perft`, `eval`,
//! `fen`, `display`). Searches run on a background thread so `stop` and
//! `quit` are served while thinking.

use std::fmt;
use std::io::{self, BufRead};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::board::nnue::NetworkError;
use crate::board::{FenError, MoveParseError};
use crate::engine::{Engine, EngineOptions, SearchJob};

pub mod command;
pub mod options;
pub mod pretty;
pub mod report;

use command::{parse_uci_command, UciCommand};
use options::{uci_banner, UciOption};
use pretty::PrettyReporter;
use report::{print_ready, UciReporter};

/// Error type for malformed or unusable protocol input
#[derive(Debug)]
pub enum UciError {
    /// Invalid FEN string
    InvalidFen(FenError),
    /// Invalid move in the move list
    InvalidMove { move_str: String, error: MoveParseError },
    /// Missing required parts in the command
    MissingParts,
    /// A numeric or option value that does not parse or is out of range
    InvalidValue { name: String, value: String },
    UnknownCommand(String),
    UnknownOption(String),
    /// Network file could not be loaded
    Network(NetworkError),
    /// Search thread could not be started
    Io(io::Error),
}

impl fmt::Display for UciError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UciError::InvalidFen(e) => write!(f, "Invalid FEN: {e}"),
            UciError::InvalidMove { move_str, error } => {
                write!(f, "Invalid move '{move_str}': {error}")
            }
            UciError::MissingParts => write!(f, "Missing required parts in command"),
            UciError::InvalidValue { name, value } => {
                write!(f, "Invalid value '{value}' for {name}")
            }
            UciError::UnknownCommand(cmd) => write!(f, "Unknown command '{cmd}'"),
            UciError::UnknownOption(name) => write!(f, "Unknown option '{name}'"),
            UciError::Network(e) => write!(f, "{e}"),
            UciError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for UciError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UciError::InvalidFen(e) => Some(e),
            UciError::InvalidMove { error, .. } => Some(error),
            UciError::Network(e) => Some(e),
            UciError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FenError> for UciError {
    fn from(e: FenError) -> Self {
        UciError::InvalidFen(e)
    }
}

impl From<NetworkError> for UciError {
    fn from(e: NetworkError) -> Self {
        UciError::Network(e)
    }
}

impl From<io::Error> for UciError {
    fn from(e: io::Error) -> Self {
        UciError::Io(e)
    }
}

/// Protocol state: the shared engine and the running search, if any
pub struct UciHandler {
    engine: Arc<Mutex<Engine>>,
    job: Option<SearchJob>,
}

impl UciHandler {
    pub fn new(options: EngineOptions) -> Result<Self, NetworkError> {
        let engine = Engine::new(options, Box::new(UciReporter))?;
        Ok(UciHandler {
            engine: Arc::new(Mutex::new(engine)),
            job: None,
        })
    }

    /// Shared engine handle
    #[must_use]
    pub fn engine(&self) -> &Arc<Mutex<Engine>> {
        &self.engine
    }

    /// Read commands from stdin until `quit` or end of input
    pub fn run(&mut self) {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if !self.execute(&line) {
                return;
            }
        }
        self.wait();
    }

    /// Handle one line. Returns `false` once the session should end.
    ///
    /// Errors are logged and echoed as `info string`; the command is dropped.
    pub fn execute(&mut self, line: &str) -> bool {
        let result = parse_uci_command(line).and_then(|cmd| match cmd {
            Some(cmd) => self.handle(cmd),
            None => Ok(true),
        });
        match result {
            Ok(keep_going) => keep_going,
            Err(e) => {
                log::warn!("{e}");
                println!("info string {e}");
                true
            }
        }
    }

    /// Let a running search finish on its own
    pub fn wait(&mut self) {
        if let Some(job) = self.job.take() {
            job.wait();
        }
    }

    fn stop_search(&mut self) {
        if let Some(job) = self.job.take() {
            job.stop_and_wait();
            log::debug!("search stopped");
        }
    }

    fn handle(&mut self, cmd: UciCommand) -> Result<bool, UciError> {
        // Only these may run alongside a search
        match cmd {
            UciCommand::IsReady => {
                print_ready();
                return Ok(true);
            }
            UciCommand::Stop => {
                self.stop_search();
                return Ok(true);
            }
            UciCommand::Quit => {
                self.stop_search();
                return Ok(false);
            }
            _ => self.stop_search(),
        }

        match cmd {
            UciCommand::Uci => {
                let mut engine = self.engine.lock();
                engine.set_reporter(Box::new(UciReporter));
                println!("{}", uci_banner());
            }
            UciCommand::Pretty => {
                self.engine.lock().set_reporter(Box::new(PrettyReporter::new()));
            }
            UciCommand::UciNewGame => {
                let mut engine = self.engine.lock();
                engine.new_game();
                engine.set_position(crate::board::Position::startpos());
            }
            UciCommand::SetOption { name, value } => {
                let option = UciOption::parse(&name, value.as_deref())?;
                let mut engine = self.engine.lock();
                match option {
                    UciOption::Hash(mb) => engine.set_hash(mb),
                    UciOption::Threads(n) => engine.set_threads(n),
                    UciOption::EvalFile(path) => engine.load_network(path)?,
                }
                log::info!("option {name} set");
            }
            UciCommand::Position { fen, moves } => {
                let position = UciCommand::build_position(fen.as_deref(), &moves)?;
                self.engine.lock().set_position(position);
            }
            UciCommand::Go(params) => {
                let limits = params.limits(self.engine.lock().position().side_to_move());
                self.job = Some(SearchJob::spawn(&self.engine, limits)?);
            }
            UciCommand::Bench(depth) => {
                let result = self.engine.lock().bench(depth);
                println!("{} nodes {} nps", result.nodes, result.nps);
            }
            UciCommand::Perft(depth) => {
                let start = Instant::now();
                let nodes = self.engine.lock().perft(depth);
                println!(
                    "info string perft depth {depth} nodes {nodes} time {}",
                    start.elapsed().as_millis()
                );
            }
            UciCommand::Eval => {
                self.engine.lock().eval();
            }
            UciCommand::Fen => {
                println!("{}", self.engine.lock().position().to_fen());
            }
            UciCommand::Display => {
                println!("{}", self.engine.lock().position());
            }
            UciCommand::IsReady | UciCommand::Stop | UciCommand::Quit => {}
        }
        Ok(true)
    }
}

/// Run the interactive protocol loop on stdin
pub fn run_uci_loop(options: EngineOptions) -> Result<(), NetworkError> {
    let mut handler = UciHandler::new(options)?;
    handler.run();
    Ok(())
}
