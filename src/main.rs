use std::process::ExitCode;

use env_logger::Env;

use chess_nnue::engine::EngineOptions;
use chess_nnue::uci::UciHandler;

const DEFAULT_LOG_FILTER: &str = "warn";

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().filter_or("RUST_LOG", DEFAULT_LOG_FILTER))
        .target(env_logger::Target::Stderr)
        .init();

    let mut handler = match UciHandler::new(EngineOptions::default()) {
        Ok(handler) => handler,
        Err(e) => {
            log::error!("failed to start engine: {e}");
            return ExitCode::FAILURE;
        }
    };

    // `chess_nnue bench 12` runs one command and exits
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        handler.run();
    } else {
        handler.execute(&args.join(" "));
        handler.wait();
    }
    ExitCode::SUCCESS
}
