//! Engine controller for managing search and game state.
//!
//! This module sits between the protocol front end and the search: it owns
//! the position, the shared tables and the workers, turns protocol limits
//! into a [`Limiter`], and hands progress to a [`Reporter`].

mod controller;
pub mod report;
pub mod time;

pub use controller::{BenchResult, Engine, EngineOptions, SearchJob, BENCH_FENS, DEFAULT_HASH_MB};
pub use report::{Report, Reporter, Silent};
pub use time::{Limiter, LimiterConfig};
