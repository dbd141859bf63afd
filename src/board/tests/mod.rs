//! Board module tests.
//!
//! Tests are organized into separate files by category:
//! - `perft.rs` - Move generation node counts
//! - `draw.rs` - Draw detection (50-move, repetition, insufficient material)
//! - `make_unmake.rs` - Make/unmake correctness and hash channels
//! - `edge_cases.rs` - Special positions, notation and exchange evaluation
//! - `eval.rs` - Network evaluation and kernel agreement
//! - `search.rs` - Search worker behavior
//! - `search_tables.rs` - History, correction and transposition tables
//! - `proptest.rs` - Property-based tests

mod draw;
mod make_unmake;
mod search_tables;
