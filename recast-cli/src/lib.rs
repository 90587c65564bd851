//! recast CLI library.
//!
//! The binary in `main.rs` is a thin wrapper; everything it dispatches to lives
//! here so the integration tests can drive the same code paths.

pub mod cli;
pub mod commands;
pub mod driver;
pub mod error;
pub mod lock;
pub mod logging;
pub mod output;
