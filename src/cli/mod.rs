//! Command-line interface for tezos-beats.
//!
//! Scans wallets, looks up curated tokens and inspects metadata files
//! from the terminal.

mod commands;

pub use commands::{Cli, Commands, run_command};
