//! Tezos Beats - music NFT discovery for Tezos wallets.
//!
//! Finds the music among a wallet's FA2 tokens, resolves playable audio and
//! artwork through IPFS, and upgrades the result with a curated audio index
//! when one is configured.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod ipfs;
pub mod metadata;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("tezos_beats=info"))?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    cli::run_command(&args)
}
