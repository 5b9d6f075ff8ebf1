//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `scan`: full wallet discovery through the catalog
//! - `tokens`: curated index lookup for explicit tokens
//! - `search`: title/artist search in a wallet's curated tracks
//! - `inspect`: offline classification of a metadata file
//! - `init`: write a config file to edit
//!
//! `--demo` swaps the live pipeline for the fixed offline catalog.

mod init;
mod inspect;
mod scan;
mod search;
mod tokens;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

use crate::config::{self, Config};
use crate::discovery::{DemoSource, DiscoveryService, MusicTrack, TrackSource};

pub use init::cmd_init;
pub use inspect::cmd_inspect;
pub use scan::cmd_scan;
pub use search::cmd_search;
pub use tokens::cmd_tokens;

/// Tezos Beats CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to the OS config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Curated index URL, overriding the config file
    #[arg(long, global = true, env = "TEZOS_BEATS_INDEX_URL")]
    pub index_url: Option<String>,

    /// Curated index API key, overriding the config file
    #[arg(long, global = true, env = "TEZOS_BEATS_INDEX_KEY", hide_env_values = true)]
    pub index_key: Option<String>,

    /// Serve a fixed offline demo catalog instead of querying the network
    #[arg(long, global = true)]
    pub demo: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Discover the music tracks held by a wallet
    Scan {
        /// Wallet address (tz1..., tz2..., KT1...)
        wallet: String,
        /// Print the catalog snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Look up tokens in the curated index
    Tokens {
        /// Tokens as CONTRACT:TOKEN_ID
        #[arg(required = true)]
        tokens: Vec<String>,
        /// Print tracks as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search a wallet's curated tracks by title or artist
    Search {
        /// Wallet address
        wallet: String,
        /// Search term (empty lists every curated track)
        #[arg(default_value = "")]
        term: String,
        /// Print tracks as JSON
        #[arg(long)]
        json: bool,
    },
    /// Classify a token metadata JSON file without network access
    Inspect {
        /// Path to the metadata JSON
        path: PathBuf,
        /// Contract the metadata belongs to
        #[arg(long, default_value = "KT1Inspect")]
        contract: String,
        /// Token id the metadata belongs to
        #[arg(long, default_value = "0")]
        token_id: String,
        /// Print the verdict and track as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the current settings to the config file
    Init {
        /// Replace an existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli);
    let rt = Runtime::new()?;

    match &cli.command {
        Commands::Scan { wallet, json } => {
            cmd_scan(&rt, &config, track_source(&config, cli.demo)?, wallet, *json)
        }
        Commands::Tokens { tokens, json } => {
            cmd_tokens(&rt, &config, track_source(&config, cli.demo)?, tokens, *json)
        }
        Commands::Search { wallet, term, json } => {
            cmd_search(&rt, track_source(&config, cli.demo)?, wallet, term, *json)
        }
        Commands::Inspect {
            path,
            contract,
            token_id,
            json,
        } => cmd_inspect(&config, path, contract, token_id, *json),
        Commands::Init { force } => cmd_init(&config, cli.config.as_deref(), *force),
    }
}

/// The live discovery pipeline, or the demo catalog with `--demo`
fn track_source(config: &Config, demo: bool) -> anyhow::Result<Arc<dyn TrackSource>> {
    if demo {
        tracing::info!(target: "cli", "Demo mode, no network access");
        return Ok(Arc::new(DemoSource));
    }

    let service = DiscoveryService::from_config(config)?;
    if !service.has_index() {
        tracing::info!(target: "cli", "Curated index not configured, using on-chain metadata only");
    }
    Ok(Arc::new(service))
}

/// Config file plus command-line overrides
fn load_config(cli: &Cli) -> Config {
    let config = match &cli.config {
        Some(path) => config::load_from(path),
        None => config::load(),
    };
    apply_overrides(cli, config)
}

fn apply_overrides(cli: &Cli, mut config: Config) -> Config {
    if let Some(url) = &cli.index_url {
        config.secondary_index.base_url = Some(url.clone());
    }
    if let Some(key) = &cli.index_key {
        config.secondary_index.api_key = Some(key.clone());
    }
    config
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Print tracks one per line, or as a JSON array
pub(crate) fn print_tracks(tracks: &[MusicTrack], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(tracks)?);
        return Ok(());
    }

    for track in tracks {
        println!("{}", format_track(track));
    }
    Ok(())
}

/// `Artist - Title (m:ss) [id]`
pub(crate) fn format_track(track: &MusicTrack) -> String {
    format!(
        "{} - {} ({}) [{}]",
        track.artist,
        track.title,
        format_duration(track.duration_seconds),
        track.id
    )
}

/// Seconds as `m:ss`
pub(crate) fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::track;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan() {
        let cli = Cli::try_parse_from(["tezos-beats", "scan", "tz1abc", "--json"]).unwrap();
        match cli.command {
            Commands::Scan { wallet, json } => {
                assert_eq!(wallet, "tz1abc");
                assert!(json);
            }
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn test_parse_tokens_requires_one() {
        assert!(Cli::try_parse_from(["tezos-beats", "tokens"]).is_err());
        let cli = Cli::try_parse_from(["tezos-beats", "tokens", "KT1a:1", "KT1b:2"]).unwrap();
        match cli.command {
            Commands::Tokens { tokens, .. } => assert_eq!(tokens, vec!["KT1a:1", "KT1b:2"]),
            _ => panic!("expected tokens"),
        }
    }

    #[test]
    fn test_search_term_defaults_to_empty() {
        let cli = Cli::try_parse_from(["tezos-beats", "search", "tz1abc"]).unwrap();
        match cli.command {
            Commands::Search { term, .. } => assert_eq!(term, ""),
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let cli = Cli::try_parse_from([
            "tezos-beats",
            "--index-url",
            "https://index.example",
            "--index-key",
            "anon",
            "scan",
            "tz1abc",
        ])
        .unwrap();
        let config = apply_overrides(&cli, Config::default());
        assert_eq!(
            config.secondary_index.base_url.as_deref(),
            Some("https://index.example")
        );
        assert_eq!(config.secondary_index.api_key.as_deref(), Some("anon"));
    }

    #[test]
    fn test_demo_flag_is_global() {
        let cli = Cli::try_parse_from(["tezos-beats", "scan", "tz1abc", "--demo"]).unwrap();
        assert!(cli.demo);
        let cli = Cli::try_parse_from(["tezos-beats", "scan", "tz1abc"]).unwrap();
        assert!(!cli.demo);
    }

    #[test]
    fn test_demo_source_serves_fixed_catalog() {
        let rt = Runtime::new().unwrap();
        let source = track_source(&Config::default(), true).unwrap();
        let tracks = rt
            .block_on(source.discover("tz1abc", &tokio_util::sync::CancellationToken::new()))
            .unwrap();
        assert_eq!(tracks, crate::discovery::demo::demo_tracks());
    }

    #[test]
    fn test_parse_init() {
        let cli = Cli::try_parse_from(["tezos-beats", "init", "--force"]).unwrap();
        assert!(matches!(cli.command, Commands::Init { force: true }));
    }

    #[test]
    fn test_format_track() {
        let mut t = track("KT1a_1", "Waves");
        t.duration_seconds = 245;
        assert_eq!(format_track(&t), "Test Artist - Waves (4:05) [KT1a_1]");
        assert_eq!(format_duration(59), "0:59");
    }
}
