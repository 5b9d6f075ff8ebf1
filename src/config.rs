//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\tezos-beats\config.toml
//! - macOS: ~/Library/Application Support/tezos-beats/config.toml
//! - Linux: ~/.config/tezos-beats/config.toml
//!
//! Every section falls back to its defaults, so a file only needs the
//! values it changes:
//!
//! ```toml
//! [secondary_index]
//! base_url = "https://example.supabase.co/rest/v1"
//!
//! [cache]
//! ttl_secs = 600
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::discovery::classifier::WEAK_SIGNAL_THRESHOLD;
use crate::discovery::tzkt::DEFAULT_BASE_URL;
use crate::ipfs::DEFAULT_GATEWAY;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chain indexer (TzKT)
    pub indexer: IndexerConfig,

    /// IPFS gateway
    pub ipfs: IpfsConfig,

    /// Curated music index (PostgREST)
    pub secondary_index: SecondaryIndexConfig,

    /// Per-token stage tuning
    pub pipeline: PipelineConfig,

    /// Wallet cache
    pub cache: CacheConfig,

    /// Scan retry policy
    pub retry: RetryConfig,
}

/// Chain indexer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    pub base_url: String,

    /// Balances per page
    pub page_size: usize,

    /// Pages fetched before giving up on a wallet
    pub max_pages: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 1000,
            max_pages: 10,
        }
    }
}

/// IPFS settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpfsConfig {
    /// Gateway used to turn `ipfs://` URIs into HTTPS URLs
    pub gateway: String,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            gateway: DEFAULT_GATEWAY.to_string(),
        }
    }
}

/// Curated index settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryIndexConfig {
    /// Project URL; the index is disabled when unset
    pub base_url: Option<String>,

    pub table: String,

    /// Anonymous API key (keep out of version control)
    pub api_key: Option<String>,

    /// Rows per page for wallet queries
    pub page_size: usize,

    /// Tokens per `or=(...)` query
    pub token_batch_size: usize,

    /// Maximum rows returned by a search
    pub search_limit: usize,

    /// Pages fetched per query before giving up on the rest
    pub max_pages: usize,
}

impl Default for SecondaryIndexConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            table: "music_nfts".to_string(),
            api_key: None,
            page_size: 1000,
            token_batch_size: 50,
            search_limit: 500,
            max_pages: 10,
        }
    }
}

/// Per-token stage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Tokens processed concurrently
    pub batch_width: usize,

    /// Pause between batches (milliseconds)
    pub batch_pause_ms: u64,

    /// Weak signals needed to call a token music
    pub weak_signal_threshold: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_width: 10,
            batch_pause_ms: 100,
            weak_signal_threshold: WEAK_SIGNAL_THRESHOLD,
        }
    }
}

/// Wallet cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a wallet's tracks stay fresh (seconds)
    pub ttl_secs: u64,

    /// How often stale entries are dropped (seconds)
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            sweep_interval_secs: 60,
        }
    }
}

/// Retry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds)
    pub base_delay_ms: u64,

    /// Growth factor between retries
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            multiplier: 2.0,
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tezos-beats"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location
///
/// Returns default config if the file doesn't exist or can't be parsed.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from `path`
///
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to `path`
///
/// Creates the parent directory if it doesn't exist.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Config file {0} already exists")]
    AlreadyExists(PathBuf),

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================
