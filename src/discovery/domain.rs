//! Internal domain models for music NFT discovery.
//!
//! These types are OUR types - they don't change when the chain indexer or the
//! curated index change their response shapes. All external responses get
//! converted into these types via adapters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metadata::TokenMetadata;

/// Composite `(contract, token)` key identifying a token across sources
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenKey {
    pub contract_address: String,
    pub token_id: String,
}

impl TokenKey {
    pub fn new(contract_address: impl Into<String>, token_id: impl Into<String>) -> Self {
        Self {
            contract_address: contract_address.into(),
            token_id: token_id.into(),
        }
    }

    /// Parse the `KT1...:42` form used on the command line
    pub fn parse(input: &str) -> Option<Self> {
        let (contract, token) = input.trim().rsplit_once(':')?;
        if contract.is_empty() || token.is_empty() {
            return None;
        }
        Some(Self::new(contract, token))
    }
}

/// Renders as the track id: `<contract>_<token>`
impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.contract_address, self.token_id)
    }
}

/// A token balance as reported by the chain indexer
#[derive(Debug, Clone, PartialEq)]
pub struct RawToken {
    /// Wallet holding the balance
    pub owner_address: String,
    /// FA2 contract address (KT1...)
    pub contract_address: String,
    /// Human-friendly contract name known to the indexer
    pub contract_alias: Option<String>,
    /// Token id within the contract
    pub token_id: String,
    /// Token standard ("fa2")
    pub standard: String,
    /// Metadata, if the indexer had it resolved
    pub metadata: Option<TokenMetadata>,
}

impl RawToken {
    pub fn key(&self) -> TokenKey {
        TokenKey::new(&self.contract_address, &self.token_id)
    }
}

/// Why the classifier reached its verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerdictReason {
    /// A playable audio file was found in the metadata
    AudioArtifact,
    /// Enough corroborating weak signals were found
    WeakSignalCount,
    /// Neither check passed
    Rejected,
}

/// Outcome of classifying one token's metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationVerdict {
    pub is_music: bool,
    pub reason: VerdictReason,
    /// Weak signals counted (0 when the audio check was decisive)
    pub weak_signals: u8,
}

/// Where a track's fields came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// Extracted from token metadata only
    OnChain,
    /// Built from a curated index record only
    SecondaryIndex,
    /// On-chain extraction upgraded with a curated index record
    Merged,
}

/// Normalized, player-ready track.
///
/// Identity is [`MusicTrack::id`]; two tracks with the same id are the same track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicTrack {
    /// `<contract>_<token>`
    pub id: String,
    pub title: String,
    pub artist: String,
    /// Fetchable image URL or generated placeholder data URI
    pub cover_url: String,
    pub duration_seconds: u32,
    pub collection_name: String,
    pub contract_address: String,
    pub token_id: String,
    /// Fetchable audio URL, if one was found
    pub audio_url: Option<String>,
    pub description: Option<String>,
    pub provenance: Provenance,
}

/// A row of the curated audio index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecondaryIndexRecord {
    pub contract_address: String,
    pub token_id: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Usually `ipfs://`; rows without one are filtered out at query time
    pub audio_uri: Option<String>,
    pub thumbnail_uri: Option<String>,
    pub duration_seconds: Option<u32>,
    pub description: Option<String>,
}

impl SecondaryIndexRecord {
    pub fn key(&self) -> TokenKey {
        TokenKey::new(&self.contract_address, &self.token_id)
    }
}

/// Errors that can occur during discovery
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} from {service}")]
    Http { service: &'static str, status: u16 },

    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Rate limited - try again later")]
    RateLimited,

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Scan cancelled")]
    Cancelled,
}

impl DiscoveryError {
    /// Whether the retry layer should try again after this error
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::NotConfigured(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_key_display_is_track_id() {
        let key = TokenKey::new("KT1abc", "7");
        assert_eq!(key.to_string(), "KT1abc_7");
    }

    #[test]
    fn test_token_key_parse() {
        assert_eq!(TokenKey::parse("KT1abc:42"), Some(TokenKey::new("KT1abc", "42")));
        assert_eq!(TokenKey::parse("KT1abc"), None);
        assert_eq!(TokenKey::parse(":42"), None);
        assert_eq!(TokenKey::parse("KT1abc:"), None);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(DiscoveryError::Network("timeout".into()).is_retryable());
        assert!(DiscoveryError::RateLimited.is_retryable());
        assert!(
            DiscoveryError::Http {
                service: "tzkt",
                status: 502
            }
            .is_retryable()
        );
        assert!(!DiscoveryError::Cancelled.is_retryable());
        assert!(!DiscoveryError::NotConfigured("curated index").is_retryable());
    }

    #[test]
    fn test_provenance_serializes_kebab_case() {
        let json = serde_json::to_string(&Provenance::SecondaryIndex).unwrap();
        assert_eq!(json, "\"secondary-index\"");
        let json = serde_json::to_string(&VerdictReason::WeakSignalCount).unwrap();
        assert_eq!(json, "\"weak-signal-count\"");
    }
}
