//! Test utilities and fixtures for tezos-beats tests.
//!
//! Small builders for the domain types so tests only spell out the fields
//! they care about.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{metadata, raw_token_with};
//!
//! let token = raw_token_with("KT1abc", "1", json!({"name": "Night Drive"}));
//! let meta = metadata(json!({"mimeType": "audio/mpeg"}));
//! ```

use serde_json::Value;

use crate::discovery::{MusicTrack, Provenance, RawToken, SecondaryIndexRecord};
use crate::metadata::TokenMetadata;

/// Wallet used as the owner of fixture tokens
pub const TEST_WALLET: &str = "tz1TestWallet";

/// Metadata from a JSON object literal.
///
/// Panics when `value` is not an object.
pub fn metadata(value: Value) -> TokenMetadata {
    TokenMetadata::from_value(value).expect("fixture metadata must be a JSON object")
}

/// An FA2 balance with no inline metadata.
pub fn raw_token(contract: &str, token_id: &str, alias: Option<&str>) -> RawToken {
    RawToken {
        owner_address: TEST_WALLET.to_string(),
        contract_address: contract.to_string(),
        contract_alias: alias.map(str::to_string),
        token_id: token_id.to_string(),
        standard: "fa2".to_string(),
        metadata: None,
    }
}

/// An FA2 balance carrying inline metadata.
pub fn raw_token_with(contract: &str, token_id: &str, value: Value) -> RawToken {
    RawToken {
        metadata: Some(metadata(value)),
        ..raw_token(contract, token_id, None)
    }
}

/// A curated index row with title, artist and an audio URI.
///
/// Thumbnail, duration and description are left empty.
pub fn index_record(contract: &str, token_id: &str, title: &str, artist: &str) -> SecondaryIndexRecord {
    SecondaryIndexRecord {
        contract_address: contract.to_string(),
        token_id: token_id.to_string(),
        title: Some(title.to_string()),
        artist: Some(artist.to_string()),
        audio_uri: Some("ipfs://QmIndexAudio".to_string()),
        ..Default::default()
    }
}

/// A finished on-chain track with id `<contract>_<token>`.
pub fn track(id: &str, title: &str) -> MusicTrack {
    let (contract, token_id) = id.rsplit_once('_').unwrap_or((id, "0"));
    MusicTrack {
        id: id.to_string(),
        title: title.to_string(),
        artist: "Test Artist".to_string(),
        cover_url: "https://ipfs.io/ipfs/QmTestCover".to_string(),
        duration_seconds: 180,
        collection_name: "Test Collection".to_string(),
        contract_address: contract.to_string(),
        token_id: token_id.to_string(),
        audio_url: Some("https://ipfs.io/ipfs/QmTestAudio".to_string()),
        description: None,
        provenance: Provenance::OnChain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_token_defaults() {
        let token = raw_token("KT1abc", "7", Some("OBJKT"));
        assert_eq!(token.key().to_string(), "KT1abc_7");
        assert_eq!(token.contract_alias.as_deref(), Some("OBJKT"));
        assert!(token.metadata.is_none());
    }

    #[test]
    fn test_raw_token_with_metadata() {
        let token = raw_token_with("KT1abc", "7", json!({"name": "Song"}));
        assert_eq!(token.metadata.unwrap().text("name"), Some("Song"));
    }

    #[test]
    fn test_track_splits_id() {
        let track = track("KT1abc_42", "Song");
        assert_eq!(track.contract_address, "KT1abc");
        assert_eq!(track.token_id, "42");
    }
}
