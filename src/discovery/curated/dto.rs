//! Curated index Data Transfer Objects
//!
//! These types match the `music_nfts` rows served by the PostgREST API.
//! DO NOT use these types outside the curated module - convert to domain types.

use serde::{Deserialize, Serialize};

/// One row of `music_nfts`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MusicNftRow {
    /// Row id (used for ordering only)
    #[serde(default)]
    pub id: Option<i64>,
    pub contract_address: String,
    /// Stored as an integer, but older rows carry strings
    pub token_id: TokenIdRepr,
    #[serde(default)]
    pub track_title: Option<String>,
    #[serde(default)]
    pub artist_address: Option<String>,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub audio_ipfs_uri: Option<String>,
    #[serde(default)]
    pub thumbnail_ipfs_uri: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Seconds; some importers wrote fractional values
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Token id as either a JSON number or a string
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum TokenIdRepr {
    Number(u64),
    Text(String),
}

impl TokenIdRepr {
    pub fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }
}

/// PostgREST error body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}
