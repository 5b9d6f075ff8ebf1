//! Adapter layer: Convert curated index DTOs to domain models

use super::dto;
use crate::discovery::domain::SecondaryIndexRecord;
use crate::discovery::extractor::duration::seconds_from_f64;

/// Convert one row to a record, dropping blank strings
pub fn to_record(row: dto::MusicNftRow) -> SecondaryIndexRecord {
    SecondaryIndexRecord {
        contract_address: row.contract_address.trim().to_string(),
        token_id: row.token_id.into_string(),
        title: non_blank(row.track_title),
        artist: non_blank(row.artist_name),
        audio_uri: non_blank(row.audio_ipfs_uri),
        thumbnail_uri: non_blank(row.thumbnail_ipfs_uri),
        duration_seconds: row.duration_seconds.and_then(seconds_from_f64),
        description: non_blank(row.description),
    }
}

/// Convert a page, preserving order
pub fn to_records(rows: Vec<dto::MusicNftRow>) -> Vec<SecondaryIndexRecord> {
    rows.into_iter().map(to_record).collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_record() {
        let row: dto::MusicNftRow = serde_json::from_value(json!({
            "contract_address": "KT1Beats",
            "token_id": 42,
            "track_title": " Night Drive ",
            "artist_name": "",
            "audio_ipfs_uri": "ipfs://QmAudio",
            "duration_seconds": 201.6
        }))
        .unwrap();

        let record = to_record(row);
        assert_eq!(record.contract_address, "KT1Beats");
        assert_eq!(record.token_id, "42");
        assert_eq!(record.title.as_deref(), Some("Night Drive"));
        assert_eq!(record.artist, None);
        assert_eq!(record.audio_uri.as_deref(), Some("ipfs://QmAudio"));
        assert_eq!(record.duration_seconds, Some(202));
    }

    #[test]
    fn test_zero_duration_is_unknown() {
        let row: dto::MusicNftRow = serde_json::from_value(json!({
            "contract_address": "KT1Beats",
            "token_id": "1",
            "duration_seconds": 0
        }))
        .unwrap();
        assert_eq!(to_record(row).duration_seconds, None);
    }
}
