//! Offline metadata inspection command.

use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use super::format_track;
use crate::config::Config;
use crate::discovery::{ClassificationVerdict, DiscoveryService, MusicTrack, RawToken};
use crate::error::{Error, Result, ResultExt};
use crate::metadata::TokenMetadata;

#[derive(Serialize)]
struct Inspection {
    verdict: ClassificationVerdict,
    track: Option<MusicTrack>,
}

/// Classify and extract a metadata file as if it belonged to `contract:token_id`
pub fn cmd_inspect(
    config: &Config,
    path: &Path,
    contract: &str,
    token_id: &str,
    json: bool,
) -> anyhow::Result<()> {
    let metadata = read_metadata(path)?;
    let service = DiscoveryService::from_config(config)?;

    let token = RawToken {
        owner_address: String::new(),
        contract_address: contract.to_string(),
        contract_alias: None,
        token_id: token_id.to_string(),
        standard: "fa2".to_string(),
        metadata: Some(metadata.clone()),
    };
    let (verdict, track) = service.evaluate(&token, &metadata);

    if json {
        let report = Inspection { verdict, track };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Music: {} ({:?}, {} weak signals)",
        if verdict.is_music { "yes" } else { "no" },
        verdict.reason,
        verdict.weak_signals
    );
    if let Some(track) = track {
        println!("{}", format_track(&track));
        println!("  collection: {}", track.collection_name);
        println!("  audio:      {}", track.audio_url.as_deref().unwrap_or("-"));
        if !track.cover_url.starts_with("data:") {
            println!("  cover:      {}", track.cover_url);
        }
    }
    Ok(())
}

/// Read token metadata from a JSON file.
///
/// Accepts the bare metadata object or an indexer row wrapping it in `metadata`.
pub fn read_metadata(path: &Path) -> Result<TokenMetadata> {
    let raw = std::fs::read_to_string(path).with_context(format!("reading {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)?;

    let value = match value {
        Value::Object(mut map) if map.len() == 1 && map.get("metadata").is_some_and(Value::is_object) => {
            map.remove("metadata").unwrap_or_default()
        }
        other => other,
    };

    TokenMetadata::from_value(value)
        .ok_or_else(|| Error::invalid_metadata(path, "expected a JSON object"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("token.json");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_read_bare_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, r#"{"name": "Night Drive", "mimeType": "audio/mpeg"}"#);
        let metadata = read_metadata(&path).unwrap();
        assert_eq!(metadata.text("name"), Some("Night Drive"));
    }

    #[test]
    fn test_read_wrapped_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, r#"{"metadata": {"name": "Wrapped"}}"#);
        assert_eq!(read_metadata(&path).unwrap().text("name"), Some("Wrapped"));
    }

    #[test]
    fn test_read_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "[1, 2, 3]");
        let err = read_metadata(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidMetadata { .. }));
    }

    #[test]
    fn test_read_missing_file_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_metadata(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_read_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "{not json");
        assert!(matches!(read_metadata(&path).unwrap_err(), Error::Json(_)));
    }
}
