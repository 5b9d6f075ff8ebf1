//! Merging on-chain fields with curated index records.
//!
//! Pure functions, no I/O. When a curated record exists for a token, every
//! field it carries replaces the on-chain value; collection name and
//! description always stay on-chain.

use std::collections::HashMap;

use super::domain::{MusicTrack, Provenance, RawToken, SecondaryIndexRecord, TokenKey};
use super::extractor::{
    DEFAULT_ARTIST, DEFAULT_DURATION_SECS, DEFAULT_TITLE, ExtractedFields, placeholder_cover,
    synthesized_collection_name,
};
use crate::ipfs::IpfsResolver;

/// Build the final track for a classified token
pub fn merge(
    token: &RawToken,
    fields: ExtractedFields,
    index: &HashMap<TokenKey, SecondaryIndexRecord>,
    resolver: &IpfsResolver,
) -> MusicTrack {
    let key = token.key();
    let mut track = MusicTrack {
        id: key.to_string(),
        title: fields.title,
        artist: fields.artist,
        cover_url: fields.cover_url,
        duration_seconds: fields.duration_seconds,
        collection_name: fields.collection_name,
        contract_address: key.contract_address.clone(),
        token_id: key.token_id.clone(),
        audio_url: fields.audio_url,
        description: fields.description,
        provenance: Provenance::OnChain,
    };

    let Some(record) = index.get(&key) else {
        return track;
    };

    if let Some(ref title) = record.title {
        track.title = title.clone();
    }
    if let Some(ref artist) = record.artist {
        track.artist = artist.clone();
    }
    if let Some(duration) = record.duration_seconds {
        track.duration_seconds = duration;
    }
    if let Some(ref thumbnail) = record.thumbnail_uri {
        track.cover_url = resolver.resolve(thumbnail);
    }
    if let Some(ref audio) = record.audio_uri {
        track.audio_url = Some(resolver.resolve(audio));
    }
    track.provenance = Provenance::Merged;

    track
}

/// Build a track from a curated record alone (no on-chain metadata)
pub fn track_from_index_record(record: &SecondaryIndexRecord, resolver: &IpfsResolver) -> MusicTrack {
    let title = record.title.clone().unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let cover_url = match record.thumbnail_uri {
        Some(ref thumbnail) => resolver.resolve(thumbnail),
        None => placeholder_cover(&title),
    };

    MusicTrack {
        id: record.key().to_string(),
        artist: record.artist.clone().unwrap_or_else(|| DEFAULT_ARTIST.to_string()),
        cover_url,
        duration_seconds: record.duration_seconds.unwrap_or(DEFAULT_DURATION_SECS),
        collection_name: synthesized_collection_name(&record.contract_address),
        contract_address: record.contract_address.clone(),
        token_id: record.token_id.clone(),
        audio_url: record.audio_uri.as_deref().map(|uri| resolver.resolve(uri)),
        description: record.description.clone(),
        provenance: Provenance::SecondaryIndex,
        title,
    }
}

/// Index records keyed by token
pub fn index_by_key(records: Vec<SecondaryIndexRecord>) -> HashMap<TokenKey, SecondaryIndexRecord> {
    let mut map = HashMap::with_capacity(records.len());
    for record in records {
        // first record per token wins, matching index order
        map.entry(record.key()).or_insert(record);
    }
    map
}
