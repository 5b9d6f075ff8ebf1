//! Music classifier - decides whether a token is a playable music asset.
//!
//! Two tiers, evaluated in order:
//!
//! 1. **Audio artifact** (decisive): an audio file in the artifact URI, the
//!    `formats` list, or a top-level `mimeType`. Audio evidence wins over
//!    everything else.
//! 2. **Weak signals** (only without audio): music tags, genre/BPM-style
//!    fields or attributes, and a `type` mentioning music are counted; the
//!    token is music when the count reaches [`WEAK_SIGNAL_THRESHOLD`].
//!
//! Wallets hold thousands of heterogeneous tokens, and a lone "audio" tag is
//! far too common on non-music art to be trusted on its own.

use crate::metadata::TokenMetadata;

use super::domain::{ClassificationVerdict, VerdictReason};

/// Default number of weak signals needed without audio evidence
pub const WEAK_SIGNAL_THRESHOLD: u8 = 2;

/// File extensions treated as audio.
///
/// Includes the containers shared with video (.mp4, .webm, .3gp), which music
/// platforms use for AAC and Opus audio.
pub const AUDIO_EXTENSIONS: &[&str] = &[
    ".mp3", ".wav", ".wave", ".ogg", ".oga", ".m4a", ".aac", ".mp4", ".flac", ".wma", ".opus",
    ".aiff", ".webm", ".3gp",
];

/// File extensions treated as images
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".avif"];

/// Artifact URI spellings, TZIP-21 first
pub const ARTIFACT_FIELDS: &[&str] = &["artifact_uri", "artifactUri"];

/// Tags that count as a music signal
const MUSIC_TAGS: &[&str] = &["music", "audio", "song", "track"];

/// Explicit top-level fields that count as a music signal
const MUSIC_FIELDS: &[&str] = &["genre", "genres", "bpm", "tempo"];

/// Attribute names that count as a music signal
const MUSIC_ATTRIBUTES: &[&str] = &["genre", "bpm", "tempo", "key", "album", "artist"];

/// Heuristic music classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classifier {
    weak_signal_threshold: u8,
}

impl Classifier {
    pub fn new(weak_signal_threshold: u8) -> Self {
        Self {
            // A threshold of zero would accept every token
            weak_signal_threshold: weak_signal_threshold.max(1),
        }
    }

    pub fn weak_signal_threshold(&self) -> u8 {
        self.weak_signal_threshold
    }

    /// Classify a metadata blob
    pub fn classify(&self, metadata: &TokenMetadata) -> ClassificationVerdict {
        if has_audio_artifact(metadata) {
            return ClassificationVerdict {
                is_music: true,
                reason: VerdictReason::AudioArtifact,
                weak_signals: 0,
            };
        }

        let weak_signals = count_weak_signals(metadata);
        if weak_signals >= self.weak_signal_threshold {
            ClassificationVerdict {
                is_music: true,
                reason: VerdictReason::WeakSignalCount,
                weak_signals,
            }
        } else {
            ClassificationVerdict {
                is_music: false,
                reason: VerdictReason::Rejected,
                weak_signals,
            }
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(WEAK_SIGNAL_THRESHOLD)
    }
}

/// Primary check: is there a playable audio file anywhere we trust?
pub fn has_audio_artifact(metadata: &TokenMetadata) -> bool {
    let artifact_is_audio = ARTIFACT_FIELDS
        .iter()
        .filter_map(|field| metadata.text(field))
        .any(is_audio_uri);

    let format_is_audio = metadata.formats().iter().any(|format| {
        format.mime_type.as_deref().is_some_and(is_audio_mime)
            || format.uri.as_deref().is_some_and(is_audio_uri)
    });

    let mime_is_audio = metadata.text("mimeType").is_some_and(is_audio_mime);

    artifact_is_audio || format_is_audio || mime_is_audio
}

/// Secondary check: count independent weak indicators (0..=3)
pub fn count_weak_signals(metadata: &TokenMetadata) -> u8 {
    let has_music_tag = metadata
        .tags()
        .iter()
        .any(|tag| MUSIC_TAGS.iter().any(|t| tag.eq_ignore_ascii_case(t)));

    let has_music_field = MUSIC_FIELDS.iter().any(|f| metadata.has_value(f))
        || metadata.has_attribute(MUSIC_ATTRIBUTES);

    let has_music_type = metadata
        .text("type")
        .is_some_and(|t| t.to_lowercase().contains("music"));

    [has_music_tag, has_music_field, has_music_type]
        .into_iter()
        .filter(|signal| *signal)
        .count() as u8
}

/// Whether a MIME type is audio
pub fn is_audio_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("audio/")
}

/// Whether a MIME type is an image
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

/// Whether a URI's path ends in a known audio extension
pub fn is_audio_uri(uri: &str) -> bool {
    has_extension(uri, AUDIO_EXTENSIONS)
}

/// Whether a URI's path ends in a known image extension
pub fn is_image_uri(uri: &str) -> bool {
    has_extension(uri, IMAGE_EXTENSIONS)
}

/// Extension check on the path part only: query strings and fragments are ignored.
fn has_extension(uri: &str, extensions: &[&str]) -> bool {
    let path = uri.split(['?', '#']).next().unwrap_or(uri).to_ascii_lowercase();
    extensions.iter().any(|ext| path.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn classify(value: Value) -> ClassificationVerdict {
        Classifier::default().classify(&TokenMetadata::from_value(value).unwrap())
    }

    #[test]
    fn test_mp3_artifact_is_music() {
        let verdict = classify(json!({"artifact_uri": "ipfs://QmHash/track.mp3"}));
        assert!(verdict.is_music);
        assert_eq!(verdict.reason, VerdictReason::AudioArtifact);
    }

    #[test]
    fn test_camel_case_artifact_is_music() {
        let verdict = classify(json!({"artifactUri": "https://cdn.example/song.FLAC"}));
        assert_eq!(verdict.reason, VerdictReason::AudioArtifact);
    }

    #[test]
    fn test_audio_format_mime_is_music() {
        let verdict = classify(json!({
            "artifact_uri": "ipfs://QmNoExtension",
            "formats": [{"uri": "ipfs://QmNoExtension", "mimeType": "audio/mpeg"}]
        }));
        assert_eq!(verdict.reason, VerdictReason::AudioArtifact);
    }

    #[test]
    fn test_audio_format_extension_is_music() {
        let verdict = classify(json!({"formats": [{"uri": "ipfs://Qm/a.wav"}]}));
        assert!(verdict.is_music);
    }

    #[test]
    fn test_top_level_mime_is_music() {
        let verdict = classify(json!({"mimeType": "Audio/OGG"}));
        assert_eq!(verdict.reason, VerdictReason::AudioArtifact);
    }

    #[test]
    fn test_audio_evidence_ignores_other_fields() {
        let verdict = classify(json!({
            "artifact_uri": "ipfs://Qm/track.mp3",
            "type": "painting",
            "tags": ["art", "photography"]
        }));
        assert!(verdict.is_music);
    }

    #[test]
    fn test_shared_container_extensions_are_audio() {
        for uri in ["ipfs://Qm/track.mp4", "ipfs://Qm/track.webm", "ipfs://Qm/voice.3gp"] {
            let verdict = classify(json!({"artifact_uri": uri}));
            assert!(verdict.is_music, "{uri}");
            assert_eq!(verdict.reason, VerdictReason::AudioArtifact);
        }
    }

    #[test]
    fn test_query_string_does_not_hide_extension() {
        assert!(is_audio_uri("https://x/y.mp3?download=1"));
        assert!(!is_audio_uri("https://x/y.png?name=song.mp3x"));
        assert!(is_image_uri("https://x/cover.JPG#frag"));
    }

    #[test]
    fn test_two_weak_signals_is_music() {
        let verdict = classify(json!({
            "tags": ["Music"],
            "attributes": [{"name": "genre", "value": "house"}]
        }));
        assert!(verdict.is_music);
        assert_eq!(verdict.reason, VerdictReason::WeakSignalCount);
        assert_eq!(verdict.weak_signals, 2);
    }

    #[test]
    fn test_single_weak_signal_is_rejected() {
        let verdict = classify(json!({"tags": ["audio"], "name": "Podcast cover art"}));
        assert!(!verdict.is_music);
        assert_eq!(verdict.reason, VerdictReason::Rejected);
        assert_eq!(verdict.weak_signals, 1);
    }

    #[test]
    fn test_genre_and_type_is_music() {
        let verdict = classify(json!({"genre": "ambient", "type": "Music Release"}));
        assert!(verdict.is_music);
        assert_eq!(verdict.weak_signals, 2);
    }

    #[test]
    fn test_genres_array_counts() {
        assert_eq!(
            count_weak_signals(
                &TokenMetadata::from_value(json!({"genres": ["dub"], "tags": ["song"]})).unwrap()
            ),
            2
        );
        assert_eq!(
            count_weak_signals(&TokenMetadata::from_value(json!({"genres": []})).unwrap()),
            0
        );
    }

    #[test]
    fn test_field_and_attribute_are_one_signal() {
        // genre field + album attribute are the same indicator
        let verdict = classify(json!({
            "genre": "jazz",
            "attributes": [{"name": "album", "value": "Blue"}]
        }));
        assert!(!verdict.is_music);
        assert_eq!(verdict.weak_signals, 1);
    }

    #[test]
    fn test_all_three_signals() {
        let verdict = classify(json!({
            "tags": ["track"],
            "bpm": 120,
            "type": "music"
        }));
        assert_eq!(verdict.weak_signals, 3);
    }

    #[test]
    fn test_empty_metadata_is_rejected() {
        let verdict = classify(json!({}));
        assert!(!verdict.is_music);
        assert_eq!(verdict.weak_signals, 0);
    }

    #[test]
    fn test_threshold_is_tunable() {
        let strict = Classifier::new(3);
        let meta = TokenMetadata::from_value(json!({"tags": ["music"], "genre": "rock"})).unwrap();
        assert!(!strict.classify(&meta).is_music);

        let lenient = Classifier::new(1);
        let meta = TokenMetadata::from_value(json!({"tags": ["music"]})).unwrap();
        assert!(lenient.classify(&meta).is_music);

        assert_eq!(Classifier::new(0).weak_signal_threshold(), 1);
    }
}
