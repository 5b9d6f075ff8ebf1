//! Field extraction - turns one token's metadata into normalized track fields.
//!
//! Every field is resolved by walking an ordered table of probes; the first
//! probe returning `Some` wins, otherwise the field's default applies. The
//! tables are plain data (`&[(name, fn)]`) so their order can be read and
//! tested without tracing through nested conditionals.
//!
//! Extraction only ever runs on tokens the classifier accepted.

pub mod cover;
pub mod duration;

use crate::ipfs::IpfsResolver;
use crate::metadata::TokenMetadata;

use super::classifier::{ARTIFACT_FIELDS, is_audio_mime, is_audio_uri, is_image_mime, is_image_uri};
use super::domain::RawToken;

pub use cover::placeholder_cover;
pub use duration::{DEFAULT_DURATION_SECS, parse_duration, try_parse_duration};

/// Title used when every probe comes up empty
pub const DEFAULT_TITLE: &str = "Untitled Track";

/// Artist used when every probe comes up empty
pub const DEFAULT_ARTIST: &str = "Unknown Artist";

const TITLE_ATTRIBUTES: &[&str] = &["title", "track_name", "song_name", "name"];

const ARTIST_ATTRIBUTES: &[&str] = &[
    "artist", "creator", "author", "musician", "producer", "composer", "by", "made_by",
];

const ARTIST_ALTERNATE_FIELDS: &[&str] = &["created_by", "performer", "band", "singer"];

const DURATION_ATTRIBUTES: &[&str] = &["duration", "length", "time"];

const COLLECTION_FIELDS: &[&str] = &["collection", "album", "series"];

const COLLECTION_ATTRIBUTES: &[&str] = &["collection", "series", "album", "label", "release"];

/// Image fields in preference order. The flag says whether a URI without an
/// image extension is still trusted when it matches an image-hosting pattern;
/// artifacts are only used as covers when they are visibly images.
const COVER_FIELDS: &[(&str, bool)] = &[
    ("display_uri", true),
    ("displayUri", true),
    ("thumbnail_uri", true),
    ("thumbnailUri", true),
    ("image", true),
    ("artifact_uri", false),
    ("artifactUri", false),
];

/// Path fragments of content-addressed or image-hosting URIs
const IMAGE_HOST_PATTERNS: &[&str] = &[
    "ipfs://",
    "/ipfs/",
    "ar://",
    "arweave.net/",
    "imgur.com/",
    "cloudinary.com/",
    "imgix.net/",
    "/images/",
];

/// Everything a probe may look at
pub struct ProbeContext<'a> {
    pub token: &'a RawToken,
    pub metadata: &'a TokenMetadata,
}

/// A single extraction strategy
pub type Probe<T> = fn(&ProbeContext<'_>) -> Option<T>;

pub const TITLE_PROBES: &[(&str, Probe<String>)] = &[
    ("name", |cx| text(cx, "name")),
    ("title", |cx| text(cx, "title")),
    ("title-attribute", |cx| cx.metadata.attribute(TITLE_ATTRIBUTES)),
    ("description-head", |cx| {
        cx.metadata
            .text("description")
            .and_then(description_split)
            .map(|(head, _)| head)
    }),
];

pub const ARTIST_PROBES: &[(&str, Probe<String>)] = &[
    ("first-creator", |cx| cx.metadata.creators().into_iter().next()),
    ("artist", |cx| text(cx, "artist")),
    ("artist-attribute", |cx| cx.metadata.attribute(ARTIST_ATTRIBUTES)),
    ("description-tail", |cx| {
        cx.metadata
            .text("description")
            .and_then(description_split)
            .map(|(_, tail)| tail)
    }),
    ("alternate-field", |cx| {
        cx.metadata
            .first_text(ARTIST_ALTERNATE_FIELDS)
            .map(str::to_string)
    }),
];

pub const DURATION_PROBES: &[(&str, Probe<u32>)] = &[
    ("numeric-duration", |cx| {
        cx.metadata
            .get("duration")
            .and_then(serde_json::Value::as_f64)
            .and_then(duration::seconds_from_f64)
    }),
    ("string-duration", |cx| {
        cx.metadata.text("duration").and_then(try_parse_duration)
    }),
    ("format-duration", |cx| {
        cx.metadata
            .formats()
            .iter()
            .filter_map(|f| f.duration.as_ref())
            .find_map(duration::duration_from_value)
    }),
    ("duration-attribute", |cx| {
        cx.metadata
            .attribute(DURATION_ATTRIBUTES)
            .and_then(|v| try_parse_duration(&v))
    }),
];

pub const COLLECTION_PROBES: &[(&str, Probe<String>)] = &[
    ("contract-alias", |cx| {
        cx.token
            .contract_alias
            .as_deref()
            .map(str::trim)
            .filter(|alias| !alias.is_empty())
            .map(str::to_string)
    }),
    ("collection-field", |cx| {
        cx.metadata.first_text(COLLECTION_FIELDS).map(str::to_string)
    }),
    ("collection-attribute", |cx| {
        cx.metadata.attribute(COLLECTION_ATTRIBUTES)
    }),
];

/// Cover probes return the raw (unresolved) URI
pub const COVER_PROBES: &[(&str, Probe<String>)] = &[
    ("image-field", |cx| {
        COVER_FIELDS.iter().find_map(|(field, trust_host)| {
            cx.metadata
                .text(field)
                .filter(|uri| is_image_uri(uri) || (*trust_host && is_image_host(uri)))
                .map(str::to_string)
        })
    }),
    ("image-format", |cx| {
        cx.metadata
            .formats()
            .into_iter()
            .filter(|f| {
                f.mime_type.as_deref().is_some_and(is_image_mime)
                    || f.uri.as_deref().is_some_and(is_image_uri)
            })
            .find_map(|f| f.uri)
    }),
];

/// Audio probes return the raw (unresolved) URI
pub const AUDIO_PROBES: &[(&str, Probe<String>)] = &[
    ("audio-artifact", |cx| {
        let declared_audio = cx.metadata.text("mimeType").is_some_and(is_audio_mime);
        ARTIFACT_FIELDS
            .iter()
            .filter_map(|field| cx.metadata.text(field))
            .find(|uri| declared_audio || is_audio_uri(uri))
            .map(str::to_string)
    }),
    ("audio-format", |cx| first_audio_entry(cx.metadata.formats())),
    ("audio-field", |cx| text(cx, "audio")),
    ("audio-media", |cx| first_audio_entry(cx.metadata.media())),
];

/// Walk a probe table, returning the first hit
pub fn first_match<T>(probes: &[(&str, Probe<T>)], cx: &ProbeContext<'_>) -> Option<T> {
    probes.iter().find_map(|(_, probe)| probe(cx))
}

/// Name of the probe that would win (diagnostics and tests)
pub fn winning_probe<T>(probes: &[(&'static str, Probe<T>)], cx: &ProbeContext<'_>) -> Option<&'static str> {
    probes
        .iter()
        .find(|(_, probe)| probe(cx).is_some())
        .map(|(name, _)| *name)
}

/// Normalized fields for one token, URIs already resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFields {
    pub title: String,
    pub artist: String,
    pub duration_seconds: u32,
    pub collection_name: String,
    pub cover_url: String,
    pub audio_url: Option<String>,
    pub description: Option<String>,
}

/// Runs the probe tables and resolves URIs
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    resolver: IpfsResolver,
}

impl FieldExtractor {
    pub fn new(resolver: IpfsResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &IpfsResolver {
        &self.resolver
    }

    /// Extract all fields for a token
    pub fn extract(&self, token: &RawToken, metadata: &TokenMetadata) -> ExtractedFields {
        let cx = ProbeContext { token, metadata };

        let title = first_match(TITLE_PROBES, &cx).unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let artist = first_match(ARTIST_PROBES, &cx).unwrap_or_else(|| DEFAULT_ARTIST.to_string());
        let duration_seconds = first_match(DURATION_PROBES, &cx).unwrap_or(DEFAULT_DURATION_SECS);
        let collection_name = first_match(COLLECTION_PROBES, &cx)
            .unwrap_or_else(|| synthesized_collection_name(&token.contract_address));
        let cover_url = match first_match(COVER_PROBES, &cx) {
            Some(uri) => self.resolver.resolve(&uri),
            None => placeholder_cover(&title),
        };
        let audio_url = first_match(AUDIO_PROBES, &cx).map(|uri| self.resolver.resolve(&uri));

        ExtractedFields {
            title,
            artist,
            duration_seconds,
            collection_name,
            cover_url,
            audio_url,
            description: metadata.text("description").map(str::to_string),
        }
    }
}

/// `Collection KT1abcde…` for contracts with no better name
pub fn synthesized_collection_name(contract_address: &str) -> String {
    let prefix: String = contract_address.chars().take(8).collect();
    format!("Collection {}…", prefix)
}

fn text(cx: &ProbeContext<'_>, key: &str) -> Option<String> {
    cx.metadata.text(key).map(str::to_string)
}

/// Split a `"Title - Artist"` description on its first line's first dash.
/// Both halves must be non-empty.
fn description_split(description: &str) -> Option<(String, String)> {
    let first_line = description.lines().next()?;
    let (head, tail) = first_line.split_once('-')?;
    let (head, tail) = (head.trim(), tail.trim());
    if head.is_empty() || tail.is_empty() {
        return None;
    }
    Some((head.to_string(), tail.to_string()))
}

fn is_image_host(uri: &str) -> bool {
    let lower = uri.to_ascii_lowercase();
    IMAGE_HOST_PATTERNS.iter().any(|p| lower.contains(p))
}

fn first_audio_entry(entries: Vec<crate::metadata::MediaEntry>) -> Option<String> {
    entries
        .into_iter()
        .filter(|e| {
            e.mime_type.as_deref().is_some_and(is_audio_mime)
                || e.uri.as_deref().is_some_and(is_audio_uri)
        })
        .find_map(|e| e.uri)
}
