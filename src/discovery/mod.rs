//! Music NFT discovery
//!
//! Turns a Tezos wallet into a list of playable tracks:
//! - `tzkt`: chain indexer client (balances and metadata)
//! - `fetcher`: sequential balance pagination with metadata fallback
//! - `classifier`: decides which tokens are music
//! - `extractor`: probe tables for title, artist, duration, artwork, audio
//! - `curated`: the curated audio index (PostgREST)
//! - `merger`: curated records override on-chain fields
//! - `service`: the pipeline tying it all together
//! - `demo`: a fixed offline catalog behind the same `TrackSource` seam
//!
//! # Architecture
//!
//! Each external API has its own module with:
//! - `client.rs` - HTTP client
//! - `dto.rs` - Data Transfer Objects (exact API response shapes)
//! - `adapter.rs` - Converts DTOs to domain models
//!
//! Domain models live in `domain.rs` and are API-agnostic.

pub mod classifier;
pub mod curated;
pub mod demo;
pub mod domain;
pub mod extractor;
pub mod fetcher;
pub mod merger;
pub mod service;
pub mod traits;
pub mod tzkt;

pub use classifier::Classifier;
pub use demo::DemoSource;
pub use domain::{
    ClassificationVerdict, DiscoveryError, MusicTrack, Provenance, RawToken, SecondaryIndexRecord,
    TokenKey, VerdictReason,
};
pub use extractor::FieldExtractor;
pub use service::DiscoveryService;
pub use traits::TrackSource;
