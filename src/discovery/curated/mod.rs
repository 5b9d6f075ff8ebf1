//! Curated audio index integration
//!
//! An independently maintained table of known music NFTs, served over
//! PostgREST. Its rows carry hand-checked titles, artists and audio pointers,
//! and take precedence over what the extractor finds on chain.

pub mod dto;
mod adapter;
mod client;
mod index;

pub use adapter::to_record;
pub use client::{CuratedIndexClient, IndexFilter, sanitize};
pub use index::{IndexLimits, SecondaryIndex, dedupe_by_release};
