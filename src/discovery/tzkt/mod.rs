//! TzKT chain indexer integration
//!
//! Lists the FA2 tokens a wallet holds and, when a balance row arrives
//! without metadata, looks the token's metadata up directly.
//!
//! API docs: https://api.tzkt.io/

pub mod dto;
mod adapter;
mod client;

pub use adapter::{metadata_from_select, to_raw_token};
pub use client::{DEFAULT_BASE_URL, TzktClient};
