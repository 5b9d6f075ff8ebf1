//! Trait definitions for external API clients.
//!
//! These traits enable dependency injection and mocking for tests.
//! Production code uses the real client implementations, while tests
//! can substitute mock implementations.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::curated::IndexFilter;
use super::domain::{DiscoveryError, MusicTrack, RawToken, SecondaryIndexRecord, TokenKey};
use crate::metadata::TokenMetadata;

/// Trait for the chain indexer (token balances and metadata).
#[async_trait]
pub trait ChainIndexerApi: Send + Sync {
    /// One page of FA2 balances held by `account`.
    async fn fetch_balances_page(
        &self,
        account: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<RawToken>, DiscoveryError>;

    /// Metadata for a single token, if the indexer has any.
    async fn fetch_token_metadata(
        &self,
        contract_address: &str,
        token_id: &str,
    ) -> Result<Option<TokenMetadata>, DiscoveryError>;
}

/// Trait for the curated secondary index.
#[async_trait]
pub trait SecondaryIndexApi: Send + Sync {
    /// Rows `offset..offset + limit` matching `filter`.
    async fn query_page(
        &self,
        filter: &IndexFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<SecondaryIndexRecord>, DiscoveryError>;
}

/// Trait for anything that can produce tracks (the discovery pipeline).
///
/// The catalog layer depends on this seam rather than on the pipeline
/// itself, so caching and retry can be tested against a scripted source.
#[async_trait]
pub trait TrackSource: Send + Sync {
    /// Full scan of a wallet.
    async fn discover(
        &self,
        wallet: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<MusicTrack>, DiscoveryError>;

    /// Tracks for explicit tokens, from the curated index.
    async fn tracks_for_tokens(
        &self,
        keys: &[TokenKey],
        cancel: &CancellationToken,
    ) -> Result<Vec<MusicTrack>, DiscoveryError>;

    /// Title/artist search within a wallet's curated tracks.
    async fn search(
        &self,
        wallet: &str,
        term: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<MusicTrack>, DiscoveryError>;
}

// Implement traits for real clients

#[async_trait]
impl ChainIndexerApi for super::tzkt::TzktClient {
    async fn fetch_balances_page(
        &self,
        account: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<RawToken>, DiscoveryError> {
        self.fetch_balances_page(account, offset, limit).await
    }

    async fn fetch_token_metadata(
        &self,
        contract_address: &str,
        token_id: &str,
    ) -> Result<Option<TokenMetadata>, DiscoveryError> {
        self.fetch_token_metadata(contract_address, token_id).await
    }
}

#[async_trait]
impl SecondaryIndexApi for super::curated::CuratedIndexClient {
    async fn query_page(
        &self,
        filter: &IndexFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<SecondaryIndexRecord>, DiscoveryError> {
        self.query_page(filter, offset, limit).await
    }
}
