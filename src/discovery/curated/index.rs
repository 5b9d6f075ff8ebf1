//! Paged, deduplicated access to the curated index.
//!
//! [`SecondaryIndex`] sits on top of any [`SecondaryIndexApi`] and turns the
//! page-level API into the three lookups the pipeline needs: by wallet, by
//! token batch and by search term. Results are deduplicated by release;
//! [`SecondaryIndex::fetch_token_rows`] keeps every row so each owned edition
//! can be joined to its own record.

use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::client::{IndexFilter, sanitize};
use crate::discovery::domain::{DiscoveryError, SecondaryIndexRecord, TokenKey};
use crate::discovery::extractor::{DEFAULT_ARTIST, DEFAULT_TITLE};
use crate::discovery::traits::SecondaryIndexApi;

/// Paging limits for the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexLimits {
    /// Rows per page (the store's max row limit)
    pub page_size: usize,
    /// Token pairs per disjunctive query
    pub token_batch_size: usize,
    /// Max rows returned by a search
    pub search_limit: usize,
    /// Max pages fetched for one filter
    pub max_pages: usize,
}

impl Default for IndexLimits {
    fn default() -> Self {
        Self {
            page_size: 1000,
            token_batch_size: 50,
            search_limit: 500,
            max_pages: 10,
        }
    }
}

/// Curated index lookups
#[derive(Clone)]
pub struct SecondaryIndex {
    api: Arc<dyn SecondaryIndexApi>,
    limits: IndexLimits,
}

impl SecondaryIndex {
    pub fn new(api: Arc<dyn SecondaryIndexApi>, limits: IndexLimits) -> Self {
        let limits = IndexLimits {
            page_size: limits.page_size.max(1),
            token_batch_size: limits.token_batch_size.max(1),
            search_limit: limits.search_limit,
            max_pages: limits.max_pages.max(1),
        };
        Self { api, limits }
    }

    pub fn limits(&self) -> IndexLimits {
        self.limits
    }

    /// All index rows attributed to `wallet`, deduplicated by release
    pub async fn fetch_by_wallet(
        &self,
        wallet: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SecondaryIndexRecord>, DiscoveryError> {
        let records = self.fetch_all(&IndexFilter::Owner(wallet.to_string()), cancel).await?;
        let unique = dedupe_by_release(records);
        tracing::debug!(target: "discovery::curated", wallet, count = unique.len(), "Index rows for wallet");
        Ok(unique)
    }

    /// Index rows for the given tokens, deduplicated by release
    pub async fn fetch_by_tokens(
        &self,
        keys: &[TokenKey],
        cancel: &CancellationToken,
    ) -> Result<Vec<SecondaryIndexRecord>, DiscoveryError> {
        let records = self.fetch_token_rows(keys, cancel).await?;
        Ok(dedupe_by_release(records))
    }

    /// Every index row for the given tokens, queried in chunks.
    ///
    /// A failed chunk is logged and skipped; the error is returned only when
    /// every chunk failed.
    pub async fn fetch_token_rows(
        &self,
        keys: &[TokenKey],
        cancel: &CancellationToken,
    ) -> Result<Vec<SecondaryIndexRecord>, DiscoveryError> {
        let mut records = Vec::new();
        let mut last_error = None;
        let mut succeeded = 0;

        for chunk in keys.chunks(self.limits.token_batch_size) {
            let filter = IndexFilter::Tokens(chunk.to_vec());
            match self.fetch_all(&filter, cancel).await {
                Ok(rows) => {
                    succeeded += 1;
                    records.extend(rows);
                }
                Err(DiscoveryError::Cancelled) => return Err(DiscoveryError::Cancelled),
                Err(e) => {
                    tracing::warn!(
                        target: "discovery::curated",
                        chunk = chunk.len(),
                        error = %e,
                        "Index token batch failed, skipping"
                    );
                    last_error = Some(e);
                }
            }
        }

        if succeeded == 0
            && let Some(e) = last_error
        {
            return Err(e);
        }

        tracing::debug!(
            target: "discovery::curated",
            requested = keys.len(),
            found = records.len(),
            "Index rows for tokens"
        );
        Ok(records)
    }

    /// Case-insensitive title/artist search within a wallet's rows.
    ///
    /// A term that is blank once filter syntax is stripped is the same as
    /// [`fetch_by_wallet`](Self::fetch_by_wallet).
    pub async fn search(
        &self,
        wallet: &str,
        term: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SecondaryIndexRecord>, DiscoveryError> {
        if sanitize(term).is_empty() {
            return self.fetch_by_wallet(wallet, cancel).await;
        }

        if cancel.is_cancelled() {
            return Err(DiscoveryError::Cancelled);
        }

        let filter = IndexFilter::Search {
            owner: wallet.to_string(),
            term: term.to_string(),
        };
        let records = self.api.query_page(&filter, 0, self.limits.search_limit).await?;
        Ok(dedupe_by_release(records))
    }

    /// Page through every row matching `filter` until a short page or the page cap
    async fn fetch_all(
        &self,
        filter: &IndexFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<SecondaryIndexRecord>, DiscoveryError> {
        let IndexLimits { page_size, max_pages, .. } = self.limits;
        let mut records = Vec::new();

        for page_index in 0..max_pages {
            if cancel.is_cancelled() {
                return Err(DiscoveryError::Cancelled);
            }

            let page = self
                .api
                .query_page(filter, page_index * page_size, page_size)
                .await?;
            let fetched = page.len();
            records.extend(page);

            if fetched < page_size {
                return Ok(records);
            }
        }

        tracing::warn!(
            target: "discovery::curated",
            limit = page_size * max_pages,
            "Reached index row limit, remaining rows skipped"
        );
        Ok(records)
    }
}

/// Keep the first record per lowercased `(title, artist)`.
///
/// Missing titles and artists are compared as their display defaults, so two
/// untitled rows by the same unknown artist collapse too.
pub fn dedupe_by_release(records: Vec<SecondaryIndexRecord>) -> Vec<SecondaryIndexRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(release_key(record)))
        .collect()
}

fn release_key(record: &SecondaryIndexRecord) -> String {
    let title = record.title.as_deref().unwrap_or(DEFAULT_TITLE);
    let artist = record.artist.as_deref().unwrap_or(DEFAULT_ARTIST);
    format!("{}|{}", title.to_lowercase(), artist.to_lowercase())
}
