//! Token fetcher - lists every FA2 balance a wallet holds.
//!
//! Pages are requested strictly one after another. A page shorter than the
//! page size ends the scan; `max_pages` caps runaway wallets. Any page error
//! aborts the whole listing (the caller's retry layer decides what next).

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::domain::{DiscoveryError, RawToken};
use super::traits::ChainIndexerApi;
use crate::metadata::TokenMetadata;

/// Pagination limits for the chain indexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    /// Balances per page (TzKT maximum is 10000, default 1000)
    pub page_size: usize,
    /// Hard cap on pages per scan
    pub max_pages: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            page_size: 1000,
            max_pages: 10,
        }
    }
}

/// Lists balances and fills in missing metadata
#[derive(Clone)]
pub struct TokenFetcher {
    indexer: Arc<dyn ChainIndexerApi>,
    limits: FetchLimits,
}

impl TokenFetcher {
    pub fn new(indexer: Arc<dyn ChainIndexerApi>, limits: FetchLimits) -> Self {
        let limits = FetchLimits {
            page_size: limits.page_size.max(1),
            max_pages: limits.max_pages.max(1),
        };
        Self { indexer, limits }
    }

    /// Every positive FA2 balance held by `wallet`, in indexer order
    pub async fn fetch_all(
        &self,
        wallet: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<RawToken>, DiscoveryError> {
        let FetchLimits { page_size, max_pages } = self.limits;
        let mut tokens = Vec::new();

        for page_index in 0..max_pages {
            if cancel.is_cancelled() {
                return Err(DiscoveryError::Cancelled);
            }

            let offset = page_index * page_size;
            let page = self
                .indexer
                .fetch_balances_page(wallet, offset, page_size)
                .await?;
            let fetched = page.len();
            tokens.extend(page);

            tracing::debug!(
                target: "discovery::fetcher",
                wallet,
                offset,
                fetched,
                total = tokens.len(),
                "Fetched balances page"
            );

            if fetched < page_size {
                return Ok(tokens);
            }
        }

        tracing::warn!(
            target: "discovery::fetcher",
            wallet,
            limit = page_size * max_pages,
            "Reached token scan limit, remaining balances skipped"
        );
        Ok(tokens)
    }

    /// Metadata for a token: inline if present, else one fallback lookup.
    ///
    /// A failed lookup is logged and treated as missing metadata.
    pub async fn resolve_metadata(&self, token: &RawToken) -> Option<TokenMetadata> {
        if let Some(ref metadata) = token.metadata {
            return Some(metadata.clone());
        }

        match self
            .indexer
            .fetch_token_metadata(&token.contract_address, &token.token_id)
            .await
        {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(
                    target: "discovery::fetcher",
                    token = %token.key(),
                    "Metadata lookup failed: {}",
                    e
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::domain::TokenKey;
    use crate::discovery::traits::mocks::MockChainIndexer;
    use crate::test_utils::{metadata, raw_token, raw_token_with};
    use serde_json::json;

    fn tokens(n: usize) -> Vec<RawToken> {
        (0..n).map(|i| raw_token("KT1a", &i.to_string(), None)).collect()
    }

    fn fetcher(mock: Arc<MockChainIndexer>, page_size: usize, max_pages: usize) -> TokenFetcher {
        TokenFetcher::new(mock, FetchLimits { page_size, max_pages })
    }

    #[tokio::test]
    async fn test_stops_on_short_page() {
        let mock = Arc::new(MockChainIndexer::with_tokens(tokens(25)));
        let all = fetcher(mock.clone(), 10, 10)
            .fetch_all("tz1abc", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(all.len(), 25);
        assert_eq!(mock.page_calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_wallet_is_one_request() {
        let mock = Arc::new(MockChainIndexer::with_tokens(vec![]));
        let all = fetcher(mock.clone(), 10, 10)
            .fetch_all("tz1abc", &CancellationToken::new())
            .await
            .unwrap();
        assert!(all.is_empty());
        assert_eq!(mock.page_calls(), 1);
    }

    #[tokio::test]
    async fn test_page_cap() {
        let mock = Arc::new(MockChainIndexer::with_tokens(tokens(100)));
        let all = fetcher(mock.clone(), 10, 3)
            .fetch_all("tz1abc", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(all.len(), 30);
        assert_eq!(mock.page_calls(), 3);
    }

    #[tokio::test]
    async fn test_page_error_aborts() {
        let mock = Arc::new(
            MockChainIndexer::with_tokens(tokens(5))
                .failing(1, DiscoveryError::Http { service: "tzkt", status: 503 }),
        );
        let result = fetcher(mock, 10, 10)
            .fetch_all("tz1abc", &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(DiscoveryError::Http { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_cancelled_scan_makes_no_requests() {
        let mock = Arc::new(MockChainIndexer::with_tokens(tokens(5)));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = fetcher(mock.clone(), 10, 10).fetch_all("tz1abc", &cancel).await;
        assert_eq!(result, Err(DiscoveryError::Cancelled));
        assert_eq!(mock.page_calls(), 0);
    }

    #[tokio::test]
    async fn test_inline_metadata_skips_lookup() {
        let mock = Arc::new(MockChainIndexer::with_tokens(vec![]));
        let token = raw_token_with("KT1a", "1", json!({"name": "Inline"}));
        let meta = fetcher(mock.clone(), 10, 10).resolve_metadata(&token).await.unwrap();
        assert_eq!(meta.text("name"), Some("Inline"));
        assert_eq!(mock.metadata_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_metadata_uses_fallback() {
        let mock = Arc::new(
            MockChainIndexer::with_tokens(vec![])
                .with_metadata(TokenKey::new("KT1a", "1"), metadata(json!({"name": "Fetched"}))),
        );
        let token = raw_token("KT1a", "1", None);
        let meta = fetcher(mock.clone(), 10, 10).resolve_metadata(&token).await.unwrap();
        assert_eq!(meta.text("name"), Some("Fetched"));
        assert_eq!(mock.metadata_calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_fallback_is_missing() {
        let mut indexer = MockChainIndexer::with_tokens(vec![]);
        indexer.metadata_error = Some(DiscoveryError::Network("reset".into()));
        let mock = Arc::new(indexer);
        let token = raw_token("KT1a", "1", None);
        assert!(fetcher(mock, 10, 10).resolve_metadata(&token).await.is_none());
    }
}
