//! TzKT HTTP client
//!
//! Handles communication with the TzKT Tezos indexer.
//! See: https://api.tzkt.io/
//!
//! Only two endpoints are used: paged FA2 balances for a wallet, and the
//! token listing as a metadata fallback.

use serde_json::Value;

use super::{adapter, dto};
use crate::discovery::domain::{DiscoveryError, RawToken};
use crate::metadata::TokenMetadata;

/// Public TzKT mainnet API
pub const DEFAULT_BASE_URL: &str = "https://api.tzkt.io/v1";

/// User agent string
const USER_AGENT: &str = concat!("TezosBeats/", env!("CARGO_PKG_VERSION"));

/// TzKT API client
pub struct TzktClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl TzktClient {
    /// Create a new client against the given API base
    pub fn new(base_url: impl Into<String>) -> Result<Self, DiscoveryError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DiscoveryError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one page of positive FA2 balances held by `account`
    pub async fn fetch_balances_page(
        &self,
        account: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<RawToken>, DiscoveryError> {
        let url = self.balances_url(account, offset, limit);
        let page: Vec<dto::TokenBalance> = self.get_json(&url).await?;
        Ok(adapter::to_raw_tokens(page))
    }

    /// Look up metadata for a single token; `None` when TzKT has none
    pub async fn fetch_token_metadata(
        &self,
        contract_address: &str,
        token_id: &str,
    ) -> Result<Option<TokenMetadata>, DiscoveryError> {
        let url = self.token_metadata_url(contract_address, token_id);
        let rows: Vec<Value> = self.get_json(&url).await?;
        Ok(adapter::metadata_from_select(rows))
    }

    fn balances_url(&self, account: &str, offset: usize, limit: usize) -> String {
        format!(
            "{}/tokens/balances?account={}&token.standard=fa2&balance.gt=0&offset={}&limit={}",
            self.base_url,
            urlencoding::encode(account),
            offset,
            limit
        )
    }

    fn token_metadata_url(&self, contract_address: &str, token_id: &str) -> String {
        format!(
            "{}/tokens?contract={}&tokenId={}&select=metadata",
            self.base_url,
            urlencoding::encode(contract_address),
            urlencoding::encode(token_id)
        )
    }

    /// Send a GET and decode the JSON body
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, DiscoveryError> {
        tracing::trace!(target: "discovery::tzkt", url, "GET");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| DiscoveryError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DiscoveryError::RateLimited);
        }

        if !status.is_success() {
            return Err(DiscoveryError::Http {
                service: "tzkt",
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DiscoveryError::Parse(e.to_string()))
    }
}
