//! Curated index HTTP client
//!
//! Talks to the PostgREST API in front of the `music_nfts` table.
//! See: https://postgrest.org/en/stable/references/api.html
//!
//! Pagination uses the `Range` header; filters are rendered as PostgREST
//! query parameters by [`IndexFilter`].

use super::{adapter, dto};
use crate::discovery::domain::{DiscoveryError, SecondaryIndexRecord, TokenKey};

/// User agent string
const USER_AGENT: &str = concat!("TezosBeats/", env!("CARGO_PKG_VERSION"));

/// Characters that would break out of a PostgREST logic tree
const RESERVED: &[char] = &[',', '(', ')', '*', '"', '\\', '%'];

/// Which rows to ask the index for
#[derive(Debug, Clone, PartialEq)]
pub enum IndexFilter {
    /// Rows attributed to a wallet
    Owner(String),
    /// Rows for an explicit set of tokens
    Tokens(Vec<TokenKey>),
    /// A wallet's rows whose title or artist contains `term`
    Search { owner: String, term: String },
}

impl IndexFilter {
    /// PostgREST query parameters for this filter, unencoded.
    ///
    /// Every filter only returns rows with an audio pointer, newest first.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("select", "*".to_string())];

        match self {
            Self::Owner(owner) => {
                params.push(("artist_address", format!("eq.{}", owner)));
            }
            Self::Tokens(keys) => {
                let pairs: Vec<String> = keys
                    .iter()
                    .map(|k| {
                        format!(
                            "and(contract_address.eq.{},token_id.eq.{})",
                            sanitize(&k.contract_address),
                            sanitize(&k.token_id)
                        )
                    })
                    .collect();
                params.push(("or", format!("({})", pairs.join(","))));
            }
            Self::Search { owner, term } => {
                let term = sanitize(term);
                params.push(("artist_address", format!("eq.{}", owner)));
                params.push((
                    "or",
                    format!("(track_title.ilike.*{term}*,artist_name.ilike.*{term}*)"),
                ));
            }
        }

        params.push(("audio_ipfs_uri", "not.is.null".to_string()));
        params.push(("order", "id.desc".to_string()));
        params
    }
}

/// Strip characters that PostgREST treats as syntax inside `or=(...)`
pub fn sanitize(value: &str) -> String {
    value.trim().chars().filter(|c| !RESERVED.contains(c)).collect()
}

/// PostgREST client for the curated index
pub struct CuratedIndexClient {
    http_client: reqwest::Client,
    base_url: String,
    table: String,
    api_key: Option<String>,
}

impl CuratedIndexClient {
    /// Create a client for `<base_url>/<table>`.
    ///
    /// `base_url` is the PostgREST root, e.g. `https://<project>.supabase.co/rest/v1`.
    pub fn new(
        base_url: impl Into<String>,
        table: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, DiscoveryError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DiscoveryError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            table: table.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Fetch rows `offset..offset + limit` matching `filter`
    pub async fn query_page(
        &self,
        filter: &IndexFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<SecondaryIndexRecord>, DiscoveryError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let url = self.table_url(filter);
        tracing::trace!(target: "discovery::curated", url = %url, offset, limit, "GET");

        let mut request = self
            .http_client
            .get(&url)
            .header("Range-Unit", "items")
            .header("Range", range_header(offset, limit));

        if let Some(ref key) = self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DiscoveryError::Network(e.to_string()))?;

        let status = response.status();

        // Offset past the last row
        if status == reqwest::StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok(Vec::new());
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DiscoveryError::RateLimited);
        }

        if !status.is_success() {
            if let Ok(error) = response.json::<dto::ApiError>().await {
                return Err(DiscoveryError::ApiError(error.message));
            }
            return Err(DiscoveryError::Http {
                service: "curated index",
                status: status.as_u16(),
            });
        }

        let rows = response
            .json::<Vec<dto::MusicNftRow>>()
            .await
            .map_err(|e| DiscoveryError::Parse(e.to_string()))?;

        Ok(adapter::to_records(rows))
    }

    fn table_url(&self, filter: &IndexFilter) -> String {
        let query: Vec<String> = filter
            .query_params()
            .into_iter()
            .map(|(name, value)| format!("{}={}", name, urlencoding::encode(&value)))
            .collect();
        format!("{}/{}?{}", self.base_url, self.table, query.join("&"))
    }
}

/// Inclusive `Range` header value for a page
fn range_header(offset: usize, limit: usize) -> String {
    format!("{}-{}", offset, offset + limit.saturating_sub(1))
}
