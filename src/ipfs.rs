//! IPFS URL resolution.
//!
//! Token metadata references media by content address (`ipfs://<cid>/...`),
//! which a player cannot fetch directly. Every URI handed to callers goes
//! through [`IpfsResolver::resolve`] to become a plain HTTP gateway URL.

/// Scheme prefix for content-addressed URIs
const IPFS_SCHEME: &str = "ipfs://";

/// Default public gateway
pub const DEFAULT_GATEWAY: &str = "https://ipfs.io";

/// Rewrites `ipfs://` URIs to a gateway URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpfsResolver {
    gateway: String,
}

impl IpfsResolver {
    /// Create a resolver for the given gateway base (e.g. `https://ipfs.io`).
    ///
    /// A trailing slash or `/ipfs` suffix on the base is tolerated.
    pub fn new(gateway: impl Into<String>) -> Self {
        let gateway = gateway.into();
        let trimmed = gateway.trim_end_matches('/');
        let trimmed = trimmed.strip_suffix("/ipfs").unwrap_or(trimmed);
        Self {
            gateway: trimmed.to_string(),
        }
    }

    /// Gateway base this resolver rewrites to
    pub fn gateway(&self) -> &str {
        &self.gateway
    }

    /// Resolve a URI to something fetchable over HTTP.
    ///
    /// Non-IPFS URIs are returned unchanged.
    pub fn resolve(&self, uri: &str) -> String {
        match uri.strip_prefix(IPFS_SCHEME) {
            Some(hash) => {
                // Some minters write ipfs://ipfs/<cid>
                let hash = hash.strip_prefix("ipfs/").unwrap_or(hash);
                format!("{}/ipfs/{}", self.gateway, hash)
            }
            None => uri.to_string(),
        }
    }
}

impl Default for IpfsResolver {
    fn default() -> Self {
        Self::new(DEFAULT_GATEWAY)
    }
}

/// Whether a URI uses the IPFS scheme
pub fn is_ipfs_uri(uri: &str) -> bool {
    uri.starts_with(IPFS_SCHEME)
}
