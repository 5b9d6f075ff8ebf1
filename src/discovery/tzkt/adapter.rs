//! Adapter layer: Convert TzKT DTOs to domain models
//!
//! This is the ONLY place where TzKT DTO types are converted to domain types.

use serde_json::Value;

use super::dto;
use crate::discovery::domain::RawToken;
use crate::metadata::TokenMetadata;

/// Convert one balance row to a raw token
pub fn to_raw_token(balance: dto::TokenBalance) -> RawToken {
    let token = balance.token;
    RawToken {
        owner_address: balance.account.address,
        contract_address: token.contract.address,
        contract_alias: token.contract.alias.filter(|a| !a.trim().is_empty()),
        token_id: token.token_id,
        standard: token.standard.unwrap_or_else(|| "fa2".to_string()),
        metadata: token.metadata.and_then(to_metadata),
    }
}

/// Convert a whole page, preserving order
pub fn to_raw_tokens(page: Vec<dto::TokenBalance>) -> Vec<RawToken> {
    page.into_iter().map(to_raw_token).collect()
}

/// Metadata from the fallback `/tokens?select=metadata` query.
///
/// With a single selected field TzKT returns bare values, but some
/// deployments wrap each row as `{"metadata": {...}}`; both are accepted.
pub fn metadata_from_select(rows: Vec<Value>) -> Option<TokenMetadata> {
    let first = rows.into_iter().next()?;
    match first {
        Value::Object(mut obj) if obj.len() == 1 && obj.contains_key("metadata") => {
            obj.remove("metadata").and_then(to_metadata)
        }
        other => to_metadata(other),
    }
}

/// Non-empty JSON objects only; `null`, scalars and `{}` count as missing
fn to_metadata(value: Value) -> Option<TokenMetadata> {
    TokenMetadata::from_value(value).filter(|m| !m.is_empty())
}
