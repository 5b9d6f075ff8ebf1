//! TzKT API Data Transfer Objects
//!
//! These types match what the TzKT `/tokens/balances` endpoint returns.
//! DO NOT use these types outside the tzkt module - convert to domain types.
//!
//! API Reference: https://api.tzkt.io/#operation/Tokens_GetTokenBalances

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of `/tokens/balances`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenBalance {
    /// Holder of the balance
    pub account: Account,
    /// The token held
    pub token: Token,
    /// Raw balance (string, arbitrary precision)
    #[serde(default)]
    pub balance: Option<String>,
}

/// Account reference
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Account {
    pub address: String,
}

/// Token description embedded in a balance row
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Contract the token lives in
    pub contract: Contract,
    /// Token id (decimal string)
    pub token_id: String,
    /// "fa2" or "fa1.2"
    #[serde(default)]
    pub standard: Option<String>,
    /// Resolved TZIP-21 metadata; missing when TzKT hasn't indexed it
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Contract reference
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Contract {
    pub address: String,
    /// Name TzKT knows the contract by, e.g. "hic et nunc NFTs"
    #[serde(default)]
    pub alias: Option<String>,
}
