//! Curated token lookup command.

use std::sync::Arc;
use tokio::runtime::Runtime;

use super::print_tracks;
use crate::catalog::{CatalogSettings, WalletCatalog};
use crate::config::Config;
use crate::discovery::{TokenKey, TrackSource};
use crate::error::Error;

/// Fetch curated tracks for `CONTRACT:TOKEN_ID` arguments
pub fn cmd_tokens(
    rt: &Runtime,
    config: &Config,
    source: Arc<dyn TrackSource>,
    tokens: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let keys = parse_keys(tokens)?;

    let catalog = WalletCatalog::new(source, CatalogSettings::from_config(config));
    let tracks = rt.block_on(catalog.fetch_by_tokens(&keys))?;

    print_tracks(&tracks, json)?;
    if !json {
        println!("\n{} of {} tokens found in the curated index.", tracks.len(), keys.len());
    }
    Ok(())
}

fn parse_keys(tokens: &[String]) -> crate::error::Result<Vec<TokenKey>> {
    tokens
        .iter()
        .map(|t| {
            TokenKey::parse(t).ok_or_else(|| {
                Error::invalid_argument(format!("expected CONTRACT:TOKEN_ID, got {:?}", t))
            })
        })
        .collect()
}
