//! Wallet scan command.

use std::sync::Arc;
use tokio::runtime::Runtime;

use super::print_tracks;
use crate::catalog::{CatalogSettings, LoadingState, WalletCatalog};
use crate::config::Config;
use crate::discovery::TrackSource;

/// Discover a wallet's tracks through the cached, retrying catalog
pub fn cmd_scan(
    rt: &Runtime,
    config: &Config,
    source: Arc<dyn TrackSource>,
    wallet: &str,
    json: bool,
) -> anyhow::Result<()> {
    let catalog = WalletCatalog::new(source, CatalogSettings::from_config(config));
    let snapshot = rt.block_on(async {
        tokio::select! {
            snapshot = catalog.set_wallet(Some(wallet)) => Ok(snapshot),
            _ = tokio::signal::ctrl_c() => {
                catalog.shutdown();
                Err(anyhow::anyhow!("Scan of {} interrupted", wallet))
            }
        }
    })?;

    if snapshot.loading_state == LoadingState::Error {
        anyhow::bail!(
            "Scan of {} failed after {} retries: {}",
            wallet,
            snapshot.retry_count,
            snapshot.error.unwrap_or_default()
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("Scanning wallet: {}", wallet);
    print_tracks(&snapshot.tracks, false)?;
    println!("\nScan complete. {} tracks found.", snapshot.tracks.len());
    Ok(())
}
