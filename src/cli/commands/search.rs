//! Curated index search command.

use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use super::print_tracks;
use crate::discovery::TrackSource;

/// Search a wallet's curated tracks by title or artist
pub fn cmd_search(
    rt: &Runtime,
    source: Arc<dyn TrackSource>,
    wallet: &str,
    term: &str,
    json: bool,
) -> anyhow::Result<()> {
    let tracks = rt.block_on(source.search(wallet, term, &CancellationToken::new()))?;

    print_tracks(&tracks, json)?;
    if !json {
        println!("\n{} tracks match {:?}.", tracks.len(), term);
    }
    Ok(())
}
