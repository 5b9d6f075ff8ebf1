//! Offline demo catalog.
//!
//! A fixed set of five tracks served through [`TrackSource`], so the catalog
//! and CLI can be exercised without a network. Demo tracks have no audio.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::domain::{DiscoveryError, MusicTrack, Provenance, TokenKey};
use super::extractor::placeholder_cover;
use super::traits::TrackSource;

/// Contract every demo token lives on
pub const DEMO_CONTRACT: &str = "KT1RJ6PbjHpwc3M5rw5s2Nbmefwbuwbdxton";

struct DemoTrack {
    token_id: &'static str,
    title: &'static str,
    artist: &'static str,
    duration_seconds: u32,
    collection: &'static str,
    description: &'static str,
}

const DEMO_TRACKS: &[DemoTrack] = &[
    DemoTrack {
        token_id: "1",
        title: "Ethereal Waves",
        artist: "Digital Composer",
        duration_seconds: 245,
        collection: "Electronic Dreams",
        description: "An ambient electronic composition",
    },
    DemoTrack {
        token_id: "2",
        title: "Blockchain Symphony",
        artist: "CryptoBeats",
        duration_seconds: 198,
        collection: "Tech Anthems",
        description: "A orchestral piece inspired by technology",
    },
    DemoTrack {
        token_id: "3",
        title: "Tezos Rhythm",
        artist: "NFT Musician",
        duration_seconds: 167,
        collection: "Crypto Sounds",
        description: "Rhythmic beats from the blockchain",
    },
    DemoTrack {
        token_id: "4",
        title: "Digital Dreams",
        artist: "Synth Master",
        duration_seconds: 312,
        collection: "Synthwave Collection",
        description: "Synthwave track with retro vibes",
    },
    DemoTrack {
        token_id: "5",
        title: "Ambient Space",
        artist: "Cosmic Sound",
        duration_seconds: 423,
        collection: "Space Music",
        description: "Atmospheric sounds from outer space",
    },
];

impl DemoTrack {
    fn to_track(&self) -> MusicTrack {
        MusicTrack {
            id: TokenKey::new(DEMO_CONTRACT, self.token_id).to_string(),
            title: self.title.to_string(),
            artist: self.artist.to_string(),
            cover_url: placeholder_cover(self.title),
            duration_seconds: self.duration_seconds,
            collection_name: self.collection.to_string(),
            contract_address: DEMO_CONTRACT.to_string(),
            token_id: self.token_id.to_string(),
            audio_url: None,
            description: Some(self.description.to_string()),
            provenance: Provenance::OnChain,
        }
    }
}

/// Every demo track, in catalog order
pub fn demo_tracks() -> Vec<MusicTrack> {
    DEMO_TRACKS.iter().map(DemoTrack::to_track).collect()
}

/// [`TrackSource`] serving the demo catalog for any wallet
#[derive(Debug, Default, Clone, Copy)]
pub struct DemoSource;

#[async_trait]
impl TrackSource for DemoSource {
    async fn discover(
        &self,
        wallet: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<MusicTrack>, DiscoveryError> {
        if cancel.is_cancelled() {
            return Err(DiscoveryError::Cancelled);
        }
        tracing::info!(target: "discovery::demo", wallet, "Serving demo catalog");
        Ok(demo_tracks())
    }

    async fn tracks_for_tokens(
        &self,
        keys: &[TokenKey],
        _cancel: &CancellationToken,
    ) -> Result<Vec<MusicTrack>, DiscoveryError> {
        Ok(demo_tracks()
            .into_iter()
            .filter(|t| keys.contains(&TokenKey::new(&t.contract_address, &t.token_id)))
            .collect())
    }

    async fn search(
        &self,
        _wallet: &str,
        term: &str,
        _cancel: &CancellationToken,
    ) -> Result<Vec<MusicTrack>, DiscoveryError> {
        let term = term.trim().to_lowercase();
        Ok(demo_tracks()
            .into_iter()
            .filter(|t| {
                t.title.to_lowercase().contains(&term) || t.artist.to_lowercase().contains(&term)
            })
            .collect())
    }
}
