//! Visible catalog state.
//!
//! ```text
//! IDLE ──wallet──▶ LOADING ──▶ LOADED
//!                     │   ▲
//!                     ▼   │ refresh / new wallet
//!                   ERROR ┘
//! ```
//!
//! Every scan gets a generation number when it enters `LOADING`. Results
//! from an older generation are dropped, so a superseded scan can never
//! overwrite what the current one shows.

use serde::Serialize;

use crate::discovery::MusicTrack;

/// Where the catalog is in its load cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadingState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

/// What a consumer sees
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub wallet: Option<String>,
    pub tracks: Vec<MusicTrack>,
    pub loading_state: LoadingState,
    pub error: Option<String>,
    pub retry_count: u32,
}

/// Snapshot plus the generation guard
#[derive(Debug, Default)]
pub struct CatalogState {
    snapshot: CatalogSnapshot,
    generation: u64,
}

impl CatalogState {
    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.snapshot
    }

    pub fn wallet(&self) -> Option<&str> {
        self.snapshot.wallet.as_deref()
    }

    pub fn loading_state(&self) -> LoadingState {
        self.snapshot.loading_state
    }

    /// Generation of the latest scan
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Enter `LOADING` for `wallet`, returning the new scan's generation.
    ///
    /// Tracks from the same wallet stay visible while it reloads.
    pub fn begin(&mut self, wallet: &str) -> u64 {
        self.generation += 1;
        if self.snapshot.wallet.as_deref() != Some(wallet) {
            self.snapshot.tracks.clear();
        }
        self.snapshot.wallet = Some(wallet.to_string());
        self.snapshot.loading_state = LoadingState::Loading;
        self.snapshot.error = None;
        self.snapshot.retry_count = 0;
        self.generation
    }

    /// Record a retry of the current scan
    pub fn retrying(&mut self, generation: u64, retry_count: u32) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.snapshot.retry_count = retry_count;
        true
    }

    /// `LOADING → LOADED`
    pub fn loaded(&mut self, generation: u64, tracks: Vec<MusicTrack>) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.snapshot.tracks = tracks;
        self.snapshot.loading_state = LoadingState::Loaded;
        self.snapshot.error = None;
        true
    }

    /// `LOADING → ERROR`
    pub fn failed(&mut self, generation: u64, message: String) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.snapshot.loading_state = LoadingState::Error;
        self.snapshot.error = Some(message);
        true
    }

    /// Back to `IDLE` with nothing shown; in-flight scans are orphaned
    pub fn reset(&mut self) {
        self.generation += 1;
        self.snapshot = CatalogSnapshot::default();
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation && self.snapshot.loading_state == LoadingState::Loading
    }
}
