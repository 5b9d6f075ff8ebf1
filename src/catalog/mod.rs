//! Wallet catalog - cached, retried, cancellable access to a wallet's tracks.
//!
//! [`WalletCatalog`] is what a player talks to. It follows one wallet at a
//! time and exposes its tracks as a [`CatalogSnapshot`]:
//!
//! - a fresh cache entry short-circuits straight to `LOADED`
//! - otherwise the discovery pipeline runs, retried with exponential backoff
//! - concurrent loads of the same wallet share one pipeline run
//! - switching wallets cancels the previous scan; its result is discarded
//!
//! # Example
//!
//! ```ignore
//! let catalog = WalletCatalog::new(Arc::new(service), CatalogSettings::default());
//! let snapshot = catalog.set_wallet(Some("tz1...")).await;
//! println!("{} tracks", snapshot.tracks.len());
//! ```

pub mod cache;
pub mod retry;
pub mod state;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::discovery::{DiscoveryError, MusicTrack, TokenKey, TrackSource};

pub use cache::{Clock, SystemClock, TrackCache};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use state::{CatalogSnapshot, CatalogState, LoadingState};

/// Cache and retry tuning
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSettings {
    /// How long a wallet's tracks stay fresh
    pub ttl: Duration,
    /// How often stale entries are swept
    pub sweep_interval: Duration,
    pub retry: RetryPolicy,
}

impl CatalogSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ttl: Duration::from_secs(config.cache.ttl_secs),
            sweep_interval: Duration::from_secs(config.cache.sweep_interval_secs),
            retry: RetryPolicy {
                max_retries: config.retry.max_retries,
                base_delay: Duration::from_millis(config.retry.base_delay_ms),
                multiplier: config.retry.multiplier,
            },
        }
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}

type ScanResult = Result<Vec<MusicTrack>, DiscoveryError>;

/// A pipeline run other callers can join.
///
/// The run has its own token. It is cancelled only once every caller
/// waiting on it has gone.
struct InFlight {
    id: u64,
    cancel: CancellationToken,
    waiters: usize,
    scan: Shared<BoxFuture<'static, ScanResult>>,
}

/// Cached, single-flight, cancellable wallet → tracks access
pub struct WalletCatalog {
    source: Arc<dyn TrackSource>,
    cache: Arc<TrackCache>,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    sweep_interval: Duration,
    sweeper_started: AtomicBool,
    state: Mutex<CatalogState>,
    snapshots: watch::Sender<CatalogSnapshot>,
    scan_cancel: Mutex<CancellationToken>,
    /// Generation of the visible scan started by `refresh`, if any
    refresh_generation: AtomicU64,
    in_flight: Mutex<HashMap<String, InFlight>>,
    next_flight_id: AtomicU64,
    shutdown: CancellationToken,
}

impl WalletCatalog {
    /// Catalog on the system clock and real timers
    pub fn new(source: Arc<dyn TrackSource>, settings: CatalogSettings) -> Self {
        Self::with_parts(
            source,
            Arc::new(TrackCache::with_ttl(settings.ttl)),
            settings.retry,
            Arc::new(TokioSleeper),
            settings.sweep_interval,
        )
    }

    /// Catalog with an explicit cache (and its clock) and sleeper
    pub fn with_parts(
        source: Arc<dyn TrackSource>,
        cache: Arc<TrackCache>,
        retry: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
        sweep_interval: Duration,
    ) -> Self {
        let shutdown = CancellationToken::new();
        Self {
            source,
            cache,
            retry,
            sleeper,
            sweep_interval,
            sweeper_started: AtomicBool::new(false),
            state: Mutex::new(CatalogState::default()),
            snapshots: watch::Sender::new(CatalogSnapshot::default()),
            scan_cancel: Mutex::new(shutdown.child_token()),
            refresh_generation: AtomicU64::new(0),
            in_flight: Mutex::new(HashMap::new()),
            next_flight_id: AtomicU64::new(0),
            shutdown,
        }
    }

    /// Current visible state
    pub fn snapshot(&self) -> CatalogSnapshot {
        self.state.lock().snapshot().clone()
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<CatalogSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn cache(&self) -> &Arc<TrackCache> {
        &self.cache
    }

    /// Follow a wallet, or stop following with `None`.
    ///
    /// Switching to a new wallet cancels any scan for the old one and loads
    /// the new one. Setting the wallet already followed changes nothing (use
    /// [`refresh`](Self::refresh) to reload); if it is still loading, this
    /// waits for that load. `None` returns to `IDLE` but keeps the cache.
    pub async fn set_wallet(&self, wallet: Option<&str>) -> CatalogSnapshot {
        self.ensure_sweeper();

        let Some(wallet) = wallet.map(str::trim).filter(|w| !w.is_empty()) else {
            self.cancel_scan();
            self.update(CatalogState::reset);
            tracing::debug!(target: "catalog", "Wallet cleared");
            return self.snapshot();
        };

        let started = {
            let mut state = self.state.lock();
            if state.wallet() == Some(wallet) {
                None
            } else {
                let generation = state.begin(wallet);
                self.snapshots.send_replace(state.snapshot().clone());
                Some((generation, self.replace_scan_token()))
            }
        };

        match started {
            Some((generation, cancel)) => {
                tracing::info!(target: "catalog", wallet, "Loading wallet");
                self.load_visible(wallet, generation, &cancel, false).await;
            }
            None => self.wait_until_settled(wallet).await,
        }

        self.snapshot()
    }

    /// Reload the current wallet now, ignoring the cache and any backoff.
    ///
    /// A refresh that arrives while another refresh of the same wallet is on
    /// its first attempt waits for that one instead of starting a new run.
    pub async fn refresh(&self) -> CatalogSnapshot {
        self.ensure_sweeper();

        let (wallet, started) = {
            let mut state = self.state.lock();
            let Some(wallet) = state.wallet().map(str::to_string) else {
                return state.snapshot().clone();
            };

            let refreshing = state.loading_state() == LoadingState::Loading
                && state.snapshot().retry_count == 0
                && self.refresh_generation.load(Ordering::SeqCst) == state.generation();
            if refreshing {
                (wallet, None)
            } else {
                self.cache.invalidate(&wallet);
                let generation = state.begin(&wallet);
                self.refresh_generation.store(generation, Ordering::SeqCst);
                self.snapshots.send_replace(state.snapshot().clone());
                (wallet, Some((generation, self.replace_scan_token())))
            }
        };

        match started {
            Some((generation, cancel)) => {
                tracing::info!(target: "catalog", wallet = %wallet, "Refreshing wallet");
                self.load_visible(&wallet, generation, &cancel, true).await;
            }
            None => {
                tracing::debug!(target: "catalog", wallet = %wallet, "Joining refresh in progress");
                self.wait_until_settled(&wallet).await;
            }
        }

        self.snapshot()
    }

    /// Tracks for `wallet` without touching the visible state.
    ///
    /// Goes through the same cache, single-flight map and retry policy as
    /// [`set_wallet`](Self::set_wallet).
    pub async fn load_wallet(&self, wallet: &str) -> ScanResult {
        self.ensure_sweeper();
        let cancel = self.shutdown.child_token();
        self.fetch_with_retry(wallet, &cancel, false, |_| {}).await
    }

    /// Curated tracks for explicit tokens
    pub async fn fetch_by_tokens(&self, keys: &[TokenKey]) -> ScanResult {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let cancel = self.shutdown.child_token();
        self.source.tracks_for_tokens(keys, &cancel).await
    }

    /// Search the followed wallet's curated tracks; empty when no wallet is set
    pub async fn search(&self, term: &str) -> ScanResult {
        let Some(wallet) = self.state.lock().wallet().map(str::to_string) else {
            return Ok(Vec::new());
        };
        let cancel = self.shutdown.child_token();
        self.source.search(&wallet, term, &cancel).await
    }

    /// Cancel every scan and background task
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Start the periodic cache sweep on first use; it stops on shutdown
    fn ensure_sweeper(&self) {
        if self.sweeper_started.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!(target: "catalog", interval = ?self.sweep_interval, "Starting cache sweeper");
        self.cache
            .spawn_sweeper(self.sweep_interval, self.shutdown.child_token());
    }

    /// Run a visible load to completion and publish the outcome
    async fn load_visible(
        &self,
        wallet: &str,
        generation: u64,
        cancel: &CancellationToken,
        fresh: bool,
    ) {
        let result = self
            .fetch_with_retry(wallet, cancel, fresh, |retry_count| {
                self.update(|state| state.retrying(generation, retry_count));
            })
            .await;

        match result {
            Ok(tracks) => {
                let count = tracks.len();
                if self.update(|state| state.loaded(generation, tracks)) {
                    tracing::info!(target: "catalog", wallet, tracks = count, "Wallet loaded");
                }
            }
            Err(DiscoveryError::Cancelled) => {
                tracing::debug!(target: "catalog", wallet, "Scan superseded");
            }
            Err(e) => {
                tracing::error!(target: "catalog", wallet, "Failed to load wallet: {}", e);
                self.update(|state| state.failed(generation, e.to_string()));
            }
        }
    }

    /// Cache, then single-flight pipeline run under the retry policy.
    ///
    /// With `fresh`, runs started before this call are not joined.
    async fn fetch_with_retry(
        &self,
        wallet: &str,
        cancel: &CancellationToken,
        fresh: bool,
        mut on_retry: impl FnMut(u32),
    ) -> ScanResult {
        if let Some(tracks) = self.cache.get_fresh(wallet) {
            tracing::debug!(target: "catalog", wallet, "Cache hit");
            return Ok(tracks);
        }

        let tracks = self
            .retry
            .run(
                self.sleeper.as_ref(),
                cancel,
                move || self.run_pipeline(wallet, cancel, fresh),
                |retry_count, _| on_retry(retry_count),
            )
            .await?;

        // A superseded scan must not reach the cache
        if cancel.is_cancelled() {
            return Err(DiscoveryError::Cancelled);
        }

        self.cache.insert(wallet, tracks.clone());
        Ok(tracks)
    }

    /// One pipeline run, shared with any concurrent caller for the same wallet.
    ///
    /// `cancel` only releases this caller; the run continues while anyone
    /// else still waits on it.
    async fn run_pipeline(
        &self,
        wallet: &str,
        cancel: &CancellationToken,
        fresh: bool,
    ) -> ScanResult {
        let (id, scan) = {
            let mut in_flight = self.in_flight.lock();
            match in_flight.get_mut(wallet) {
                Some(flight) if !fresh && !flight.cancel.is_cancelled() => {
                    tracing::debug!(target: "catalog", wallet, "Joining in-flight scan");
                    flight.waiters += 1;
                    (flight.id, flight.scan.clone())
                }
                _ => {
                    let id = self.next_flight_id.fetch_add(1, Ordering::Relaxed);
                    let flight_cancel = self.shutdown.child_token();
                    let source = Arc::clone(&self.source);
                    let owned_wallet = wallet.to_string();
                    let owned_cancel = flight_cancel.clone();
                    let scan = async move { source.discover(&owned_wallet, &owned_cancel).await }
                        .boxed()
                        .shared();
                    // a replaced run keeps going for the callers already on it
                    in_flight.insert(
                        wallet.to_string(),
                        InFlight {
                            id,
                            cancel: flight_cancel,
                            waiters: 1,
                            scan: scan.clone(),
                        },
                    );
                    (id, scan)
                }
            }
        };

        let _waiter = FlightWaiter {
            catalog: self,
            wallet,
            id,
        };

        tokio::select! {
            result = scan => {
                self.remove_flight(wallet, id);
                result
            }
            _ = cancel.cancelled() => Err(DiscoveryError::Cancelled),
        }
    }

    fn remove_flight(&self, wallet: &str, id: u64) {
        let mut in_flight = self.in_flight.lock();
        if in_flight.get(wallet).is_some_and(|flight| flight.id == id) {
            in_flight.remove(wallet);
        }
    }

    /// Wait until `wallet` is no longer loading (or no longer followed)
    async fn wait_until_settled(&self, wallet: &str) {
        let mut rx = self.snapshots.subscribe();
        let _ = rx
            .wait_for(|s| {
                s.loading_state != LoadingState::Loading || s.wallet.as_deref() != Some(wallet)
            })
            .await;
    }

    /// Apply a state change and publish the new snapshot
    fn update<R>(&self, change: impl FnOnce(&mut CatalogState) -> R) -> R {
        let mut state = self.state.lock();
        let out = change(&mut state);
        self.snapshots.send_replace(state.snapshot().clone());
        out
    }

    /// Cancel the current scan and hand out a token for the next one
    fn replace_scan_token(&self) -> CancellationToken {
        let mut current = self.scan_cancel.lock();
        current.cancel();
        *current = self.shutdown.child_token();
        current.clone()
    }

    fn cancel_scan(&self) {
        self.scan_cancel.lock().cancel();
    }
}

/// One caller's hold on an in-flight run; the last one out cancels it
struct FlightWaiter<'a> {
    catalog: &'a WalletCatalog,
    wallet: &'a str,
    id: u64,
}

impl Drop for FlightWaiter<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.catalog.in_flight.lock();
        let Some(flight) = in_flight.get_mut(self.wallet) else {
            return;
        };
        if flight.id != self.id {
            return;
        }
        flight.waiters -= 1;
        if flight.waiters == 0 {
            flight.cancel.cancel();
            in_flight.remove(self.wallet);
            tracing::debug!(target: "catalog", wallet = self.wallet, "Abandoned scan cancelled");
        }
    }
}

impl Drop for WalletCatalog {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
