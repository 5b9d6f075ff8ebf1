//! Discovery service - orchestrates the wallet scan.
//!
//! This is the high-level API for turning a wallet into playable tracks:
//! 1. List every FA2 balance (sequential pages)
//! 2. Per token, in bounded concurrent batches: resolve metadata, classify,
//!    extract fields (non-music tokens stop after classification)
//! 3. Look the surviving tokens up in the curated index (non-fatal)
//! 4. Merge, deduplicate by track id

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use super::classifier::Classifier;
use super::curated::{CuratedIndexClient, IndexLimits, SecondaryIndex};
use super::domain::{
    ClassificationVerdict, DiscoveryError, MusicTrack, RawToken, SecondaryIndexRecord, TokenKey,
};
use super::extractor::{ExtractedFields, FieldExtractor};
use super::fetcher::{FetchLimits, TokenFetcher};
use super::merger;
use super::traits::{ChainIndexerApi, TrackSource};
use super::tzkt::TzktClient;
use crate::config::Config;
use crate::ipfs::IpfsResolver;
use crate::metadata::TokenMetadata;

/// Tuning for the per-token stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    /// Tokens processed concurrently per batch
    pub batch_width: usize,
    /// Pause between batches
    pub batch_pause: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            batch_width: 10,
            batch_pause: Duration::from_millis(100),
        }
    }
}

/// A token that passed classification, with its extracted fields
struct Candidate {
    token: RawToken,
    fields: ExtractedFields,
}

/// Service for discovering music tracks in a wallet
pub struct DiscoveryService {
    fetcher: TokenFetcher,
    index: Option<SecondaryIndex>,
    classifier: Classifier,
    extractor: FieldExtractor,
    settings: PipelineSettings,
}

impl DiscoveryService {
    pub fn new(
        fetcher: TokenFetcher,
        index: Option<SecondaryIndex>,
        classifier: Classifier,
        extractor: FieldExtractor,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            fetcher,
            index,
            classifier,
            extractor,
            settings: PipelineSettings {
                batch_width: settings.batch_width.max(1),
                ..settings
            },
        }
    }

    /// Build the service with real HTTP clients from configuration.
    ///
    /// The curated index is optional; without a base URL the pipeline runs
    /// on chain data alone.
    pub fn from_config(config: &Config) -> Result<Self, DiscoveryError> {
        let indexer: Arc<dyn ChainIndexerApi> = Arc::new(TzktClient::new(&config.indexer.base_url)?);
        let fetcher = TokenFetcher::new(
            indexer,
            FetchLimits {
                page_size: config.indexer.page_size,
                max_pages: config.indexer.max_pages,
            },
        );

        let index = match config.secondary_index.base_url {
            Some(ref base_url) => {
                let client = CuratedIndexClient::new(
                    base_url,
                    &config.secondary_index.table,
                    config.secondary_index.api_key.clone(),
                )?;
                Some(SecondaryIndex::new(
                    Arc::new(client),
                    IndexLimits {
                        page_size: config.secondary_index.page_size,
                        token_batch_size: config.secondary_index.token_batch_size,
                        search_limit: config.secondary_index.search_limit,
                        max_pages: config.secondary_index.max_pages,
                    },
                ))
            }
            None => {
                tracing::debug!(target: "discovery", "Curated index not configured");
                None
            }
        };

        Ok(Self::new(
            fetcher,
            index,
            Classifier::new(config.pipeline.weak_signal_threshold),
            FieldExtractor::new(IpfsResolver::new(&config.ipfs.gateway)),
            PipelineSettings {
                batch_width: config.pipeline.batch_width,
                batch_pause: Duration::from_millis(config.pipeline.batch_pause_ms),
            },
        ))
    }

    /// Whether a curated index is attached
    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    /// Scan a wallet and return its music tracks
    pub async fn discover(
        &self,
        wallet: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<MusicTrack>, DiscoveryError> {
        let tokens = self.fetcher.fetch_all(wallet, cancel).await?;
        tracing::info!(target: "discovery", wallet, tokens = tokens.len(), "Scanning tokens");

        let candidates = self.classify_all(&tokens, cancel).await?;
        tracing::info!(
            target: "discovery",
            wallet,
            music = candidates.len(),
            scanned = tokens.len(),
            "Classification complete"
        );

        let index = self.lookup_index(&candidates, cancel).await?;
        let resolver = self.extractor.resolver();

        let tracks = dedupe_by_id(
            candidates
                .into_iter()
                .map(|c| merger::merge(&c.token, c.fields, &index, resolver))
                .collect(),
        );

        tracing::info!(target: "discovery", wallet, tracks = tracks.len(), "Discovery complete");
        Ok(tracks)
    }

    /// Tracks for explicit tokens, built from curated index records
    pub async fn tracks_for_tokens(
        &self,
        keys: &[TokenKey],
        cancel: &CancellationToken,
    ) -> Result<Vec<MusicTrack>, DiscoveryError> {
        let index = self.index.as_ref().ok_or(DiscoveryError::NotConfigured("curated index"))?;
        let records = index.fetch_by_tokens(keys, cancel).await?;
        Ok(self.index_tracks(&records))
    }

    /// Title/artist search within a wallet's curated records
    pub async fn search(
        &self,
        wallet: &str,
        term: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<MusicTrack>, DiscoveryError> {
        let index = self.index.as_ref().ok_or(DiscoveryError::NotConfigured("curated index"))?;
        let records = index.search(wallet, term, cancel).await?;
        Ok(self.index_tracks(&records))
    }

    /// Classify and extract one token's metadata without any network access
    pub fn evaluate(
        &self,
        token: &RawToken,
        metadata: &TokenMetadata,
    ) -> (ClassificationVerdict, Option<MusicTrack>) {
        let verdict = self.classifier.classify(metadata);
        let track = verdict.is_music.then(|| {
            let fields = self.extractor.extract(token, metadata);
            merger::merge(token, fields, &HashMap::new(), self.extractor.resolver())
        });
        (verdict, track)
    }

    /// Run the per-token stage over all tokens in batches
    async fn classify_all(
        &self,
        tokens: &[RawToken],
        cancel: &CancellationToken,
    ) -> Result<Vec<Candidate>, DiscoveryError> {
        let mut candidates = Vec::new();
        let batches: Vec<&[RawToken]> = tokens.chunks(self.settings.batch_width).collect();

        for (i, batch) in batches.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(DiscoveryError::Cancelled);
            }

            let results = join_all(batch.iter().map(|token| self.process_token(token))).await;
            candidates.extend(results.into_iter().flatten());

            tracing::debug!(
                target: "discovery",
                batch = i + 1,
                of = batches.len(),
                found = candidates.len(),
                "Processed token batch"
            );

            if i + 1 < batches.len() && !self.settings.batch_pause.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.settings.batch_pause) => {}
                    _ = cancel.cancelled() => return Err(DiscoveryError::Cancelled),
                }
            }
        }

        Ok(candidates)
    }

    /// Metadata, classification and extraction for one token.
    ///
    /// Never fails: missing metadata and non-music tokens are `None`.
    async fn process_token(&self, token: &RawToken) -> Option<Candidate> {
        let Some(metadata) = self.fetcher.resolve_metadata(token).await else {
            tracing::trace!(target: "discovery", token = %token.key(), "No metadata");
            return None;
        };

        let verdict = self.classifier.classify(&metadata);
        if !verdict.is_music {
            return None;
        }

        let fields = self.extractor.extract(token, &metadata);
        tracing::debug!(
            target: "discovery",
            token = %token.key(),
            reason = ?verdict.reason,
            title = %fields.title,
            "Music token"
        );

        Some(Candidate {
            token: token.clone(),
            fields,
        })
    }

    /// Curated records for the candidates, keyed by token.
    ///
    /// Index failures are logged and treated as "no records"; only
    /// cancellation propagates.
    async fn lookup_index(
        &self,
        candidates: &[Candidate],
        cancel: &CancellationToken,
    ) -> Result<HashMap<TokenKey, SecondaryIndexRecord>, DiscoveryError> {
        let Some(ref index) = self.index else {
            return Ok(HashMap::new());
        };
        if candidates.is_empty() {
            return Ok(HashMap::new());
        }

        let keys: Vec<TokenKey> = candidates.iter().map(|c| c.token.key()).collect();
        match index.fetch_token_rows(&keys, cancel).await {
            Ok(records) => Ok(merger::index_by_key(records)),
            Err(DiscoveryError::Cancelled) => Err(DiscoveryError::Cancelled),
            Err(e) => {
                tracing::warn!(target: "discovery", "Curated index lookup failed, using on-chain data only: {}", e);
                Ok(HashMap::new())
            }
        }
    }

    fn index_tracks(&self, records: &[SecondaryIndexRecord]) -> Vec<MusicTrack> {
        let resolver = self.extractor.resolver();
        dedupe_by_id(
            records
                .iter()
                .map(|r| merger::track_from_index_record(r, resolver))
                .collect(),
        )
    }
}

#[async_trait]
impl TrackSource for DiscoveryService {
    async fn discover(
        &self,
        wallet: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<MusicTrack>, DiscoveryError> {
        self.discover(wallet, cancel).await
    }

    async fn tracks_for_tokens(
        &self,
        keys: &[TokenKey],
        cancel: &CancellationToken,
    ) -> Result<Vec<MusicTrack>, DiscoveryError> {
        self.tracks_for_tokens(keys, cancel).await
    }

    async fn search(
        &self,
        wallet: &str,
        term: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<MusicTrack>, DiscoveryError> {
        self.search(wallet, term, cancel).await
    }
}

/// Drop later tracks whose id was already seen
pub fn dedupe_by_id(tracks: Vec<MusicTrack>) -> Vec<MusicTrack> {
    let mut seen = HashSet::new();
    tracks
        .into_iter()
        .filter(|t| seen.insert(t.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::domain::{Provenance, VerdictReason};
    use crate::discovery::traits::mocks::{MockChainIndexer, MockSecondaryIndex};
    use crate::test_utils::{index_record, metadata, raw_token, raw_token_with};
    use serde_json::json;

    fn service(indexer: MockChainIndexer, index: Option<MockSecondaryIndex>) -> DiscoveryService {
        DiscoveryService::new(
            TokenFetcher::new(Arc::new(indexer), FetchLimits::default()),
            index.map(|mock| SecondaryIndex::new(Arc::new(mock), IndexLimits::default())),
            Classifier::default(),
            FieldExtractor::default(),
            PipelineSettings {
                batch_width: 2,
                batch_pause: Duration::ZERO,
            },
        )
    }

    fn three_tokens() -> Vec<RawToken> {
        vec![
            raw_token_with(
                "KT1Music",
                "1",
                json!({"name": "Waves", "artifact_uri": "ipfs://QmA/waves.mp3"}),
            ),
            raw_token_with(
                "KT1Music",
                "2",
                json!({
                    "name": "Tagged",
                    "tags": ["music"],
                    "attributes": [{"name": "genre", "value": "techno"}]
                }),
            ),
            raw_token_with(
                "KT1Art",
                "3",
                json!({"name": "Painting", "artifact_uri": "ipfs://QmP/art.png"}),
            ),
        ]
    }

    #[tokio::test]
    async fn test_end_to_end_three_tokens_two_tracks() {
        let svc = service(MockChainIndexer::with_tokens(three_tokens()), None);
        let tracks = svc.discover("tz1abc", &CancellationToken::new()).await.unwrap();

        let ids: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["KT1Music_1", "KT1Music_2"]);
        assert_eq!(tracks[0].audio_url.as_deref(), Some("https://ipfs.io/ipfs/QmA/waves.mp3"));
        assert!(tracks.iter().all(|t| t.provenance == Provenance::OnChain));
    }

    #[tokio::test]
    async fn test_index_record_overrides_on_chain_fields() {
        let index = MockSecondaryIndex::with_records(vec![index_record(
            "KT1Music", "1", "Curated Waves", "Curated Artist",
        )]);
        let svc = service(MockChainIndexer::with_tokens(three_tokens()), Some(index));
        let tracks = svc.discover("tz1abc", &CancellationToken::new()).await.unwrap();

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].title, "Curated Waves");
        assert_eq!(tracks[0].provenance, Provenance::Merged);
        assert_eq!(tracks[1].title, "Tagged");
        assert_eq!(tracks[1].provenance, Provenance::OnChain);
    }

    #[tokio::test]
    async fn test_same_release_editions_each_merge() {
        let tokens = vec![
            raw_token_with("KT1a", "1", json!({"name": "A", "artifact_uri": "ipfs://Qm/a1.mp3"})),
            raw_token_with("KT1a", "2", json!({"name": "A", "artifact_uri": "ipfs://Qm/a2.mp3"})),
        ];
        let index = MockSecondaryIndex::with_records(vec![
            index_record("KT1a", "1", "B", "Curated"),
            index_record("KT1a", "2", "B", "Curated"),
        ]);
        let svc = service(MockChainIndexer::with_tokens(tokens), Some(index));
        let tracks = svc.discover("tz1abc", &CancellationToken::new()).await.unwrap();

        assert_eq!(tracks.len(), 2);
        assert!(tracks.iter().all(|t| t.provenance == Provenance::Merged));
        assert!(tracks.iter().all(|t| t.title == "B"));
    }

    #[tokio::test]
    async fn test_index_failure_is_not_fatal() {
        let index = MockSecondaryIndex::with_error(DiscoveryError::Network("down".into()));
        let svc = service(MockChainIndexer::with_tokens(three_tokens()), Some(index));
        let tracks = svc.discover("tz1abc", &CancellationToken::new()).await.unwrap();
        assert_eq!(tracks.len(), 2);
    }

    #[tokio::test]
    async fn test_chain_failure_propagates() {
        let indexer = MockChainIndexer::with_tokens(three_tokens())
            .failing(1, DiscoveryError::Network("reset".into()));
        let svc = service(indexer, None);
        let result = svc.discover("tz1abc", &CancellationToken::new()).await;
        assert!(matches!(result, Err(DiscoveryError::Network(_))));
    }

    #[tokio::test]
    async fn test_missing_metadata_uses_fallback_then_skips() {
        let indexer = MockChainIndexer::with_tokens(vec![
            raw_token("KT1a", "1", None),
            raw_token("KT1a", "2", None),
        ])
        .with_metadata(
            TokenKey::new("KT1a", "1"),
            metadata(json!({"name": "Late", "mimeType": "audio/mpeg", "artifact_uri": "ipfs://QmLate"})),
        );
        let svc = service(indexer, None);
        let tracks = svc.discover("tz1abc", &CancellationToken::new()).await.unwrap();

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, "KT1a_1");
        assert_eq!(tracks[0].audio_url.as_deref(), Some("https://ipfs.io/ipfs/QmLate"));
    }

    #[tokio::test]
    async fn test_duplicate_balances_collapse() {
        let token = raw_token_with("KT1a", "1", json!({"artifact_uri": "ipfs://Qm/a.wav"}));
        let svc = service(MockChainIndexer::with_tokens(vec![token.clone(), token]), None);
        let tracks = svc.discover("tz1abc", &CancellationToken::new()).await.unwrap();
        assert_eq!(tracks.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_discover() {
        let svc = service(MockChainIndexer::with_tokens(three_tokens()), None);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(svc.discover("tz1abc", &cancel).await, Err(DiscoveryError::Cancelled));
    }

    #[tokio::test]
    async fn test_tracks_for_tokens_requires_index() {
        let svc = service(MockChainIndexer::default(), None);
        let result = svc
            .tracks_for_tokens(&[TokenKey::new("KT1a", "1")], &CancellationToken::new())
            .await;
        assert_eq!(result, Err(DiscoveryError::NotConfigured("curated index")));
    }

    #[tokio::test]
    async fn test_tracks_for_tokens_from_index() {
        let index = MockSecondaryIndex::with_records(vec![
            index_record("KT1a", "1", "One", "A"),
            index_record("KT1a", "2", "Two", "A"),
        ]);
        let svc = service(MockChainIndexer::default(), Some(index));
        let tracks = svc
            .tracks_for_tokens(&[TokenKey::new("KT1a", "2")], &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, "KT1a_2");
        assert_eq!(tracks[0].provenance, Provenance::SecondaryIndex);
    }

    #[tokio::test]
    async fn test_search() {
        let index = MockSecondaryIndex::with_records(vec![
            index_record("KT1a", "1", "Dub Echoes", "A"),
            index_record("KT1a", "2", "Ambient", "B"),
        ]);
        let svc = service(MockChainIndexer::default(), Some(index));
        let tracks = svc.search("tz1abc", "ECHO", &CancellationToken::new()).await.unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].title, "Dub Echoes");
    }

    #[test]
    fn test_evaluate_offline() {
        let svc = service(MockChainIndexer::default(), None);
        let token = raw_token("KT1a", "1", None);

        let (verdict, track) = svc.evaluate(&token, &metadata(json!({"artifactUri": "ipfs://Qm/x.flac"})));
        assert_eq!(verdict.reason, VerdictReason::AudioArtifact);
        assert_eq!(track.unwrap().id, "KT1a_1");

        let (verdict, track) = svc.evaluate(&token, &metadata(json!({"name": "Not music"})));
        assert!(!verdict.is_music);
        assert!(track.is_none());
    }

    #[test]
    fn test_from_config_without_index() {
        let svc = DiscoveryService::from_config(&Config::default()).unwrap();
        assert!(!svc.has_index());
    }
}
