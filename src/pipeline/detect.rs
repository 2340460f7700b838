// src/pipeline/detect.rs

//! Fingerprint-based change detection.
//!
//! Each source keeps the fingerprint of the last document it saw. The first
//! observation only records a baseline, so a restart never triggers a burst
//! of notifications. Fetches run without holding the source lock; the lock
//! is taken only to compare and store the fingerprint.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{JobCategory, JobRecord, SourceConfig};
use crate::services::{DocumentFetcher, FetchedDocument, TableParser};

/// Last known version of a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceState {
    pub source_id: String,
    pub last_fingerprint: Option<String>,
    pub last_checked: Option<DateTime<Utc>>,
    /// Sequence number of the fetch that produced `last_fingerprint`
    #[serde(skip)]
    applied_seq: u64,
}

impl SourceState {
    fn new(source_id: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            last_fingerprint: None,
            last_checked: None,
            applied_seq: 0,
        }
    }
}

/// Outcome of checking one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeResult {
    pub source_id: String,
    /// The fingerprint differs from the previous one
    pub changed: bool,
    /// This check recorded the first fingerprint for the source
    pub baseline: bool,
    pub fingerprint: String,
    /// Parsed records, present when changed or forced
    pub records: Option<Vec<JobRecord>>,
    /// Rows the parser could not extract
    pub dropped_rows: usize,
    /// Categories mentioned in the document, present when parsed
    pub categories: Vec<JobCategory>,
}

struct SourceSlot {
    config: SourceConfig,
    next_seq: AtomicU64,
    state: Mutex<SourceState>,
}

/// Tracks fingerprints for every configured source.
pub struct ChangeDetector {
    order: Vec<String>,
    sources: HashMap<String, Arc<SourceSlot>>,
    fetcher: Arc<dyn DocumentFetcher>,
    parser: Arc<TableParser>,
}

impl ChangeDetector {
    pub fn new(
        sources: &[SourceConfig],
        fetcher: Arc<dyn DocumentFetcher>,
        parser: Arc<TableParser>,
    ) -> Self {
        let slots = sources
            .iter()
            .map(|config| {
                let slot = SourceSlot {
                    config: config.clone(),
                    next_seq: AtomicU64::new(0),
                    state: Mutex::new(SourceState::new(&config.id)),
                };
                (config.id.clone(), Arc::new(slot))
            })
            .collect();

        Self {
            order: sources.iter().map(|s| s.id.clone()).collect(),
            sources: slots,
            fetcher,
            parser,
        }
    }

    /// Source ids in configuration order.
    pub fn source_ids(&self) -> &[String] {
        &self.order
    }

    pub fn source(&self, source_id: &str) -> Option<&SourceConfig> {
        self.sources.get(source_id).map(|slot| &slot.config)
    }

    fn slot(&self, source_id: &str) -> Result<Arc<SourceSlot>> {
        self.sources
            .get(source_id)
            .cloned()
            .ok_or_else(|| AppError::UnknownSource(source_id.to_string()))
    }

    /// Snapshot of a source's state.
    pub async fn state(&self, source_id: &str) -> Result<SourceState> {
        Ok(self.slot(source_id)?.state.lock().await.clone())
    }

    /// Fetch a source without touching its state.
    pub async fn fetch(&self, source_id: &str) -> Result<FetchedDocument> {
        let slot = self.slot(source_id)?;
        self.fetcher
            .fetch(&slot.config)
            .await
            .map_err(|e| AppError::fetch(source_id, e))
    }

    /// Fetch a source and compare against the stored fingerprint.
    ///
    /// `forced` parses the document even when nothing changed. The stored
    /// fingerprint is updated either way, and left untouched when the fetch
    /// fails.
    pub async fn check(&self, source_id: &str, forced: bool) -> Result<ChangeResult> {
        let slot = self.slot(source_id)?;
        let seq = slot.next_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let document = self.fetcher.fetch(&slot.config).await.map_err(|e| {
            log::warn!("Fetching {} failed: {}", source_id, e);
            AppError::fetch(source_id, e)
        })?;

        let (changed, baseline) = {
            let mut state = slot.state.lock().await;
            state.last_checked = Some(Utc::now());

            if seq < state.applied_seq {
                // A later fetch already stored its fingerprint.
                log::debug!(
                    "Discarding stale fetch #{} of {} (state at #{})",
                    seq,
                    source_id,
                    state.applied_seq
                );
                (false, false)
            } else {
                state.applied_seq = seq;
                match state.last_fingerprint.replace(document.fingerprint.clone()) {
                    None => {
                        log::info!("Baseline for {}: {}", source_id, document.fingerprint);
                        (false, true)
                    }
                    Some(previous) => (previous != document.fingerprint, false),
                }
            }
        };

        let mut result = ChangeResult {
            source_id: source_id.to_string(),
            changed,
            baseline,
            fingerprint: document.fingerprint,
            records: None,
            dropped_rows: 0,
            categories: Vec::new(),
        };

        if changed || forced {
            let outcome = self.parser.parse_with_stats(&document.content);
            if changed {
                log::info!(
                    "{} changed: {} record(s), {} dropped row(s)",
                    source_id,
                    outcome.records.len(),
                    outcome.dropped_rows
                );
            }
            result.categories = JobCategory::detect_in(&document.content);
            result.dropped_rows = outcome.dropped_rows;
            result.records = Some(outcome.records);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::models::{ParserConfig, SourceLocation};
    use crate::services::fetcher::testing::ScriptedFetcher;

    const DOC_V1: &str = "\
| Company | Role | Location | Link | Date |
|---|---|---|---|---|
| Acme | SWE Intern | NYC | <a href=\"https://acme.example\">Apply</a> | Dec 26 |";

    const DOC_V2: &str = "\
| Company | Role | Location | Link | Date |
|---|---|---|---|---|
| Acme | SWE Intern | NYC | <a href=\"https://acme.example\">Apply</a> | Dec 26 |
| Globex | Finance Intern | Chicago | <a href=\"https://globex.example\">Apply</a> | Dec 27 |";

    fn detector(fetcher: Arc<ScriptedFetcher>) -> ChangeDetector {
        let sources = vec![SourceConfig {
            id: "summer".to_string(),
            location: SourceLocation::Url {
                url: "https://example.com/README.md".to_string(),
            },
        }];
        let parser = Arc::new(TableParser::new(&ParserConfig::default()).unwrap());
        ChangeDetector::new(&sources, fetcher, parser)
    }

    #[tokio::test]
    async fn test_first_observation_is_baseline() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("summer", "f1", DOC_V1);
        let detector = detector(fetcher);

        let result = detector.check("summer", false).await.unwrap();
        assert!(!result.changed);
        assert!(result.baseline);
        assert_eq!(result.records, None);
        assert_eq!(
            detector.state("summer").await.unwrap().last_fingerprint.as_deref(),
            Some("f1")
        );
    }

    #[tokio::test]
    async fn test_forced_first_observation_parses_but_is_not_a_change() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("summer", "f1", DOC_V1);
        let detector = detector(fetcher);

        let result = detector.check("summer", true).await.unwrap();
        assert!(!result.changed);
        assert_eq!(result.records.map(|r| r.len()), Some(1));
        assert_eq!(
            detector.state("summer").await.unwrap().last_fingerprint.as_deref(),
            Some("f1")
        );
    }

    #[tokio::test]
    async fn test_change_parses_and_detects_categories() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("summer", "f1", DOC_V1);
        fetcher.respond("summer", "f1", DOC_V1);
        fetcher.respond("summer", "f2", DOC_V2);
        let detector = detector(fetcher);

        detector.check("summer", false).await.unwrap();

        let unchanged = detector.check("summer", false).await.unwrap();
        assert!(!unchanged.changed);
        assert_eq!(unchanged.records, None);

        let changed = detector.check("summer", false).await.unwrap();
        assert!(changed.changed);
        assert_eq!(changed.fingerprint, "f2");
        assert_eq!(changed.records.as_ref().map(Vec::len), Some(2));
        assert_eq!(
            changed.categories,
            vec![JobCategory::Swe, JobCategory::Finance]
        );
    }

    #[tokio::test]
    async fn test_fingerprint_tracks_last_success_and_survives_errors() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("summer", "f1", DOC_V1);
        fetcher.respond("summer", "f2", DOC_V1);
        fetcher.fail("summer", FetchError::RateLimited { retry_after_secs: None });
        fetcher.respond("summer", "f3", DOC_V1);
        let detector = detector(fetcher);

        detector.check("summer", false).await.unwrap();
        detector.check("summer", false).await.unwrap();

        let err = detector.check("summer", false).await.unwrap_err();
        assert!(matches!(
            err.as_fetch_error(),
            Some(FetchError::RateLimited { .. })
        ));
        assert_eq!(
            detector.state("summer").await.unwrap().last_fingerprint.as_deref(),
            Some("f2")
        );

        let result = detector.check("summer", false).await.unwrap();
        assert!(result.changed);
        assert_eq!(
            detector.state("summer").await.unwrap().last_fingerprint.as_deref(),
            Some("f3")
        );
    }

    #[tokio::test]
    async fn test_slow_older_fetch_does_not_regress_fingerprint() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("summer", "f1", DOC_V1);
        let release_slow = fetcher.respond_when_released("summer", "f-old", DOC_V1);
        fetcher.respond("summer", "f-new", DOC_V2);
        let detector = Arc::new(detector(fetcher));

        detector.check("summer", false).await.unwrap();

        let slow = {
            let detector = Arc::clone(&detector);
            tokio::spawn(async move { detector.check("summer", false).await })
        };
        // Let the slow check take its sequence number and start waiting.
        tokio::task::yield_now().await;
        while detector.sources["summer"].next_seq.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }

        let fast = detector.check("summer", false).await.unwrap();
        assert!(fast.changed);

        release_slow.send(()).unwrap();
        let slow = slow.await.unwrap().unwrap();
        assert!(!slow.changed);
        assert_eq!(
            detector.state("summer").await.unwrap().last_fingerprint.as_deref(),
            Some("f-new")
        );
    }

    #[tokio::test]
    async fn test_unknown_source() {
        let detector = detector(Arc::new(ScriptedFetcher::new()));
        assert!(matches!(
            detector.check("winter", false).await,
            Err(AppError::UnknownSource(_))
        ));
    }
}
