// src/pipeline/engine.rs

//! Feed engine facade.
//!
//! Owns every piece of process state (source fingerprints, subscriber
//! preferences, tracked applications) and exposes the operations transport
//! adapters call.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{Config, JobRecord};
use crate::pipeline::detect::{ChangeDetector, ChangeResult, SourceState};
use crate::services::{
    ApplicationTracker, DeliveryReport, DocumentFetcher, NotificationDispatcher, Notifier,
    RecordQuery, SourceFetcher, SubscriptionRegistry, TableParser,
};

pub struct FeedEngine {
    detector: ChangeDetector,
    parser: Arc<TableParser>,
    tracker: ApplicationTracker,
    subscriptions: Arc<SubscriptionRegistry>,
    dispatcher: NotificationDispatcher,
}

impl FeedEngine {
    /// Build an engine over the configured sources using `fetcher`.
    pub fn new(config: &Config, fetcher: Arc<dyn DocumentFetcher>) -> Result<Self> {
        let parser = Arc::new(TableParser::new(&config.parser)?);
        let subscriptions = Arc::new(SubscriptionRegistry::new());

        Ok(Self {
            detector: ChangeDetector::new(&config.sources, fetcher, Arc::clone(&parser)),
            parser,
            tracker: ApplicationTracker::new(),
            dispatcher: NotificationDispatcher::new(Arc::clone(&subscriptions)),
            subscriptions,
        })
    }

    /// Build an engine that fetches over HTTP.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = Arc::new(SourceFetcher::from_config(&config.fetcher)?);
        Self::new(config, fetcher)
    }

    /// Configured source ids, in configuration order.
    pub fn source_ids(&self) -> &[String] {
        self.detector.source_ids()
    }

    pub async fn source_state(&self, source_id: &str) -> Result<SourceState> {
        self.detector.state(source_id).await
    }

    /// Check a source for changes. Used by the scheduler and manual refresh.
    pub async fn poll_once(&self, source_id: &str, forced: bool) -> Result<ChangeResult> {
        self.detector.check(source_id, forced).await
    }

    /// Fetch a source and list its records, optionally filtered by posting
    /// day ("Dec 26") and category keyword.
    ///
    /// Input is validated before any fetch. The stored fingerprint is not
    /// touched.
    pub async fn query(
        &self,
        source_id: &str,
        date: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<JobRecord>> {
        let query = RecordQuery::parse(date, category)?;
        let document = self.detector.fetch(source_id).await?;
        let records = self.parser.parse(&document.content);
        Ok(query.apply(&records))
    }

    pub fn tracker(&self) -> &ApplicationTracker {
        &self.tracker
    }

    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.subscriptions
    }

    /// Notify about a change: one dispatch per detected category.
    ///
    /// Does nothing for results that are not changes.
    pub async fn notify(&self, result: &ChangeResult, notifier: &dyn Notifier) -> Vec<DeliveryReport> {
        if !result.changed {
            return Vec::new();
        }

        let mut reports = Vec::with_capacity(result.categories.len());
        for &category in &result.categories {
            let dispatch = self.dispatcher.resolve(&result.source_id, category).await;
            reports.push(self.dispatcher.deliver(&dispatch, notifier).await);
        }
        reports
    }
}
