// src/services/tracker.rs

//! Per-subscriber application tracking.
//!
//! Each subscriber owns an ordered list of tracked records guarded by its
//! own mutex, so concurrent reaction events for one subscriber are applied
//! one at a time while different subscribers never contend.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::models::{ApplicationStatus, JobKey, JobRecord, SubscriberId, TrackedRecord};

type TrackedList = Arc<Mutex<Vec<TrackedRecord>>>;

/// Result of flagging a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

/// Result of a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    Updated { previous: ApplicationStatus },
    NotFound,
}

/// Status counts over one subscriber's tracked list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusStats {
    pub total: usize,
    pub counts: BTreeMap<ApplicationStatus, usize>,
}

impl StatusStats {
    fn from_records(records: &[TrackedRecord]) -> Self {
        let mut counts = BTreeMap::new();
        for tracked in records {
            *counts.entry(tracked.status).or_insert(0) += 1;
        }
        Self {
            total: records.len(),
            counts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn count(&self, status: ApplicationStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    /// Share of `status` in percent, or `None` when nothing is tracked.
    pub fn percentage(&self, status: ApplicationStatus) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(self.count(status) as f64 * 100.0 / self.total as f64)
    }

    /// (status, count, percent) for every status with at least one record,
    /// in pipeline order.
    pub fn breakdown(&self) -> impl Iterator<Item = (ApplicationStatus, usize, f64)> + '_ {
        self.counts.iter().map(move |(&status, &count)| {
            (status, count, count as f64 * 100.0 / self.total as f64)
        })
    }
}

/// Tracks flagged postings and their status for every subscriber.
#[derive(Default)]
pub struct ApplicationTracker {
    lists: RwLock<HashMap<SubscriberId, TrackedList>>,
}

impl ApplicationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    async fn list_for(&self, subscriber: &SubscriberId) -> Option<TrackedList> {
        self.lists.read().await.get(subscriber).cloned()
    }

    async fn list_or_create(&self, subscriber: &SubscriberId) -> TrackedList {
        if let Some(list) = self.list_for(subscriber).await {
            return list;
        }
        let mut lists = self.lists.write().await;
        Arc::clone(lists.entry(subscriber.clone()).or_default())
    }

    /// Start tracking `record` at `Applied` unless the subscriber already
    /// tracks the same company and role.
    pub async fn add_if_absent(&self, subscriber: &SubscriberId, record: JobRecord) -> AddOutcome {
        let list = self.list_or_create(subscriber).await;
        let mut tracked = list.lock().await;

        let key = record.key();
        if tracked.iter().any(|t| t.matches(&key)) {
            log::debug!("{} already tracks {}", subscriber, key);
            return AddOutcome::AlreadyPresent;
        }

        log::info!("{} started tracking {}", subscriber, key);
        tracked.push(TrackedRecord::new(record));
        AddOutcome::Added
    }

    /// Move a tracked record to `status`. Every transition is allowed.
    pub async fn set_status(
        &self,
        subscriber: &SubscriberId,
        key: &JobKey,
        status: ApplicationStatus,
    ) -> StatusUpdate {
        let Some(list) = self.list_for(subscriber).await else {
            return StatusUpdate::NotFound;
        };
        let mut tracked = list.lock().await;

        match tracked.iter_mut().find(|t| t.matches(key)) {
            Some(entry) => {
                let previous = entry.status;
                entry.status = status;
                log::info!("{}: {} {} -> {}", subscriber, key, previous, status);
                StatusUpdate::Updated { previous }
            }
            None => StatusUpdate::NotFound,
        }
    }

    /// Snapshot of the subscriber's tracked records in the order they were added.
    pub async fn list(&self, subscriber: &SubscriberId) -> Vec<TrackedRecord> {
        match self.list_for(subscriber).await {
            Some(list) => list.lock().await.clone(),
            None => Vec::new(),
        }
    }

    pub async fn stats(&self, subscriber: &SubscriberId) -> StatusStats {
        match self.list_for(subscriber).await {
            Some(list) => StatusStats::from_records(&list.lock().await),
            None => StatusStats::default(),
        }
    }
}
