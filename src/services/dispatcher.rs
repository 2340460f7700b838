// src/services/dispatcher.rs

//! Notification fan-out.
//!
//! Resolves who should hear about a changed source and hands each target to
//! a [`Notifier`]. Delivery is best effort: one failed target never stops
//! the others.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;

use crate::error::Result;
use crate::models::{JobCategory, SubscriberId};
use crate::services::SubscriptionRegistry;

/// Recipient of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryTarget {
    /// A single subscriber, e.g. a direct message
    Subscriber(SubscriberId),
    /// Everyone watching the shared channel
    Broadcast,
}

impl fmt::Display for DeliveryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryTarget::Subscriber(id) => write!(f, "subscriber {id}"),
            DeliveryTarget::Broadcast => f.write_str("broadcast"),
        }
    }
}

/// Structured payload; adapters decide how to render it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub source_id: String,
    pub category: JobCategory,
    pub detected_at: DateTime<Utc>,
}

/// Capability to deliver a notification to one target.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, target: &DeliveryTarget, notification: &Notification) -> Result<()>;
}

/// Resolved recipients for one notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub subscribers: Vec<SubscriberId>,
    pub broadcast: DeliveryTarget,
    pub notification: Notification,
}

impl Dispatch {
    /// Per-subscriber targets followed by the broadcast target.
    pub fn targets(&self) -> Vec<DeliveryTarget> {
        self.subscribers
            .iter()
            .cloned()
            .map(DeliveryTarget::Subscriber)
            .chain(std::iter::once(self.broadcast.clone()))
            .collect()
    }
}

/// Outcome of delivering one dispatch.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failures: Vec<(DeliveryTarget, String)>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failed targets across several reports.
    pub fn total_failures(reports: &[DeliveryReport]) -> usize {
        reports.iter().map(|r| r.failures.len()).sum()
    }
}

pub struct NotificationDispatcher {
    registry: Arc<SubscriptionRegistry>,
}

impl NotificationDispatcher {
    pub fn new(registry: Arc<SubscriptionRegistry>) -> Self {
        Self { registry }
    }

    /// Subscribers following `category`, plus the unconditional broadcast.
    pub async fn resolve(&self, source_id: &str, category: JobCategory) -> Dispatch {
        Dispatch {
            subscribers: self.registry.subscribers_for(category).await,
            broadcast: DeliveryTarget::Broadcast,
            notification: Notification {
                source_id: source_id.to_string(),
                category,
                detected_at: Utc::now(),
            },
        }
    }

    /// Deliver to every target concurrently and collect failures.
    pub async fn deliver(&self, dispatch: &Dispatch, notifier: &dyn Notifier) -> DeliveryReport {
        let targets = dispatch.targets();
        let results = join_all(
            targets
                .iter()
                .map(|target| notifier.deliver(target, &dispatch.notification)),
        )
        .await;

        let mut report = DeliveryReport::default();
        for (target, result) in targets.into_iter().zip(results) {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    log::warn!(
                        "Failed to notify {} about {}: {}",
                        target,
                        dispatch.notification.source_id,
                        e
                    );
                    report.failures.push((target, e.to_string()));
                }
            }
        }
        report
    }
}
