//! Service layer for the feed engine.
//!
//! This module contains the business logic for:
//! - Document fetching (`DocumentFetcher`, `SourceFetcher`)
//! - Table parsing (`TableParser`)
//! - Record filtering (`RecordQuery`)
//! - Application tracking (`ApplicationTracker`)
//! - Category subscriptions (`SubscriptionRegistry`)
//! - Notification fan-out (`NotificationDispatcher`)

pub mod dispatcher;
pub mod fetcher;
pub mod parser;
pub mod query;
pub mod subscriptions;
pub mod tracker;

pub use dispatcher::{
    DeliveryReport, DeliveryTarget, Dispatch, Notification, NotificationDispatcher, Notifier,
};
pub use fetcher::{DocumentFetcher, FetchedDocument, GithubFetcher, HttpFetcher, SourceFetcher};
pub use parser::{ParseOutcome, TableParser};
pub use query::{RecordQuery, filter_by_category, filter_by_date};
pub use subscriptions::SubscriptionRegistry;
pub use tracker::{AddOutcome, ApplicationTracker, StatusStats, StatusUpdate};
