// src/models/mod.rs

//! Domain models for the feed engine.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod category;
mod config;
mod job;
mod tracking;

// Re-export all public types
pub use category::JobCategory;
pub use config::{
    Config, FetcherConfig, LoggingConfig, ParserConfig, SchedulerConfig, SourceConfig,
    SourceLocation,
};
pub use job::{JobKey, JobRecord, MONTH_ABBREVIATIONS, MonthDay};
pub use tracking::{ApplicationStatus, SubscriberId, TrackedRecord};
