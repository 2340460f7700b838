//! Pipeline entry points for feed operations.
//!
//! - `ChangeDetector`: fingerprint comparison per source
//! - `FeedEngine`: the operations adapters call
//! - `Scheduler`: the periodic check loop

pub mod detect;
pub mod engine;
pub mod schedule;

pub use detect::{ChangeDetector, ChangeResult, SourceState};
pub use engine::FeedEngine;
pub use schedule::{CycleSummary, Scheduler};
