// src/pipeline/schedule.rs

//! Periodic polling loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::pipeline::FeedEngine;
use crate::services::{DeliveryReport, Notifier};

/// Counters for one pass over all sources.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub checked: usize,
    pub changed: usize,
    pub failed: usize,
    pub delivery_failures: usize,
}

/// Checks every source on a fixed interval and notifies on change.
pub struct Scheduler {
    engine: Arc<FeedEngine>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(engine: Arc<FeedEngine>, notifier: Arc<dyn Notifier>, interval: Duration) -> Self {
        Self {
            engine,
            notifier,
            interval,
        }
    }

    /// Check all sources once, in order. Failures are logged and counted;
    /// they never stop the cycle.
    pub async fn run_cycle(&self) -> CycleSummary {
        let mut summary = CycleSummary::default();

        for source_id in self.engine.source_ids() {
            summary.checked += 1;
            match self.engine.poll_once(source_id, false).await {
                Ok(result) if result.changed => {
                    summary.changed += 1;
                    let reports = self.engine.notify(&result, self.notifier.as_ref()).await;
                    summary.delivery_failures += DeliveryReport::total_failures(&reports);
                }
                Ok(_) => log::debug!("{} unchanged", source_id),
                Err(e) => {
                    summary.failed += 1;
                    log::warn!("Check of {} failed: {}", source_id, e);
                }
            }
        }

        summary
    }

    /// Run cycles until `shutdown` resolves. The first cycle starts at once.
    pub async fn run_until(&self, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        log::info!(
            "Watching {} source(s) every {}s",
            self.engine.source_ids().len(),
            self.interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("Scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let summary = self.run_cycle().await;
                    log::debug!("Cycle finished: {:?}", summary);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::models::{Config, JobCategory, SourceConfig, SourceLocation};
    use crate::services::DeliveryTarget;
    use crate::services::dispatcher::testing::RecordingNotifier;
    use crate::services::fetcher::testing::ScriptedFetcher;

    const DOC: &str = "| Acme | SWE Intern | NYC | <a href=\"https://acme.example\">Apply</a> | Dec 26 |";

    fn source(id: &str) -> SourceConfig {
        SourceConfig {
            id: id.to_string(),
            location: SourceLocation::Url {
                url: format!("https://example.com/{id}.md"),
            },
        }
    }

    fn scheduler(fetcher: Arc<ScriptedFetcher>, notifier: Arc<RecordingNotifier>) -> Scheduler {
        let config = Config {
            sources: vec![source("broken"), source("summer")],
            ..Config::default()
        };
        let engine = Arc::new(FeedEngine::new(&config, fetcher).unwrap());
        Scheduler::new(engine, notifier, Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_cycle_survives_failing_source() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.fail("broken", FetchError::NotFound);
        fetcher.fail("broken", FetchError::Unreachable("connection reset".into()));
        fetcher.respond("summer", "f1", DOC);
        fetcher.respond("summer", "f2", DOC);
        let notifier = Arc::new(RecordingNotifier::default());
        let scheduler = scheduler(fetcher, Arc::clone(&notifier));

        let first = scheduler.run_cycle().await;
        assert_eq!(
            first,
            CycleSummary {
                checked: 2,
                changed: 0,
                failed: 1,
                delivery_failures: 0
            }
        );
        assert!(notifier.sent_targets().is_empty());

        let second = scheduler.run_cycle().await;
        assert_eq!(second.changed, 1);
        assert_eq!(second.failed, 1);
        assert_eq!(notifier.sent_targets(), vec![DeliveryTarget::Broadcast]);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent[0].1.category, JobCategory::Swe);
        assert_eq!(sent[0].1.source_id, "summer");
    }

    #[tokio::test]
    async fn test_run_until_stops_on_shutdown() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("summer", "f1", DOC);
        fetcher.respond("summer", "f2", DOC);
        let notifier = Arc::new(RecordingNotifier::default());
        let scheduler = scheduler(fetcher, Arc::clone(&notifier));

        scheduler
            .run_until(tokio::time::sleep(Duration::from_millis(100)))
            .await;

        assert_eq!(notifier.sent_targets(), vec![DeliveryTarget::Broadcast]);
    }

    #[tokio::test]
    async fn test_cycle_counts_delivery_failures() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.fail("broken", FetchError::NotFound);
        fetcher.fail("broken", FetchError::NotFound);
        fetcher.respond("summer", "f1", DOC);
        fetcher.respond("summer", "f2", DOC);
        let notifier = Arc::new(RecordingNotifier::failing_for([DeliveryTarget::Broadcast]));
        let scheduler = scheduler(fetcher, Arc::clone(&notifier));

        scheduler.run_cycle().await;
        let summary = scheduler.run_cycle().await;
        assert_eq!(summary.changed, 1);
        assert_eq!(summary.delivery_failures, 1);
        assert!(notifier.sent_targets().is_empty());
    }
}
