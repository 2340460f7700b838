//! jobfeed CLI
//!
//! Thin adapter over the feed engine: runs the watch loop, performs manual
//! checks and listings, and renders results for the terminal.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use jobfeed::{
    config::load_validated,
    error::{AppError, Result},
    models::{Config, JobRecord, MonthDay, SourceLocation},
    pipeline::{FeedEngine, Scheduler},
    services::{DeliveryReport, DeliveryTarget, Notification, Notifier},
};

/// jobfeed - job table watcher
#[derive(Parser, Debug)]
#[command(name = "jobfeed", version, about = "Watch job posting tables for updates")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll all sources on the configured interval until Ctrl-C
    Watch {
        /// Override the polling interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Check one source once
    Poll {
        /// Source id (default: first configured source)
        #[arg(short, long)]
        source: Option<String>,

        /// Parse the document even if it did not change
        #[arg(long)]
        force: bool,
    },

    /// List postings from a source
    List {
        /// Source id (default: first configured source)
        #[arg(short, long)]
        source: Option<String>,

        /// Only postings from this day, e.g. "Dec 26"
        #[arg(short, long, conflicts_with = "today")]
        date: Option<String>,

        /// Only postings from today
        #[arg(long)]
        today: bool,

        /// Only postings mentioning this keyword, e.g. "finance"
        #[arg(short = 'k', long)]
        category: Option<String>,
    },

    /// Validate the configuration file
    Validate,

    /// Show configured sources
    Sources,
}

/// Writes notifications to the log in place of a chat transport.
struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, target: &DeliveryTarget, notification: &Notification) -> Result<()> {
        match target {
            DeliveryTarget::Broadcast => log::info!(
                "🚀 New {} update detected in {}!",
                notification.category,
                notification.source_id
            ),
            DeliveryTarget::Subscriber(id) => log::info!(
                "[to {}] 🚀 New {} update in {}!",
                id,
                notification.category,
                notification.source_id
            ),
        }
        Ok(())
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn resolve_source(config: &Config, source: Option<String>) -> Result<String> {
    match source {
        Some(id) if config.source(&id).is_some() => Ok(id),
        Some(id) => Err(AppError::UnknownSource(id)),
        None => config
            .sources
            .first()
            .map(|s| s.id.clone())
            .ok_or_else(|| AppError::config("No sources configured")),
    }
}

fn print_record(record: &JobRecord) {
    println!(
        "{:<8} {} | {} | {}",
        record.posted_date.as_deref().unwrap_or("-"),
        record.company,
        record.role,
        record.location
    );
    if let Some(link) = &record.apply_link {
        println!("         {}", link);
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging needs the config level, so surface config errors on stderr first.
    let config = match load_validated(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            init_logging(cli.verbose, "info");
            log::error!("{}", e);
            return Err(e);
        }
    };
    init_logging(cli.verbose, &config.logging.level);

    match cli.command {
        Command::Watch { interval } => {
            let engine = Arc::new(FeedEngine::from_config(&config)?);
            let interval = Duration::from_secs(interval.unwrap_or(config.scheduler.interval_secs).max(1));
            let scheduler = Scheduler::new(engine, Arc::new(LogNotifier), interval);

            scheduler
                .run_until(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        log::error!("Cannot listen for Ctrl-C: {}", e);
                    }
                })
                .await;
        }

        Command::Poll { source, force } => {
            let source_id = resolve_source(&config, source)?;
            let engine = FeedEngine::from_config(&config)?;

            let result = engine.poll_once(&source_id, force).await?;
            log::info!(
                "{}: fingerprint {} ({})",
                source_id,
                result.fingerprint,
                if result.baseline {
                    "baseline"
                } else if result.changed {
                    "changed"
                } else {
                    "unchanged"
                }
            );
            if let Some(records) = &result.records {
                for record in records {
                    print_record(record);
                }
                log::info!(
                    "{} posting(s), {} malformed row(s) skipped",
                    records.len(),
                    result.dropped_rows
                );
            }
            let reports = engine.notify(&result, &LogNotifier).await;
            let failures = DeliveryReport::total_failures(&reports);
            if failures > 0 {
                log::warn!("{} notification(s) for {} failed", failures, source_id);
            }
        }

        Command::List {
            source,
            date,
            today,
            category,
        } => {
            let source_id = resolve_source(&config, source)?;
            let engine = FeedEngine::from_config(&config)?;
            let date = if today {
                Some(MonthDay::today().to_string())
            } else {
                date
            };

            let records = engine
                .query(&source_id, date.as_deref(), category.as_deref())
                .await?;
            if records.is_empty() {
                log::info!("No postings match");
            }
            for record in &records {
                print_record(record);
            }
        }

        Command::Validate => {
            log::info!("✓ Config OK: {} source(s)", config.sources.len());
            log::info!(
                "  interval {}s, timeout {}s",
                config.scheduler.interval_secs,
                config.fetcher.timeout_secs
            );
        }

        Command::Sources => {
            for source in &config.sources {
                match &source.location {
                    SourceLocation::Github { repo, path, branch } => println!(
                        "{:<16} github {}/{}{}",
                        source.id,
                        repo,
                        path,
                        branch.as_deref().map(|b| format!(" @{b}")).unwrap_or_default()
                    ),
                    SourceLocation::Url { url } => println!("{:<16} url    {}", source.id, url),
                }
            }
        }
    }

    Ok(())
}
