//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP behavior for document fetching
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Polling schedule
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Table parsing markers
    #[serde(default)]
    pub parser: ParserConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Monitored documents
    #[serde(default = "defaults::sources")]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetcher.user_agent is empty"));
        }
        if self.fetcher.timeout_secs == 0 {
            return Err(AppError::validation("fetcher.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.fetcher.github_api_base)?;
        if self.scheduler.interval_secs == 0 {
            return Err(AppError::validation("scheduler.interval_secs must be > 0"));
        }
        if self.parser.header_token.trim().is_empty() {
            return Err(AppError::validation("parser.header_token is empty"));
        }
        if self.parser.closed_marker.trim().is_empty() {
            return Err(AppError::validation("parser.closed_marker is empty"));
        }
        if self.sources.is_empty() {
            return Err(AppError::validation("No sources defined"));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.id.trim().is_empty() {
                return Err(AppError::validation("Source with empty id"));
            }
            if !seen.insert(source.id.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate source id '{}'",
                    source.id
                )));
            }
            source.location.validate()?;
        }
        Ok(())
    }

    /// Look up a source by id.
    pub fn source(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetcher: FetcherConfig::default(),
            scheduler: SchedulerConfig::default(),
            parser: ParserConfig::default(),
            logging: LoggingConfig::default(),
            sources: defaults::sources(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Base URL of the GitHub REST API
    #[serde(default = "defaults::github_api_base")]
    pub github_api_base: String,

    /// Environment variable holding an optional GitHub token
    #[serde(default = "defaults::token_env")]
    pub token_env: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            github_api_base: defaults::github_api_base(),
            token_env: defaults::token_env(),
        }
    }
}

/// Polling schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between check cycles
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
        }
    }
}

/// Markers the table parser recognizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Column title identifying the header row
    #[serde(default = "defaults::header_token")]
    pub header_token: String,

    /// Glyph marking a posting as closed
    #[serde(default = "defaults::closed_marker")]
    pub closed_marker: String,

    /// Company cell value meaning "same company as the row above"
    #[serde(default = "defaults::continuation_marker")]
    pub continuation_marker: String,

    /// Replace continuation markers with the previous row's company
    #[serde(default)]
    pub inherit_continuation: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            header_token: defaults::header_token(),
            closed_marker: defaults::closed_marker(),
            continuation_marker: defaults::continuation_marker(),
            inherit_continuation: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when RUST_LOG is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

/// A monitored document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    /// Stable identifier used by adapters
    pub id: String,

    /// Where the document lives
    #[serde(flatten)]
    pub location: SourceLocation,
}

/// Location of a monitored document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceLocation {
    /// A file in a GitHub repository, read through the contents API
    Github {
        /// "owner/name"
        repo: String,
        #[serde(default = "defaults::readme")]
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        branch: Option<String>,
    },
    /// Any URL serving the raw document
    Url { url: String },
}

impl SourceLocation {
    fn validate(&self) -> Result<()> {
        match self {
            SourceLocation::Github { repo, path, .. } => {
                let mut parts = repo.split('/');
                let valid = matches!(
                    (parts.next(), parts.next(), parts.next()),
                    (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty()
                );
                if !valid {
                    return Err(AppError::validation(format!(
                        "GitHub repo '{repo}' must look like owner/name"
                    )));
                }
                if path.trim().is_empty() {
                    return Err(AppError::validation(format!("Empty path for repo '{repo}'")));
                }
            }
            SourceLocation::Url { url } => {
                url::Url::parse(url)?;
            }
        }
        Ok(())
    }
}

mod defaults {
    use super::{SourceConfig, SourceLocation};

    // Fetcher defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; jobfeed/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn github_api_base() -> String {
        "https://api.github.com".into()
    }
    pub fn token_env() -> String {
        "GITHUB_API_TOKEN".into()
    }

    // Scheduler defaults
    pub fn interval() -> u64 {
        60
    }

    // Parser defaults
    pub fn header_token() -> String {
        "Company".into()
    }
    pub fn closed_marker() -> String {
        "🔒".into()
    }
    pub fn continuation_marker() -> String {
        "↳".into()
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }

    // Source defaults
    pub fn readme() -> String {
        "README.md".into()
    }
    pub fn sources() -> Vec<SourceConfig> {
        vec![SourceConfig {
            id: "summer2025".to_string(),
            location: SourceLocation::Github {
                repo: "SimplifyJobs/Summer2025-Internships".to_string(),
                path: readme(),
                branch: None,
            },
        }]
    }
}
