// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::error::{FetchError, Result};
use crate::models::FetcherConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &FetcherConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Map a non-success response to a fetch error.
///
/// Returns `None` for success statuses. GitHub signals an exhausted quota
/// with 403 plus `x-ratelimit-remaining: 0`, everyone else with 429.
pub fn classify_status(status: StatusCode, headers: &HeaderMap) -> Option<FetchError> {
    if status.is_success() {
        return None;
    }

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
    };

    let quota_exhausted = header("x-ratelimit-remaining") == Some("0");
    if status == StatusCode::TOO_MANY_REQUESTS || (status == StatusCode::FORBIDDEN && quota_exhausted)
    {
        let retry_after_secs = header(RETRY_AFTER.as_str())
            .and_then(|v| v.parse::<u64>().ok())
            .or_else(|| {
                header("x-ratelimit-reset")
                    .and_then(|v| v.parse::<i64>().ok())
                    .map(|reset| (reset - Utc::now().timestamp()).max(0) as u64)
            });
        return Some(FetchError::RateLimited { retry_after_secs });
    }

    if status == StatusCode::NOT_FOUND {
        return Some(FetchError::NotFound);
    }

    Some(FetchError::Unreachable(format!("HTTP {status}")))
}
