// src/services/fetcher.rs

//! Document fetching.
//!
//! A fetcher turns a configured source into the current document text plus
//! an opaque fingerprint that changes whenever the text does.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::error::{FetchError, Result};
use crate::models::{FetcherConfig, SourceConfig, SourceLocation};
use crate::utils::http::{classify_status, create_async_client};
use crate::utils::{fingerprint, github_contents_url};

/// Document text and its version token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    pub fingerprint: String,
    pub content: String,
}

/// Capability to retrieve a source document.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, source: &SourceConfig) -> std::result::Result<FetchedDocument, FetchError>;
}

/// Send a GET and fail on non-success statuses.
async fn get_text(request: reqwest::RequestBuilder) -> std::result::Result<String, FetchError> {
    let response = request.send().await?;
    if let Some(error) = classify_status(response.status(), response.headers()) {
        return Err(error);
    }
    Ok(response.text().await?)
}

/// Subset of the GitHub contents API response.
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    download_url: Option<String>,
}

/// Reads files through the GitHub contents API.
///
/// The blob `sha` serves as the fingerprint, so an unchanged file costs one
/// small API call plus the raw download.
pub struct GithubFetcher {
    client: Client,
    api_base: String,
    token: Option<String>,
}

impl GithubFetcher {
    pub fn new(client: Client, api_base: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            token,
        }
    }

    async fn fetch_file(
        &self,
        repo: &str,
        path: &str,
        branch: Option<&str>,
    ) -> std::result::Result<FetchedDocument, FetchError> {
        let url = github_contents_url(&self.api_base, repo, path, branch)
            .map_err(FetchError::unreachable)?;

        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let body = get_text(request).await?;
        let contents: ContentsResponse =
            serde_json::from_str(&body).map_err(FetchError::unreachable)?;
        let download_url = contents
            .download_url
            .ok_or_else(|| FetchError::Unreachable(format!("{repo}/{path} has no download URL")))?;

        log::debug!("Downloading {} (sha {})", download_url, contents.sha);
        let content = get_text(self.client.get(&download_url)).await?;

        Ok(FetchedDocument {
            fingerprint: contents.sha,
            content,
        })
    }
}

/// Reads any URL and fingerprints the body itself.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn fetch_url(&self, url: &str) -> std::result::Result<FetchedDocument, FetchError> {
        let content = get_text(self.client.get(url)).await?;
        Ok(FetchedDocument {
            fingerprint: fingerprint(&content),
            content,
        })
    }
}

/// Routes each source to the fetcher for its location kind.
pub struct SourceFetcher {
    github: GithubFetcher,
    http: HttpFetcher,
}

impl SourceFetcher {
    /// Build from configuration, reading the optional GitHub token from the
    /// configured environment variable.
    pub fn from_config(config: &FetcherConfig) -> Result<Self> {
        let client = create_async_client(config)?;
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty());
        if token.is_none() {
            log::debug!("{} not set, using unauthenticated GitHub requests", config.token_env);
        }

        Ok(Self {
            github: GithubFetcher::new(client.clone(), &config.github_api_base, token),
            http: HttpFetcher::new(client),
        })
    }
}

#[async_trait]
impl DocumentFetcher for SourceFetcher {
    async fn fetch(&self, source: &SourceConfig) -> std::result::Result<FetchedDocument, FetchError> {
        match &source.location {
            SourceLocation::Github { repo, path, branch } => {
                self.github.fetch_file(repo, path, branch.as_deref()).await
            }
            SourceLocation::Url { url } => self.http.fetch_url(url).await,
        }
    }
}
