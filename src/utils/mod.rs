//! Utility functions and helpers.

pub mod http;

use sha2::{Digest, Sha256};
use url::Url;

/// Content fingerprint: lowercase hex SHA-256 of the document text.
pub fn fingerprint(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Build the GitHub contents API URL for a file in a repository.
pub fn github_contents_url(
    api_base: &str,
    repo: &str,
    path: &str,
    branch: Option<&str>,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&format!(
        "{}/repos/{}/contents/{}",
        api_base.trim_end_matches('/'),
        repo.trim_matches('/'),
        path.trim_start_matches('/')
    ))?;
    if let Some(branch) = branch {
        url.query_pairs_mut().append_pair("ref", branch);
    }
    Ok(url)
}
