// src/config.rs

//! Configuration loading utilities.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Config;

/// Load configuration from a TOML file.
///
/// A missing file falls back to defaults; a file that exists but does not
/// parse is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        log::warn!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    Config::load(path)
}

/// Load configuration and check it before use.
pub fn load_validated(path: &Path) -> Result<Config> {
    let config = load_config(path)?;
    config
        .validate()
        .map_err(|e| AppError::config(format!("Invalid config {}: {e}", path.display())))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_validated(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.sources.len(), 1);
    }

    #[test]
    fn test_broken_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scheduler\ninterval_secs = ").unwrap();
        assert!(matches!(load_config(file.path()), Err(AppError::Toml(_))));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scheduler]\ninterval_secs = 0").unwrap();
        assert!(matches!(
            load_validated(file.path()),
            Err(AppError::Config(_))
        ));
    }
}
