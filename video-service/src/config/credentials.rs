//! Loads the fal.ai API key from a local `key=value` file.
//!
//! The file is read once, before the listener is bound. Any failure here is
//! fatal to startup.

use secrecy::{Secret, SecretString};
use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;

/// Line prefix that carries the credential.
pub const FAL_KEY_MARKER: &str = "FAL_KEY=";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("{file} file not found. Please create a {file} file with FAL_KEY=your_api_key")]
    ConfigurationMissing { file: String },

    #[error("FAL_KEY not found in {file} file")]
    CredentialNotFound { file: String },

    #[error("failed to read {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read `path` and return the value of its first `FAL_KEY=` line.
///
/// An empty value is returned as-is.
pub fn load_fal_key(path: &Path) -> Result<SecretString, CredentialError> {
    let file = path.display().to_string();

    let contents = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => CredentialError::ConfigurationMissing { file: file.clone() },
        _ => CredentialError::Io {
            file: file.clone(),
            source,
        },
    })?;

    parse_fal_key(&contents)
        .map(Secret::new)
        .ok_or(CredentialError::CredentialNotFound { file })
}

/// Extract the credential from file contents, stripping the marker, quotes
/// and surrounding whitespace.
pub fn parse_fal_key(contents: &str) -> Option<String> {
    contents
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(FAL_KEY_MARKER))
        .map(|value| value.replace(['"', '\''], "").trim().to_string())
}
