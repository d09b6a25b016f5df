//! Error types for the extractor.
//!
//! A single `EchrError` covers every failure a library consumer can see;
//! transport and parse errors convert into it with `?`.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the extractor library.
#[derive(Debug, Error)]
pub enum EchrError {
    /// Invalid date format.
    #[error("Invalid date: '{0}'. Expected YYYY-MM-DD (e.g., 2020-01-01)")]
    InvalidDate(String),

    /// Invalid language code.
    #[error("Invalid language code: '{0}'. Expected three upper-case letters (e.g., ENG)")]
    InvalidLanguage(String),

    /// Options that contradict each other or are out of range.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// HUDOC search link that cannot be turned into a query.
    #[error("Invalid HUDOC link '{link}': {reason}")]
    InvalidLink { link: String, reason: String },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status that is not worth retrying.
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// All retry attempts failed.
    #[error("Max attempts ({attempts}) exceeded for {url}. Last error: {message}")]
    RetriesExhausted {
        attempts: u32,
        url: String,
        message: String,
    },

    /// Malformed HUDOC response body.
    #[error("Failed to parse HUDOC response: {0}")]
    ResponseParse(String),

    /// Neither cases nor a metadata file were given to the graph builder.
    #[error("Either cases or a metadata path must be provided")]
    MissingSource,

    /// Metadata file does not exist.
    #[error("Metadata file not found: {}", .0.display())]
    MetadataNotFound(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV (de)serialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Background download task failed to complete.
    #[error("Download task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type alias for extractor operations.
pub type Result<T> = std::result::Result<T, EchrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EchrError::InvalidDate("2020/01/01".to_string());
        assert!(err.to_string().contains("2020/01/01"));
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_retries_exhausted_display() {
        let err = EchrError::RetriesExhausted {
            attempts: 3,
            url: "https://hudoc.echr.coe.int/app/query/results".to_string(),
            message: "Server error: 503".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Max attempts (3) exceeded for https://hudoc.echr.coe.int/app/query/results. Last error: Server error: 503"
        );
    }

    #[test]
    fn test_metadata_not_found_display() {
        let err = EchrError::MetadataNotFound(PathBuf::from("data/missing.csv"));
        assert_eq!(err.to_string(), "Metadata file not found: data/missing.csv");
    }
}
