//! ECHR Extractor - Download case law of the European Court of Human Rights.
//!
//! This crate queries the HUDOC database for case metadata, downloads the
//! full text of judgments and derives a citation network between cases.
//!
//! # Example
//!
//! ```
//! use echr_extractor::{config, get_nodes_edges, EchrCase};
//!
//! // Validate inputs before starting a download
//! assert!(config::parse_date("2020-01-01").is_ok());
//! assert!(config::validate_language("ENG").is_ok());
//!
//! // Build a citation network from records already in memory
//! let cases = vec![
//!     EchrCase::from_fields([("itemid", "001-1"), ("appno", "1/10"), ("scl", "2/20")]),
//!     EchrCase::from_fields([("itemid", "001-2"), ("appno", "2/20")]),
//! ];
//! let (nodes, edges) =
//!     get_nodes_edges(Some(cases.as_slice()), None, false, std::path::Path::new("data")).unwrap();
//! assert_eq!(nodes.len(), 2);
//! assert_eq!(edges.len(), 1);
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants, validation and [`ExtractorOptions`]
//! - [`types`]: Case records and network elements
//! - [`error`]: Error types and Result alias
//! - [`http`]: HUDOC HTTP client with retries
//! - [`query`]: HUDOC query and URL construction
//! - [`metadata`]: Paged metadata harvesting
//! - [`fulltext`]: Concurrent full-text download and HTML-to-text
//! - [`network`]: Citation graph construction
//! - [`export`]: CSV and JSON output
//! - [`extractor`]: The `get_echr`, `get_echr_extra` and `get_nodes_edges` operations
//! - [`cli`]: Command-line interface

use std::sync::Once;

use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod extractor;
pub mod fulltext;
pub mod http;
pub mod metadata;
pub mod network;
pub mod query;
pub mod types;

// Re-export main functions
pub use extractor::{get_echr, get_echr_extra, get_nodes_edges};

// Re-export commonly used items
pub use config::ExtractorOptions;
pub use error::{EchrError, Result};
pub use types::{EchrCase, NetworkEdge, NetworkNode};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

static LOGGING: Once = Once::new();

/// Install the process-wide tracing subscriber.
///
/// Respects `RUST_LOG`; otherwise logs at `info` when `verbose` and at `warn`
/// when not. Only the first call has an effect, and a subscriber installed
/// elsewhere is left in place.
pub fn init_logging(verbose: bool) {
    LOGGING.call_once(|| {
        let default_level = if verbose { "info" } else { "warn" };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(default_level)),
            )
            .with_target(false)
            .try_init();
    });
}
