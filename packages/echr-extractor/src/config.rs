//! Configuration constants, validation functions and extraction options.

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{EchrError, Result};

/// Default HUDOC host.
pub const HUDOC_BASE_URL: &str = "https://hudoc.echr.coe.int";

/// Path of the HUDOC query API, relative to the host.
pub const RESULTS_PATH: &str = "/app/query/results";

/// Path of the HUDOC document conversion endpoint, relative to the host.
pub const FULL_TEXT_PATH: &str = "/app/conversion/docx/html/body";

/// Default page length for metadata queries.
pub const DEFAULT_BATCH_SIZE: u32 = 500;

/// Per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Attempts per metadata page before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// Width of one date window when a date range is given.
pub const DEFAULT_DAYS_PER_BATCH: u32 = 365;

/// Concurrent full-text downloads.
pub const DEFAULT_THREADS: usize = 10;

/// Ceiling for the exponential backoff between retries.
pub const MAX_BACKOFF_SECS: u64 = 30;

/// Default output directory for saved files.
pub const DEFAULT_OUTPUT_DIR: &str = "data";

/// Fields requested from HUDOC when the caller does not choose any.
pub const DEFAULT_FIELDS: &[&str] = &[
    "itemid",
    "appno",
    "article",
    "conclusion",
    "docname",
    "doctype",
    "doctypebranch",
    "ecli",
    "importance",
    "judgementdate",
    "languageisocode",
    "originatingbody",
    "violation",
    "nonviolation",
    "extractedappno",
    "scl",
];

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LANGUAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid regex"));

/// Parse and validate a `YYYY-MM-DD` date.
///
/// # Examples
/// ```
/// use echr_extractor::config::parse_date;
///
/// assert!(parse_date("2020-01-01").is_ok());
/// assert!(parse_date("2020-13-01").is_err()); // Invalid month
/// assert!(parse_date("01-01-2020").is_err());
/// ```
pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    if !DATE_PATTERN.is_match(date_str) {
        return Err(EchrError::InvalidDate(date_str.to_string()));
    }
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| EchrError::InvalidDate(date_str.to_string()))
}

/// Validate a HUDOC language code such as `ENG` or `FRE`.
///
/// # Examples
/// ```
/// use echr_extractor::config::validate_language;
///
/// assert!(validate_language("ENG").is_ok());
/// assert!(validate_language("en").is_err());
/// ```
pub fn validate_language(language: &str) -> Result<()> {
    if LANGUAGE_PATTERN.is_match(language) {
        Ok(())
    } else {
        Err(EchrError::InvalidLanguage(language.to_string()))
    }
}

/// Options controlling a metadata or full-text extraction run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorOptions {
    pub start_id: u32,
    pub end_id: Option<u32>,
    pub count: Option<usize>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// HUDOC fields to select. Empty means [`DEFAULT_FIELDS`].
    pub fields: Vec<String>,
    pub languages: Vec<String>,
    /// HUDOC search URL whose filters are added to the query.
    pub link: Option<String>,
    /// Raw HUDOC query fragment ANDed into the query.
    pub query_payload: Option<String>,
    pub batch_size: u32,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub days_per_batch: u32,
    pub threads: usize,
    pub save_file: bool,
    pub verbose: bool,
    pub output_dir: PathBuf,
    pub api_base_url: String,
    /// First backoff step; doubles per attempt up to [`MAX_BACKOFF_SECS`].
    pub retry_base_delay: Duration,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            start_id: 0,
            end_id: None,
            count: None,
            start_date: None,
            end_date: None,
            fields: Vec::new(),
            languages: vec!["ENG".to_string()],
            link: None,
            query_payload: None,
            batch_size: DEFAULT_BATCH_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            days_per_batch: DEFAULT_DAYS_PER_BATCH,
            threads: DEFAULT_THREADS,
            save_file: true,
            verbose: false,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            api_base_url: HUDOC_BASE_URL.to_string(),
            retry_base_delay: Duration::from_secs(2),
        }
    }
}

impl ExtractorOptions {
    /// Defaults with environment overrides applied.
    ///
    /// Reads `ECHR_OUTPUT_DIR`, `ECHR_API_BASE_URL`, `ECHR_THREADS` and
    /// `ECHR_TIMEOUT_SECS`. Unparseable numbers fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let output_dir = std::env::var("ECHR_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        let api_base_url =
            std::env::var("ECHR_API_BASE_URL").unwrap_or(defaults.api_base_url);

        let threads = std::env::var("ECHR_THREADS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.threads);

        let timeout_secs = std::env::var("ECHR_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        Self {
            output_dir,
            api_base_url,
            threads,
            timeout_secs,
            ..defaults
        }
    }

    pub fn with_start_id(mut self, start_id: u32) -> Self {
        self.start_id = start_id;
        self
    }

    pub fn with_end_id(mut self, end_id: u32) -> Self {
        self.end_id = Some(end_id);
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn with_end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_query_payload(mut self, query: impl Into<String>) -> Self {
        self.query_payload = Some(query.into());
        self
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_days_per_batch(mut self, days: u32) -> Self {
        self.days_per_batch = days;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_save_file(mut self, save_file: bool) -> Self {
        self.save_file = save_file;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Fields to request, falling back to [`DEFAULT_FIELDS`].
    pub fn selected_fields(&self) -> Vec<String> {
        if self.fields.is_empty() {
            DEFAULT_FIELDS.iter().map(|f| (*f).to_string()).collect()
        } else {
            self.fields.clone()
        }
    }

    /// Check option consistency before any request is made.
    pub fn validate(&self) -> Result<()> {
        for language in &self.languages {
            validate_language(language)?;
        }

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(EchrError::InvalidOption(format!(
                    "start date {start} is after end date {end}"
                )));
            }
        }

        if let Some(end_id) = self.end_id {
            if end_id <= self.start_id {
                return Err(EchrError::InvalidOption(format!(
                    "end id {end_id} must be greater than start id {}",
                    self.start_id
                )));
            }
        }

        let positive = [
            ("batch size", u64::from(self.batch_size)),
            ("max attempts", u64::from(self.max_attempts)),
            ("days per batch", u64::from(self.days_per_batch)),
            ("threads", self.threads as u64),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(EchrError::InvalidOption(format!("{name} must be positive")));
        }

        Ok(())
    }

    /// Base file name (without extension) for saved metadata.
    ///
    /// # Examples
    /// ```
    /// use echr_extractor::ExtractorOptions;
    ///
    /// let options = ExtractorOptions::default();
    /// assert_eq!(options.file_stem(), "echr_metadata_0-ALL_dates_START-END");
    /// ```
    pub fn file_stem(&self) -> String {
        let end_id = self
            .end_id
            .map_or_else(|| "ALL".to_string(), |id| id.to_string());
        let start_date = self
            .start_date
            .map_or_else(|| "START".to_string(), |d| d.format("%Y-%m-%d").to_string());
        let end_date = self
            .end_date
            .map_or_else(|| "END".to_string(), |d| d.format("%Y-%m-%d").to_string());

        format!(
            "echr_metadata_{}-{end_id}_dates_{start_date}-{end_date}",
            self.start_id
        )
    }
}
