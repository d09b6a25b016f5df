//! HTTP client wrapper for the HUDOC API.

use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::config::{ExtractorOptions, MAX_BACKOFF_SECS};
use crate::error::{EchrError, Result};

/// User agent string identifying this extractor.
const USER_AGENT: &str = concat!("echr-extractor/", env!("CARGO_PKG_VERSION"));

/// Async HUDOC client with timeout and retry handling.
#[derive(Debug, Clone)]
pub struct HudocClient {
    http: Client,
    retry_base_delay: Duration,
}

impl HudocClient {
    /// Create a client configured from extraction options.
    pub fn new(options: &ExtractorOptions) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            retry_base_delay: options.retry_base_delay,
        })
    }

    /// Single GET returning the body as text.
    pub async fn get_text(&self, url: &Url) -> Result<String> {
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EchrError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }

    /// GET with exponential backoff.
    ///
    /// Connection errors, timeouts and 5xx responses are retried up to
    /// `max_attempts` times in total. 4xx responses fail immediately.
    pub async fn get_with_retry(&self, url: &Url, max_attempts: u32) -> Result<String> {
        let mut last_error: Option<String> = None;

        for attempt in 1..=max_attempts {
            match self.http.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_server_error() {
                        tracing::warn!(
                            status = %status,
                            attempt,
                            max_attempts,
                            "Server error, will retry"
                        );
                        last_error = Some(format!("Server error: {status}"));
                    } else if !status.is_success() {
                        return Err(EchrError::Status {
                            status: status.as_u16(),
                            url: url.to_string(),
                        });
                    } else {
                        match response.text().await {
                            Ok(body) => return Ok(body),
                            Err(e) => {
                                tracing::warn!(error = %e, attempt, max_attempts, "Body read failed, will retry");
                                last_error = Some(e.to_string());
                            }
                        }
                    }
                }
                Err(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                    tracing::warn!(
                        error = %e,
                        attempt,
                        max_attempts,
                        "Request failed, will retry"
                    );
                    last_error = Some(e.to_string());
                }
                Err(e) => return Err(EchrError::Http(e)),
            }

            if attempt < max_attempts {
                let delay = backoff_delay(self.retry_base_delay, attempt);
                tracing::info!(delay_ms = delay.as_millis() as u64, "Retrying after delay");
                tokio::time::sleep(delay).await;
            }
        }

        let err = EchrError::RetriesExhausted {
            attempts: max_attempts,
            url: url.to_string(),
            message: last_error.unwrap_or_else(|| "Unknown error".to_string()),
        };
        tracing::error!(error = %err, "Giving up on request");
        Err(err)
    }
}

/// Delay before the retry following `attempt` (1-based): `base * 2^(attempt-1)`,
/// capped at [`MAX_BACKOFF_SECS`].
///
/// With the default two-second base this yields 2, 4, 8, 16, 30, 30, ... seconds.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
        .min(Duration::from_secs(MAX_BACKOFF_SECS))
}
