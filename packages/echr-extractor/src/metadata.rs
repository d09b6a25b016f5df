//! Case metadata harvesting from the HUDOC query API.
//!
//! Results are fetched per date window and paged in `batch_size` steps. A
//! page shorter than requested ends its window.

use serde_json::Value;

use crate::config::ExtractorOptions;
use crate::error::{EchrError, Result};
use crate::http::HudocClient;
use crate::query::{build_query, date_ranges, results_url};
use crate::types::EchrCase;

/// Fetch case metadata for every date window described by `options`.
///
/// A page that still fails after all retries is logged and ends its window;
/// cases collected so far are kept.
pub async fn fetch_metadata(client: &HudocClient, options: &ExtractorOptions) -> Result<Vec<EchrCase>> {
    let fields = options.selected_fields();
    let mut cases: Vec<EchrCase> = Vec::new();

    for (start, end) in date_ranges(options.start_date, options.end_date, options.days_per_batch) {
        let query = build_query(options, start, end)?;
        let remaining = options.count.map(|c| c.saturating_sub(cases.len()));
        if remaining == Some(0) {
            break;
        }

        let batch = fetch_window(client, options, &query, &fields, remaining).await?;
        if options.verbose {
            tracing::info!(
                count = batch.len(),
                start = ?start,
                end = ?end,
                "Fetched cases for date range"
            );
        }
        cases.extend(batch);
    }

    if options.verbose {
        tracing::info!(total = cases.len(), "Total cases fetched");
    }
    Ok(cases)
}

/// Page through one query until exhausted, `end_id` is reached or `limit`
/// cases are collected.
async fn fetch_window(
    client: &HudocClient,
    options: &ExtractorOptions,
    query: &str,
    fields: &[String],
    limit: Option<usize>,
) -> Result<Vec<EchrCase>> {
    let mut cases = Vec::new();
    let mut offset = options.start_id;

    loop {
        let length = match options.end_id {
            Some(end_id) if offset >= end_id => break,
            Some(end_id) => options.batch_size.min(end_id - offset),
            None => options.batch_size,
        };

        let url = results_url(&options.api_base_url, query, fields, offset, length)?;
        tracing::debug!(offset, length, "Requesting results page");

        let body = match client.get_with_retry(&url, options.max_attempts).await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(offset, error = %e, "Error fetching batch");
                break;
            }
        };

        if offset == options.start_id {
            if let Some(total) = parse_result_count(&body) {
                tracing::debug!(total, "HUDOC reports matching documents");
            }
        }

        let page = match parse_results(&body) {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(offset, error = %e, "Error parsing batch");
                break;
            }
        };

        let page_len = page.len();
        cases.extend(page);

        if let Some(limit) = limit {
            if cases.len() >= limit {
                cases.truncate(limit);
                break;
            }
        }

        if page_len < length as usize {
            break;
        }
        offset += length;
    }

    Ok(cases)
}

/// Parse a HUDOC query response body into cases.
///
/// Each entry of `results` carries its fields under `columns`; entries
/// without `columns` are read as flat objects.
pub fn parse_results(body: &str) -> Result<Vec<EchrCase>> {
    let json: Value = serde_json::from_str(body)?;
    let results = json
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| EchrError::ResponseParse("missing 'results' array".to_string()))?;

    Ok(results
        .iter()
        .filter_map(|result| result.get("columns").unwrap_or(result).as_object())
        .map(|columns| {
            EchrCase::from_fields(
                columns
                    .iter()
                    .map(|(key, value)| (key.clone(), value_to_string(value))),
            )
        })
        .collect())
}

/// Result count reported by HUDOC, when present.
pub fn parse_result_count(body: &str) -> Option<u64> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("resultcount")?
        .as_u64()
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(";"),
        other => other.to_string(),
    }
}
