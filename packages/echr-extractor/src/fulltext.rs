//! Full-text download and HTML-to-text conversion.
//!
//! HUDOC serves each judgment body as converted HTML. Downloads run
//! concurrently, bounded by the `threads` option.

use std::sync::Arc;
use std::time::Duration;

use scraper::{ElementRef, Html};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use unicode_normalization::UnicodeNormalization;

use crate::config::ExtractorOptions;
use crate::error::Result;
use crate::http::HudocClient;
use crate::query::full_text_url;
use crate::types::EchrCase;

/// Elements whose text is never part of the judgment.
const SKIPPED_TAGS: &[&str] = &["script", "style"];

/// Elements that start a new line of text.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "table", "tr", "td", "th", "h1", "h2", "h3", "h4", "h5",
    "h6", "blockquote", "section", "article", "body",
];

/// Download the full text of every case.
///
/// Output order matches input order. A case whose download fails twice keeps
/// an empty `full_text`.
pub async fn download_full_texts(
    client: &HudocClient,
    options: &ExtractorOptions,
    mut cases: Vec<EchrCase>,
) -> Result<Vec<EchrCase>> {
    tracing::info!(cases = cases.len(), threads = options.threads, "Full-text download will now begin");

    let semaphore = Arc::new(Semaphore::new(options.threads.max(1)));
    let retry_delay = options.retry_base_delay.min(Duration::from_secs(1));
    let mut tasks = JoinSet::new();

    for (index, case) in cases.iter().enumerate() {
        let client = client.clone();
        let semaphore = Arc::clone(&semaphore);
        let base_url = options.api_base_url.clone();
        let item_id = case.itemid.clone();

        tasks.spawn(async move {
            // The semaphore is never closed, so acquire only fails after drop
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return (index, String::new());
            };
            let text = match download_one(&client, &base_url, &item_id, retry_delay).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(item_id = %item_id, error = %e, "Failed to download full text");
                    String::new()
                }
            };
            (index, text)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (index, text) = joined?;
        if let Some(case) = cases.get_mut(index) {
            case.full_text = text;
        }
    }

    tracing::info!("Full-text download finished");
    Ok(cases)
}

/// Fetch and convert one document, retrying once after `retry_delay`.
async fn download_one(
    client: &HudocClient,
    base_url: &str,
    item_id: &str,
    retry_delay: Duration,
) -> Result<String> {
    let url = full_text_url(base_url, item_id)?;
    let html = match client.get_text(&url).await {
        Ok(html) => html,
        Err(e) => {
            tracing::debug!(item_id, error = %e, "Full-text request failed, retrying once");
            tokio::time::sleep(retry_delay).await;
            client.get_text(&url).await?
        }
    };
    Ok(html_to_text(&html))
}

/// Convert a HUDOC HTML body to plain text.
///
/// Lines are trimmed and blank lines dropped. Commas become underscores so
/// the text stays a single CSV-friendly column.
///
/// # Examples
/// ```
/// use echr_extractor::fulltext::html_to_text;
///
/// let html = "<p>PROCEDURE</p><script>var x = 1;</script><p> 1. The case, originated </p>";
/// assert_eq!(html_to_text(html), "PROCEDURE\n1. The case_ originated");
/// ```
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);

    raw.split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .nfc()
        .collect::<String>()
        .replace(',', "_")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if SKIPPED_TAGS.contains(&name) {
        return;
    }

    let block = BLOCK_TAGS.contains(&name);
    if block {
        out.push('\n');
    }

    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, out);
        }
    }

    if block {
        out.push('\n');
    }
}
