//! HUDOC query construction.
//!
//! HUDOC's query API takes a Lucene-like query string plus `select`, `sort`,
//! `start` and `length` parameters. This module builds those strings and
//! splits long date ranges into windows the API can page through.

use chrono::{Duration, NaiveDate};
use serde_json::Value;
use url::Url;

use crate::config::{ExtractorOptions, FULL_TEXT_PATH, RESULTS_PATH};
use crate::error::{EchrError, Result};

/// An inclusive date window; `None` bounds are open.
pub type DateWindow = (Option<NaiveDate>, Option<NaiveDate>);

/// Build the query string for one date window.
///
/// Parts are ANDed: language filter, date range, link-derived filters and the
/// raw query payload. No parts yields `*`.
///
/// # Examples
/// ```
/// use echr_extractor::{query::build_query, ExtractorOptions};
///
/// let options = ExtractorOptions::default();
/// assert_eq!(
///     build_query(&options, None, None).unwrap(),
///     r#"((languageisocode:"ENG"))"#
/// );
/// ```
pub fn build_query(
    options: &ExtractorOptions,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<String> {
    let mut parts: Vec<String> = Vec::new();

    if !options.languages.is_empty() {
        let languages = options
            .languages
            .iter()
            .map(|lang| format!("(languageisocode:\"{lang}\")"))
            .collect::<Vec<_>>()
            .join(" OR ");
        parts.push(format!("({languages})"));
    }

    if start.is_some() || end.is_some() {
        let start = start.map_or_else(|| "*".to_string(), |d| d.format("%Y-%m-%d").to_string());
        let end = end.map_or_else(|| "*".to_string(), |d| d.format("%Y-%m-%d").to_string());
        parts.push(format!("(kpdate:[{start} TO {end}])"));
    }

    if let Some(link) = options.link.as_deref() {
        if let Some(link_query) = query_from_link(link)? {
            parts.push(format!("({link_query})"));
        }
    }

    if let Some(payload) = options.query_payload.as_deref().filter(|p| !p.trim().is_empty()) {
        parts.push(format!("({payload})"));
    }

    if parts.is_empty() {
        Ok("*".to_string())
    } else {
        Ok(parts.join(" AND "))
    }
}

/// Translate a HUDOC search link into query terms.
///
/// HUDOC encodes the active search filters as a JSON object in the URL
/// fragment, e.g. `https://hudoc.echr.coe.int/eng#{"documentcollectionid2":["JUDGMENTS"]}`.
/// Each field becomes an OR group and the groups are ANDed. Free-text
/// `fulltext` values are added unquoted. Returns `Ok(None)` when the fragment
/// carries no usable filter.
///
/// # Examples
/// ```
/// use echr_extractor::query::query_from_link;
///
/// let link = r#"https://hudoc.echr.coe.int/eng#{"respondent":["NLD","BEL"]}"#;
/// assert_eq!(
///     query_from_link(link).unwrap().as_deref(),
///     Some(r#"(respondent:"NLD" OR respondent:"BEL")"#)
/// );
/// ```
pub fn query_from_link(link: &str) -> Result<Option<String>> {
    let invalid = |reason: &str| EchrError::InvalidLink {
        link: link.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(link).map_err(|e| invalid(&e.to_string()))?;
    let fragment = url
        .fragment()
        .ok_or_else(|| invalid("no search filters in URL fragment"))?;
    let decoded = percent_decode(fragment);

    let filters: Value =
        serde_json::from_str(&decoded).map_err(|e| invalid(&format!("fragment is not JSON: {e}")))?;
    let filters = filters
        .as_object()
        .ok_or_else(|| invalid("fragment is not a JSON object"))?;

    let mut groups: Vec<String> = Vec::new();
    for (field, value) in filters {
        // Sorting and item selection are view state, not filters
        if matches!(field.as_str(), "sort" | "itemid" | "tabview") {
            continue;
        }

        let values: Vec<String> = match value {
            Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
            other => scalar_to_string(other).into_iter().collect(),
        };
        if values.is_empty() {
            continue;
        }

        let terms = values
            .iter()
            .map(|v| {
                if field == "fulltext" {
                    v.clone()
                } else {
                    format!("{field}:\"{v}\"")
                }
            })
            .collect::<Vec<_>>()
            .join(" OR ");
        groups.push(format!("({terms})"));
    }

    if groups.is_empty() {
        Ok(None)
    } else {
        Ok(Some(groups.join(" AND ")))
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Decode `%XX` escapes; malformed escapes are kept verbatim.
fn percent_decode(input: &str) -> String {
    let escaped = input.replace('+', "%2B").replace('&', "%26");
    url::form_urlencoded::parse(format!("x={escaped}").as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}

/// URL for one page of query results.
pub fn results_url(
    base_url: &str,
    query: &str,
    fields: &[String],
    start: u32,
    length: u32,
) -> Result<Url> {
    let mut url = endpoint(base_url, RESULTS_PATH)?;
    url.query_pairs_mut()
        .append_pair("query", query)
        .append_pair("select", &fields.join(","))
        .append_pair("sort", "itemid Ascending")
        .append_pair("start", &start.to_string())
        .append_pair("length", &length.to_string());
    Ok(url)
}

/// URL of the HTML body of a document.
///
/// # Examples
/// ```
/// use echr_extractor::query::full_text_url;
///
/// let url = full_text_url("https://hudoc.echr.coe.int", "001-57619").unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://hudoc.echr.coe.int/app/conversion/docx/html/body?library=ECHR&id=001-57619"
/// );
/// ```
pub fn full_text_url(base_url: &str, item_id: &str) -> Result<Url> {
    let mut url = endpoint(base_url, FULL_TEXT_PATH)?;
    url.query_pairs_mut()
        .append_pair("library", "ECHR")
        .append_pair("id", item_id);
    Ok(url)
}

fn endpoint(base_url: &str, path: &str) -> Result<Url> {
    let joined = format!("{}{path}", base_url.trim_end_matches('/'));
    Url::parse(&joined)
        .map_err(|e| EchrError::InvalidOption(format!("invalid API base URL '{base_url}': {e}")))
}

/// Split `[start, end]` into inclusive windows of `days_per_batch` days.
///
/// When either bound is missing the whole range is a single window.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use echr_extractor::query::date_ranges;
///
/// let start = NaiveDate::from_ymd_opt(2020, 1, 1);
/// let end = NaiveDate::from_ymd_opt(2020, 1, 10);
/// assert_eq!(date_ranges(start, end, 5).len(), 2);
/// assert_eq!(date_ranges(None, end, 5), vec![(None, end)]);
/// ```
pub fn date_ranges(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    days_per_batch: u32,
) -> Vec<DateWindow> {
    let (Some(start), Some(end)) = (start, end) else {
        return vec![(start, end)];
    };

    let step = Duration::days(i64::from(days_per_batch.max(1)) - 1);
    let mut windows = Vec::new();
    let mut current = start;

    while current <= end {
        let window_end = (current + step).min(end);
        windows.push((Some(current), Some(window_end)));
        match window_end.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }

    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_build_query_languages_and_dates() {
        let options = ExtractorOptions::default().with_languages(["ENG", "FRE"]);
        let query = build_query(&options, Some(date("2020-01-01")), None).unwrap();
        assert_eq!(
            query,
            r#"((languageisocode:"ENG") OR (languageisocode:"FRE")) AND (kpdate:[2020-01-01 TO *])"#
        );
    }

    #[test]
    fn test_build_query_single_language() {
        let options = ExtractorOptions::default();
        assert_eq!(
            build_query(&options, None, None).unwrap(),
            r#"((languageisocode:"ENG"))"#
        );
    }

    #[test]
    fn test_build_query_empty_is_wildcard() {
        let options = ExtractorOptions::default().with_languages(Vec::<String>::new());
        assert_eq!(build_query(&options, None, None).unwrap(), "*");
    }

    #[test]
    fn test_build_query_with_payload() {
        let options = ExtractorOptions::default()
            .with_languages(Vec::<String>::new())
            .with_query_payload(r#"article:"8""#);
        assert_eq!(
            build_query(&options, None, None).unwrap(),
            r#"(article:"8")"#
        );
    }

    #[test]
    fn test_build_query_with_link() {
        let options = ExtractorOptions::default()
            .with_link(r#"https://hudoc.echr.coe.int/eng#{"documentcollectionid2":["JUDGMENTS"]}"#);
        let query = build_query(&options, None, None).unwrap();
        assert!(query.ends_with(r#"AND ((documentcollectionid2:"JUDGMENTS"))"#));
    }

    #[test]
    fn test_query_from_link_percent_encoded() {
        let link = "https://hudoc.echr.coe.int/eng#%7B%22article%22:%5B%228%22%5D,%22sort%22:%5B%22kpdate%22%5D%7D";
        assert_eq!(
            query_from_link(link).unwrap().as_deref(),
            Some(r#"(article:"8")"#)
        );
    }

    #[test]
    fn test_query_from_link_fulltext_unquoted() {
        let link = r#"https://hudoc.echr.coe.int/eng#{"fulltext":["privacy"]}"#;
        assert_eq!(query_from_link(link).unwrap().as_deref(), Some("(privacy)"));
    }

    #[test]
    fn test_query_from_link_errors() {
        assert!(matches!(
            query_from_link("https://hudoc.echr.coe.int/eng"),
            Err(EchrError::InvalidLink { .. })
        ));
        assert!(query_from_link("https://hudoc.echr.coe.int/eng#notjson").is_err());
        assert!(query_from_link("not a url").is_err());
    }

    #[test]
    fn test_query_from_link_without_filters() {
        let link = r#"https://hudoc.echr.coe.int/eng#{"sort":["kpdate Descending"]}"#;
        assert_eq!(query_from_link(link).unwrap(), None);
    }

    #[test]
    fn test_results_url_encodes_parameters() {
        let url = results_url(
            "https://hudoc.echr.coe.int/",
            r#"(languageisocode:"ENG")"#,
            &["itemid".to_string(), "ecli".to_string()],
            500,
            100,
        )
        .unwrap();

        assert_eq!(url.path(), "/app/query/results");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("query".to_string(), r#"(languageisocode:"ENG")"#.to_string()),
                ("select".to_string(), "itemid,ecli".to_string()),
                ("sort".to_string(), "itemid Ascending".to_string()),
                ("start".to_string(), "500".to_string()),
                ("length".to_string(), "100".to_string()),
            ]
        );
    }

    #[test]
    fn test_date_ranges_windows() {
        let windows = date_ranges(Some(date("2020-01-01")), Some(date("2020-01-10")), 4);
        assert_eq!(
            windows,
            vec![
                (Some(date("2020-01-01")), Some(date("2020-01-04"))),
                (Some(date("2020-01-05")), Some(date("2020-01-08"))),
                (Some(date("2020-01-09")), Some(date("2020-01-10"))),
            ]
        );
    }

    #[test]
    fn test_date_ranges_single_day() {
        let day = Some(date("2020-06-01"));
        assert_eq!(date_ranges(day, day, 365), vec![(day, day)]);
    }

    #[test]
    fn test_date_ranges_open_bounds() {
        assert_eq!(date_ranges(None, None, 365), vec![(None, None)]);
    }
}
