//! Top-level extraction operations that tie all components together.

use std::path::Path;

use crate::config::ExtractorOptions;
use crate::error::{EchrError, Result};
use crate::export::{read_cases_csv, save_network, write_cases_csv, write_json};
use crate::fulltext::download_full_texts;
use crate::http::HudocClient;
use crate::metadata::fetch_metadata;
use crate::network::CitationGraph;
use crate::types::{EchrCase, NetworkEdge, NetworkNode};

/// Download ECHR case metadata.
///
/// When `options.save_file` is set and cases were found, the metadata is
/// written to `<output_dir>/<file stem>.csv`.
pub async fn get_echr(options: &ExtractorOptions) -> Result<Vec<EchrCase>> {
    options.validate()?;
    if options.verbose {
        tracing::info!("--- STARTING ECHR DOWNLOAD ---");
    }

    let client = HudocClient::new(options)?;
    let cases = fetch_metadata(&client, options).await?;

    if options.save_file && !cases.is_empty() {
        let path = options
            .output_dir
            .join(format!("{}.csv", options.file_stem()));
        write_cases_csv(&cases, &path)?;
    }

    if options.verbose {
        tracing::info!("--- DONE ---");
    }
    Ok(cases)
}

/// Download ECHR case metadata and the full text of every case.
///
/// Returns `(metadata, full_text_cases)`. When saving, the metadata CSV is
/// rewritten with the full text included and a JSON file with `metadata`
/// replaced by `full_text` in its name is added.
pub async fn get_echr_extra(options: &ExtractorOptions) -> Result<(Vec<EchrCase>, Vec<EchrCase>)> {
    let cases = get_echr(options).await?;

    let client = HudocClient::new(options)?;
    let full_text_cases = download_full_texts(&client, options, cases.clone()).await?;

    if options.save_file && !full_text_cases.is_empty() {
        let stem = options.file_stem();
        let csv_path = options.output_dir.join(format!("{stem}.csv"));
        let json_path = options
            .output_dir
            .join(format!("{}.json", stem.replace("metadata", "full_text")));

        write_cases_csv(&full_text_cases, &csv_path)?;
        write_json(&full_text_cases, &json_path)?;
    }

    Ok((cases, full_text_cases))
}

/// Build the citation network from cases or from a saved metadata CSV.
///
/// In-memory `cases` take precedence over `metadata_path`. When `save_file`
/// is set, `ECHR_nodes`/`ECHR_edges` CSV and JSON files are written to
/// `output_dir`.
pub fn get_nodes_edges(
    cases: Option<&[EchrCase]>,
    metadata_path: Option<&Path>,
    save_file: bool,
    output_dir: &Path,
) -> Result<(Vec<NetworkNode>, Vec<NetworkEdge>)> {
    let loaded;
    let cases = match (cases, metadata_path) {
        (Some(cases), _) => cases,
        (None, Some(path)) => {
            loaded = read_cases_csv(path)?;
            loaded.as_slice()
        }
        (None, None) => return Err(EchrError::MissingSource),
    };

    let (nodes, edges) = CitationGraph::from_cases(cases).into_parts();

    if save_file {
        save_network(&nodes, &edges, output_dir)?;
    }

    Ok((nodes, edges))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_get_nodes_edges_requires_source() {
        let dir = tempdir().unwrap();
        let err = get_nodes_edges(None, None, false, dir.path()).unwrap_err();
        assert!(matches!(err, EchrError::MissingSource));
    }

    #[test]
    fn test_get_nodes_edges_in_memory_without_saving() {
        let dir = tempdir().unwrap();
        let cases = vec![
            EchrCase::from_fields([("itemid", "001-1"), ("appno", "1/10"), ("scl", "2/20")]),
            EchrCase::from_fields([("itemid", "001-2"), ("appno", "2/20")]),
        ];

        let (nodes, edges) = get_nodes_edges(Some(cases.as_slice()), None, false, dir.path()).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(edges, vec![NetworkEdge::references("001-1", "001-2")]);
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_get_echr_rejects_invalid_options() {
        let options = ExtractorOptions::default().with_batch_size(0);
        assert!(matches!(
            get_echr(&options).await,
            Err(EchrError::InvalidOption(_))
        ));
    }
}
