//! CSV and JSON output.
//!
//! Every writer creates missing parent directories and writes to a temporary
//! sibling file that is renamed into place once complete.

use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{EchrError, Result};
use crate::types::{EchrCase, NetworkEdge, NetworkNode, CASE_COLUMNS, EDGE_COLUMNS, NODE_COLUMNS};

/// File names used for the citation network.
pub const NODES_CSV: &str = "ECHR_nodes.csv";
pub const EDGES_CSV: &str = "ECHR_edges.csv";
pub const NODES_JSON: &str = "ECHR_nodes.json";
pub const EDGES_JSON: &str = "ECHR_edges.json";

/// Write cases as CSV.
///
/// Columns are [`CASE_COLUMNS`] followed by every extra field present in any
/// case, sorted by name.
pub fn write_cases_csv(cases: &[EchrCase], path: &Path) -> Result<()> {
    let extra: BTreeSet<&str> = cases
        .iter()
        .flat_map(|c| c.extra.keys().map(String::as_str))
        .collect();
    let columns: Vec<&str> = CASE_COLUMNS.iter().copied().chain(extra).collect();

    write_atomic(path, |file| {
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(&columns)?;
        for case in cases {
            writer.write_record(columns.iter().map(|column| case.field(column)))?;
        }
        writer.flush()?;
        Ok(())
    })?;

    tracing::info!(count = cases.len(), path = %path.display(), "Exported cases to CSV");
    Ok(())
}

/// Read cases back from a CSV written by [`write_cases_csv`].
///
/// Any column layout is accepted; unknown columns become extra fields.
pub fn read_cases_csv(path: &Path) -> Result<Vec<EchrCase>> {
    if !path.is_file() {
        return Err(EchrError::MetadataNotFound(path.to_path_buf()));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut cases = Vec::new();
    for record in reader.deserialize::<HashMap<String, String>>() {
        cases.push(EchrCase::from(record?));
    }

    tracing::info!(count = cases.len(), path = %path.display(), "Loaded cases from CSV");
    Ok(cases)
}

/// Write serialisable records as CSV under the given header row.
///
/// The header is written even when `records` is empty. `columns` must match
/// the field order of `T`.
pub fn write_records_csv<T: Serialize>(records: &[T], columns: &[&str], path: &Path) -> Result<()> {
    write_atomic(path, |file| {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(columns)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    })?;

    tracing::info!(count = records.len(), path = %path.display(), "Exported records to CSV");
    Ok(())
}

/// Write any serialisable value as pretty-printed JSON.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    write_atomic(path, |file| {
        serde_json::to_writer_pretty(&mut *file, value)?;
        file.write_all(b"\n")?;
        Ok(())
    })?;

    tracing::info!(path = %path.display(), "Exported JSON");
    Ok(())
}

/// Save the citation network as CSV and JSON in `output_dir`.
///
/// Returns the paths written.
pub fn save_network(
    nodes: &[NetworkNode],
    edges: &[NetworkEdge],
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let nodes_csv = output_dir.join(NODES_CSV);
    let edges_csv = output_dir.join(EDGES_CSV);
    let nodes_json = output_dir.join(NODES_JSON);
    let edges_json = output_dir.join(EDGES_JSON);

    write_records_csv(nodes, NODE_COLUMNS, &nodes_csv)?;
    write_records_csv(edges, EDGE_COLUMNS, &edges_csv)?;
    write_json(nodes, &nodes_json)?;
    write_json(edges, &edges_json)?;

    Ok(vec![nodes_csv, edges_csv, nodes_json, edges_json])
}

/// Write through a temporary file, then rename over `path`.
fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            EchrError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Output path has no file name: {}", path.display()),
            ))
        })?;
    let temp_path = path.with_file_name(format!(".{file_name}.tmp"));

    {
        let mut file = File::create(&temp_path)?;
        write(&mut file)?;
        file.sync_all()?;
    }

    // On Windows, rename fails if the destination already exists
    #[cfg(target_os = "windows")]
    if path.exists() {
        fs::remove_file(path)?;
    }

    fs::rename(&temp_path, path)?;
    Ok(())
}
