use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Run log kept next to the grouped output.
pub const HISTORY_FILE: &str = ".history.jsonl";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed row at {path}:{line}: {source}")]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DatasetError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        DatasetError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Input row of `resolve`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    pub domain: String,
}

/// Output row of `resolve`; a missing `logo_url` means every source failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoRecord {
    pub domain: String,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// One `group` run, appended to [`HISTORY_FILE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub timestamp: String,
    pub input: String,
    pub output: String,
    pub algorithm: String,
    pub hash_size: u32,
    pub threshold: u32,
    /// Rows read from the input.
    pub items: usize,
    /// Rows that were downloaded, decoded and grouped.
    pub grouped: usize,
    pub groups: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSummary {
    pub name: String,
    pub non_null: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    pub head: Vec<Value>,
}

/// Read a JSON Lines file. Blank lines are skipped.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DatasetError> {
    let file = File::open(path).map_err(|e| DatasetError::io(path, e))?;
    let reader = BufReader::new(file);

    let mut rows = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| DatasetError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line).map_err(|source| DatasetError::Malformed {
            path: path.to_path_buf(),
            line: i + 1,
            source,
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Write rows as JSON Lines, replacing the file and creating parent directories.
pub fn write_jsonl<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| DatasetError::io(path, e))?;
    let mut out = BufWriter::new(file);
    for row in rows {
        serde_json::to_writer(&mut out, row)?;
        out.write_all(b"\n").map_err(|e| DatasetError::io(path, e))?;
    }
    out.flush().map_err(|e| DatasetError::io(path, e))?;
    Ok(())
}

pub fn append_run(dir: &Path, record: &RunRecord) -> Result<(), DatasetError> {
    let history_file = dir.join(HISTORY_FILE);
    let mut out = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&history_file)
        .map_err(|e| DatasetError::io(&history_file, e))?;
    writeln!(out, "{}", serde_json::to_string(record)?)
        .map_err(|e| DatasetError::io(&history_file, e))?;
    Ok(())
}

/// Read the run log of `dir`, skipping malformed entries.
pub fn read_runs(dir: &Path) -> Result<Vec<RunRecord>, DatasetError> {
    let history_file = dir.join(HISTORY_FILE);
    let f = File::open(&history_file).map_err(|e| DatasetError::io(&history_file, e))?;
    let (runs, _skipped) = parse_runs(BufReader::new(f), &history_file)?;
    Ok(runs)
}

/// Parse run log lines; the second value lists the 1-based line numbers
/// that were skipped.
fn parse_runs<R: BufRead>(
    reader: R,
    path: &Path,
) -> Result<(Vec<RunRecord>, Vec<usize>), DatasetError> {
    let mut runs = Vec::new();
    let mut skipped = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| DatasetError::io(path, e))?;
        match serde_json::from_str::<RunRecord>(&line) {
            Ok(run) => runs.push(run),
            Err(err) => {
                log::warn!("Skipping malformed history entry on line {}: {}", i + 1, err);
                skipped.push(i + 1);
            }
        }
    }
    Ok((runs, skipped))
}

/// Row count, per-column fill and the first `head` rows of any JSON Lines file.
pub fn summarize(path: &Path, head: usize) -> Result<DatasetSummary, DatasetError> {
    let rows: Vec<Value> = read_jsonl(path)?;

    let mut columns: BTreeMap<String, usize> = BTreeMap::new();
    for row in &rows {
        if let Value::Object(fields) = row {
            for (name, value) in fields {
                let count = columns.entry(name.clone()).or_default();
                if !value.is_null() {
                    *count += 1;
                }
            }
        }
    }

    Ok(DatasetSummary {
        rows: rows.len(),
        columns: columns
            .into_iter()
            .map(|(name, non_null)| ColumnSummary { name, non_null })
            .collect(),
        head: rows.into_iter().take(head).collect(),
    })
}
