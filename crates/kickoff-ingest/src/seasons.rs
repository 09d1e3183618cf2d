//! Season CSV concatenation
//!
//! Each raw file is one season's export (`epl_2019-20.csv` and so on).
//! Column sets drift between seasons, so the combined header is the union
//! of all headers in first-seen order and absent cells are left empty.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Writer};

use crate::{ensure_parent, IngestError, Result};

const SEASON_COLUMN: &str = "season";

/// Merge every `*.csv` in `raw_dir` into `out_csv`, returning the row count
pub fn concat_seasons(raw_dir: impl AsRef<Path>, out_csv: impl AsRef<Path>) -> Result<usize> {
    let raw_dir = raw_dir.as_ref();
    let out_csv = out_csv.as_ref();

    let files = season_files(raw_dir)?;
    if files.is_empty() {
        return Err(IngestError::NoInputFiles(raw_dir.to_path_buf()));
    }

    // First pass: header union
    let mut columns: Vec<String> = Vec::new();
    for file in &files {
        let headers = read_headers(file)?;
        for name in headers.iter() {
            if name != SEASON_COLUMN && !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }
    }
    columns.push(SEASON_COLUMN.to_string());

    ensure_parent(out_csv)?;
    let mut writer = Writer::from_path(out_csv).map_err(|e| IngestError::csv(out_csv, e))?;
    writer
        .write_record(&columns)
        .map_err(|e| IngestError::csv(out_csv, e))?;

    // Second pass: stream rows into the union layout
    let mut total = 0;
    for file in &files {
        let season = season_name(file);
        tracing::info!(file = %file.display(), %season, "Loading season");

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(file)
            .map_err(|e| IngestError::csv(file, e))?;
        let headers = reader
            .headers()
            .map_err(|e| IngestError::csv(file, e))?
            .clone();
        let lookup: HashMap<&str, usize> =
            headers.iter().enumerate().map(|(i, h)| (h, i)).collect();

        let mut rows = 0;
        for record in reader.records() {
            let record = record.map_err(|e| IngestError::csv(file, e))?;
            if record.iter().all(str::is_empty) {
                continue;
            }

            let row: StringRecord = columns
                .iter()
                .map(|column| {
                    if column == SEASON_COLUMN {
                        season.as_str()
                    } else {
                        lookup
                            .get(column.as_str())
                            .and_then(|&i| record.get(i))
                            .unwrap_or("")
                    }
                })
                .collect();
            writer
                .write_record(&row)
                .map_err(|e| IngestError::csv(out_csv, e))?;
            rows += 1;
        }

        tracing::debug!(file = %file.display(), rows, "Season rows copied");
        total += rows;
    }

    writer.flush().map_err(|e| IngestError::io(out_csv, e))?;
    tracing::info!(rows = total, out = %out_csv.display(), "Saved combined seasons");
    Ok(total)
}

/// CSV files in `dir`, sorted by file name
fn season_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| IngestError::io(dir, e))?.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_headers(file: &Path) -> Result<StringRecord> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(file)
        .map_err(|e| IngestError::csv(file, e))?;
    reader
        .headers()
        .cloned()
        .map_err(|e| IngestError::csv(file, e))
}

/// `epl_2019-20.csv` -> `2019-20`
fn season_name(file: &Path) -> String {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.strip_prefix("epl_").unwrap_or(&stem).to_string()
}
