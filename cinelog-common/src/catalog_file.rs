//! Catalog file codec
//!
//! The catalog lives in a tab-separated file with a header row:
//! `ID  Title  Year  Runtime  Actors  Notes`.

use crate::{MovieRecord, Result};
use std::path::Path;

/// Read every record from the catalog file
///
/// A missing file is an empty catalog, not an error.
pub fn read_catalog(path: &Path) -> Result<Vec<MovieRecord>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Catalog file missing, starting empty");
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)?;

    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// Replace the catalog file with `records`
///
/// Writes to a sibling temp file first and renames it over the target, so a
/// crash mid-write never leaves a truncated catalog.
pub fn write_catalog(path: &Path, records: &[MovieRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("tsv.tmp");
    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(&temp_path)?;
        if records.is_empty() {
            writer.write_record(["ID", "Title", "Year", "Runtime", "Actors", "Notes"])?;
        }
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
    }
    std::fs::rename(&temp_path, path)?;

    tracing::debug!(path = %path.display(), count = records.len(), "Catalog file written");
    Ok(())
}

/// Titles only, in file order
pub fn load_titles(path: &Path) -> Result<Vec<String>> {
    Ok(read_catalog(path)?.into_iter().map(|r| r.title).collect())
}
