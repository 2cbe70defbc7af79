// src/export/mod.rs

pub mod preview;

use crate::process::FlatRow;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use csv::{ReaderBuilder, WriterBuilder};
use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

pub use preview::render_preview;

/// Header plus every row projected onto it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    /// Header is the sorted union of keys; absent fields become "".
    pub fn from_rows(rows: &[FlatRow]) -> Self {
        let header: Vec<String> = rows
            .iter()
            .flat_map(|row| row.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let rows = rows
            .iter()
            .map(|row| {
                header
                    .iter()
                    .map(|field| row.get(field).map(|c| c.to_string()).unwrap_or_default())
                    .collect()
            })
            .collect();

        Self { header, rows }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    NothingToExport,
    Written {
        path: PathBuf,
        rows: usize,
        columns: usize,
    },
}

/// `nft_metadata_<YYYYMMDD_HHMMSS>.csv`
pub fn default_filename(at: DateTime<Local>) -> String {
    format!("nft_metadata_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

/// Write `rows` as CSV under `out_dir`. An empty input writes nothing.
#[tracing::instrument(level = "info", skip(rows, out_dir), fields(rows = rows.len(), dir = %out_dir.display()))]
pub fn export_csv(rows: &[FlatRow], out_dir: &Path, filename: Option<&str>) -> Result<ExportOutcome> {
    if rows.is_empty() {
        warn!("no NFTs to export");
        return Ok(ExportOutcome::NothingToExport);
    }

    let filename = match filename {
        Some(name) => name.to_string(),
        None => default_filename(Local::now()),
    };
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {:?}", out_dir))?;
    let path = out_dir.join(filename);

    let table = ExportTable::from_rows(rows);
    write_table(&table, &path)?;

    info!(path = %path.display(), rows = table.rows.len(), columns = table.header.len(), "wrote CSV");
    Ok(ExportOutcome::Written {
        path,
        rows: table.rows.len(),
        columns: table.header.len(),
    })
}

fn write_table(table: &ExportTable, path: &Path) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("creating CSV file {:?}", path))?;
    writer
        .write_record(&table.header)
        .with_context(|| format!("writing header to {:?}", path))?;
    for (idx, row) in table.rows.iter().enumerate() {
        writer
            .write_record(row)
            .with_context(|| format!("writing row {} to {:?}", idx, path))?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {:?}", path))?;
    Ok(())
}

/// Read an exported CSV back into header + string rows.
pub fn read_table(path: &Path) -> Result<ExportTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("opening CSV file {:?}", path))?;
    let header = reader
        .headers()
        .with_context(|| format!("reading header of {:?}", path))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("CSV parse error in {:?} at record {}", path, idx))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(ExportTable { header, rows })
}
