//! Persistence of the weekly tables.
//!
//! Each run writes into `{base}/{source}/{YYYYMMDD}`, replacing whatever an
//! earlier run on the same day left there.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::source::Source;

/// Paths of the two tables written for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    pub full: PathBuf,
    pub reduced: PathBuf,
}

impl OutputPaths {
    pub fn new(run_dir: &Path, source: Source) -> Self {
        let stem = source.dir_name();
        Self {
            full: run_dir.join(format!("{stem}_sabana.csv")),
            reduced: run_dir.join(format!("{stem}.csv")),
        }
    }
}

/// Creates an empty `{base}/{source}/{YYYYMMDD}` directory and returns it.
///
/// An existing directory for the same day is removed first.
pub fn prepare_run_dir(base: &Path, source: Source, today: NaiveDate) -> Result<PathBuf> {
    let dir = base
        .join(source.dir_name())
        .join(today.format("%Y%m%d").to_string());

    if dir.exists() {
        info!(dir = %dir.display(), "Replacing existing output directory");
        fs::remove_dir_all(&dir).with_context(|| format!("removing {}", dir.display()))?;
    }
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    Ok(dir)
}

/// A row type written as one CSV table.
pub trait CsvTable: Serialize {
    /// Header line, in serialization order.
    const COLUMNS: &'static [&'static str];
}

/// Writes `rows` to a new CSV file at `path`, header first.
///
/// The header is written even when `rows` is empty.
pub fn write_table<T: CsvTable>(path: &Path, rows: &[T]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing CSV table");

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    writer.write_record(T::COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Logs any serializable value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
