//! End-to-end processing of one source: load, transform, write.

use anyhow::Result;
use chrono::NaiveDate;
use std::path::Path;
use tracing::info;

use crate::aggregate::{ReducedRow, WeeklyRow, aggregate, reduce};
use crate::fetch::{HttpClient, load_bytes};
use crate::normalize::normalize;
use crate::output::{OutputPaths, prepare_run_dir, write_table};
use crate::parser::{RawRecord, parse_raw_records};
use crate::source::Source;
use crate::weeks::{WeekScheme, reconcile};

/// Both tables for one source plus the count of rows left out.
#[derive(Debug)]
pub struct SourceReport {
    pub full: Vec<WeeklyRow>,
    pub reduced: Vec<ReducedRow>,
    pub dropped: usize,
}

/// Runs the pure transform over already-parsed rows.
pub fn process(raw: &[RawRecord], source: Source, scheme: WeekScheme) -> Result<SourceReport> {
    let normalized = normalize(raw, source)?;
    let (week_ids, weeks) = reconcile(&normalized.records, scheme);
    let full = aggregate(&normalized.records, &week_ids, &weeks);
    let reduced = reduce(&full);

    info!(
        source = %source,
        rows_in = raw.len(),
        dropped = normalized.dropped,
        weeks = weeks.len(),
        rows_out = full.len(),
        "Source processed"
    );

    Ok(SourceReport {
        full,
        reduced,
        dropped: normalized.dropped,
    })
}

/// Loads `source` (or `input` when given), processes it and writes both
/// tables under `base_dir`.
#[tracing::instrument(skip(client, base_dir), fields(base_dir = %base_dir.display()))]
pub async fn run_source<C: HttpClient>(
    client: &C,
    source: Source,
    input: Option<&str>,
    base_dir: &Path,
    today: NaiveDate,
    scheme: WeekScheme,
) -> Result<OutputPaths> {
    let location = input.unwrap_or(source.url());
    info!(%location, "Loading source");

    let bytes = load_bytes(client, location).await?;
    let raw = parse_raw_records(&bytes)?;
    let report = process(&raw, source, scheme)?;

    let run_dir = prepare_run_dir(base_dir, source, today)?;
    let paths = OutputPaths::new(&run_dir, source);
    write_table(&paths.full, &report.full)?;
    write_table(&paths.reduced, &report.reduced)?;

    info!(
        full = %paths.full.display(),
        reduced = %paths.reduced.display(),
        "Tables written"
    );
    Ok(paths)
}
