//! CSV parser for the age-group time series.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;

/// One row of the upstream table, exactly as published.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "Grupo de edad")]
    pub age_group: String,
    #[serde(rename = "Casos confirmados")]
    pub cases: Option<u64>,
}

/// Decodes UTF-8 CSV bytes with a header row into [`RawRecord`]s.
///
/// Columns other than `fecha`, `Grupo de edad` and `Casos confirmados` are
/// ignored. An empty case count decodes to `None`.
///
/// # Errors
///
/// Returns an error if a required column is missing or a case count is not
/// a non-negative integer.
pub fn parse_raw_records(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(bytes);

    let mut records = Vec::new();
    for (i, result) in rdr.deserialize().enumerate() {
        let record: RawRecord = result.with_context(|| format!("decoding CSV row {}", i + 1))?;
        records.push(record);
    }

    Ok(records)
}
