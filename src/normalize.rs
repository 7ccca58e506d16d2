//! Date parsing, Sunday-based week numbering and age re-bucketing.

use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::parser::RawRecord;
use crate::source::{AgeBucket, Source};

/// A raw row after parsing and re-bucketing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub date: NaiveDate,
    pub raw_week_number: u32,
    pub year: i32,
    pub age_bucket: AgeBucket,
    pub case_count: u64,
}

/// Normalized rows plus how many rows had an age label the source does not map.
#[derive(Debug, Default)]
pub struct NormalizeReport {
    pub records: Vec<NormalizedRecord>,
    pub dropped: usize,
}

/// Week of the year with Sunday as the first day, as `strftime("%U")`.
///
/// Days before the year's first Sunday fall in week 0.
pub fn sunday_week_number(date: NaiveDate) -> u32 {
    let yday = date.ordinal0();
    let wday = date.weekday().num_days_from_sunday();
    (yday + 7 - wday) / 7
}

/// Parses a `YYYY-MM-DD` date, ignoring any trailing time component.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let day = value.trim().split([' ', 'T']).next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Converts raw rows into [`NormalizedRecord`]s for `source`.
///
/// Rows whose age label is not in the source's map are dropped and counted.
/// A missing case count is taken as zero.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidDate`] for the first unparsable date.
pub fn normalize(raw: &[RawRecord], source: Source) -> Result<NormalizeReport, PipelineError> {
    let mut report = NormalizeReport {
        records: Vec::with_capacity(raw.len()),
        dropped: 0,
    };

    for (i, row) in raw.iter().enumerate() {
        let date = parse_date(&row.date).ok_or_else(|| PipelineError::InvalidDate {
            value: row.date.clone(),
            row: i + 1,
        })?;

        let Some(age_bucket) = source.bucket_for(&row.age_group) else {
            report.dropped += 1;
            continue;
        };

        report.records.push(NormalizedRecord {
            date,
            raw_week_number: sunday_week_number(date),
            year: date.year(),
            age_bucket,
            case_count: row.cases.unwrap_or(0),
        });
    }

    if report.dropped > 0 {
        warn!(
            source = %source,
            dropped = report.dropped,
            "Rows with unmapped age group dropped"
        );
    }
    debug!(source = %source, kept = report.records.len(), "Rows normalized");

    Ok(report)
}
