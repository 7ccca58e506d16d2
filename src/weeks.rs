//! Week reconciliation across the year boundary and week-span labels.

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use std::collections::BTreeMap;

use crate::normalize::NormalizedRecord;

/// How calendar weeks are turned into report week ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum WeekScheme {
    /// Shift 2021 weeks by 53 and fold the first 2021 week into the last
    /// 2020 week. Only valid for data spanning 2020 and 2021.
    #[default]
    Legacy,
    /// Whole Sunday-started weeks counted from Sunday 2019-12-29. Agrees with
    /// `Legacy` for every 2020 and 2021 date and keeps counting afterwards.
    Continuous,
}

/// Year whose weeks are shifted under [`WeekScheme::Legacy`].
const SHIFTED_YEAR: i32 = 2021;
const SHIFT: i64 = 53;

/// Sunday before 2020-01-01, week 0 of [`WeekScheme::Continuous`].
const CONTINUOUS_ANCHOR: (i32, u32, u32) = (2019, 12, 29);

impl WeekScheme {
    /// Report week id for one record.
    pub fn week_id(&self, record: &NormalizedRecord) -> i64 {
        match self {
            WeekScheme::Legacy => {
                let mut week = i64::from(record.raw_week_number);
                if record.year == SHIFTED_YEAR {
                    week += SHIFT;
                }
                if week >= SHIFT {
                    week -= 1;
                }
                week
            }
            WeekScheme::Continuous => {
                let (y, m, d) = CONTINUOUS_ANCHOR;
                let anchor = NaiveDate::from_ymd_opt(y, m, d)
                    .map(|a| a.num_days_from_ce())
                    .unwrap_or_default();
                i64::from(record.date.num_days_from_ce() - anchor).div_euclid(7)
            }
        }
    }
}

/// A report week: the dates actually observed under one week id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledWeek {
    pub week_id: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReconciledWeek {
    /// Days covered, counting both ends.
    pub fn length_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// `"27 Dec - 02 Jan 21"`.
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            self.start.format("%d %b"),
            self.end.format("%d %b %y")
        )
    }
}

/// Assigns week ids and computes the span of each week.
///
/// Returns the week id of every record, in input order, and the weeks keyed
/// by id. A week's span is the earliest and latest date among the records
/// sharing its id, whatever their age bucket.
pub fn reconcile(
    records: &[NormalizedRecord],
    scheme: WeekScheme,
) -> (Vec<i64>, BTreeMap<i64, ReconciledWeek>) {
    let mut ids = Vec::with_capacity(records.len());
    let mut weeks: BTreeMap<i64, ReconciledWeek> = BTreeMap::new();

    for record in records {
        let week_id = scheme.week_id(record);
        ids.push(week_id);

        weeks
            .entry(week_id)
            .and_modify(|w| {
                w.start = w.start.min(record.date);
                w.end = w.end.max(record.date);
            })
            .or_insert(ReconciledWeek {
                week_id,
                start: record.date,
                end: record.date,
            });
    }

    (ids, weeks)
}
