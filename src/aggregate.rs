//! Weekly totals per age bucket and week-over-week change.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::normalize::NormalizedRecord;
use crate::output::CsvTable;
use crate::source::AgeBucket;
use crate::weeks::ReconciledWeek;

/// One row of the full ("sabana") table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyRow {
    #[serde(rename = "grupo_etario")]
    pub age_bucket: AgeBucket,
    #[serde(rename = "semana")]
    pub week_id: i64,
    #[serde(rename = "semana_texto")]
    pub week_label: String,
    #[serde(rename = "largo_semana")]
    pub week_length_days: i64,
    #[serde(rename = "inicio_semana")]
    pub week_start: NaiveDate,
    #[serde(rename = "fin_semana")]
    pub week_end: NaiveDate,
    #[serde(rename = "casos_totales")]
    pub total_cases: u64,
    #[serde(rename = "casos_diarios_promedio")]
    pub avg_daily_cases: u64,
    #[serde(rename = "promedio_final_df_ant")]
    pub prev_avg: Option<u64>,
    #[serde(rename = "diferencia_promedios")]
    pub avg_difference: Option<i64>,
    #[serde(rename = "cambio_porcentual")]
    pub pct_change_vs_prev: Option<f64>,
}

/// One row of the reduced report; always a projection of a [`WeeklyRow`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReducedRow {
    #[serde(rename = "grupo_etario")]
    pub age_bucket: AgeBucket,
    #[serde(rename = "semana")]
    pub week_id: i64,
    #[serde(rename = "semana_texto")]
    pub week_label: String,
    #[serde(rename = "inicio_semana")]
    pub week_start: NaiveDate,
    #[serde(rename = "casos_totales")]
    pub total_cases: u64,
    #[serde(rename = "casos_diarios_promedio")]
    pub avg_daily_cases: u64,
    #[serde(rename = "cambio_porcentual")]
    pub pct_change_vs_prev: Option<f64>,
}

impl CsvTable for WeeklyRow {
    const COLUMNS: &'static [&'static str] = &[
        "grupo_etario",
        "semana",
        "semana_texto",
        "largo_semana",
        "inicio_semana",
        "fin_semana",
        "casos_totales",
        "casos_diarios_promedio",
        "promedio_final_df_ant",
        "diferencia_promedios",
        "cambio_porcentual",
    ];
}

impl CsvTable for ReducedRow {
    const COLUMNS: &'static [&'static str] = &[
        "grupo_etario",
        "semana",
        "semana_texto",
        "inicio_semana",
        "casos_totales",
        "casos_diarios_promedio",
        "cambio_porcentual",
    ];
}

impl From<&WeeklyRow> for ReducedRow {
    fn from(row: &WeeklyRow) -> Self {
        ReducedRow {
            age_bucket: row.age_bucket,
            week_id: row.week_id,
            week_label: row.week_label.clone(),
            week_start: row.week_start,
            total_cases: row.total_cases,
            avg_daily_cases: row.avg_daily_cases,
            pct_change_vs_prev: row.pct_change_vs_prev,
        }
    }
}

/// Percent change from `prev` to `curr`, rounded half to even at two decimals.
///
/// `None` when there is no previous value or it is zero.
pub fn pct_change(prev: Option<u64>, curr: u64) -> Option<f64> {
    let prev = prev.filter(|p| *p != 0)? as f64;
    let pct = (curr as f64 - prev) / prev * 100.0;
    Some((pct * 100.0).round_ties_even() / 100.0)
}

/// Sums cases per (age bucket, week) and derives averages and changes.
///
/// `week_ids[i]` is the week of `records[i]`. Rows come out ordered by age
/// bucket then week id. The change column compares each row with the row
/// just before it in that order, so the first week of a bucket is compared
/// with the last week of the previous bucket.
pub fn aggregate(
    records: &[NormalizedRecord],
    week_ids: &[i64],
    weeks: &BTreeMap<i64, ReconciledWeek>,
) -> Vec<WeeklyRow> {
    let mut totals: BTreeMap<(AgeBucket, i64), u64> = BTreeMap::new();
    for (record, week_id) in records.iter().zip(week_ids) {
        *totals.entry((record.age_bucket, *week_id)).or_default() += record.case_count;
    }

    let mut rows = Vec::with_capacity(totals.len());
    let mut prev_avg: Option<u64> = None;

    for ((age_bucket, week_id), total_cases) in totals {
        // `reconcile` builds `weeks` from the same ids as `week_ids`, so every
        // grouped id has an entry.
        let Some(week) = weeks.get(&week_id) else {
            continue;
        };
        let week_length_days = week.length_days();
        let avg_daily_cases = total_cases / week_length_days.max(1) as u64;

        rows.push(WeeklyRow {
            age_bucket,
            week_id,
            week_label: week.label(),
            week_length_days,
            week_start: week.start,
            week_end: week.end,
            total_cases,
            avg_daily_cases,
            prev_avg,
            avg_difference: prev_avg.map(|p| avg_daily_cases as i64 - p as i64),
            pct_change_vs_prev: pct_change(prev_avg, avg_daily_cases),
        });

        prev_avg = Some(avg_daily_cases);
    }

    rows
}

/// Projects the full table onto the reduced report columns.
pub fn reduce(rows: &[WeeklyRow]) -> Vec<ReducedRow> {
    rows.iter().map(ReducedRow::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::sunday_week_number;
    use crate::weeks::{WeekScheme, reconcile};
    use chrono::Datelike;

    fn record(date: &str, age_bucket: AgeBucket, case_count: u64) -> NormalizedRecord {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        NormalizedRecord {
            date,
            raw_week_number: sunday_week_number(date),
            year: date.year(),
            age_bucket,
            case_count,
        }
    }

    fn run(records: &[NormalizedRecord]) -> Vec<WeeklyRow> {
        let (ids, weeks) = reconcile(records, WeekScheme::Legacy);
        aggregate(records, &ids, &weeks)
    }

    #[test]
    fn test_pct_change() {
        assert_eq!(pct_change(None, 5), None);
        assert_eq!(pct_change(Some(0), 5), None);
        assert_eq!(pct_change(Some(10), 15), Some(50.0));
        assert_eq!(pct_change(Some(3), 1), Some(-66.67));
        assert_eq!(pct_change(Some(7), 7), Some(0.0));
    }

    #[test]
    fn test_pct_change_rounds_half_to_even() {
        assert_eq!(pct_change(Some(32), 33), Some(3.12));
        assert_eq!(pct_change(Some(160), 161), Some(0.62));
        assert_eq!(pct_change(Some(8), 9), Some(12.5));
    }

    #[test]
    fn test_single_week_totals() {
        // Tuesday through Thursday of the same Sunday-Saturday week.
        let records = vec![
            record("2020-06-02", AgeBucket::Under50, 2),
            record("2020-06-03", AgeBucket::Under50, 3),
            record("2020-06-04", AgeBucket::Under50, 5),
        ];
        let rows = run(&records);

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.total_cases, 10);
        assert_eq!(row.week_length_days, 3);
        assert_eq!(row.avg_daily_cases, 3);
        assert_eq!(row.prev_avg, None);
        assert_eq!(row.avg_difference, None);
        assert_eq!(row.pct_change_vs_prev, None);
    }

    #[test]
    fn test_average_truncates() {
        let mut records = Vec::new();
        for day in 7..=13 {
            let cases = if day == 7 { 10 } else { 0 };
            records.push(record(&format!("2020-06-{day:02}"), AgeBucket::Over70, cases));
        }
        let rows = run(&records);

        assert_eq!(rows[0].week_length_days, 7);
        assert_eq!(rows[0].total_cases, 10);
        assert_eq!(rows[0].avg_daily_cases, 1);
    }

    #[test]
    fn test_boundary_week_is_one_row() {
        let records = vec![
            record("2020-12-28", AgeBucket::Under50, 4),
            record("2021-01-02", AgeBucket::Under50, 6),
        ];
        let rows = run(&records);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].week_id, 52);
        assert_eq!(rows[0].total_cases, 10);
        assert_eq!(rows[0].week_label, "28 Dec - 02 Jan 21");
    }

    #[test]
    fn test_change_crosses_age_buckets() {
        // Two full weeks for two buckets, one row per day.
        let mut records = Vec::new();
        for day in 7..=20 {
            let date = format!("2020-06-{day:02}");
            let first_week = day <= 13;
            records.push(record(&date, AgeBucket::Under50, if first_week { 10 } else { 15 }));
            records.push(record(&date, AgeBucket::From50To69, if first_week { 4 } else { 2 }));
        }
        let rows = run(&records);

        let order: Vec<_> = rows.iter().map(|r| (r.age_bucket, r.week_id)).collect();
        assert_eq!(
            order,
            vec![
                (AgeBucket::From50To69, 23),
                (AgeBucket::From50To69, 24),
                (AgeBucket::Under50, 23),
                (AgeBucket::Under50, 24),
            ]
        );

        let avgs: Vec<_> = rows.iter().map(|r| r.avg_daily_cases).collect();
        assert_eq!(avgs, vec![4, 2, 10, 15]);

        assert_eq!(rows[0].pct_change_vs_prev, None);
        assert_eq!(rows[1].pct_change_vs_prev, Some(-50.0));
        // First <50 row is compared with the last 50-69 row.
        assert_eq!(rows[2].prev_avg, Some(2));
        assert_eq!(rows[2].avg_difference, Some(8));
        assert_eq!(rows[2].pct_change_vs_prev, Some(400.0));
        assert_eq!(rows[3].pct_change_vs_prev, Some(50.0));
    }

    #[test]
    fn test_zero_previous_average_gives_null() {
        let records = vec![
            record("2020-06-07", AgeBucket::Under50, 0),
            record("2020-06-14", AgeBucket::Under50, 8),
        ];
        let rows = run(&records);

        assert_eq!(rows[1].prev_avg, Some(0));
        assert_eq!(rows[1].avg_difference, Some(8));
        assert_eq!(rows[1].pct_change_vs_prev, None);
    }

    #[test]
    fn test_totals_are_exact_sums() {
        let records = vec![
            record("2020-06-08", AgeBucket::Over70, 1),
            record("2020-06-08", AgeBucket::Over70, 2),
            record("2020-06-09", AgeBucket::Over70, 3),
            record("2020-06-09", AgeBucket::Under50, 100),
        ];
        let rows = run(&records);

        let over70 = rows.iter().find(|r| r.age_bucket == AgeBucket::Over70).unwrap();
        let under50 = rows.iter().find(|r| r.age_bucket == AgeBucket::Under50).unwrap();
        assert_eq!(over70.total_cases, 6);
        assert_eq!(under50.total_cases, 100);
        assert_eq!(rows.iter().map(|r| r.total_cases).sum::<u64>(), 106);
    }

    #[test]
    fn test_reduce_is_projection() {
        let records = vec![
            record("2020-06-08", AgeBucket::Under50, 7),
            record("2020-06-15", AgeBucket::Under50, 14),
        ];
        let rows = run(&records);
        let reduced = reduce(&rows);

        assert_eq!(reduced.len(), rows.len());
        for (full, short) in rows.iter().zip(&reduced) {
            assert_eq!(short.age_bucket, full.age_bucket);
            assert_eq!(short.week_id, full.week_id);
            assert_eq!(short.week_label, full.week_label);
            assert_eq!(short.week_start, full.week_start);
            assert_eq!(short.total_cases, full.total_cases);
            assert_eq!(short.avg_daily_cases, full.avg_daily_cases);
            assert_eq!(short.pct_change_vs_prev, full.pct_change_vs_prev);
        }
    }

    #[test]
    fn test_every_record_reaches_a_row() {
        let mut records = Vec::new();
        let mut date = NaiveDate::from_ymd_opt(2020, 11, 1).unwrap();
        let mut expected = 0;
        let mut n = 0u64;
        while date < NaiveDate::from_ymd_opt(2021, 2, 1).unwrap() {
            for bucket in [AgeBucket::Under50, AgeBucket::From50To69, AgeBucket::Over70] {
                n += 1;
                expected += n;
                records.push(record(&date.format("%Y-%m-%d").to_string(), bucket, n));
            }
            date = date.succ_opt().unwrap();
        }
        let rows = run(&records);

        assert_eq!(rows.iter().map(|r| r.total_cases).sum::<u64>(), expected);
        assert_eq!(rows[0].prev_avg, None);
        for pair in rows.windows(2) {
            assert_eq!(pair[1].prev_avg, Some(pair[0].avg_daily_cases));
        }
    }

    fn serialized_header<T: CsvTable>(row: &T) -> Vec<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(row).unwrap();
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let header = text.lines().next().unwrap().to_string();
        header.split(',').map(str::to_string).collect()
    }

    #[test]
    fn test_columns_match_serialized_fields() {
        let rows = run(&[record("2020-06-08", AgeBucket::Under50, 7)]);
        assert_eq!(serialized_header(&rows[0]), WeeklyRow::COLUMNS);

        let reduced = reduce(&rows);
        assert_eq!(serialized_header(&reduced[0]), ReducedRow::COLUMNS);
    }

    #[test]
    fn test_empty_input() {
        assert!(run(&[]).is_empty());
    }
}
