use chrono::{Duration, NaiveDate, NaiveTime};
use serde::Serialize;
use utoipa::ToSchema;

use super::{ReportRequest, ReportRow};

pub const NOT_AVAILABLE: &str = "N/A";

/// Aggregates printed in the parameter block of a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub employee_label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub earliest_check_in: Option<NaiveTime>,
    pub latest_check_out: Option<NaiveTime>,
    pub total_worked: Duration,
    pub record_count: usize,
}

pub fn summarize(request: &ReportRequest, rows: &[ReportRow]) -> ReportSummary {
    let employee_label = if request.has_employee_filter() && !rows.is_empty() {
        let mut names: Vec<&str> = Vec::new();
        for row in rows {
            if !names.contains(&row.employee_name.as_str()) {
                names.push(&row.employee_name);
            }
        }
        names.join(", ")
    } else {
        "All".to_string()
    };

    let earliest_check_in = rows.iter().filter_map(|r| r.check_in).map(|t| t.time()).min();
    let latest_check_out = rows.iter().filter_map(|r| r.check_out).map(|t| t.time()).max();

    let total_worked = rows
        .iter()
        .filter_map(|r| Some(r.check_out? - r.check_in?))
        .filter(|d| *d > Duration::zero())
        .fold(Duration::zero(), |acc, d| acc + d);

    ReportSummary {
        employee_label,
        start_date: request.start_date,
        end_date: request.end_date,
        earliest_check_in,
        latest_check_out,
        total_worked,
        record_count: rows.len(),
    }
}

impl ReportSummary {
    /// Largest whole unit: `8 h`, `45 m` or `30 s`.
    pub fn compact_total(&self) -> String {
        let secs = self.total_worked.num_seconds();
        if secs >= 3600 {
            format!("{} h", secs / 3600)
        } else if secs >= 60 {
            format!("{} m", secs / 60)
        } else {
            format!("{} s", secs)
        }
    }

    /// `HH:MM:SS`; hours are not wrapped at 24.
    pub fn long_total(&self) -> String {
        let secs = self.total_worked.num_seconds();
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }

    pub fn earliest_check_in_display(&self) -> String {
        time_or_na(self.earliest_check_in)
    }

    pub fn latest_check_out_display(&self) -> String {
        time_or_na(self.latest_check_out)
    }
}

fn time_or_na(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryResponse {
    #[schema(example = "All")]
    pub employee_label: String,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    #[schema(example = "08:02")]
    pub earliest_check_in: String,
    #[schema(example = "18:40")]
    pub latest_check_out: String,
    pub total_worked_seconds: i64,
    #[schema(example = "41 h")]
    pub total_compact: String,
    #[schema(example = "41:12:09")]
    pub total_long: String,
    pub record_count: usize,
}

impl From<&ReportSummary> for SummaryResponse {
    fn from(s: &ReportSummary) -> Self {
        SummaryResponse {
            employee_label: s.employee_label.clone(),
            start_date: s.start_date,
            end_date: s.end_date,
            earliest_check_in: s.earliest_check_in_display(),
            latest_check_out: s.latest_check_out_display(),
            total_worked_seconds: s.total_worked.num_seconds(),
            total_compact: s.compact_total(),
            total_long: s.long_total(),
            record_count: s.record_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn row(name: &str, check_in: Option<(u32, u32, u32)>, check_out: Option<(u32, u32, u32)>) -> ReportRow {
        let at = |(h, m, s): (u32, u32, u32)| day().and_hms_opt(h, m, s).unwrap();
        ReportRow {
            employee_id: Uuid::new_v4(),
            employee_name: name.to_string(),
            date: day(),
            check_in: check_in.map(at),
            check_out: check_out.map(at),
        }
    }

    fn request(filtered: bool) -> ReportRequest {
        ReportRequest {
            start_date: day(),
            end_date: day(),
            employee_id: filtered.then(Uuid::new_v4),
            employee_ids: vec![],
        }
    }

    fn worked(secs: i64) -> ReportSummary {
        ReportSummary {
            employee_label: "All".into(),
            start_date: day(),
            end_date: day(),
            earliest_check_in: None,
            latest_check_out: None,
            total_worked: Duration::seconds(secs),
            record_count: 0,
        }
    }

    #[test]
    fn totals_only_complete_positive_pairs() {
        let rows = vec![
            row("Ann", Some((9, 0, 0)), Some((17, 30, 0))),
            row("Ann", Some((8, 0, 0)), None),
            row("Ben", None, Some((18, 0, 0))),
            row("Ben", Some((12, 0, 0)), Some((11, 0, 0))),
        ];

        let summary = summarize(&request(false), &rows);

        assert_eq!(summary.total_worked, Duration::minutes(8 * 60 + 30));
        assert_eq!(summary.earliest_check_in, NaiveTime::from_hms_opt(8, 0, 0));
        assert_eq!(summary.latest_check_out, NaiveTime::from_hms_opt(18, 0, 0));
        assert_eq!(summary.record_count, 4);
    }

    #[test]
    fn label_is_all_without_filter() {
        let rows = vec![row("Ann", None, None)];
        assert_eq!(summarize(&request(false), &rows).employee_label, "All");
    }

    #[test]
    fn label_is_all_when_filter_matches_nothing() {
        assert_eq!(summarize(&request(true), &[]).employee_label, "All");
    }

    #[test]
    fn label_joins_distinct_names_in_row_order() {
        let rows = vec![
            row("Ann", None, None),
            row("Ann", None, None),
            row("Ben", None, None),
        ];
        assert_eq!(summarize(&request(true), &rows).employee_label, "Ann, Ben");
    }

    #[test]
    fn empty_rows_show_not_available() {
        let summary = summarize(&request(false), &[]);
        assert_eq!(summary.earliest_check_in_display(), "N/A");
        assert_eq!(summary.latest_check_out_display(), "N/A");
        assert_eq!(summary.compact_total(), "0 s");
        assert_eq!(summary.long_total(), "00:00:00");
    }

    #[test]
    fn compact_total_uses_largest_whole_unit() {
        assert_eq!(worked(59).compact_total(), "59 s");
        assert_eq!(worked(60).compact_total(), "1 m");
        assert_eq!(worked(3599).compact_total(), "59 m");
        assert_eq!(worked(3600).compact_total(), "1 h");
        assert_eq!(worked(30 * 3600 + 59 * 60).compact_total(), "30 h");
    }

    #[test]
    fn long_total_does_not_wrap_hours() {
        assert_eq!(worked(3725).long_total(), "01:02:05");
        assert_eq!(worked(100 * 3600 + 7).long_total(), "100:00:07");
    }

    #[test]
    fn display_times_are_hours_and_minutes() {
        let rows = vec![row("Ann", Some((7, 5, 59)), Some((19, 45, 1)))];
        let summary = summarize(&request(false), &rows);
        assert_eq!(summary.earliest_check_in_display(), "07:05");
        assert_eq!(summary.latest_check_out_display(), "19:45");
    }
}
