use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;

/// One check-in/check-out session within a daily attendance record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceEntry {
    #[schema(value_type = String, format = "date-time")]
    pub check_in: DateTime<Utc>,
    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub check_out: Option<DateTime<Utc>>,
    pub lat_in: f64,
    pub lng_in: f64,
    pub lat_out: f64,
    pub lng_out: f64,
    pub location_in: String,
    pub location_out: String,
    pub note_in: String,
    pub note_out: String,
}

/// Daily attendance document: one row per (employee, date), sessions kept
/// as an ordered JSON list. At most one entry may have a null check_out.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,
    pub date: NaiveDate,
    pub entries: Json<Vec<AttendanceEntry>>,
    pub total_hours: f64,
}

impl Attendance {
    pub fn has_open_entry(&self) -> bool {
        self.entries.iter().any(|e| e.check_out.is_none())
    }

    pub fn open_entry_mut(&mut self) -> Option<&mut AttendanceEntry> {
        self.entries.0.iter_mut().find(|e| e.check_out.is_none())
    }

    /// Recompute total_hours from closed check-in/check-out pairs.
    pub fn calculate_total_hours(&mut self) -> f64 {
        let total_seconds: i64 = self
            .entries
            .iter()
            .filter_map(|e| e.check_out.map(|co| (co - e.check_in).num_seconds()))
            .sum();
        self.total_hours = round2(total_seconds as f64 / 3600.0);
        self.total_hours
    }

    /// Human-readable duration, e.g. "3h 25m".
    pub fn total_duration_display(&self) -> String {
        let hours = self.total_hours as i64;
        let minutes = ((self.total_hours - hours as f64) * 60.0) as i64;
        if hours > 0 {
            format!("{}h {}m", hours, minutes)
        } else {
            format!("{}m", minutes)
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(check_in: DateTime<Utc>, check_out: Option<DateTime<Utc>>) -> AttendanceEntry {
        AttendanceEntry {
            check_in,
            check_out,
            lat_in: 0.0,
            lng_in: 0.0,
            lat_out: 0.0,
            lng_out: 0.0,
            location_in: String::new(),
            location_out: String::new(),
            note_in: String::new(),
            note_out: String::new(),
        }
    }

    fn record(entries: Vec<AttendanceEntry>) -> Attendance {
        Attendance {
            id: 1,
            employee_id: 1,
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            entries: Json(entries),
            total_hours: 0.0,
        }
    }

    #[test]
    fn total_hours_sums_closed_pairs_only() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2026, 1, 5, 12, 30, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2026, 1, 5, 13, 0, 0).unwrap();

        let mut att = record(vec![entry(t0, Some(t1)), entry(t2, None)]);
        assert_eq!(att.calculate_total_hours(), 3.5);
        assert!(att.has_open_entry());
    }

    #[test]
    fn total_hours_rounds_to_two_decimals() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2026, 1, 5, 9, 10, 0).unwrap();

        let mut att = record(vec![entry(t0, Some(t1))]);
        assert_eq!(att.calculate_total_hours(), 0.17);
    }

    #[test]
    fn duration_display_formats() {
        let mut att = record(vec![]);
        att.total_hours = 3.42;
        assert_eq!(att.total_duration_display(), "3h 25m");

        att.total_hours = 0.5;
        assert_eq!(att.total_duration_display(), "30m");
    }

    #[test]
    fn open_entry_lookup_finds_active_session() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap();

        let mut att = record(vec![entry(t0, Some(t1))]);
        assert!(att.open_entry_mut().is_none());

        att.entries.0.push(entry(t1, None));
        assert!(att.open_entry_mut().is_some());
    }
}
