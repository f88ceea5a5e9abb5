use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkSchedule {
    pub id: Uuid,
    pub employee_id: Uuid,
    /// 0 = Sunday .. 6 = Saturday
    pub weekday: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// One working window of the week, as sent and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScheduleEntry {
    #[schema(example = 1, minimum = 0, maximum = 6)]
    pub weekday: u8,
    #[schema(example = "09:00:00", value_type = String, format = "time")]
    pub start_time: NaiveTime,
    #[schema(example = "18:00:00", value_type = String, format = "time")]
    pub end_time: NaiveTime,
}

impl ScheduleEntry {
    pub fn validate(&self) -> Result<(), String> {
        if self.weekday > 6 {
            return Err(format!(
                "weekday must be between 0 (Sunday) and 6 (Saturday), got {}",
                self.weekday
            ));
        }
        if self.start_time >= self.end_time {
            return Err(format!(
                "start_time must be before end_time on weekday {}",
                self.weekday
            ));
        }
        Ok(())
    }
}

impl From<WorkSchedule> for ScheduleEntry {
    fn from(s: WorkSchedule) -> Self {
        Self {
            weekday: s.weekday,
            start_time: s.start_time,
            end_time: s.end_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(weekday: u8, start: (u32, u32), end: (u32, u32)) -> ScheduleEntry {
        ScheduleEntry {
            weekday,
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        }
    }

    #[test]
    fn accepts_regular_window() {
        assert!(entry(1, (9, 0), (18, 0)).validate().is_ok());
    }

    #[test]
    fn rejects_weekday_out_of_range() {
        assert!(entry(7, (9, 0), (18, 0)).validate().is_err());
    }

    #[test]
    fn rejects_inverted_or_empty_window() {
        assert!(entry(2, (18, 0), (9, 0)).validate().is_err());
        assert!(entry(2, (9, 0), (9, 0)).validate().is_err());
    }
}
