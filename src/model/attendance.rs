use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One employee's attendance for one calendar day.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attendance {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
}

impl Attendance {
    /// Checked in and waiting for a check-out.
    pub fn is_open(&self) -> bool {
        self.check_in.is_some() && self.check_out.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(check_in: Option<u32>, check_out: Option<u32>) -> Attendance {
        let at = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        Attendance {
            id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            check_in: check_in.map(at),
            check_out: check_out.map(at),
        }
    }

    #[test]
    fn open_only_between_check_in_and_check_out() {
        assert!(record(Some(9), None).is_open());
        assert!(!record(Some(9), Some(17)).is_open());
        assert!(!record(None, Some(17)).is_open());
    }
}
