pub mod export;
pub mod history;
pub mod query;
pub mod summary;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;

/// Date range and optional employee filter shared by every report operation.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReportRequest {
    #[serde(deserialize_with = "date_or_datetime")]
    #[schema(value_type = String, format = "date", example = "2026-03-01")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "date_or_datetime")]
    #[schema(value_type = String, format = "date", example = "2026-03-31")]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub employee_id: Option<Uuid>,
    #[serde(default)]
    pub employee_ids: Vec<Uuid>,
}

impl ReportRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.start_date > self.end_date {
            return Err(ApiError::bad_request(
                "Start date must be on or before end date",
            ));
        }
        Ok(())
    }

    /// Union of `employee_id` and `employee_ids`, first occurrence wins.
    /// Empty means every employee.
    pub fn selected_employees(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = Vec::with_capacity(self.employee_ids.len() + 1);
        for id in self.employee_id.iter().chain(self.employee_ids.iter()) {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }

    pub fn has_employee_filter(&self) -> bool {
        self.employee_id.is_some() || !self.employee_ids.is_empty()
    }
}

/// One attendance record shaped for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReportRow {
    pub employee_id: Uuid,
    pub employee_name: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out: Option<NaiveDateTime>,
}

/// Accepts `2026-03-01` as well as the `2026-03-01T00:00:00` form date pickers send.
fn date_or_datetime<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let date_part = raw.trim().get(..10).unwrap_or(raw.trim());
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(serde::de::Error::custom)
}
