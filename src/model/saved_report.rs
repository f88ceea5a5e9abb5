use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SavedReport {
    pub id: Uuid,
    pub name: String,
    pub generated_at: DateTime<Utc>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub employee_id: Option<Uuid>,
    /// Set when the report was limited to specific employees, even if they were deleted since.
    pub has_employee_filter: bool,
    /// Name of the administrator who saved it.
    pub generated_by: String,
}
