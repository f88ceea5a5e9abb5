use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

use super::ReportRequest;
use crate::error::ApiError;
use crate::model::saved_report::SavedReport;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveReportRequest {
    #[schema(example = "March attendance")]
    pub name: String,
    #[serde(flatten)]
    pub filter: ReportRequest,
}

impl SaveReportRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::bad_request("Report name is required"));
        }
        self.filter.validate()
    }
}

/// History entry as shown to administrators.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SavedReportEntry {
    pub id: Uuid,
    pub name: String,
    /// Generation date in server local time, `dd/mm/YYYY`
    #[schema(example = "09/03/2026")]
    pub date: String,
    #[schema(value_type = String, format = "date-time")]
    pub generated_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub employee_id: Option<Uuid>,
    pub employee_ids: Vec<Uuid>,
    pub generated_by: String,
    #[serde(skip)]
    pub has_employee_filter: bool,
}

impl SavedReportEntry {
    fn new(report: SavedReport, employee_ids: Vec<Uuid>) -> Self {
        SavedReportEntry {
            date: report
                .generated_at
                .with_timezone(&Local)
                .format("%d/%m/%Y")
                .to_string(),
            id: report.id,
            name: report.name,
            generated_at: report.generated_at,
            start_date: report.start_date,
            end_date: report.end_date,
            employee_id: report.employee_id,
            employee_ids,
            generated_by: report.generated_by,
            has_employee_filter: report.has_employee_filter,
        }
    }

    /// Parameters to re-run the report with.
    pub fn to_request(&self) -> ReportRequest {
        ReportRequest {
            start_date: self.start_date,
            end_date: self.end_date,
            employee_id: self.employee_id,
            employee_ids: self.employee_ids.clone(),
        }
    }

    /// True when every employee the report was limited to has since been deleted.
    pub fn selection_is_gone(&self) -> bool {
        self.has_employee_filter && self.employee_id.is_none() && self.employee_ids.is_empty()
    }
}

const SELECT_REPORT: &str = r#"
    SELECT id, name, generated_at, start_date, end_date, employee_id, has_employee_filter, generated_by
    FROM saved_reports
"#;

pub async fn save(
    pool: &SqlitePool,
    request: &SaveReportRequest,
    generated_by: &str,
    generated_at: DateTime<Utc>,
) -> Result<SavedReportEntry, sqlx::Error> {
    let report = SavedReport {
        id: Uuid::new_v4(),
        name: request.name.trim().to_string(),
        generated_at,
        start_date: request.filter.start_date,
        end_date: request.filter.end_date,
        employee_id: request.filter.employee_id,
        has_employee_filter: request.filter.has_employee_filter(),
        generated_by: generated_by.to_string(),
    };
    let employee_ids = request.filter.selected_employees();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO saved_reports
        (id, name, generated_at, start_date, end_date, employee_id, has_employee_filter, generated_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(report.id)
    .bind(&report.name)
    .bind(report.generated_at)
    .bind(report.start_date)
    .bind(report.end_date)
    .bind(report.employee_id)
    .bind(report.has_employee_filter)
    .bind(&report.generated_by)
    .execute(&mut *tx)
    .await?;

    for employee_id in &employee_ids {
        sqlx::query("INSERT INTO saved_report_employees (report_id, employee_id) VALUES (?, ?)")
            .bind(report.id)
            .bind(employee_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(SavedReportEntry::new(report, employee_ids))
}

/// Selected ids with no employee row behind them.
pub async fn missing_employees(pool: &SqlitePool, ids: &[Uuid]) -> Result<Vec<Uuid>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT id FROM employees WHERE id IN (");
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let found: Vec<Uuid> = query
        .build_query_scalar::<Uuid>()
        .fetch_all(pool)
        .await?;
    Ok(ids.iter().filter(|id| !found.contains(id)).copied().collect())
}

async fn selections(
    pool: &SqlitePool,
    report_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Uuid>>, sqlx::Error> {
    let mut map: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    if report_ids.is_empty() {
        return Ok(map);
    }

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT report_id, employee_id FROM saved_report_employees WHERE report_id IN (",
    );
    let mut ids = query.separated(", ");
    for id in report_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(")");

    let pairs = query
        .build_query_as::<(Uuid, Uuid)>()
        .fetch_all(pool)
        .await?;
    for (report_id, employee_id) in pairs {
        map.entry(report_id).or_default().push(employee_id);
    }
    Ok(map)
}

/// Saved reports, newest first.
pub async fn list(pool: &SqlitePool) -> Result<Vec<SavedReportEntry>, sqlx::Error> {
    let sql = format!("{SELECT_REPORT} ORDER BY generated_at DESC");
    let reports = sqlx::query_as::<_, SavedReport>(&sql).fetch_all(pool).await?;

    let ids: Vec<Uuid> = reports.iter().map(|r| r.id).collect();
    let mut selected = selections(pool, &ids).await?;

    Ok(reports
        .into_iter()
        .map(|r| {
            let employees = selected.remove(&r.id).unwrap_or_default();
            SavedReportEntry::new(r, employees)
        })
        .collect())
}

pub async fn find(pool: &SqlitePool, id: Uuid) -> Result<Option<SavedReportEntry>, sqlx::Error> {
    let sql = format!("{SELECT_REPORT} WHERE id = ?");
    let report = match sqlx::query_as::<_, SavedReport>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
    {
        Some(r) => r,
        None => return Ok(None),
    };

    let employees = selections(pool, &[id]).await?.remove(&id).unwrap_or_default();
    Ok(Some(SavedReportEntry::new(report, employees)))
}

/// Returns false when no report had that id.
pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM saved_reports WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
