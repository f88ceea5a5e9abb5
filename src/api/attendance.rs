use crate::error::{ApiError, is_unique_violation};
use crate::model::attendance::Attendance;
use crate::utils::employee_cache::{CachedEmployee, EmployeeCache};
use actix_web::{HttpResponse, web};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use strum_macros::Display;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// How the employee code reached the kiosk.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MarkSource {
    #[default]
    Manual,
    Qr,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MarkKind {
    #[strum(serialize = "Check-in")]
    CheckIn,
    #[strum(serialize = "Check-out")]
    CheckOut,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkRequest {
    /// Code typed by the employee or decoded from their QR badge
    #[schema(example = "1025")]
    pub employee_code: String,
    #[serde(default)]
    pub source: Option<MarkSource>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "success": true,
        "kind": "check_in",
        "employee_name": "Jane Doe",
        "message": "Check-in registered for Jane Doe",
        "date": "2026-03-02",
        "time": "09:01:12"
    })
)]
pub struct MarkResponse {
    pub success: bool,
    #[schema(value_type = String)]
    pub kind: MarkKind,
    pub employee_name: String,
    pub message: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String, format = "time")]
    pub time: NaiveTime,
}

/// What a mark is allowed to do; `Toggle` picks based on today's record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkIntent {
    Toggle,
    CheckIn,
    CheckOut,
}

async fn resolve_employee(
    pool: &SqlitePool,
    cache: &EmployeeCache,
    raw_code: &str,
) -> Result<CachedEmployee, ApiError> {
    let code = raw_code.trim();
    if code.is_empty() {
        return Err(ApiError::bad_request("Please enter a valid employee code"));
    }

    let employee = cache
        .lookup(pool, code)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    if !employee.is_active {
        return Err(ApiError::Forbidden("Employee is inactive".into()));
    }

    Ok(employee)
}

/// Records a check-in or check-out for `employee` at `now`.
pub async fn record_mark(
    pool: &SqlitePool,
    employee: &CachedEmployee,
    intent: MarkIntent,
    now: NaiveDateTime,
) -> Result<MarkResponse, ApiError> {
    let date = now.date();
    let time = now.time();

    let today = sqlx::query_as::<_, Attendance>(
        "SELECT id, employee_id, date, check_in, check_out FROM attendance_records WHERE employee_id = ? AND date = ?",
    )
    .bind(employee.id)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    let open_record = today
        .as_ref()
        .filter(|r| r.is_open())
        .map(|r| r.id);

    let kind = match (today.is_some(), open_record, intent) {
        (false, _, MarkIntent::Toggle | MarkIntent::CheckIn) => MarkKind::CheckIn,
        (_, Some(_), MarkIntent::Toggle | MarkIntent::CheckOut) => MarkKind::CheckOut,
        (_, _, MarkIntent::CheckOut) => {
            return Err(ApiError::bad_request("No active check-in found for today"));
        }
        (true, _, MarkIntent::CheckIn) => {
            return Err(ApiError::conflict("Already checked in today"));
        }
        (true, None, MarkIntent::Toggle) => {
            return Err(ApiError::conflict("Attendance already completed for today"));
        }
    };

    match open_record {
        Some(record_id) if kind == MarkKind::CheckOut => {
            let result = sqlx::query(
                "UPDATE attendance_records SET check_out = ? WHERE id = ? AND check_out IS NULL",
            )
            .bind(time)
            .bind(record_id)
            .execute(pool)
            .await?;

            if result.rows_affected() == 0 {
                return Err(ApiError::conflict("Attendance already completed for today"));
            }
        }
        _ => {
            let result = sqlx::query(
                "INSERT INTO attendance_records (id, employee_id, date, check_in) VALUES (?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4())
            .bind(employee.id)
            .bind(date)
            .bind(time)
            .execute(pool)
            .await;

            if let Err(e) = result {
                // A concurrent mark for the same day won the race
                if is_unique_violation(&e) {
                    return Err(ApiError::conflict("Already checked in today"));
                }
                return Err(e.into());
            }
        }
    }

    Ok(MarkResponse {
        success: true,
        kind,
        employee_name: employee.name.clone(),
        message: format!("{} registered for {}", kind, employee.name),
        date,
        time,
    })
}

async fn handle_mark(
    pool: &SqlitePool,
    cache: &EmployeeCache,
    payload: MarkRequest,
    intent: MarkIntent,
) -> Result<HttpResponse, ApiError> {
    let source = payload.source.unwrap_or_default();
    let employee = match resolve_employee(pool, cache, &payload.employee_code).await {
        Ok(e) => e,
        Err(e) => {
            warn!(code = %payload.employee_code.trim(), %source, reason = %e, "Mark rejected");
            return Err(e);
        }
    };

    let response = record_mark(pool, &employee, intent, Local::now().naive_local()).await?;

    info!(
        employee_id = %employee.id,
        kind = %response.kind,
        %source,
        "Attendance mark recorded"
    );

    Ok(HttpResponse::Ok().json(response))
}

/// Kiosk mark: checks in, or checks out when today's check-in is still open
#[utoipa::path(
    post,
    path = "/attendance/mark",
    request_body = MarkRequest,
    responses(
        (status = 200, description = "Mark recorded", body = MarkResponse),
        (status = 400, description = "Empty employee code"),
        (status = 403, description = "Employee is inactive"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Attendance already completed for today")
    ),
    tag = "Attendance"
)]
pub async fn mark(
    pool: web::Data<SqlitePool>,
    cache: web::Data<EmployeeCache>,
    payload: web::Json<MarkRequest>,
) -> Result<HttpResponse, ApiError> {
    handle_mark(&pool, &cache, payload.into_inner(), MarkIntent::Toggle).await
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/attendance/check-in",
    request_body = MarkRequest,
    responses(
        (status = 200, description = "Checked in successfully", body = MarkResponse),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Already checked in today")
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    pool: web::Data<SqlitePool>,
    cache: web::Data<EmployeeCache>,
    payload: web::Json<MarkRequest>,
) -> Result<HttpResponse, ApiError> {
    handle_mark(&pool, &cache, payload.into_inner(), MarkIntent::CheckIn).await
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/attendance/check-out",
    request_body = MarkRequest,
    responses(
        (status = 200, description = "Checked out successfully", body = MarkResponse),
        (status = 400, description = "No active check-in found for today"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    pool: web::Data<SqlitePool>,
    cache: web::Data<EmployeeCache>,
    payload: web::Json<MarkRequest>,
) -> Result<HttpResponse, ApiError> {
    handle_mark(&pool, &cache, payload.into_inner(), MarkIntent::CheckOut).await
}
