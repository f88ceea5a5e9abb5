use crate::error::ApiError;
use actix_web::{HttpResponse, get, web};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DbHealth {
    pub ok: bool,
    pub areas: i64,
    pub job_roles: i64,
    pub employees: i64,
    pub attendance_records: i64,
}

/// Database connectivity check with row counts
#[utoipa::path(
    get,
    path = "/health/db",
    responses(
        (status = 200, body = DbHealth),
        (status = 500, description = "Database unreachable")
    ),
    tag = "Health"
)]
#[get("/health/db")]
pub async fn db_health(pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let (areas, job_roles, employees, attendance_records) = sqlx::query_as::<_, (i64, i64, i64, i64)>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM areas) AS areas,
            (SELECT COUNT(*) FROM job_roles) AS job_roles,
            (SELECT COUNT(*) FROM employees) AS employees,
            (SELECT COUNT(*) FROM attendance_records) AS attendance_records
        "#,
    )
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(DbHealth {
        ok: true,
        areas,
        job_roles,
        employees,
        attendance_records,
    }))
}
