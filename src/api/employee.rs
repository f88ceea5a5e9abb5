use crate::{
    api::catalog::{Catalog, resolve_or_create},
    auth::password::hash_password,
    error::{ApiError, is_unique_violation},
    model::{
        employee::{Employee, EmployeeSummary},
        schedule::{ScheduleEntry, WorkSchedule},
    },
    utils::{employee_cache::EmployeeCache, employee_code_filter},
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const SUMMARY_SELECT: &str = r#"
    SELECT
        e.id,
        e.employee_code,
        e.name,
        e.email,
        e.phone,
        e.is_active,
        e.is_admin,
        a.name AS area_name,
        r.name AS job_role_name
    FROM employees e
    LEFT JOIN areas a ON a.id = e.area_id
    LEFT JOIN job_roles r ON r.id = e.job_role_id
"#;

/// Body of both create and update; update replaces every field.
#[derive(Deserialize, Serialize, ToSchema)]
pub struct EmployeePayload {
    #[schema(example = "1025")]
    pub employee_code: String,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane.doe@company.com", format = "email")]
    pub email: Option<String>,
    #[schema(example = "+52 55 1234 5678")]
    pub phone: Option<String>,
    /// Resolved by name (case-insensitive); created when missing
    #[schema(example = "IT")]
    pub area_name: Option<String>,
    /// Resolved by name (case-insensitive); created when missing
    #[schema(example = "Developer")]
    pub job_role_name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    /// Required for new administrators; optional when updating one
    pub password: Option<String>,
    #[serde(default)]
    pub schedules: Vec<ScheduleEntry>,
}

impl EmployeePayload {
    fn validate(&self) -> Result<(), ApiError> {
        if self.employee_code.trim().is_empty() {
            return Err(ApiError::bad_request("employee_code is required"));
        }
        if self.name.trim().is_empty() {
            return Err(ApiError::bad_request("name is required"));
        }
        for entry in &self.schedules {
            entry.validate().map_err(ApiError::BadRequest)?;
        }
        Ok(())
    }

    fn new_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.trim().is_empty())
    }
}

fn blank_to_none(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub active: Option<bool>,
    /// Area name
    pub area: Option<String>,
    /// Matches name, code or email
    pub search: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct EmployeeResponse {
    #[serde(flatten)]
    pub employee: EmployeeSummary,
    pub schedules: Vec<ScheduleEntry>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<EmployeeResponse>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams)]
pub struct StatusQuery {
    pub active: bool,
}

#[derive(Deserialize, IntoParams)]
pub struct CodeQuery {
    pub code: String,
}

fn hash(password: &str) -> Result<String, ApiError> {
    hash_password(password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        ApiError::Internal
    })
}

async fn fetch_employee(pool: &SqlitePool, id: Uuid) -> Result<Option<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        r#"
        SELECT id, employee_code, name, email, phone, is_active, is_admin, password_hash, area_id, job_role_id
        FROM employees
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

async fn fetch_schedules(pool: &SqlitePool, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<ScheduleEntry>>, sqlx::Error> {
    let mut grouped: HashMap<Uuid, Vec<ScheduleEntry>> = HashMap::new();
    if ids.is_empty() {
        return Ok(grouped);
    }

    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT id, employee_id, weekday, start_time, end_time FROM work_schedules WHERE employee_id IN (",
    );
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY weekday, start_time");

    let rows = builder
        .build_query_as::<WorkSchedule>()
        .fetch_all(pool)
        .await?;

    for row in rows {
        grouped.entry(row.employee_id).or_default().push(row.into());
    }
    Ok(grouped)
}

async fn replace_schedules(
    conn: &mut SqliteConnection,
    employee_id: Uuid,
    schedules: &[ScheduleEntry],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM work_schedules WHERE employee_id = ?")
        .bind(employee_id)
        .execute(&mut *conn)
        .await?;

    for entry in schedules {
        sqlx::query(
            "INSERT INTO work_schedules (id, employee_id, weekday, start_time, end_time) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4())
        .bind(employee_id)
        .bind(entry.weekday)
        .bind(entry.start_time)
        .bind(entry.end_time)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn load_response(pool: &SqlitePool, id: Uuid) -> Result<Option<EmployeeResponse>, sqlx::Error> {
    let sql = format!("{SUMMARY_SELECT} WHERE e.id = ?");
    let summary = sqlx::query_as::<_, EmployeeSummary>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let Some(employee) = summary else {
        return Ok(None);
    };

    let mut schedules = fetch_schedules(pool, &[id]).await?;
    Ok(Some(EmployeeResponse {
        schedules: schedules.remove(&id).unwrap_or_default(),
        employee,
    }))
}

/// true  => code AVAILABLE
/// false => code TAKEN
pub async fn is_code_available(code: &str, pool: &SqlitePool) -> Result<bool, sqlx::Error> {
    let code = code.trim();

    // Cuckoo filter: fast negative
    if !employee_code_filter::might_exist(code) {
        return Ok(true);
    }

    let exists: i64 =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM employees WHERE employee_code = ?)")
            .bind(code)
            .fetch_one(pool)
        .await?;

    Ok(exists == 0)
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = EmployeePayload,
    responses(
        (status = 201, description = "Employee created", body = Object, example = json!({
            "id": "5b0c6f7e-2d0e-4a55-9e3b-3c1d8c7f2a10"
        })),
        (status = 400, description = "Invalid payload or administrator without password"),
        (status = 409, description = "Employee code already exists")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    pool: web::Data<SqlitePool>,
    payload: web::Json<EmployeePayload>,
) -> Result<HttpResponse, ApiError> {
    payload.validate()?;
    let code = payload.employee_code.trim();

    let password_hash = if payload.is_admin {
        let password = payload
            .new_password()
            .ok_or_else(|| ApiError::bad_request("Administrators require a password"))?;
        Some(hash(password)?)
    } else {
        None
    };

    // Cheap pre-check; the UNIQUE constraint below is authoritative
    if !is_code_available(code, &pool).await? {
        return Err(ApiError::conflict("Employee code already exists"));
    }

    let id = Uuid::new_v4();
    let mut tx = pool.begin().await?;

    let area_id = resolve_or_create(&mut *tx, Catalog::Areas, payload.area_name.as_deref())
        .await?;
    let job_role_id = resolve_or_create(&mut *tx, Catalog::JobRoles, payload.job_role_name.as_deref())
        .await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO employees
        (id, employee_code, name, email, phone, is_active, is_admin, password_hash, area_id, job_role_id)
        VALUES (?, ?, ?, ?, ?, 1, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(code)
    .bind(payload.name.trim())
    .bind(blank_to_none(&payload.email))
    .bind(blank_to_none(&payload.phone))
    .bind(payload.is_admin)
    .bind(password_hash)
    .bind(area_id)
    .bind(job_role_id)
    .execute(&mut *tx)
    .await;

    if let Err(e) = inserted {
        if is_unique_violation(&e) {
            return Err(ApiError::conflict("Employee code already exists"));
        }
        error!(error = %e, "Failed to create employee");
        return Err(ApiError::Internal);
    }

    replace_schedules(&mut *tx, id, &payload.schedules).await?;
    tx.commit().await?;

    employee_code_filter::insert(code);
    info!(employee_id = %id, code, "Employee created");

    Ok(HttpResponse::Created().json(json!({ "id": id })))
}

/// List employees
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    pool: web::Data<SqlitePool>,
    query: web::Query<EmployeeQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- WHERE clause shared by count and data queries ----------
    fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &EmployeeQuery) {
        builder.push(" WHERE 1 = 1");

        if let Some(active) = query.active {
            builder.push(" AND e.is_active = ").push_bind(active);
        }

        if let Some(area) = query.area.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            builder.push(" AND a.name = ").push_bind(area.to_string());
            builder.push(" COLLATE NOCASE");
        }

        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let like = format!("%{}%", search);
            builder
                .push(" AND (e.name LIKE ")
                .push_bind(like.clone())
                .push(" OR e.employee_code LIKE ")
                .push_bind(like.clone())
                .push(" OR e.email LIKE ")
                .push_bind(like)
                .push(")");
        }
    }

    let mut count = QueryBuilder::<Sqlite>::new(
        "SELECT COUNT(*) FROM employees e LEFT JOIN areas a ON a.id = e.area_id",
    );
    push_filters(&mut count, &query);
    debug!(sql = %count.sql(), "Counting employees");

    let total: i64 = count
        .build_query_scalar::<i64>()
        .fetch_one(pool.get_ref())
        .await?;

    let mut data = QueryBuilder::<Sqlite>::new(SUMMARY_SELECT);
    push_filters(&mut data, &query);
    data.push(" ORDER BY e.name LIMIT ")
        .push_bind(per_page as i64)
        .push(" OFFSET ")
        .push_bind(offset as i64);
    debug!(sql = %data.sql(), page, per_page, offset, "Fetching employees");

    let employees = data
        .build_query_as::<EmployeeSummary>()
        .fetch_all(pool.get_ref())
        .await?;

    let ids: Vec<Uuid> = employees.iter().map(|e| e.id).collect();
    let mut schedules = fetch_schedules(&pool, &ids).await?;

    let data = employees
        .into_iter()
        .map(|employee| EmployeeResponse {
            schedules: schedules.remove(&employee.id).unwrap_or_default(),
            employee,
        })
        .collect();

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = EmployeeResponse),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    pool: web::Data<SqlitePool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();

    match load_response(&pool, employee_id).await? {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Err(ApiError::not_found("Employee not found")),
    }
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    request_body = EmployeePayload,
    responses(
        (status = 200, description = "Employee updated", body = EmployeeResponse),
        (status = 400, description = "Invalid payload or administrator without password"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Employee code already exists")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn update_employee(
    pool: web::Data<SqlitePool>,
    cache: web::Data<EmployeeCache>,
    path: web::Path<Uuid>,
    payload: web::Json<EmployeePayload>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();
    payload.validate()?;

    let current = fetch_employee(&pool, employee_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    let password_hash = match (payload.is_admin, payload.new_password()) {
        (true, Some(password)) => Some(hash(password)?),
        (true, None) => match current.password_hash.clone() {
            Some(existing) => Some(existing),
            None => return Err(ApiError::bad_request("Administrators require a password")),
        },
        // demoted or never admin
        (false, _) => None,
    };

    let code = payload.employee_code.trim();
    let mut tx = pool.begin().await?;

    let area_id = resolve_or_create(&mut *tx, Catalog::Areas, payload.area_name.as_deref())
        .await?;
    let job_role_id = resolve_or_create(&mut *tx, Catalog::JobRoles, payload.job_role_name.as_deref())
        .await?;

    let updated = sqlx::query(
        r#"
        UPDATE employees
        SET employee_code = ?, name = ?, email = ?, phone = ?, is_admin = ?, password_hash = ?,
            area_id = ?, job_role_id = ?
        WHERE id = ?
        "#,
    )
    .bind(code)
    .bind(payload.name.trim())
    .bind(blank_to_none(&payload.email))
    .bind(blank_to_none(&payload.phone))
    .bind(payload.is_admin)
    .bind(password_hash)
    .bind(area_id)
    .bind(job_role_id)
    .bind(employee_id)
    .execute(&mut *tx)
    .await;

    if let Err(e) = updated {
        if is_unique_violation(&e) {
            return Err(ApiError::conflict("Employee code already exists"));
        }
        error!(error = %e, %employee_id, "Failed to update employee");
        return Err(ApiError::Internal);
    }

    replace_schedules(&mut *tx, employee_id, &payload.schedules).await?;
    tx.commit().await?;

    cache.invalidate(&current.employee_code).await;
    if current.employee_code != code {
        employee_code_filter::remove(&current.employee_code);
        employee_code_filter::insert(code);
    }

    info!(%employee_id, "Employee updated");

    let response = load_response(&pool, employee_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;
    Ok(HttpResponse::Ok().json(response))
}

/// Activate or deactivate an employee
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}/status",
    params(
        ("employee_id", Path, description = "Employee ID"),
        StatusQuery
    ),
    responses(
        (status = 204, description = "Status changed"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn set_employee_status(
    pool: web::Data<SqlitePool>,
    cache: web::Data<EmployeeCache>,
    path: web::Path<Uuid>,
    query: web::Query<StatusQuery>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();

    let code: Option<String> = sqlx::query_scalar(
        "UPDATE employees SET is_active = ? WHERE id = ? RETURNING employee_code",
    )
    .bind(query.active)
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
        .await?;

    let Some(code) = code else {
        return Err(ApiError::not_found("Employee not found"));
    };

    cache.invalidate(&code).await;
    info!(%employee_id, active = query.active, "Employee status changed");

    Ok(HttpResponse::NoContent().finish())
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn delete_employee(
    pool: web::Data<SqlitePool>,
    cache: web::Data<EmployeeCache>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();

    let code: Option<String> =
        sqlx::query_scalar("DELETE FROM employees WHERE id = ? RETURNING employee_code")
            .bind(employee_id)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, %employee_id, "Failed to delete employee");
                ApiError::Internal
            })?;

    let Some(code) = code else {
        return Err(ApiError::not_found("Employee not found"));
    };

    cache.invalidate(&code).await;
    employee_code_filter::remove(&code);

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}

/// Weekly schedule of an employee
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}/schedules",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, body = [ScheduleEntry]),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_schedules(
    pool: web::Data<SqlitePool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();

    if fetch_employee(&pool, employee_id).await?.is_none() {
        return Err(ApiError::not_found("Employee not found"));
    }

    let mut schedules = fetch_schedules(&pool, &[employee_id]).await?;
    Ok(HttpResponse::Ok().json(schedules.remove(&employee_id).unwrap_or_default()))
}

/// Replace the weekly schedule of an employee
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}/schedules",
    params(("employee_id", Path, description = "Employee ID")),
    request_body = [ScheduleEntry],
    responses(
        (status = 200, body = [ScheduleEntry]),
        (status = 400, description = "Invalid schedule entry"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn replace_employee_schedules(
    pool: web::Data<SqlitePool>,
    path: web::Path<Uuid>,
    body: web::Json<Vec<ScheduleEntry>>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();

    for entry in body.iter() {
        entry.validate().map_err(ApiError::BadRequest)?;
    }

    if fetch_employee(&pool, employee_id).await?.is_none() {
        return Err(ApiError::not_found("Employee not found"));
    }

    let mut tx = pool.begin().await?;
    replace_schedules(&mut *tx, employee_id, &body).await?;
    tx.commit().await?;

    let mut schedules = fetch_schedules(&pool, &[employee_id]).await?;
    Ok(HttpResponse::Ok().json(schedules.remove(&employee_id).unwrap_or_default()))
}

/// Whether an employee code is still free
#[utoipa::path(
    get,
    path = "/api/employees/code-available",
    params(CodeQuery),
    responses(
        (status = 200, body = Object, example = json!({ "code": "1025", "available": false }))
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn code_available(
    pool: web::Data<SqlitePool>,
    query: web::Query<CodeQuery>,
) -> Result<HttpResponse, ApiError> {
    let code = query.code.trim();
    if code.is_empty() {
        return Err(ApiError::bad_request("code is required"));
    }

    let available = is_code_available(code, &pool).await?;
    Ok(HttpResponse::Ok().json(json!({ "code": code, "available": available })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_pool;
    use actix_web::{body::to_bytes, http::StatusCode};
    use chrono::NaiveTime;

    fn payload(code: &str, is_admin: bool, password: Option<&str>) -> EmployeePayload {
        EmployeePayload {
            employee_code: code.to_string(),
            name: "Jane Doe".to_string(),
            email: Some("  ".to_string()),
            phone: None,
            area_name: Some(" finance ".to_string()),
            job_role_name: None,
            is_admin,
            password: password.map(str::to_string),
            schedules: vec![ScheduleEntry {
                weekday: 1,
                start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            }],
        }
    }

    async fn create(pool: &SqlitePool, body: EmployeePayload) -> Result<Uuid, ApiError> {
        let resp = create_employee(web::Data::new(pool.clone()), web::Json(body)).await?;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        Ok(value["id"].as_str().unwrap().parse().unwrap())
    }

    #[actix_web::test]
    async fn create_resolves_area_and_stores_schedule() {
        let pool = memory_pool().await;
        sqlx::query("INSERT INTO areas (id, name) VALUES (?, 'Finance')")
            .bind(Uuid::new_v4())
            .execute(&pool)
            .await
            .unwrap();

        let id = create(&pool, payload("E-100", false, None)).await.unwrap();
        let loaded = load_response(&pool, id).await.unwrap().unwrap();

        assert_eq!(loaded.employee.area_name.as_deref(), Some("Finance"));
        assert_eq!(loaded.employee.email, None);
        assert!(loaded.employee.is_active);
        assert_eq!(loaded.schedules.len(), 1);

        let areas: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM areas")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(areas, 1);
    }

    #[actix_web::test]
    async fn admin_requires_password() {
        let pool = memory_pool().await;
        let result = create(&pool, payload("E-ADM", true, None)).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[actix_web::test]
    async fn duplicate_code_conflicts() {
        let pool = memory_pool().await;
        create(&pool, payload("E-DUP", false, None)).await.unwrap();
        let again = create(&pool, payload("E-DUP", false, None)).await;
        assert!(matches!(again, Err(ApiError::Conflict(_))));
        assert!(!is_code_available("E-DUP", &pool).await.unwrap());
    }

    #[actix_web::test]
    async fn invalid_schedule_is_rejected() {
        let pool = memory_pool().await;
        let mut body = payload("E-SCH", false, None);
        body.schedules[0].weekday = 9;
        assert!(matches!(create(&pool, body).await, Err(ApiError::BadRequest(_))));
    }

    #[actix_web::test]
    async fn update_keeps_admin_hash_and_demotion_clears_it() {
        let pool = memory_pool().await;
        let cache = web::Data::new(EmployeeCache::default());
        let id = create(&pool, payload("E-UPD", true, Some("Secret1!"))).await.unwrap();

        let resp = update_employee(
            web::Data::new(pool.clone()),
            cache.clone(),
            web::Path::from(id),
            web::Json(payload("E-UPD", true, None)),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let kept = fetch_employee(&pool, id).await.unwrap().unwrap();
        assert!(kept.password_hash.is_some());

        update_employee(
            web::Data::new(pool.clone()),
            cache,
            web::Path::from(id),
            web::Json(payload("E-UPD2", false, None)),
        )
        .await
        .unwrap();
        let demoted = fetch_employee(&pool, id).await.unwrap().unwrap();
        assert!(!demoted.is_admin);
        assert!(demoted.password_hash.is_none());
        assert_eq!(demoted.employee_code, "E-UPD2");
    }

    #[actix_web::test]
    async fn status_change_evicts_cached_employee() {
        let pool = memory_pool().await;
        let cache = web::Data::new(EmployeeCache::default());
        let id = create(&pool, payload("E-OFF", false, None)).await.unwrap();

        let cached = cache.lookup(&pool, "E-OFF").await.unwrap().unwrap();
        assert!(cached.is_active);

        let resp = set_employee_status(
            web::Data::new(pool.clone()),
            cache.clone(),
            web::Path::from(id),
            web::Query(StatusQuery { active: false }),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let reloaded = cache.lookup(&pool, "E-OFF").await.unwrap().unwrap();
        assert!(!reloaded.is_active);
    }

    #[actix_web::test]
    async fn delete_unknown_employee_is_not_found() {
        let pool = memory_pool().await;
        let result = delete_employee(
            web::Data::new(pool.clone()),
            web::Data::new(EmployeeCache::default()),
            web::Path::from(Uuid::new_v4()),
        )
        .await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
