use crate::error::{ApiError, is_unique_violation};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::model::{area::Area, job_role::JobRole};

/// Name-only lookup tables attached to employees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Catalog {
    Areas,
    JobRoles,
}

impl Catalog {
    fn table(self) -> &'static str {
        match self {
            Catalog::Areas => "areas",
            Catalog::JobRoles => "job_roles",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Catalog::Areas => "Area",
            Catalog::JobRoles => "Job role",
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateCatalogEntry {
    #[schema(example = "Finance")]
    pub name: String,
}

/// Finds an entry by name (case-insensitive) or creates it.
/// Blank names resolve to `None`.
pub async fn resolve_or_create(
    conn: &mut SqliteConnection,
    catalog: Catalog,
    name: Option<&str>,
) -> Result<Option<Uuid>, sqlx::Error> {
    let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => n,
        None => return Ok(None),
    };

    let select = format!("SELECT id FROM {} WHERE name = ? COLLATE NOCASE", catalog.table());
    if let Some(id) = sqlx::query_scalar::<_, Uuid>(&select)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?
    {
        return Ok(Some(id));
    }

    let id = Uuid::new_v4();
    let insert = format!("INSERT INTO {} (id, name) VALUES (?, ?)", catalog.table());
    sqlx::query(&insert).bind(id).bind(name).execute(&mut *conn).await?;

    info!(catalog = catalog.table(), name, "Created catalog entry");
    Ok(Some(id))
}

async fn list<T>(pool: &SqlitePool, catalog: Catalog) -> Result<Vec<T>, sqlx::Error>
where
    T: for<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> + Send + Unpin,
{
    let sql = format!("SELECT id, name FROM {} ORDER BY name", catalog.table());
    sqlx::query_as::<_, T>(&sql).fetch_all(pool).await
}

async fn create(
    pool: &SqlitePool,
    catalog: Catalog,
    payload: &CreateCatalogEntry,
) -> Result<HttpResponse, ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request(format!("{} name is required", catalog.label())));
    }

    let id = Uuid::new_v4();
    let sql = format!("INSERT INTO {} (id, name) VALUES (?, ?)", catalog.table());
    if let Err(e) = sqlx::query(&sql).bind(id).bind(name).execute(pool).await {
        if is_unique_violation(&e) {
            return Err(ApiError::conflict(format!("{} already exists", catalog.label())));
        }
        return Err(e.into());
    }

    Ok(HttpResponse::Created().json(json!({ "id": id, "name": name })))
}

async fn delete(pool: &SqlitePool, catalog: Catalog, id: Uuid) -> Result<HttpResponse, ApiError> {
    let sql = format!("DELETE FROM {} WHERE id = ?", catalog.table());
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found(format!("{} not found", catalog.label())));
    }

    Ok(HttpResponse::NoContent().finish())
}

/// List areas
#[utoipa::path(
    get,
    path = "/api/areas",
    responses((status = 200, body = [Area])),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn list_areas(pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let areas: Vec<Area> = list(&pool, Catalog::Areas).await?;
    Ok(HttpResponse::Ok().json(areas))
}

/// Create area
#[utoipa::path(
    post,
    path = "/api/areas",
    request_body = CreateCatalogEntry,
    responses(
        (status = 201, description = "Area created"),
        (status = 409, description = "Area already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn create_area(
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateCatalogEntry>,
) -> Result<HttpResponse, ApiError> {
    create(&pool, Catalog::Areas, &payload).await
}

/// Delete area; employees in it are left without an area
#[utoipa::path(
    delete,
    path = "/api/areas/{id}",
    params(("id", Path, description = "Area ID")),
    responses((status = 204), (status = 404)),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn delete_area(
    pool: web::Data<SqlitePool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    delete(&pool, Catalog::Areas, path.into_inner()).await
}

/// List job roles
#[utoipa::path(
    get,
    path = "/api/job-roles",
    responses((status = 200, body = [JobRole])),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn list_job_roles(pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let roles: Vec<JobRole> = list(&pool, Catalog::JobRoles).await?;
    Ok(HttpResponse::Ok().json(roles))
}

/// Create job role
#[utoipa::path(
    post,
    path = "/api/job-roles",
    request_body = CreateCatalogEntry,
    responses(
        (status = 201, description = "Job role created"),
        (status = 409, description = "Job role already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn create_job_role(
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateCatalogEntry>,
) -> Result<HttpResponse, ApiError> {
    create(&pool, Catalog::JobRoles, &payload).await
}

/// Delete job role; employees holding it are left without one
#[utoipa::path(
    delete,
    path = "/api/job-roles/{id}",
    params(("id", Path, description = "Job role ID")),
    responses((status = 204), (status = 404)),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn delete_job_role(
    pool: web::Data<SqlitePool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    delete(&pool, Catalog::JobRoles, path.into_inner()).await
}
