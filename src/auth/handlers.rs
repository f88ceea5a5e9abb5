use crate::{
    auth::{
        jwt::{TokenSubject, generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    config::Config,
    error::ApiError,
    model::{employee::Employee, role::Role},
    models::{LoginReqDto, TokenType},
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Display name of the signed-in administrator
    pub name: String,
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

async fn find_by_code(pool: &SqlitePool, code: &str) -> Result<Option<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        r#"
        SELECT id, employee_code, name, email, phone, is_active, is_admin, password_hash, area_id, job_role_id
        FROM employees
        WHERE employee_code = ?
        "#,
    )
    .bind(code)
    .fetch_optional(pool)
    .await
}

/// Issues an access/refresh pair and stores the refresh token's jti.
async fn issue_tokens(
    conn: &mut SqliteConnection,
    employee: &Employee,
    config: &Config,
) -> Result<LoginResponse, ApiError> {
    let subject = TokenSubject {
        employee_id: employee.id,
        employee_code: &employee.employee_code,
        name: &employee.name,
        role: Role::Admin.id(),
    };

    let access_token =
        generate_access_token(&subject, &config.jwt_secret, config.access_token_ttl).map_err(
            |e| {
                error!(error = %e, "Failed to sign access token");
                ApiError::Internal
            },
        )?;

    let (refresh_token, refresh_claims) =
        generate_refresh_token(&subject, &config.jwt_secret, config.refresh_token_ttl).map_err(
            |e| {
                error!(error = %e, "Failed to sign refresh token");
                ApiError::Internal
            },
        )?;

    debug!(employee_id = %employee.id, jti = %refresh_claims.jti, "Storing refresh token");

    sqlx::query("INSERT INTO refresh_tokens (employee_id, jti, expires_at) VALUES (?, ?, ?)")
        .bind(employee.id)
        .bind(&refresh_claims.jti)
        .bind(refresh_claims.exp as i64)
        .execute(conn)
        .await?;

    Ok(LoginResponse {
        access_token,
        refresh_token,
        name: employee.name.clone(),
    })
}

/// Administrator login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Missing employee code or password"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Employee is not an active administrator")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(employee_code = %user.employee_code)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    let code = user.employee_code.trim();
    if code.is_empty() || user.password.is_empty() {
        info!("Validation failed: empty employee code or password");
        return Err(ApiError::bad_request("Employee code and password are required"));
    }

    let employee = match find_by_code(pool.get_ref(), code).await? {
        Some(e) => e,
        None => {
            info!("Invalid credentials: employee not found");
            return Err(ApiError::Unauthorized("Invalid credentials".into()));
        }
    };

    if !employee.is_admin {
        info!("Login refused: employee is not an administrator");
        return Err(ApiError::Forbidden(
            "Employee does not have administrator permissions".into(),
        ));
    }

    if !employee.is_active {
        info!("Login refused: employee is inactive");
        return Err(ApiError::Forbidden("Employee is inactive".into()));
    }

    let hash = employee
        .password_hash
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".into()))?;

    if let Err(e) = verify_password(&user.password, hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let mut conn = pool.acquire().await?;
    let tokens = issue_tokens(&mut *conn, &employee, &config).await?;

    info!("Login successful");

    Ok(HttpResponse::Ok().json(tokens))
}

#[derive(sqlx::FromRow)]
struct RefreshRecord {
    id: i64,
    revoked: bool,
}

/// Rotates a refresh token
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = LoginResponse),
        (status = 401, description = "Missing, invalid or revoked refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let unauthorized = || ApiError::Unauthorized("Invalid refresh token".into());

    let token = bearer_token(&req).ok_or_else(unauthorized)?;
    let claims = verify_token(token, &config.jwt_secret).map_err(|_| unauthorized())?;

    if claims.token_type != TokenType::Refresh {
        return Err(unauthorized());
    }

    let mut tx = pool.begin().await?;

    let record = sqlx::query_as::<_, RefreshRecord>(
        "SELECT id, revoked FROM refresh_tokens WHERE jti = ?",
    )
    .bind(&claims.jti)
    .fetch_optional(&mut *tx)
    .await?;

    let record = match record {
        Some(r) if !r.revoked => r,
        _ => return Err(unauthorized()),
    };

    sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE id = ?")
        .bind(record.id)
        .execute(&mut *tx)
        .await?;

    // The employee may have been demoted or deactivated since the last login
    let employee = sqlx::query_as::<_, Employee>(
        r#"
        SELECT id, employee_code, name, email, phone, is_active, is_admin, password_hash, area_id, job_role_id
        FROM employees
        WHERE id = ?
        "#,
    )
    .bind(claims.employee_id)
    .fetch_optional(&mut *tx)
    .await?
    .filter(|e| e.is_admin && e.is_active)
    .ok_or_else(unauthorized)?;

    let tokens = issue_tokens(&mut *tx, &employee, &config).await?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(tokens))
}

/// Revokes a refresh token
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Logged out")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> impl Responder {
    let token = match bearer_token(&req) {
        Some(t) => t,
        None => return HttpResponse::NoContent().finish(),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::NoContent().finish(),
    };

    // only refresh tokens can logout
    if claims.token_type != TokenType::Refresh {
        return HttpResponse::NoContent().finish();
    }

    // idempotent
    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
    }

    HttpResponse::NoContent().finish()
}
