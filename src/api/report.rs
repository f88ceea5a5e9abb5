use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::ApiError,
    report::{
        ReportRequest, ReportRow,
        export::{Branding, XLSX_CONTENT_TYPE, export_file_name, render_workbook, saved_file_name},
        history::{self, SaveReportRequest, SavedReportEntry},
        query::fetch_rows,
        summary::{SummaryResponse, summarize},
    },
};
use actix_web::{
    HttpResponse,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web,
};
use chrono::{Local, Utc};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{info, instrument};
use uuid::Uuid;

fn xlsx_attachment(file_name: String, bytes: Vec<u8>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(file_name)],
        })
        .body(bytes)
}

fn render(config: &Config, request: &ReportRequest, rows: &[ReportRow]) -> Result<Vec<u8>, ApiError> {
    let summary = summarize(request, rows);
    let branding = Branding {
        title: &config.report_title,
        logo_path: Path::new(&config.report_logo_path),
    };

    Ok(render_workbook(
        &branding,
        &summary,
        rows,
        Local::now().naive_local(),
    )?)
}

/// Current rows for a saved report. A selection whose employees were all
/// deleted yields nothing rather than every employee.
async fn saved_rows(
    pool: &SqlitePool,
    saved: &SavedReportEntry,
) -> Result<Vec<ReportRow>, sqlx::Error> {
    if saved.selection_is_gone() {
        return Ok(Vec::new());
    }
    fetch_rows(pool, &saved.to_request()).await
}

/// Attendance rows for a date range
#[utoipa::path(
    post,
    path = "/api/reports",
    request_body = ReportRequest,
    responses(
        (status = 200, body = [ReportRow]),
        (status = 400, description = "Start date after end date")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn report_rows(
    pool: web::Data<SqlitePool>,
    payload: web::Json<ReportRequest>,
) -> Result<HttpResponse, ApiError> {
    payload.validate()?;
    let rows = fetch_rows(&pool, &payload).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Worked-time totals for a date range
#[utoipa::path(
    post,
    path = "/api/reports/summary",
    request_body = ReportRequest,
    responses(
        (status = 200, body = SummaryResponse),
        (status = 400, description = "Start date after end date")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn report_summary(
    pool: web::Data<SqlitePool>,
    payload: web::Json<ReportRequest>,
) -> Result<HttpResponse, ApiError> {
    payload.validate()?;
    let rows = fetch_rows(&pool, &payload).await?;
    let summary = summarize(&payload, &rows);
    Ok(HttpResponse::Ok().json(SummaryResponse::from(&summary)))
}

/// Download the report as a spreadsheet
#[utoipa::path(
    post,
    path = "/api/reports/export",
    request_body = ReportRequest,
    responses(
        (status = 200, description = "xlsx attachment", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 400, description = "Start date after end date")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
#[instrument(name = "report_export", skip_all, fields(start = %payload.start_date, end = %payload.end_date))]
pub async fn export_report(
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    payload: web::Json<ReportRequest>,
) -> Result<HttpResponse, ApiError> {
    payload.validate()?;
    let rows = fetch_rows(&pool, &payload).await?;
    let bytes = render(&config, &payload, &rows)?;
    info!(size = bytes.len(), "Report exported");
    Ok(xlsx_attachment(
        export_file_name(Local::now().naive_local()),
        bytes,
    ))
}

/// Save report parameters to the history
#[utoipa::path(
    post,
    path = "/api/reports/save",
    request_body = SaveReportRequest,
    responses(
        (status = 201, body = SavedReportEntry),
        (status = 400, description = "Missing name, invalid range or unknown employee")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn save_report(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
    payload: web::Json<SaveReportRequest>,
) -> Result<HttpResponse, ApiError> {
    payload.validate()?;
    let unknown = history::missing_employees(&pool, &payload.filter.selected_employees()).await?;
    if !unknown.is_empty() {
        return Err(ApiError::bad_request("Unknown employee in selection"));
    }
    let saved = history::save(&pool, &payload, &user.name, Utc::now()).await?;

    info!(report_id = %saved.id, generated_by = %user.employee_code, "Report saved");
    Ok(HttpResponse::Created().json(saved))
}

/// Saved reports, newest first
#[utoipa::path(
    get,
    path = "/api/reports/history",
    responses((status = 200, body = [SavedReportEntry])),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn report_history(pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let reports = history::list(&pool).await?;
    Ok(HttpResponse::Ok().json(reports))
}

/// Delete a saved report
#[utoipa::path(
    delete,
    path = "/api/reports/{id}",
    params(("id", Path, description = "Saved report ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn delete_report(
    pool: web::Data<SqlitePool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    if !history::delete(&pool, id).await? {
        return Err(ApiError::not_found("Report not found"));
    }

    info!(report_id = %id, "Saved report deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// Re-export a saved report with current data
#[utoipa::path(
    get,
    path = "/api/reports/{id}/export",
    params(("id", Path, description = "Saved report ID")),
    responses(
        (status = 200, description = "xlsx attachment", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn export_saved_report(
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let saved = history::find(&pool, path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Report not found"))?;

    let rows = saved_rows(&pool, &saved).await?;
    let bytes = render(&config, &saved.to_request(), &rows)?;

    Ok(xlsx_attachment(saved_file_name(&saved.name), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{TokenSubject, generate_access_token};
    use crate::db::test_support::{insert_employee, insert_record, memory_pool};
    use crate::model::role::Role;
    use actix_web::{App, http::StatusCode, middleware::from_fn, test};
    use chrono::{NaiveDate, NaiveTime};
    use serde_json::json;

    fn admin_token(config: &Config) -> String {
        let subject = TokenSubject {
            employee_id: Uuid::new_v4(),
            employee_code: "admin",
            name: "System Administrator",
            role: Role::Admin.id(),
        };
        generate_access_token(&subject, &config.jwt_secret, 60).unwrap()
    }

    macro_rules! report_app {
        ($pool:expr, $config:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($pool.clone()))
                    .app_data(web::Data::new($config.clone()))
                    .service(
                        web::scope("/api/reports")
                            .wrap(from_fn(crate::auth::middleware::auth_middleware))
                            .route("", web::post().to(report_rows))
                            .route("/summary", web::post().to(report_summary))
                            .route("/export", web::post().to(export_report))
                            .route("/save", web::post().to(save_report))
                            .route("/history", web::get().to(report_history))
                            .route("/{id}", web::delete().to(delete_report))
                            .route("/{id}/export", web::get().to(export_saved_report)),
                    ),
            )
            .await
        };
    }

    async fn seeded_pool() -> SqlitePool {
        let pool = memory_pool().await;
        let ann = insert_employee(&pool, "A", "Ann", true).await;
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        insert_record(
            &pool,
            ann,
            date,
            NaiveTime::from_hms_opt(9, 0, 0),
            NaiveTime::from_hms_opt(17, 30, 0),
        )
        .await;
        pool
    }

    #[actix_web::test]
    async fn rows_and_summary_cover_the_range() {
        let pool = seeded_pool().await;
        let config = Config::for_tests();
        let app = report_app!(pool, config);
        let token = admin_token(&config);
        let body = json!({ "start_date": "2026-03-01", "end_date": "2026-03-31" });

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(&body)
            .to_request();
        let rows: Vec<ReportRow> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].employee_name, "Ann");

        let req = test::TestRequest::post()
            .uri("/api/reports/summary")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(&body)
            .to_request();
        let summary: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(summary["employee_label"], "All");
        assert_eq!(summary["total_compact"], "8 h");
        assert_eq!(summary["total_long"], "08:30:00");
        assert_eq!(summary["earliest_check_in"], "09:00");
    }

    #[actix_web::test]
    async fn inverted_range_is_rejected() {
        let pool = memory_pool().await;
        let config = Config::for_tests();
        let app = report_app!(pool, config);

        let req = test::TestRequest::post()
            .uri("/api/reports/export")
            .insert_header(("Authorization", format!("Bearer {}", admin_token(&config))))
            .set_json(json!({ "start_date": "2026-03-31", "end_date": "2026-03-01" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn export_is_an_xlsx_attachment() {
        let pool = seeded_pool().await;
        let config = Config::for_tests();
        let app = report_app!(pool, config);

        let req = test::TestRequest::post()
            .uri("/api/reports/export")
            .insert_header(("Authorization", format!("Bearer {}", admin_token(&config))))
            .set_json(json!({ "start_date": "2026-03-01", "end_date": "2026-03-31" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let disposition = resp
            .headers()
            .get("content-disposition")
            .and_then(|h| h.to_str().ok())
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment"));
        assert!(disposition.contains("attendance_report_"));

        let body = test::read_body(resp).await;
        assert!(body.starts_with(b"PK"));
    }

    #[actix_web::test]
    async fn saved_report_lifecycle() {
        let pool = seeded_pool().await;
        let config = Config::for_tests();
        let app = report_app!(pool, config);
        let auth = ("Authorization", format!("Bearer {}", admin_token(&config)));

        let req = test::TestRequest::post()
            .uri("/api/reports/save")
            .insert_header(auth.clone())
            .set_json(json!({
                "name": "March",
                "start_date": "2026-03-01",
                "end_date": "2026-03-31"
            }))
            .to_request();
        let saved: SavedReportEntry = test::call_and_read_body_json(&app, req).await;
        assert_eq!(saved.generated_by, "System Administrator");

        let req = test::TestRequest::get()
            .uri("/api/reports/history")
            .insert_header(auth.clone())
            .to_request();
        let history: Vec<SavedReportEntry> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(history.len(), 1);

        let req = test::TestRequest::get()
            .uri(&format!("/api/reports/{}/export", saved.id))
            .insert_header(auth.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/reports/{}", saved.id))
            .insert_header(auth.clone())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/reports/{}", saved.id))
            .insert_header(auth)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn blank_report_name_is_rejected() {
        let pool = memory_pool().await;
        let config = Config::for_tests();
        let app = report_app!(pool, config);

        let req = test::TestRequest::post()
            .uri("/api/reports/save")
            .insert_header(("Authorization", format!("Bearer {}", admin_token(&config))))
            .set_json(json!({ "name": " ", "start_date": "2026-03-01", "end_date": "2026-03-01" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn saving_with_unknown_employee_is_rejected() {
        let pool = seeded_pool().await;
        let config = Config::for_tests();
        let app = report_app!(pool, config);
        let auth = ("Authorization", format!("Bearer {}", admin_token(&config)));

        let req = test::TestRequest::post()
            .uri("/api/reports/save")
            .insert_header(auth.clone())
            .set_json(json!({
                "name": "Ghost",
                "start_date": "2026-03-01",
                "end_date": "2026-03-31",
                "employee_id": Uuid::new_v4()
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Unknown employee in selection");

        let req = test::TestRequest::get()
            .uri("/api/reports/history")
            .insert_header(auth)
            .to_request();
        let history: Vec<SavedReportEntry> = test::call_and_read_body_json(&app, req).await;
        assert!(history.is_empty());
    }

    #[actix_web::test]
    async fn saved_report_of_deleted_employee_stays_empty() {
        let pool = seeded_pool().await;
        let ann: Uuid = sqlx::query_scalar("SELECT id FROM employees WHERE employee_code = 'A'")
            .fetch_one(&pool)
            .await
            .unwrap();
        let ben = insert_employee(&pool, "B", "Ben", true).await;
        insert_record(
            &pool,
            ben,
            NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
            NaiveTime::from_hms_opt(8, 0, 0),
            NaiveTime::from_hms_opt(12, 0, 0),
        )
        .await;

        let request = SaveReportRequest {
            name: "Ann only".to_string(),
            filter: ReportRequest {
                start_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
                employee_id: Some(ann),
                employee_ids: vec![],
            },
        };
        let saved = history::save(&pool, &request, "Admin", Utc::now()).await.unwrap();
        assert_eq!(saved_rows(&pool, &saved).await.unwrap().len(), 1);

        sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(ann)
            .execute(&pool)
            .await
            .unwrap();

        let reloaded = history::find(&pool, saved.id).await.unwrap().unwrap();
        assert!(saved_rows(&pool, &reloaded).await.unwrap().is_empty());

        let config = Config::for_tests();
        let app = report_app!(pool, config);
        let req = test::TestRequest::get()
            .uri(&format!("/api/reports/{}/export", saved.id))
            .insert_header(("Authorization", format!("Bearer {}", admin_token(&config))))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn missing_token_is_unauthorized() {
        let pool = memory_pool().await;
        let config = Config::for_tests();
        let app = report_app!(pool, config);

        let req = test::TestRequest::get().uri("/api/reports/history").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}
