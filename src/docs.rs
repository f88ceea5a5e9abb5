use crate::api::attendance::{MarkRequest, MarkResponse};
use crate::api::catalog::CreateCatalogEntry;
use crate::api::employee::{EmployeeListResponse, EmployeePayload, EmployeeResponse};
use crate::api::health::DbHealth;
use crate::auth::handlers::LoginResponse;
use crate::model::{
    area::Area, employee::EmployeeSummary, job_role::JobRole, schedule::ScheduleEntry,
};
use crate::models::LoginReqDto;
use crate::report::{
    ReportRequest, ReportRow,
    history::{SaveReportRequest, SavedReportEntry},
    summary::SummaryResponse,
};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "1.0.0",
        description = r#"
## Employee Attendance Tracker

Employees check in and out at a kiosk by typing their code or scanning their QR badge.
Administrators manage the employee directory and work schedules, and produce attendance reports.

### Key Features
- **Attendance marks**
  - One record per employee per day; the kiosk toggles between check-in and check-out
- **Employee directory**
  - Employees, areas, job roles and weekly work schedules
- **Reports**
  - Rows and worked-time totals for a date range, spreadsheet export, saved report history

### Security
`/api/*` endpoints require an administrator **JWT Bearer** access token from `/auth/login`.
Kiosk marks are public and rate limited.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::attendance::mark,
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::set_employee_status,
        crate::api::employee::delete_employee,
        crate::api::employee::get_schedules,
        crate::api::employee::replace_employee_schedules,
        crate::api::employee::code_available,

        crate::api::catalog::list_areas,
        crate::api::catalog::create_area,
        crate::api::catalog::delete_area,
        crate::api::catalog::list_job_roles,
        crate::api::catalog::create_job_role,
        crate::api::catalog::delete_job_role,

        crate::api::report::report_rows,
        crate::api::report::report_summary,
        crate::api::report::export_report,
        crate::api::report::save_report,
        crate::api::report::report_history,
        crate::api::report::delete_report,
        crate::api::report::export_saved_report,

        crate::api::health::db_health
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            MarkRequest,
            MarkResponse,
            EmployeePayload,
            EmployeeSummary,
            EmployeeResponse,
            EmployeeListResponse,
            ScheduleEntry,
            Area,
            JobRole,
            CreateCatalogEntry,
            ReportRequest,
            ReportRow,
            SummaryResponse,
            SaveReportRequest,
            SavedReportEntry,
            DbHealth
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Administrator sign-in and token rotation"),
        (name = "Attendance", description = "Kiosk check-in and check-out"),
        (name = "Employee", description = "Employee directory and schedules"),
        (name = "Directory", description = "Areas and job roles"),
        (name = "Reports", description = "Attendance reports, export and history"),
        (name = "Health", description = "Service checks"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
