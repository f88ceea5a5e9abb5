use crate::{
    api::{attendance, catalog, employee, health, report},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::{json_error_handler, path_error_handler, query_error_handler},
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Per-route limiter, replenishing evenly over a minute
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let mark_limiter = Arc::new(build_limiter(config.rate_mark_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler));

    cfg.service(health::db_health);

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Kiosk marks: ID entry and QR scan share these
    cfg.service(
        web::scope("/attendance")
            .wrap(mark_limiter)
            .route("/mark", web::post().to(attendance::mark))
            .route("/check-in", web::post().to(attendance::check_in))
            .route("/check-out", web::post().to(attendance::check_out)),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // before /{id} so it is not parsed as an id
                    .service(
                        web::resource("/code-available")
                            .route(web::get().to(employee::code_available)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    )
                    .service(
                        web::resource("/{id}/status")
                            .route(web::put().to(employee::set_employee_status)),
                    )
                    .service(
                        web::resource("/{id}/schedules")
                            .route(web::get().to(employee::get_schedules))
                            .route(web::put().to(employee::replace_employee_schedules)),
                    ),
            )
            .service(
                web::scope("/areas")
                    .service(
                        web::resource("")
                            .route(web::get().to(catalog::list_areas))
                            .route(web::post().to(catalog::create_area)),
                    )
                    .service(
                        web::resource("/{id}").route(web::delete().to(catalog::delete_area)),
                    ),
            )
            .service(
                web::scope("/job-roles")
                    .service(
                        web::resource("")
                            .route(web::get().to(catalog::list_job_roles))
                            .route(web::post().to(catalog::create_job_role)),
                    )
                    .service(
                        web::resource("/{id}").route(web::delete().to(catalog::delete_job_role)),
                    ),
            )
            .service(
                web::scope("/reports")
                    .service(web::resource("").route(web::post().to(report::report_rows)))
                    .service(
                        web::resource("/summary").route(web::post().to(report::report_summary)),
                    )
                    .service(
                        web::resource("/export").route(web::post().to(report::export_report)),
                    )
                    .service(web::resource("/save").route(web::post().to(report::save_report)))
                    .service(
                        web::resource("/history").route(web::get().to(report::report_history)),
                    )
                    .service(
                        web::resource("/{id}").route(web::delete().to(report::delete_report)),
                    )
                    .service(
                        web::resource("/{id}/export")
                            .route(web::get().to(report::export_saved_report)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns new access_token
