use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;

/// Admits only requests carrying a valid administrator access token.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let header_value = match req.headers().get("Authorization") {
        Some(h) => h.to_str().map_err(|_| {
            actix_web::error::ErrorUnauthorized(
                json!({"message": "Invalid Authorization header encoding"}),
            )
        })?,
        None => {
            let resp = HttpResponse::Unauthorized()
                .json(json!({"message": "Missing Authorization header"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let token = match header_value.strip_prefix("Bearer ") {
        Some(t) => t,
        None => {
            let resp = HttpResponse::Unauthorized()
                .json(json!({"message": "Authorization header must start with Bearer"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            let resp = HttpResponse::Unauthorized()
                .json(json!({"message": "Invalid or expired token", "details": e}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let auth_user = match AuthUser::from_claims(claims) {
        Ok(user) => user,
        Err(reason) => {
            let resp = HttpResponse::Unauthorized().json(json!({"message": reason}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    if auth_user.role != Role::Admin {
        tracing::warn!(employee_code = %auth_user.employee_code, role = %auth_user.role, "Rejected non-admin token");
        let resp = HttpResponse::Forbidden().json(json!({"message": "Admin only"}));
        return Ok(req.into_response(resp.map_into_boxed_body()));
    }

    tracing::debug!(
        employee_code = %auth_user.employee_code,
        role = %auth_user.role,
        path = %req.path(),
        "Authorized request"
    );
    req.extensions_mut().insert(auth_user);

    next.call(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{TokenSubject, generate_access_token};
    use actix_web::{App, http::StatusCode, middleware::from_fn, test, web};
    use uuid::Uuid;

    fn token_for(config: &Config, role: Role) -> String {
        let subject = TokenSubject {
            employee_id: Uuid::new_v4(),
            employee_code: "1001",
            name: "Someone",
            role: role.id(),
        };
        generate_access_token(&subject, &config.jwt_secret, 60).unwrap()
    }

    #[actix_web::test]
    async fn only_admin_role_passes() {
        let config = Config::for_tests();
        let app = test::init_service(
            App::new().app_data(Data::new(config.clone())).service(
                web::scope("/api")
                    .wrap(from_fn(auth_middleware))
                    .route("/ping", web::get().to(|| async { HttpResponse::Ok().finish() })),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/ping")
            .insert_header(("Authorization", format!("Bearer {}", token_for(&config, Role::Admin))))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/ping")
            .insert_header(("Authorization", format!("Bearer {}", token_for(&config, Role::Employee))))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }
}
