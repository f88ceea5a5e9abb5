use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::{model::role::Role, models::{Claims, TokenType}};
use crate::error::ApiError;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub employee_id: Uuid,
    pub employee_code: String,
    pub name: String,
    pub role: Role,
}

impl AuthUser {
    /// Builds the user from access-token claims.
    pub fn from_claims(claims: Claims) -> Result<Self, &'static str> {
        if claims.token_type != TokenType::Access {
            return Err("Access token required");
        }

        let role = Role::from_id(claims.role).ok_or("Invalid role")?;

        Ok(AuthUser {
            employee_id: claims.employee_id,
            employee_code: claims.sub,
            name: claims.name,
            role,
        })
    }

}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Already resolved by auth_middleware on protected scopes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ApiError::Unauthorized("Missing token".into()))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                tracing::error!("Config missing from app data");
                return ready(Err(ApiError::Internal));
            }
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ApiError::Unauthorized("Invalid token".into()))),
        };

        ready(AuthUser::from_claims(claims).map_err(|reason| ApiError::Unauthorized(reason.into())))
    }
}
