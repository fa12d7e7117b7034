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
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Resolves the bearer token to the acting employee, or the 401 body to send.
fn authenticate(req: &ServiceRequest, config: &Config) -> Result<AuthUser, Value> {
    let header_value = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| json!({"error": "Missing Authorization header"}))?
        .to_str()
        .map_err(|_| json!({"error": "Invalid Authorization header encoding"}))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| json!({"error": "Authorization header must start with Bearer"}))?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|e| json!({"error": "Invalid or expired token", "details": e}))?;

    let role = Role::from_id(claims.role).ok_or_else(|| json!({"error": "Invalid role"}))?;

    Ok(AuthUser {
        employee_id: claims.sub,
        role,
    })
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    match authenticate(&req, &config) {
        Ok(user) => {
            debug!(employee_id = %user.employee_id, role = %user.role, "Authenticated");
            req.extensions_mut().insert(user);
            next.call(req).await
        }
        Err(body) => {
            warn!(path = req.path(), "Rejected unauthenticated request");
            let resp = HttpResponse::Unauthorized().json(body);
            Ok(req.into_response(resp.map_into_boxed_body()))
        }
    }
}
