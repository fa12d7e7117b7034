use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::ledger::LedgerEngine;
use crate::model::leave_type::{FixedRange, LeaveTypeConfig};

#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "label": "Christmas closure",
    "subtracts_days": true,
    "fixed_range": { "start": "2024-12-24", "end": "2024-12-26" }
}))]
pub struct SaveLeaveType {
    pub label: String,
    pub subtracts_days: bool,
    #[serde(default)]
    pub fixed_range: Option<FixedRange>,
}

/// Configured leave types
#[utoipa::path(
    get,
    path = "/api/leave-types",
    responses(
        (status = 200, description = "All configured leave types", body = [LeaveTypeConfig]),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Leave type",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_leave_types(
    _auth: AuthUser,
    engine: web::Data<LedgerEngine>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(engine.catalog().await.all()))
}

/// Create or replace a leave type (admin)
#[utoipa::path(
    put,
    path = "/api/leave-types/{type_id}",
    params(
        ("type_id" = String, Path, description = "Leave type id, e.g. VACATION")
    ),
    request_body = SaveLeaveType,
    responses(
        (status = 200, description = "Leave type saved", body = LeaveTypeConfig),
        (status = 400, description = "Fixed range ends before it starts"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Leave type",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn save_leave_type(
    auth: AuthUser,
    engine: web::Data<LedgerEngine>,
    path: web::Path<String>,
    payload: web::Json<SaveLeaveType>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let SaveLeaveType {
        label,
        subtracts_days,
        fixed_range,
    } = payload.into_inner();

    if fixed_range.is_some_and(|r| r.end < r.start) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "fixed_range end cannot be before start"
        })));
    }

    let leave_type = LeaveTypeConfig {
        id: path.into_inner(),
        label,
        subtracts_days,
        fixed_range,
    };
    engine.upsert_leave_type(leave_type.clone()).await?;
    Ok(HttpResponse::Ok().json(leave_type))
}

/// Remove a leave type (admin). Existing requests keep their stored label.
#[utoipa::path(
    delete,
    path = "/api/leave-types/{type_id}",
    params(
        ("type_id" = String, Path, description = "Leave type id")
    ),
    responses(
        (status = 200, description = "Leave type removed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave type not found")
    ),
    tag = "Leave type",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_leave_type(
    auth: AuthUser,
    engine: web::Data<LedgerEngine>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if engine.remove_leave_type(&path).await? {
        Ok(HttpResponse::Ok().json(json!({ "message": "Leave type removed" })))
    } else {
        Ok(HttpResponse::NotFound().json(json!({ "message": "Leave type not found" })))
    }
}
