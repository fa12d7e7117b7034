use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::auth::AuthUser;
use crate::ledger::LedgerEngine;
use crate::model::request::Request;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SourceQuery {
    /// Defaults to the caller
    pub employee_id: Option<String>,
}

/// Earned overtime that can still be drawn from
#[utoipa::path(
    get,
    path = "/api/overtime/sources",
    params(SourceQuery),
    responses(
        (status = 200, description = "Approved earn records with hours left", body = [Request]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Overtime",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn available_sources(
    auth: AuthUser,
    engine: web::Data<LedgerEngine>,
    query: web::Query<SourceQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = query
        .into_inner()
        .employee_id
        .unwrap_or_else(|| auth.employee_id.clone());
    auth.require_self_or_reviewer(&employee_id)?;

    let sources = engine.list_available_overtime_sources(&employee_id).await?;
    Ok(HttpResponse::Ok().json(sources))
}
