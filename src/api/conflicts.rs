use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::auth::AuthUser;
use crate::ledger::{ConflictRecord, LedgerEngine};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConflictQuery {
    #[param(example = 2024)]
    pub year: i32,
    /// 1 to 12
    #[param(example = 7)]
    pub month: u32,
    pub department_id: Option<String>,
}

/// Days on which two or more employees of a department are on approved leave
#[utoipa::path(
    get,
    path = "/api/conflicts",
    params(ConflictQuery),
    responses(
        (status = 200, description = "Conflicts ordered by date, then department", body = [ConflictRecord]),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Conflict",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_conflicts(
    auth: AuthUser,
    engine: web::Data<LedgerEngine>,
    query: web::Query<ConflictQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;

    let conflicts = engine
        .list_conflicts(query.year, query.month, query.department_id.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(conflicts))
}
