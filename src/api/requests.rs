use actix_web::{HttpResponse, Responder, web};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::api::{LifecycleResponse, Page};
use crate::auth::auth::AuthUser;
use crate::ledger::{Impact, LedgerEngine};
use crate::model::request::{Request, RequestDraft, RequestFilter, RequestKind, RequestStatus};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RequestQuery {
    /// Filter by employee id (supervisors and admins only)
    pub employee_id: Option<String>,
    /// Filter by status
    pub status: Option<RequestStatus>,
    /// Filter by request type id
    pub type_id: Option<String>,
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    /// Items per page
    pub per_page: Option<u32>,
}

#[derive(serde::Serialize, ToSchema)]
pub struct RequestListResponse {
    pub data: Vec<Request>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "type_id": "VACATION",
    "start_date": "2024-06-10",
    "end_date": "2024-06-12",
    "reason": "Family trip"
}))]
pub struct CreateRequest {
    #[serde(flatten)]
    pub draft: RequestDraft,
    /// Admins may file on behalf of another employee.
    pub employee_id: Option<String>,
    /// Admins may pick the initial status.
    pub status: Option<RequestStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusChange {
    pub status: RequestStatus,
    #[schema(example = "Enjoy the break")]
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReviewComment {
    #[schema(example = "Coverage arranged")]
    pub comment: Option<String>,
}

/// Raw dates are accepted so an unfinished form still previews.
#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "type_id": "VACATION",
    "start_date": "2024-06-10",
    "end_date": "2024-06-12"
}))]
pub struct ImpactQuery {
    pub type_id: String,
    pub start_date: String,
    pub end_date: Option<String>,
    #[schema(value_type = Option<String>)]
    pub hours: Option<Decimal>,
}

/// Preview the balance impact of a draft
#[utoipa::path(
    post,
    path = "/api/impact",
    request_body = ImpactQuery,
    responses(
        (status = 200, description = "Signed day and hour deltas", body = Impact),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn preview_impact(
    _auth: AuthUser,
    engine: web::Data<LedgerEngine>,
    payload: web::Json<ImpactQuery>,
) -> actix_web::Result<impl Responder> {
    let q = payload.into_inner();
    let impact = engine
        .compute_impact(&q.type_id, &q.start_date, q.end_date.as_deref(), q.hours)
        .await;
    Ok(HttpResponse::Ok().json(impact))
}

/// List requests, newest first
#[utoipa::path(
    get,
    path = "/api/requests",
    params(RequestQuery),
    responses(
        (status = 200, description = "Paginated request list", body = RequestListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Store unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn list_requests(
    auth: AuthUser,
    engine: web::Data<LedgerEngine>,
    query: web::Query<RequestQuery>,
) -> actix_web::Result<impl Responder> {
    let query = query.into_inner();

    // workers only ever see their own requests
    let employee_id = if auth.role.can_review() {
        query.employee_id
    } else {
        Some(auth.employee_id.clone())
    };

    let filter = RequestFilter {
        employee_id,
        status: query.status,
        type_id: query.type_id,
    };
    debug!(?filter, "Listing requests");

    let rows = engine.list_requests(&filter).await?;
    let page = Page::slice(rows, query.page, query.per_page);

    Ok(HttpResponse::Ok().json(RequestListResponse {
        data: page.data,
        page: page.page,
        per_page: page.per_page,
        total: page.total,
    }))
}

/// Submit a request
#[utoipa::path(
    post,
    path = "/api/requests",
    request_body = CreateRequest,
    responses(
        (status = 201, description = "Request created", body = LifecycleResponse),
        (status = 400, description = "Validation failed", body = Object, example = json!({
            "message": "over-allocation on source b0c1d2e3: requested 5 hours but only 2 remain"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 503, description = "Store unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn create_request(
    auth: AuthUser,
    engine: web::Data<LedgerEngine>,
    payload: web::Json<CreateRequest>,
) -> actix_web::Result<impl Responder> {
    let CreateRequest {
        draft,
        employee_id,
        status,
    } = payload.into_inner();
    auth.require_may_handle(&RequestKind::from_type_id(&draft.type_id))?;

    let (employee_id, status, created_by_admin) = if auth.is_admin() {
        (
            employee_id.unwrap_or_else(|| auth.employee_id.clone()),
            status.unwrap_or(RequestStatus::Pending),
            true,
        )
    } else {
        if employee_id.as_deref().is_some_and(|id| id != auth.employee_id) {
            return Err(actix_web::error::ErrorForbidden(
                "Only admins can file for other employees",
            ));
        }
        if status.is_some_and(|s| s != RequestStatus::Pending) {
            return Err(actix_web::error::ErrorForbidden(
                "Only admins can set the initial status",
            ));
        }
        (auth.employee_id.clone(), RequestStatus::Pending, false)
    };

    let outcome = engine
        .create_request(draft, &employee_id, status, created_by_admin)
        .await?;

    Ok(HttpResponse::Created().json(LifecycleResponse::from(outcome)))
}

/// Fetch one request
#[utoipa::path(
    get,
    path = "/api/requests/{request_id}",
    params(
        ("request_id" = String, Path, description = "Request id")
    ),
    responses(
        (status = 200, description = "Request found", body = Request),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found", body = Object, example = json!({
            "message": "request 42 not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn get_request(
    auth: AuthUser,
    engine: web::Data<LedgerEngine>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let request = engine.get_request(&path).await?;
    auth.require_self_or_reviewer(&request.employee_id)?;
    Ok(HttpResponse::Ok().json(request))
}

/// Edit a pending request
#[utoipa::path(
    put,
    path = "/api/requests/{request_id}",
    params(
        ("request_id" = String, Path, description = "Request id")
    ),
    request_body = RequestDraft,
    responses(
        (status = 200, description = "Request updated", body = LifecycleResponse),
        (status = 400, description = "Validation failed or request no longer pending"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn update_request(
    auth: AuthUser,
    engine: web::Data<LedgerEngine>,
    path: web::Path<String>,
    payload: web::Json<RequestDraft>,
) -> actix_web::Result<impl Responder> {
    let current = engine.get_request(&path).await?;
    auth.require_owner_or_admin(&current.employee_id)?;
    let draft = payload.into_inner();
    auth.require_may_handle(&current.kind)?;
    auth.require_may_handle(&RequestKind::from_type_id(&draft.type_id))?;

    let outcome = engine.update_request(&path, draft).await?;
    Ok(HttpResponse::Ok().json(LifecycleResponse::from(outcome)))
}

/// Delete a request, reversing any active balance effect
#[utoipa::path(
    delete,
    path = "/api/requests/{request_id}",
    params(
        ("request_id" = String, Path, description = "Request id")
    ),
    responses(
        (status = 200, description = "Request deleted; the removed record is returned", body = LifecycleResponse),
        (status = 400, description = "Earned overtime already drawn from"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn delete_request(
    auth: AuthUser,
    engine: web::Data<LedgerEngine>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let current = engine.get_request(&path).await?;
    auth.require_owner_or_admin(&current.employee_id)?;
    auth.require_may_handle(&current.kind)?;

    let outcome = engine.delete_request(&path).await?;
    Ok(HttpResponse::Ok().json(LifecycleResponse::from(outcome)))
}

/// Move a request to any status (supervisor/admin)
#[utoipa::path(
    put,
    path = "/api/requests/{request_id}/status",
    params(
        ("request_id" = String, Path, description = "Request id")
    ),
    request_body = StatusChange,
    responses(
        (status = 200, description = "Status changed", body = LifecycleResponse),
        (status = 400, description = "Earned overtime already drawn from"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn set_status(
    auth: AuthUser,
    engine: web::Data<LedgerEngine>,
    path: web::Path<String>,
    payload: web::Json<StatusChange>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;
    let StatusChange { status, comment } = payload.into_inner();

    let outcome = engine
        .set_request_status(&path, status, &auth.employee_id, comment)
        .await?;
    Ok(HttpResponse::Ok().json(LifecycleResponse::from(outcome)))
}

/// Approve a request (supervisor/admin)
#[utoipa::path(
    put,
    path = "/api/requests/{request_id}/approve",
    params(
        ("request_id" = String, Path, description = "Request id")
    ),
    request_body(content = ReviewComment, description = "Optional reviewer comment"),
    responses(
        (status = 200, description = "Request approved", body = LifecycleResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn approve_request(
    auth: AuthUser,
    engine: web::Data<LedgerEngine>,
    path: web::Path<String>,
    payload: Option<web::Json<ReviewComment>>,
) -> actix_web::Result<impl Responder> {
    review(auth, engine, path, payload, RequestStatus::Approved).await
}

/// Reject a request (supervisor/admin)
#[utoipa::path(
    put,
    path = "/api/requests/{request_id}/reject",
    params(
        ("request_id" = String, Path, description = "Request id")
    ),
    request_body(content = ReviewComment, description = "Optional reviewer comment"),
    responses(
        (status = 200, description = "Request rejected", body = LifecycleResponse),
        (status = 400, description = "Earned overtime already drawn from", body = Object, example = json!({
            "message": "request b0c1d2e3 has 3 hours already consumed and cannot be withdrawn"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn reject_request(
    auth: AuthUser,
    engine: web::Data<LedgerEngine>,
    path: web::Path<String>,
    payload: Option<web::Json<ReviewComment>>,
) -> actix_web::Result<impl Responder> {
    review(auth, engine, path, payload, RequestStatus::Rejected).await
}

async fn review(
    auth: AuthUser,
    engine: web::Data<LedgerEngine>,
    path: web::Path<String>,
    payload: Option<web::Json<ReviewComment>>,
    status: RequestStatus,
) -> actix_web::Result<HttpResponse> {
    auth.require_reviewer()?;
    let comment = payload.and_then(|p| p.into_inner().comment);

    let outcome = engine
        .set_request_status(&path, status, &auth.employee_id, comment)
        .await?;

    Ok(HttpResponse::Ok().json(LifecycleResponse::from(outcome)))
}
