use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use crate::api::{Page, Pagination};
use crate::auth::auth::AuthUser;
use crate::ledger::LedgerEngine;
use crate::model::{
    balance_entry::BalanceEntry,
    employee::{Employee, NewEmployee},
};

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 10)]
    pub total: usize,
}

#[derive(Serialize, ToSchema)]
pub struct LedgerHistoryResponse {
    pub data: Vec<BalanceEntry>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 3)]
    pub total: usize,
}

/// Onboard an employee (admin)
#[utoipa::path(
    post,
    path = "/api/employee",
    request_body = NewEmployee,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 503, description = "Store unavailable", body = Object, example = json!({
            "message": "Temporarily unavailable, please retry"
        }))
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    engine: web::Data<LedgerEngine>,
    payload: web::Json<NewEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let employee = engine.onboard_employee(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(employee))
}

/// List employees with their balances (supervisor/admin)
#[utoipa::path(
    get,
    path = "/api/employee",
    responses(
        (status = 200, description = "Employee list", body = EmployeeListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    engine: web::Data<LedgerEngine>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;

    let mut data = engine.list_employees().await?;
    data.sort_by(|a, b| a.full_name.cmp(&b.full_name));
    debug!(count = data.len(), "Listing employees");

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        total: data.len(),
        data,
    }))
}

/// Fetch an employee and current balances
#[utoipa::path(
    get,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id" = String, Path, description = "Employee id")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    engine: web::Data<LedgerEngine>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_self_or_reviewer(&path)?;
    let employee = engine.employee(&path).await?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Balance mutations applied to an employee, oldest first
#[utoipa::path(
    get,
    path = "/api/employee/{employee_id}/ledger",
    params(
        ("employee_id" = String, Path, description = "Employee id"),
        Pagination
    ),
    responses(
        (status = 200, description = "Balance history", body = LedgerHistoryResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn employee_ledger(
    auth: AuthUser,
    engine: web::Data<LedgerEngine>,
    path: web::Path<String>,
    query: web::Query<Pagination>,
) -> actix_web::Result<impl Responder> {
    auth.require_self_or_reviewer(&path)?;

    let entries = engine.balance_history(&path).await?;
    let page = Page::slice(entries, query.page, query.per_page);

    Ok(HttpResponse::Ok().json(LedgerHistoryResponse {
        data: page.data,
        page: page.page,
        per_page: page.per_page,
        total: page.total,
    }))
}
