use actix_web::HttpResponse;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

use crate::api::LifecycleResponse;
use crate::api::employee::{EmployeeListResponse, LedgerHistoryResponse};
use crate::api::leave_types::SaveLeaveType;
use crate::api::requests::{
    CreateRequest, ImpactQuery, RequestListResponse, ReviewComment, StatusChange,
};
use crate::ledger::{ConflictRecord, Impact};
use crate::model::{
    balance_entry::BalanceEntry,
    department::Department,
    employee::{Employee, NewEmployee},
    leave_type::{FixedRange, LeaveTypeConfig},
    request::{OvertimeUsage, Request, RequestDraft, RequestStatus},
    role::Role,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Ledger API",
        version = "1.0.0",
        description = r#"
## HR balance ledger

Leave and overtime requests with exact balance bookkeeping.

### Key features
- **Requests**: submit, edit while pending, approve, reject and delete; every
  state change applies or reverses its balance effect exactly once
- **Overtime**: earned hours can be drawn down partially across several requests
- **Conflicts**: days on which two or more colleagues of a department are away
- **Leave types**: configurable labels, day deduction and fixed date ranges

### Security
All `/api` endpoints expect a **JWT Bearer** token. Reviews are limited to
supervisors and admins; configuration to admins.

### Response format
Decimal balances are serialized as strings to keep them exact.
"#,
    ),
    paths(
        crate::api::requests::preview_impact,
        crate::api::requests::list_requests,
        crate::api::requests::create_request,
        crate::api::requests::get_request,
        crate::api::requests::update_request,
        crate::api::requests::delete_request,
        crate::api::requests::set_status,
        crate::api::requests::approve_request,
        crate::api::requests::reject_request,

        crate::api::overtime::available_sources,
        crate::api::conflicts::list_conflicts,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::employee_ledger,

        crate::api::leave_types::list_leave_types,
        crate::api::leave_types::save_leave_type,
        crate::api::leave_types::delete_leave_type
    ),
    components(
        schemas(
            Request,
            RequestDraft,
            RequestStatus,
            OvertimeUsage,
            CreateRequest,
            StatusChange,
            ReviewComment,
            ImpactQuery,
            Impact,
            LifecycleResponse,
            RequestListResponse,
            ConflictRecord,
            Employee,
            NewEmployee,
            Role,
            Department,
            EmployeeListResponse,
            BalanceEntry,
            LedgerHistoryResponse,
            LeaveTypeConfig,
            FixedRange,
            SaveLeaveType
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Request", description = "Request lifecycle APIs"),
        (name = "Overtime", description = "Overtime consumption APIs"),
        (name = "Conflict", description = "Absence conflict APIs"),
        (name = "Employee", description = "Employee balance APIs"),
        (name = "Leave type", description = "Leave type configuration APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
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

pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
