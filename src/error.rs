use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use rust_decimal::Decimal;
use serde_json::json;

use crate::model::request::RequestStatus;

/// Durable-store failures. Always surfaced to the caller as retry-able.
#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
    #[display(fmt = "corrupt row in {}: {}", table, detail)]
    Corrupt { table: &'static str, detail: String },
    #[display(fmt = "store unavailable: {}", _0)]
    Unavailable(String),
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Rejections raised before anything is persisted.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum ValidationError {
    #[display(
        fmt = "over-allocation on source {}: requested {} hours but only {} remain",
        source_id,
        requested,
        remaining
    )]
    OverAllocation {
        source_id: String,
        requested: Decimal,
        remaining: Decimal,
    },
    #[display(
        fmt = "overtime usage sums to {} hours but the request states {}",
        usage_total,
        hours
    )]
    UsageSumMismatch { hours: Decimal, usage_total: Decimal },
    #[display(fmt = "overtime source {} does not exist", _0)]
    UnknownSource(String),
    #[display(fmt = "request {} cannot be drawn from", _0)]
    IneligibleSource(String),
    #[display(fmt = "hours drawn from source {} must be positive", _0)]
    NonPositiveUsage(String),
    #[display(fmt = "request type {} does not consume overtime", _0)]
    UsageNotAllowed(String),
    #[display(fmt = "{} has more than {} decimal places", value, max_scale)]
    TooPrecise { value: Decimal, max_scale: u32 },
    #[display(fmt = "end date cannot be before start date")]
    EndBeforeStart,
    #[display(fmt = "request is {} and can no longer be edited", _0)]
    NotEditable(RequestStatus),
    #[display(
        fmt = "request {} has {} hours already consumed and cannot be withdrawn",
        request_id,
        consumed
    )]
    SourceInUse { request_id: String, consumed: Decimal },
    #[display(fmt = "invalid month {}-{}", year, month)]
    InvalidMonth { year: i32, month: u32 },
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Display)]
pub enum LedgerError {
    #[display(fmt = "request {} not found", _0)]
    RequestNotFound(String),
    #[display(fmt = "employee {} not found", _0)]
    EmployeeNotFound(String),
    #[display(fmt = "{}", _0)]
    Validation(ValidationError),
    #[display(fmt = "{}", _0)]
    Store(StoreError),
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::Validation(e) => Some(e),
            LedgerError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        LedgerError::Store(e)
    }
}

impl From<ValidationError> for LedgerError {
    fn from(e: ValidationError) -> Self {
        LedgerError::Validation(e)
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

impl ResponseError for LedgerError {
    fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::RequestNotFound(_) | LedgerError::EmployeeNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
            LedgerError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            // store details stay in the logs
            LedgerError::Store(_) => "Temporarily unavailable, please retry".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}
