use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

use crate::model::{request::RequestKind, role::Role};

/// The acting employee, as established by the auth middleware. The ledger
/// trusts this identity without re-checking credentials.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub employee_id: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(ErrorUnauthorized("Missing token"))),
        }
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    pub fn require_reviewer(&self) -> actix_web::Result<()> {
        if self.role.can_review() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Supervisor/Admin only"))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Own records, or anyone's for admins.
    pub fn require_owner_or_admin(&self, employee_id: &str) -> actix_web::Result<()> {
        if self.is_admin() || self.employee_id == employee_id {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Not your record"))
        }
    }

    /// Own records, or anyone's for supervisors and admins.
    pub fn require_self_or_reviewer(&self, employee_id: &str) -> actix_web::Result<()> {
        if self.role.can_review() || self.employee_id == employee_id {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Not your record"))
        }
    }

    /// Balance adjustments are issued by admins only, on every write path.
    pub fn require_may_handle(&self, kind: &RequestKind) -> actix_web::Result<()> {
        if kind.is_adjustment() && !self.is_admin() {
            Err(actix_web::error::ErrorForbidden(
                "Only admins can issue balance adjustments",
            ))
        } else {
            Ok(())
        }
    }
}
