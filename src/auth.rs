//! Authenticated identity supplied by the upstream gateway.
//!
//! Credential verification happens before requests reach this service; the
//! gateway injects the verified identity as headers. The extractor trusts
//! them without re-validation.

use crate::error::AppError;
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use serde::Serialize;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_EMPLOYEE: &str = "employee";

/// Identity context `{id, role, department_code}`.
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub id: i64,
    pub role: String,
    pub department_code: Option<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Gate for reviewer-only operations. The denial reads as not-found so
    /// callers cannot probe which endpoints exist.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::permission("Không tìm thấy tài nguyên yêu cầu"))
        }
    }
}

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = header_value(req, "x-user-id")
            .and_then(|id| id.parse::<i64>().ok())
            .zip(header_value(req, "x-user-role"))
            .map(|(id, role)| AuthUser {
                id,
                role,
                department_code: header_value(req, "x-department-code"),
            });

        ready(user.ok_or_else(|| AppError::auth("Chưa đăng nhập hoặc phiên làm việc đã hết hạn")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_extracts_identity_headers() {
        let req = TestRequest::default()
            .insert_header(("x-user-id", "42"))
            .insert_header(("x-user-role", "employee"))
            .insert_header(("x-department-code", "D1"))
            .to_http_request();
        let user = AuthUser::extract(&req).await.unwrap();
        assert_eq!(user.id, 42);
        assert_eq!(user.role, ROLE_EMPLOYEE);
        assert_eq!(user.department_code.as_deref(), Some("D1"));
        assert!(!user.is_admin());
    }

    #[actix_web::test]
    async fn test_missing_identity_is_unauthorized() {
        let req = TestRequest::default().to_http_request();
        let err = AuthUser::extract(&req).await.unwrap_err();
        assert!(matches!(err, AppError::Auth { .. }));
    }
}
