use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Unified application error type.
///
/// Variants follow the failure taxonomy of the declaration workflow:
/// validation, state preconditions, duplicates, missing/unowned records,
/// database faults and everything else. User-facing messages are Vietnamese
/// and returned verbatim in the error envelope.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Lỗi cấu hình: {0}")]
    Config(#[from] crate::comm::config::ConfigError),

    #[error("{message}")]
    Auth { message: String },

    #[error("{message}")]
    Permission { message: String },

    #[error("{message}")]
    Validation { field: String, message: String },

    /// A lifecycle precondition was not met (batch not pending, already
    /// paid, missing rejection note, ...).
    #[error("{message}")]
    State { message: String },

    /// Uniqueness conflict, carrying the conflicting record's identifying
    /// detail in the message.
    #[error("{message}")]
    Duplicate { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("Lỗi cơ sở dữ liệu: {message}")]
    Database { message: String },

    #[error("Lỗi hệ thống: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn auth<T: Into<String>>(message: T) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn permission<T: Into<String>>(message: T) -> Self {
        Self::Permission {
            message: message.into(),
        }
    }

    pub fn validation<T: Into<String>, U: Into<String>>(field: T, message: U) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn state<T: Into<String>>(message: T) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    pub fn duplicate<T: Into<String>>(message: T) -> Self {
        Self::Duplicate {
            message: message.into(),
        }
    }

    pub fn not_found<T: Into<String>>(message: T) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn database<T: Into<String>>(message: T) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 1001,
            AppError::Auth { .. } => 1002,
            AppError::Permission { .. } => 1003,
            AppError::Validation { .. } => 1004,
            AppError::State { .. } => 1005,
            AppError::Duplicate { .. } => 1006,
            AppError::NotFound { .. } => 1007,
            AppError::Database { .. } => 1008,
            AppError::Internal(_) => 1000,
        }
    }

    pub fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth { .. } => StatusCode::UNAUTHORIZED,
            // Ownership failures are reported as 404 so callers cannot
            // probe for records they do not own.
            AppError::Permission { .. } => StatusCode::NOT_FOUND,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::State { .. } => StatusCode::BAD_REQUEST,
            AppError::Duplicate { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Translate driver errors into the domain taxonomy: unique violations
/// become duplicate errors, foreign-key violations become missing-reference
/// errors, everything else surfaces as a database fault.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::not_found("Không tìm thấy dữ liệu"),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => AppError::duplicate("Dữ liệu bị trùng lặp"),
                Some("23503") => AppError::not_found("Dữ liệu tham chiếu không tồn tại"),
                _ => AppError::database(db_err.to_string()),
            },
            _ => AppError::database(err.to_string()),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = AppError::status_code(self);
        let message = self.to_string();

        match self {
            AppError::Internal(_) | AppError::Database { .. } | AppError::Config(_) => {
                tracing::error!("Internal error: {}", message);
            }
            _ => {
                tracing::info!("Client error: {}", message);
            }
        }

        HttpResponse::build(status).json(json!({
            "success": false,
            "message": message,
            "error": {
                "code": self.error_code(),
            }
        }))
    }
}

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(
            AppError::validation("bhxh_code", "sai định dạng").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::state("chưa nộp").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::duplicate("trùng mã số").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found("không tìm thấy").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::permission("không có quyền").status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::NotFound { .. }));
        assert_eq!(err.error_code(), 1007);
    }
}
