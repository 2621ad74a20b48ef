use actix_web::{HttpResponse, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Business-rule and infrastructure failures surfaced to the caller.
///
/// The first five variants map 1:1 to the rejection kinds a client is
/// expected to correct and resubmit; `Database` is the generic transient
/// infrastructure failure and never leaks store details to the response.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::Conflict(_) => "conflict",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::InvalidState(_) => "invalid_state",
            ApiError::Database(_) => "internal",
        }
    }
}

impl actix_web::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidState(_) => StatusCode::CONFLICT,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::Database(e) => {
                tracing::error!(error = %e, "Database failure");
                "Something went wrong, contact the system admin".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.kind(),
            "message": message,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_map_to_client_status_codes() {
        assert_eq!(
            actix_web::ResponseError::status_code(&ApiError::Validation("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            actix_web::ResponseError::status_code(&ApiError::Conflict("x".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            actix_web::ResponseError::status_code(&ApiError::Forbidden("x".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            actix_web::ResponseError::status_code(&ApiError::NotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            actix_web::ResponseError::status_code(&ApiError::InvalidState("x".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn store_failure_is_transient_not_a_business_rejection() {
        // A dropped connection during the registration availability probe
        // must surface as the generic 500, never as a 409 conflict.
        let err = ApiError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(
            actix_web::ResponseError::status_code(&err),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_ne!(
            actix_web::ResponseError::status_code(&err),
            StatusCode::CONFLICT
        );
        assert_eq!(err.kind(), "internal");
    }

    #[test]
    fn database_errors_hide_detail() {
        let err = ApiError::Database(sqlx::Error::RowNotFound);
        assert_eq!(
            actix_web::ResponseError::status_code(&err),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(err.kind(), "internal");
    }
}
