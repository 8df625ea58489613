use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rotaplan_core::AppError;
use serde::Serialize;

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    kind: &'static str,
    message: String,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::FailedPrecondition(_) => StatusCode::PRECONDITION_FAILED,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if let AppError::Internal(detail) = &self.0 {
            tracing::error!(detail = %detail, "internal error");
        }

        let payload = Json(ErrorResponse {
            kind: self.0.kind(),
            message: client_message(&self.0),
        });

        (status, payload).into_response()
    }
}

/// Message exposed to API callers. Internal details stay in the server
/// logs; everything else is safe to echo.
fn client_message(error: &AppError) -> String {
    match error {
        AppError::Internal(_) => "an internal error occurred".to_owned(),
        other => other.to_string(),
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_details_never_reach_callers() {
        let error = AppError::Internal("failed to load schedule: db has no pg_hba.conf".to_owned());
        let message = client_message(&error);
        assert_eq!(message, "an internal error occurred");
        assert!(!message.contains("pg_hba"));
    }

    #[test]
    fn client_errors_keep_their_message() {
        let error = AppError::Validation("start date must not be after end date".to_owned());
        assert_eq!(
            client_message(&error),
            "validation error: start date must not be after end date"
        );
    }
}
