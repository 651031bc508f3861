use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use miqat_core::CoreError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        let msg = err.to_string();
        match err {
            CoreError::PermissionDenied(_) | CoreError::Forbidden(_) => {
                AppError::AuthorizationError(msg)
            }
            CoreError::ValidationError(_) => AppError::ValidationError(msg),
            CoreError::NotFound { .. } => AppError::NotFoundError(msg),
            CoreError::MissingOwner | CoreError::Repository(_) => AppError::InternalServerError(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miqat_shared::Category;

    #[test]
    fn test_core_errors_map_to_status() {
        let cases = vec![
            (CoreError::PermissionDenied("x".into()), StatusCode::FORBIDDEN),
            (CoreError::Forbidden(3), StatusCode::FORBIDDEN),
            (CoreError::ValidationError("x".into()), StatusCode::BAD_REQUEST),
            (CoreError::NotFound { category: Category::Hotels, id: 1 }, StatusCode::NOT_FOUND),
            (CoreError::Repository("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }
}
