use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use inkproxy_core::AppError;

use crate::dto::ErrorResponse;

const FETCH_FAILED: &str = "Failed to fetch data";

/// Wrapper so we can implement `IntoResponse` for `AppError`.
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            AppError::MissingUrl | AppError::InvalidQuery(_) | AppError::UnsupportedMode(_) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(self.0.to_string()),
            ),
            AppError::EmptyResult(_) => {
                (StatusCode::NOT_FOUND, ErrorResponse::new(self.0.to_string()))
            }
            other => {
                tracing::error!("Error: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(FETCH_FAILED).with_details(other.to_string()),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
