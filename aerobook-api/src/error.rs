use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use aerobook_booking::BookingError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    AuthenticationError(String),
    #[error("{0}")]
    AuthorizationError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    NotFoundError(String),
    #[error("{0}")]
    ConflictError(String),
    #[error("{0}")]
    GatewayError(String),
    #[error("{0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::GatewayError(msg) => {
                tracing::error!("Payment gateway failure: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Unable to create order".to_string())
            }
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

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound(msg) => AppError::NotFoundError(msg),
            BookingError::ValidationFailed(msg) => AppError::ValidationError(msg),
            BookingError::Forbidden(msg) => AppError::AuthorizationError(msg),
            BookingError::Conflict(msg) => AppError::ConflictError(msg),
            BookingError::Gateway(e) => AppError::GatewayError(e.to_string()),
            err @ BookingError::SignatureMismatch => AppError::ValidationError(err.to_string()),
            BookingError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerobook_core::payment::GatewayError;

    #[test]
    fn test_booking_errors_map_to_status_codes() {
        let cases = [
            (BookingError::NotFound("Booking not found".into()), StatusCode::NOT_FOUND),
            (BookingError::ValidationFailed("seatNumber is required".into()), StatusCode::BAD_REQUEST),
            (BookingError::SignatureMismatch, StatusCode::BAD_REQUEST),
            (BookingError::Forbidden("Unauthorized to delete flight".into()), StatusCode::FORBIDDEN),
            (BookingError::Conflict("Flight already exists".into()), StatusCode::CONFLICT),
            (BookingError::Gateway(GatewayError::Timeout), StatusCode::INTERNAL_SERVER_ERROR),
            (BookingError::Internal("pool closed".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }
}
