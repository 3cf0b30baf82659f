use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::error;

/// JSON error body `{"error": message}` with a status code.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub message: String,
}

impl JsonApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({"error": self.message}))).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(msg) => Self::bad_request(msg),
            ServiceError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, msg),
            // storage details stay in the log
            ServiceError::Storage(inner) => {
                error!(error = %inner, "request failed in storage layer");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("runtime check failed: {0}")]
    Runtime(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::storage::StorageError;

    #[test]
    fn maps_service_errors_to_status() {
        let e: JsonApiError = ServiceError::Validation("Already bookmarked".into()).into();
        assert_eq!((e.status, e.message.as_str()), (StatusCode::BAD_REQUEST, "Already bookmarked"));

        let e: JsonApiError = ServiceError::not_found("User").into();
        assert_eq!((e.status, e.message.as_str()), (StatusCode::NOT_FOUND, "User not found"));

        let e: JsonApiError = ServiceError::Storage(StorageError::Auth("denied".into())).into();
        assert_eq!((e.status, e.message.as_str()), (StatusCode::INTERNAL_SERVER_ERROR, "Server error"));
    }
}
