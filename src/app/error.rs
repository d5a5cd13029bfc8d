//! Maps [`ViewerError`] onto HTTP responses.

use crate::utils::error::{ErrorCategory, ViewerError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

impl ViewerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ViewerError::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => match self.category() {
                ErrorCategory::Request => StatusCode::BAD_REQUEST,
                ErrorCategory::Network | ErrorCategory::Upstream => StatusCode::BAD_GATEWAY,
                ErrorCategory::Authentication
                | ErrorCategory::Configuration
                | ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ViewerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(
                "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
                self,
                self.category(),
                self.severity()
            );
        } else {
            tracing::warn!("Rejected request: {}", self);
        }

        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}
