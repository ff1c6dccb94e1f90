use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Build an upstream error from a non-2xx vendor response body.
    ///
    /// Understands both the Web API shape (`{"error": {"status", "message"}}`)
    /// and the accounts-service shape (`{"error", "error_description"}`).
    pub fn upstream(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .or_else(|| v.get("error_description"))
                    .or_else(|| v.get("error").filter(|e| e.is_string()))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| {
                if body.is_empty() {
                    "empty response".to_string()
                } else {
                    body.to_string()
                }
            });

        AppError::Upstream { status, message }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Network(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Upstream { status, ref message } => {
                tracing::error!("Upstream error: {} - {}", status, message);
                // Vendor client errors (bad token, missing scope) are passed through
                let code = StatusCode::from_u16(status)
                    .ok()
                    .filter(StatusCode::is_client_error)
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                (
                    code,
                    json!({ "error": message.clone(), "status": status }),
                )
            }
            AppError::Network(msg) => {
                tracing::error!("Network error: {}", msg);
                (StatusCode::BAD_GATEWAY, json!({ "error": msg }))
            }
            AppError::ExternalApi(msg) => (StatusCode::BAD_GATEWAY, json!({ "error": msg })),
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
