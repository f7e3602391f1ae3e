use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not Found: {0}")]
    NotFound(String),

    /// `detail` is only set when the environment exposes error details.
    #[error("Internal Server Error")]
    Internal { detail: Option<String> },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFound(path) => {
                tracing::debug!(%path, "No route matched");
                (
                    StatusCode::NOT_FOUND,
                    ErrorBody {
                        message: "Not Found".to_string(),
                        error: None,
                    },
                )
            }
            AppError::Internal { detail } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    message: "Internal Server Error".to_string(),
                    error: detail,
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}
