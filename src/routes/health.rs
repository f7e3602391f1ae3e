//! Root health check.
//!
//! `GET /` answers as long as the process can serve HTTP. It does not report
//! store connectivity: a store that failed to open at startup is only visible
//! in the logs.

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub success: bool,
    pub users: Vec<serde_json::Value>,
}

pub async fn root() -> Json<RootResponse> {
    tracing::info!("GET /");
    Json(RootResponse {
        success: true,
        users: Vec::new(),
    })
}
