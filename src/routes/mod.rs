//! HTTP routes and the middleware stack around them.
//!
//! Layer order, outermost first: request ID span, CORS, security headers,
//! panic handler, body limit. The request ID layer wraps everything so all
//! logs emitted while serving a request carry its ID.

pub mod health;

use axum::{extract::DefaultBodyLimit, http::Uri, middleware, routing::get, Router};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::{catch_panic_layer, cors_layer, request_id_layer, with_security_headers};
use crate::state::AppState;

/// Creates the Axum router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    let routes = Router::new()
        .route("/", get(health::root))
        .fallback(not_found)
        .with_state(state);

    with_middleware(routes, &config)
}

/// Wraps `routes` in the full middleware stack.
///
/// Layers only apply to routes registered before them, so every route must
/// be on `routes` before this is called.
pub fn with_middleware(routes: Router, config: &AppConfig) -> Router {
    let app = routes
        .layer(DefaultBodyLimit::max(config.http.body_limit_bytes))
        .layer(catch_panic_layer(config.environment.exposes_error_details()));

    with_security_headers(app, config.csp_enabled())
        .layer(cors_layer())
        .layer(middleware::from_fn(request_id_layer))
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
