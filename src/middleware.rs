//! Cross-cutting HTTP middleware.
//!
//! - Request ID: a UUID v4 per request, a tracing span wrapping the request
//!   lifecycle, and an `x-request-id` response header.
//! - Security headers: the usual hardening headers, set only when a handler
//!   has not set them already.
//! - CORS: any origin.
//! - Panic handler: turns a panicking handler into a JSON 500 response.

use std::any::Any;
use std::time::Instant;

use axum::{
    body::Body,
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
    Router,
};
use const_format::formatcp;
use http::header::{self, HeaderName, HeaderValue};
use http::Method;
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};
use tower_http::cors::{Any as CorsAny, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::AppError;

/// Response header carrying the request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Strict-Transport-Security max-age (365 days)
pub const HSTS_MAX_AGE_SECS: u32 = 31_536_000;

pub const STRICT_TRANSPORT_SECURITY: &str =
    formatcp!("max-age={}; includeSubDomains", HSTS_MAX_AGE_SECS);

pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self';base-uri 'self';\
font-src 'self' https: data:;form-action 'self';frame-ancestors 'self';\
img-src 'self' data:;object-src 'none';script-src 'self';script-src-attr 'none';\
style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests";

/// Extension type for accessing request ID in handlers if needed.
#[derive(Clone, Debug)]
pub struct RequestId(pub Uuid);

/// Middleware that generates a request ID and creates a request span.
///
/// This should be the outermost middleware layer so the span wraps
/// all request processing, including other middleware and handlers.
pub async fn request_id_layer(mut request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        duration_ms = tracing::field::Empty,
    );

    let start = Instant::now();
    request.extensions_mut().insert(RequestId(request_id));

    async move {
        let mut response = next.run(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        tracing::Span::current().record("duration_ms", duration_ms);
        tracing::info!(
            status = response.status().as_u16(),
            duration_ms,
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }
        response
    }
    .instrument(span)
    .await
}

/// Hardening headers sent with every response.
pub fn security_headers(csp_enabled: bool) -> Vec<(HeaderName, HeaderValue)> {
    let mut headers = Vec::with_capacity(12);

    if csp_enabled {
        headers.push((
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ));
    }

    let fixed: [(&'static str, &'static str); 11] = [
        ("cross-origin-opener-policy", "same-origin"),
        ("cross-origin-resource-policy", "same-origin"),
        ("origin-agent-cluster", "?1"),
        ("referrer-policy", "no-referrer"),
        ("strict-transport-security", STRICT_TRANSPORT_SECURITY),
        ("x-content-type-options", "nosniff"),
        ("x-dns-prefetch-control", "off"),
        ("x-download-options", "noopen"),
        ("x-frame-options", "SAMEORIGIN"),
        ("x-permitted-cross-domain-policies", "none"),
        ("x-xss-protection", "0"),
    ];
    headers.extend(
        fixed
            .into_iter()
            .map(|(name, value)| (HeaderName::from_static(name), HeaderValue::from_static(value))),
    );

    headers
}

/// Layers every security header onto `router`, without overriding handlers.
pub fn with_security_headers(router: Router, csp_enabled: bool) -> Router {
    security_headers(csp_enabled)
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(name, value))
        })
}

/// CORS policy: any origin, the usual methods, any request header.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(CorsAny)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(CorsAny)
}

/// Builds the 500 response for a panicking handler.
#[derive(Clone, Copy, Debug)]
pub struct PanicResponder {
    pub expose_details: bool,
}

impl ResponseForPanic for PanicResponder {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Body> {
        let message = panic_message(err.as_ref());
        tracing::error!(panic = %message, "Handler panicked");

        AppError::Internal {
            detail: self.expose_details.then_some(message),
        }
        .into_response()
    }
}

pub fn catch_panic_layer(expose_details: bool) -> CatchPanicLayer<PanicResponder> {
    CatchPanicLayer::custom(PanicResponder { expose_details })
}

fn panic_message(err: &(dyn Any + Send)) -> String {
    if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_is_optional() {
        let with_csp = security_headers(true);
        let without_csp = security_headers(false);

        assert_eq!(with_csp.len(), 12);
        assert_eq!(without_csp.len(), 11);
        assert!(with_csp
            .iter()
            .any(|(name, _)| name == header::CONTENT_SECURITY_POLICY));
        assert!(!without_csp
            .iter()
            .any(|(name, _)| name == header::CONTENT_SECURITY_POLICY));
    }

    #[test]
    fn test_hsts_value() {
        assert_eq!(
            STRICT_TRANSPORT_SECURITY,
            "max-age=31536000; includeSubDomains"
        );
    }

    #[test]
    fn test_panic_message_extraction() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("boom"));
        assert_eq!(panic_message(owned.as_ref()), "boom");

        let borrowed: Box<dyn Any + Send> = Box::new("static boom");
        assert_eq!(panic_message(borrowed.as_ref()), "static boom");

        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
