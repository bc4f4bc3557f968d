use anyhow::Context;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::config::CorsConfig;

pub const ALLOWED_METHODS: &str = "PUT,GET,POST,DELETE,OPTIONS";

/// Pre-validated header values, built once at startup.
#[derive(Debug, Clone)]
pub struct CorsHeaders {
    allow_origin: HeaderValue,
    allow_headers: HeaderValue,
    max_age: HeaderValue,
}

impl CorsHeaders {
    pub fn new(config: &CorsConfig) -> anyhow::Result<Self> {
        Ok(Self {
            allow_origin: HeaderValue::from_str(&config.allowed_origin)
                .context("CORS_ALLOWED_ORIGIN is not a valid header value")?,
            allow_headers: HeaderValue::from_str(&config.allowed_headers)
                .context("CORS_ALLOWED_HEADERS is not a valid header value")?,
            max_age: HeaderValue::from(config.max_age_secs),
        })
    }

    fn decorate(&self, headers: &mut HeaderMap) {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            self.allow_origin.clone(),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    }

    fn decorate_preflight(&self, headers: &mut HeaderMap) {
        self.decorate(headers);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            self.allow_headers.clone(),
        );
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
    }
}

/// Answers preflight requests directly and stamps the CORS headers on every
/// other response, errors included.
pub async fn cors_middleware(
    State(cors): State<CorsHeaders>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        debug!(path = %request.uri().path(), "Preflight request");
        let mut response = StatusCode::NO_CONTENT.into_response();
        cors.decorate_preflight(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    cors.decorate(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, middleware, routing::get, Router};
    use tower::ServiceExt;

    async fn handler() -> &'static str {
        "OK"
    }

    async fn failing() -> (StatusCode, &'static str) {
        (StatusCode::NOT_FOUND, "nope")
    }

    fn app() -> Router {
        let cors = CorsHeaders::new(&CorsConfig::default()).unwrap();
        Router::new()
            .route("/", get(handler))
            .route("/missing", get(failing))
            .layer(middleware::from_fn_with_state(cors, cors_middleware))
    }

    #[tokio::test]
    async fn preflight_short_circuits_with_no_content() {
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let headers = response.headers();
        assert_eq!(
            headers.get("Access-Control-Allow-Origin").unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(headers.get("Access-Control-Allow-Credentials").unwrap(), "true");
        assert_eq!(
            headers.get("Access-Control-Allow-Methods").unwrap(),
            ALLOWED_METHODS
        );
        assert_eq!(
            headers.get("Access-Control-Allow-Headers").unwrap(),
            "Content-Type"
        );
        assert_eq!(headers.get("Access-Control-Max-Age").unwrap(), "3600");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn simple_responses_carry_origin_and_credentials() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app().oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert!(headers.contains_key("Access-Control-Allow-Origin"));
        assert_eq!(headers.get("Access-Control-Allow-Credentials").unwrap(), "true");
        assert!(!headers.contains_key("Access-Control-Allow-Methods"));
    }

    #[tokio::test]
    async fn error_responses_are_decorated_too() {
        let req = Request::builder()
            .uri("/missing")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("Access-Control-Allow-Origin"));
    }

    #[test]
    fn invalid_origin_is_rejected_at_startup() {
        let config = CorsConfig {
            allowed_origin: "bad\norigin".to_string(),
            ..CorsConfig::default()
        };
        assert!(CorsHeaders::new(&config).is_err());
    }
}
