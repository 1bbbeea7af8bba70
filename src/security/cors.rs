//! Cross-origin resource sharing.

use std::time::Duration;

use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use crate::config::CorsConfig;

/// Build the CORS layer. `*` allows any origin.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            config
                .allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok()),
        )
    };

    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| m.trim().parse().ok())
        .collect();

    let mut layer = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers(AllowHeaders::mirror_request());
    if config.max_age_secs > 0 {
        layer = layer.max_age(Duration::from_secs(config.max_age_secs));
    }
    layer
}

/// Answer every `OPTIONS` request with `204`.
///
/// Runs inside the CORS layer, which attaches the headers to the reply, so
/// a bare `OPTIONS` without `Access-Control-Request-Method` still gets them.
pub async fn options_preflight_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware::from_fn, routing::get, Router};
    use tower::ServiceExt;

    async fn dummy_handler() -> &'static str {
        "OK"
    }

    fn app(config: &CorsConfig) -> Router {
        Router::new()
            .route("/test", get(dummy_handler))
            .layer(from_fn(options_preflight_middleware))
            .layer(cors_layer(config))
    }

    #[tokio::test]
    async fn test_cors_wildcard_origin() {
        let request = Request::builder()
            .uri("/test")
            .header("Origin", "http://example.com")
            .body(Body::empty())
            .unwrap();
        let response = app(&CorsConfig::default()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_preflight_any_path() {
        let request = Request::builder()
            .uri("/not/a/route")
            .method("OPTIONS")
            .header("Origin", "http://example.com")
            .header("Access-Control-Request-Method", "DELETE")
            .header("Access-Control-Request-Headers", "content-type")
            .body(Body::empty())
            .unwrap();
        let response = app(&CorsConfig::default()).oneshot(request).await.unwrap();

        assert!(response.status().is_success());
        let headers = response.headers();
        assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
        let methods = headers
            .get("access-control-allow-methods")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(methods.contains("DELETE"));
        assert_eq!(
            headers.get("access-control-allow-headers").unwrap(),
            "content-type"
        );
    }

    #[tokio::test]
    async fn test_cors_disallows_unlisted_origin() {
        let config = CorsConfig {
            allowed_origins: vec!["https://natours.example".to_string()],
            ..Default::default()
        };
        let request = Request::builder()
            .uri("/test")
            .header("Origin", "http://untrusted.example")
            .body(Body::empty())
            .unwrap();
        let response = app(&config).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response
            .headers()
            .contains_key("access-control-allow-origin"));
    }
}
