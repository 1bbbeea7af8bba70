//! Security response headers.
//!
//! The header set is computed once from config and added to every response
//! that does not already carry the header.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::config::{CspDirective, SecurityConfig};

/// Precomputed security headers.
#[derive(Debug, Clone, Default)]
pub struct SecurityHeaders {
    headers: HeaderMap,
}

impl SecurityHeaders {
    pub fn from_config(config: &SecurityConfig) -> Self {
        let mut headers = HeaderMap::new();
        if !config.enable_headers {
            return Self { headers };
        }

        let csp = content_security_policy(&config.content_security_policy);
        if !csp.is_empty() {
            insert_header(&mut headers, "content-security-policy", &csp);
        }
        insert_header(&mut headers, "cross-origin-opener-policy", "same-origin");
        insert_header(&mut headers, "cross-origin-resource-policy", "same-origin");
        insert_header(&mut headers, "origin-agent-cluster", "?1");
        insert_header(&mut headers, "referrer-policy", "no-referrer");
        if config.hsts {
            insert_header(
                &mut headers,
                "strict-transport-security",
                "max-age=15552000; includeSubDomains",
            );
        }
        insert_header(&mut headers, "x-content-type-options", "nosniff");
        insert_header(&mut headers, "x-dns-prefetch-control", "off");
        insert_header(&mut headers, "x-download-options", "noopen");
        insert_header(&mut headers, "x-frame-options", "SAMEORIGIN");
        insert_header(&mut headers, "x-permitted-cross-domain-policies", "none");
        insert_header(&mut headers, "x-xss-protection", "0");

        Self { headers }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Add every header the response does not set itself.
    pub fn apply(&self, target: &mut HeaderMap) {
        for (name, value) in self.headers.iter() {
            if !target.contains_key(name) {
                target.insert(name.clone(), value.clone());
            }
        }
    }
}

/// `name src src; name src; ...`
pub fn content_security_policy(directives: &[CspDirective]) -> String {
    directives
        .iter()
        .map(|d| {
            if d.sources.is_empty() {
                d.name.clone()
            } else {
                format!("{} {}", d.name, d.sources.join(" "))
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) {
    match (name.parse::<HeaderName>(), HeaderValue::from_str(value)) {
        (Ok(name), Ok(value)) => {
            headers.insert(name, value);
        }
        _ => tracing::warn!(header = name, value = value, "Skipping invalid security header"),
    }
}

pub async fn security_headers_middleware(
    State(headers): State<Arc<SecurityHeaders>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    headers.apply(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware::from_fn_with_state, routing::get, Router};
    use tower::ServiceExt;

    async fn dummy_handler() -> &'static str {
        "OK"
    }

    async fn framed_handler() -> ([(&'static str, &'static str); 1], &'static str) {
        ([("x-frame-options", "DENY")], "OK")
    }

    fn app(config: &SecurityConfig) -> Router {
        let headers = Arc::new(SecurityHeaders::from_config(config));
        Router::new()
            .route("/test", get(dummy_handler))
            .route("/framed", get(framed_handler))
            .layer(from_fn_with_state(headers, security_headers_middleware))
    }

    #[tokio::test]
    async fn test_security_headers_present() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app(&SecurityConfig::default()).oneshot(request).await.unwrap();

        let headers = response.headers();
        assert_eq!(headers.get("x-frame-options").unwrap(), "SAMEORIGIN");
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("x-dns-prefetch-control").unwrap(), "off");
        assert_eq!(headers.get("referrer-policy").unwrap(), "no-referrer");
        assert!(headers.contains_key("strict-transport-security"));

        let csp = headers.get("content-security-policy").unwrap().to_str().unwrap();
        assert!(csp.starts_with("default-src 'self' https://*.mapbox.com"));
        assert!(csp.contains("object-src 'none'"));
        assert!(csp.ends_with("upgrade-insecure-requests"));
    }

    #[tokio::test]
    async fn test_handler_headers_win() {
        let request = Request::builder().uri("/framed").body(Body::empty()).unwrap();
        let response = app(&SecurityConfig::default()).oneshot(request).await.unwrap();
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
    }

    #[tokio::test]
    async fn test_disabled_headers() {
        let config = SecurityConfig {
            enable_headers: false,
            ..Default::default()
        };
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app(&config).oneshot(request).await.unwrap();
        assert!(!response.headers().contains_key("content-security-policy"));
    }

    #[test]
    fn test_csp_format() {
        let csp = content_security_policy(&[
            CspDirective::new("base-uri", &["'self'"]),
            CspDirective::new("upgrade-insecure-requests", &[]),
        ]);
        assert_eq!(csp, "base-uri 'self'; upgrade-insecure-requests");
    }
}
