//! Request identity: request ids and the client address.
//!
//! # Design Decisions
//! - Request id added as early as possible for tracing
//! - An incoming `x-request-id` is kept; otherwise a UUID v4 is generated
//! - Forwarding headers are only trusted when the server sits behind a proxy

use std::net::SocketAddr;

use axum::{
    extract::ConnectInfo,
    http::{HeaderName, Request},
};
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};

/// Header carrying the request id.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer that assigns a UUID v4 request id to requests without one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer that copies the request id onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Accessor for the request id assigned by [`set_request_id_layer`].
pub trait RequestIdExt {
    fn request_id(&self) -> &str;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> &str {
        self.extensions()
            .get::<RequestId>()
            .and_then(|id| id.header_value().to_str().ok())
            .unwrap_or("unknown")
    }
}

/// Whether `path` lies under `prefix` on a segment boundary: `/api` covers
/// `/api` and `/api/v1/tours` but not `/apiary`. An empty prefix covers
/// every path.
pub fn path_has_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Resolve the client address used for rate limiting.
///
/// With `trust_proxy`, the first `X-Forwarded-For` entry wins, then
/// `X-Real-IP`. Otherwise (or when neither is present) the peer address
/// from the connection is used.
pub fn client_ip<B>(request: &Request<B>, trust_proxy: bool) -> String {
    let headers = request.headers();

    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }

        let real_ip = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(ip) = real_ip {
            return ip.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/v1/tours");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_path_has_prefix() {
        assert!(path_has_prefix("/api", "/api"));
        assert!(path_has_prefix("/api/v1/tours", "/api/"));
        assert!(!path_has_prefix("/apiary", "/api"));
        assert!(!path_has_prefix("/", "/api"));
        assert!(path_has_prefix("/anything", ""));
    }

    #[test]
    fn test_forwarded_for_first_entry() {
        let req = request(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1")]);
        assert_eq!(client_ip(&req, true), "203.0.113.7");
    }

    #[test]
    fn test_real_ip_fallback() {
        let req = request(&[("x-real-ip", "198.51.100.2")]);
        assert_eq!(client_ip(&req, true), "198.51.100.2");
    }

    #[test]
    fn test_untrusted_headers_ignored() {
        let mut req = request(&[("x-forwarded-for", "203.0.113.7")]);
        req.extensions_mut()
            .insert(ConnectInfo("192.0.2.10:5000".parse::<SocketAddr>().unwrap()));
        assert_eq!(client_ip(&req, false), "192.0.2.10");
    }

    #[test]
    fn test_unknown_without_connection_info() {
        assert_eq!(client_ip(&request(&[]), true), "unknown");
        assert_eq!(request(&[]).request_id(), "unknown");
    }
}
