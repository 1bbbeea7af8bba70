//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, path group, status
//! - `http_request_duration_seconds` (histogram): latency distribution
//! - `http_rate_limited_total` (counter): rejections by limited prefix

use std::net::SocketAddr;
use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use ::metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Collapse a request path to a low-cardinality label.
pub fn path_group(path: &str) -> &'static str {
    let mut segments = path.trim_start_matches('/').split('/');
    match (segments.next(), segments.next(), segments.next()) {
        (Some("api"), Some("v1"), Some("tours")) => "/api/v1/tours",
        (Some("api"), Some("v1"), Some("users")) => "/api/v1/users",
        (Some("api"), Some("v1"), Some("reviews")) => "/api/v1/reviews",
        (Some("api"), Some("v1"), Some("bookings")) => "/api/v1/bookings",
        (Some("api"), _, _) => "/api/other",
        (Some(""), _, _) | (Some("tour"), _, _) => "/views",
        _ => "/static",
    }
}

pub fn record_request(method: &str, path: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("path", path_group(path).to_string()),
        ("status", status.to_string()),
    ];
    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(prefix: &str) {
    counter!("http_rate_limited_total", "prefix" => prefix.to_string()).increment(1);
}

pub async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    record_request(&method, &path, response.status().as_u16(), start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_group() {
        assert_eq!(path_group("/api/v1/tours/123"), "/api/v1/tours");
        assert_eq!(path_group("/api/v1/reviews"), "/api/v1/reviews");
        assert_eq!(path_group("/api/v2/anything"), "/api/other");
        assert_eq!(path_group("/"), "/views");
        assert_eq!(path_group("/tour/the-sea-explorer"), "/views");
        assert_eq!(path_group("/css/style.css"), "/static");
    }
}
