//! Request input sanitization: NoSQL-operator stripping and markup escaping
//! over the parsed body and the query string.

use axum::{extract::Request, middleware::Next, response::Response};

use crate::http::middleware::body_parser::ParsedBody;
use crate::http::query::QueryString;
use crate::http::request::RequestIdExt;
use crate::sanitize::{nosql, xss};

pub async fn nosql_sanitize_middleware(mut request: Request, next: Next) -> Response {
    let mut sanitized = false;
    if let Some(ParsedBody(body)) = request.extensions_mut().get_mut::<ParsedBody>() {
        sanitized |= nosql::sanitize_value(body);
    }

    let mut query = QueryString::from_uri(request.uri());
    if nosql::sanitize_query(&mut query) {
        query.write_to(&mut request);
        sanitized = true;
    }

    if sanitized {
        tracing::warn!(
            request_id = %request.request_id(),
            path = %request.uri().path(),
            "Removed prohibited keys from request input"
        );
    }
    next.run(request).await
}

pub async fn xss_sanitize_middleware(mut request: Request, next: Next) -> Response {
    let mut sanitized = false;
    if let Some(ParsedBody(body)) = request.extensions_mut().get_mut::<ParsedBody>() {
        sanitized |= xss::sanitize_value(body);
    }

    let mut query = QueryString::from_uri(request.uri());
    if xss::sanitize_query(&mut query) {
        query.write_to(&mut request);
        sanitized = true;
    }

    if sanitized {
        tracing::debug!(
            request_id = %request.request_id(),
            path = %request.uri().path(),
            "Escaped markup in request input"
        );
    }
    next.run(request).await
}
