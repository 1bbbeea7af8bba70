//! JSON and urlencoded body parsing with a size limit.
//!
//! The parsed body is stored as a [`ParsedBody`] request extension so the
//! sanitizers can rewrite it before any handler sees it. Handlers read it
//! back through the [`JsonBody`] extractor.

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::error::AppError;
use crate::http::query::key_segments;

/// Maximum accepted body size in bytes.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit(pub usize);

/// A request body parsed into JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBody(pub Value);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    UrlEncoded,
}

fn body_kind(headers: &HeaderMap) -> Option<BodyKind> {
    let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if mime == "application/json" || mime.ends_with("+json") {
        Some(BodyKind::Json)
    } else if mime == "application/x-www-form-urlencoded" {
        Some(BodyKind::UrlEncoded)
    } else {
        None
    }
}

fn too_large() -> AppError {
    AppError::new(StatusCode::PAYLOAD_TOO_LARGE, "request entity too large")
}

pub async fn body_parser_middleware(
    State(limit): State<BodyLimit>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(kind) = body_kind(request.headers()) else {
        return Ok(next.run(request).await);
    };

    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit.0) {
        return Err(too_large());
    }

    let (mut parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, limit.0)
        .await
        .map_err(|_| too_large())?;

    let value = match kind {
        BodyKind::Json => parse_json(&bytes)?,
        BodyKind::UrlEncoded => parse_urlencoded(&bytes),
    };

    parts.headers.remove(header::CONTENT_LENGTH);
    parts.extensions.insert(ParsedBody(value));
    Ok(next.run(Request::from_parts(parts, Body::empty())).await)
}

fn parse_json(bytes: &[u8]) -> Result<Value, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Ok(value),
        Ok(_) => Err(AppError::bad_request(
            "Invalid JSON body: expected an object or an array",
        )),
        Err(e) => Err(AppError::bad_request(format!("Invalid JSON body: {}", e))),
    }
}

/// Decode a form body into nested JSON: `a[b]=1` becomes `{"a":{"b":"1"}}`,
/// repeated keys and `a[]` become arrays.
fn parse_urlencoded(bytes: &[u8]) -> Value {
    let mut root = Map::new();
    for (key, value) in form_urlencoded::parse(bytes) {
        let segments = key_segments(&key);
        insert_nested(&mut root, &segments, value.into_owned());
    }
    Value::Object(root)
}

fn insert_nested(target: &mut Map<String, Value>, segments: &[&str], value: String) {
    let Some((&key, rest)) = segments.split_first() else {
        return;
    };

    match rest.first() {
        None => match target.get_mut(key) {
            Some(Value::Array(items)) => items.push(Value::String(value)),
            Some(existing) => {
                let previous = existing.take();
                *existing = Value::Array(vec![previous, Value::String(value)]);
            }
            None => {
                target.insert(key.to_string(), Value::String(value));
            }
        },
        Some(&"") => {
            let slot = target
                .entry(key.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            match slot {
                Value::Array(items) => items.push(Value::String(value)),
                other => {
                    let previous = other.take();
                    *other = Value::Array(vec![previous, Value::String(value)]);
                }
            }
        }
        Some(_) => {
            let slot = target
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(child) = slot {
                insert_nested(child, rest, value);
            }
        }
    }
}

/// Typed view of the parsed (and sanitized) request body.
///
/// A request without a parsed body deserializes from `{}`.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequestParts<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .extensions
            .get::<ParsedBody>()
            .map(|body| body.0.clone())
            .unwrap_or_else(|| Value::Object(Map::new()));

        serde_json::from_value(value)
            .map(JsonBody)
            .map_err(|e| AppError::bad_request(format!("Invalid input data. {}", e)))
    }
}
