//! Response builders shared by the route handlers.
//!
//! JSON endpoints answer with the envelope
//! `{ "status": "success", "results"?: n, "data": { "data": ... } }`;
//! view endpoints render small HTML documents.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::AppError;

/// `200 { status, results, data: { data: [...] } }`
pub fn list<T: Serialize>(docs: Vec<T>) -> Response {
    let results = docs.len();
    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "results": results,
            "data": { "data": docs },
        })),
    )
        .into_response()
}

/// `200 { status, data: { data } }`
pub fn one<T: Serialize>(doc: T) -> Response {
    envelope(StatusCode::OK, doc)
}

/// `201 { status, data: { data } }`
pub fn created<T: Serialize>(doc: T) -> Response {
    envelope(StatusCode::CREATED, doc)
}

/// `204` with an empty body.
pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

fn envelope<T: Serialize>(status: StatusCode, doc: T) -> Response {
    match serde_json::to_value(doc) {
        Ok(data) => (
            status,
            Json(json!({ "status": "success", "data": { "data": data } })),
        )
            .into_response(),
        Err(e) => AppError::internal(format!("failed to serialize response: {}", e)).into_response(),
    }
}

/// `200 { status, data: <value> }` for aggregate endpoints.
pub fn aggregate(key: &str, value: Value) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "status": "success", "data": { key: value } })),
    )
        .into_response()
}

/// Escape text for inclusion in HTML.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap `body` (already escaped) in the site layout.
pub fn html_page(title: &str, body: &str) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>\n",
            "<html lang=\"en\">\n",
            "<head>\n",
            "<meta charset=\"utf-8\">\n",
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
            "<link rel=\"stylesheet\" href=\"/css/style.css\">\n",
            "<title>Natours | {title}</title>\n",
            "</head>\n",
            "<body>\n",
            "<header class=\"header\"><a class=\"nav__el\" href=\"/\">All tours</a></header>\n",
            "<main class=\"main\">\n{body}\n</main>\n",
            "</body>\n",
            "</html>\n"
        ),
        title = escape_html(title),
        body = body,
    )
}

/// An HTML response with the given status.
pub fn html(status: StatusCode, title: &str, body: &str) -> Response {
    (status, Html(html_page(title, body))).into_response()
}
