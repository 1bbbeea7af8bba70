//! Cookie parsing.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use cookie::Cookie;

/// Request cookies by name. The first occurrence of a name wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookies(pub HashMap<String, String>);

impl Cookies {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = HashMap::new();
        for value in headers.get_all(header::COOKIE) {
            let Ok(raw) = value.to_str() else {
                continue;
            };
            for cookie in Cookie::split_parse_encoded(raw.to_string()).flatten() {
                cookies
                    .entry(cookie.name().to_string())
                    .or_insert_with(|| cookie.value().to_string());
            }
        }
        Self(cookies)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

pub async fn cookie_parser_middleware(mut request: Request, next: Next) -> Response {
    let cookies = Cookies::from_headers(request.headers());
    request.extensions_mut().insert(cookies);
    next.run(request).await
}

impl<S> FromRequestParts<S> for Cookies
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Cookies>()
            .cloned()
            .unwrap_or_else(|| Cookies::from_headers(&parts.headers)))
    }
}
