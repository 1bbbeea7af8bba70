//! Ordered query-string pairs.
//!
//! The sanitizers and the parameter-pollution filter rewrite the query in
//! place, so it is kept as an ordered list of decoded `(key, value)` pairs
//! instead of a map.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, uri::PathAndQuery, Request, Uri},
};
use url::form_urlencoded;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString {
    pairs: Vec<(String, String)>,
}

impl QueryString {
    pub fn parse(raw: &str) -> Self {
        let pairs = form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    pub fn from_uri(uri: &Uri) -> Self {
        uri.query().map(Self::parse).unwrap_or_default()
    }

    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn pairs_mut(&mut self) -> &mut Vec<(String, String)> {
        &mut self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Last value given for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value given for `key`, in order.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }

    /// Replace the query of `request`'s URI with this query string.
    pub fn write_to<B>(&self, request: &mut Request<B>) {
        let path = request.uri().path().to_string();
        let path_and_query = if self.pairs.is_empty() {
            path
        } else {
            format!("{}?{}", path, self.encode())
        };

        let mut parts = request.uri().clone().into_parts();
        match path_and_query.parse::<PathAndQuery>() {
            Ok(pq) => parts.path_and_query = Some(pq),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to rebuild request query");
                return;
            }
        }
        if let Ok(uri) = Uri::from_parts(parts) {
            *request.uri_mut() = uri;
        }
    }
}

/// Extracts the query as seen after sanitization.
impl<S> FromRequestParts<S> for QueryString
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(QueryString::from_uri(&parts.uri))
    }
}

/// Split a bracketed key into its segments: `price[gte]` → `["price", "gte"]`.
pub fn key_segments(key: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let (head, mut rest) = match key.find('[') {
        Some(idx) => (&key[..idx], &key[idx..]),
        None => return vec![key],
    };
    segments.push(head);

    while let Some(stripped) = rest.strip_prefix('[') {
        match stripped.find(']') {
            Some(end) => {
                segments.push(&stripped[..end]);
                rest = &stripped[end + 1..];
            }
            None => {
                // Unterminated bracket: keep the remainder as a literal segment.
                segments.push(stripped);
                rest = "";
            }
        }
    }
    if !rest.is_empty() {
        segments.push(rest);
    }

    segments
}
