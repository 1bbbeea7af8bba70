//! NoSQL query-injection sanitization.
//!
//! Operator keys (`$gt`, `$ne`, ...) and dotted paths (`a.b`) are what let a
//! client smuggle query operators into a document filter. Any object key
//! starting with `$` or containing `.` is removed, at every depth.

use serde_json::Value;

use crate::http::query::{key_segments, QueryString};

pub fn is_prohibited_key(key: &str) -> bool {
    key.starts_with('$') || key.contains('.')
}

/// Strip prohibited keys from a JSON value in place. Returns true if anything was removed.
pub fn sanitize_value(value: &mut Value) -> bool {
    match value {
        Value::Object(map) => {
            let before = map.len();
            map.retain(|key, _| !is_prohibited_key(key));
            let mut removed = map.len() != before;
            for child in map.values_mut() {
                removed |= sanitize_value(child);
            }
            removed
        }
        Value::Array(items) => {
            let mut removed = false;
            for item in items.iter_mut() {
                removed |= sanitize_value(item);
            }
            removed
        }
        _ => false,
    }
}

/// Drop query pairs whose key, or any bracketed segment of it, is prohibited.
pub fn sanitize_query(query: &mut QueryString) -> bool {
    let pairs = query.pairs_mut();
    let before = pairs.len();
    pairs.retain(|(key, _)| !key_segments(key).iter().any(|s| is_prohibited_key(s)));
    pairs.len() != before
}
