//! Cross-site scripting sanitization.
//!
//! String values are filtered for an HTML data context: every `<` becomes
//! `&lt;`, which is enough to stop markup such as `<script>` from being
//! interpreted when the value is later rendered.

use serde_json::Value;

use crate::http::query::QueryString;

pub fn clean_str(input: &str) -> String {
    input.replace('<', "&lt;")
}

/// Filter every string in a JSON value (keys are left alone). Returns true if anything changed.
pub fn sanitize_value(value: &mut Value) -> bool {
    match value {
        Value::String(s) => {
            if s.contains('<') {
                *s = clean_str(s);
                true
            } else {
                false
            }
        }
        Value::Object(map) => {
            let mut changed = false;
            for child in map.values_mut() {
                changed |= sanitize_value(child);
            }
            changed
        }
        Value::Array(items) => {
            let mut changed = false;
            for item in items.iter_mut() {
                changed |= sanitize_value(item);
            }
            changed
        }
        _ => false,
    }
}

pub fn sanitize_query(query: &mut QueryString) -> bool {
    let mut changed = false;
    for (_, value) in query.pairs_mut().iter_mut() {
        if value.contains('<') {
            *value = clean_str(value);
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escapes_script_tags() {
        let mut body = json!({
            "name": "<script>alert('x')</script>",
            "nested": { "list": ["<img src=x onerror=alert(1)>", 5] }
        });
        assert!(sanitize_value(&mut body));
        assert_eq!(body["name"], "&lt;script>alert('x')&lt;/script>");
        assert_eq!(body["nested"]["list"][0], "&lt;img src=x onerror=alert(1)>");
        assert_eq!(body["nested"]["list"][1], 5);
    }

    #[test]
    fn test_query_values() {
        let mut query = QueryString::parse("name=%3Cb%3Ehi&sort=price");
        assert!(sanitize_query(&mut query));
        assert_eq!(query.get("name"), Some("&lt;b>hi"));
        assert_eq!(query.get("sort"), Some("price"));
    }
}
