//! List-endpoint query features: filtering, sorting, field limiting and
//! pagination, driven by the (already sanitized) query string.
//!
//! ```text
//! ?difficulty=easy&price[lt]=1500&sort=-ratingsAverage,price&fields=name,price&page=2&limit=10
//! ```

use std::cmp::Ordering;

use serde_json::Value;

use crate::http::query::{key_segments, QueryString};

const RESERVED: [&str; 4] = ["page", "sort", "limit", "fields"];

pub const DEFAULT_SORT: &str = "-createdAt";
pub const DEFAULT_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOp {
    fn parse(op: &str) -> Option<Self> {
        match op {
            "gt" => Some(FilterOp::Gt),
            "gte" => Some(FilterOp::Gte),
            "lt" => Some(FilterOp::Lt),
            "lte" => Some(FilterOp::Lte),
            _ => None,
        }
    }
}

/// `field <op> value`; an `Eq` filter with several values matches any of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    All,
    Include(Vec<String>),
    Exclude(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiFeatures {
    pub filters: Vec<Filter>,
    pub sort: Vec<SortKey>,
    pub projection: Projection,
    pub page: usize,
    pub limit: usize,
}

impl Default for ApiFeatures {
    fn default() -> Self {
        Self::from_query(&QueryString::default())
    }
}

impl ApiFeatures {
    pub fn from_query(query: &QueryString) -> Self {
        let mut filters: Vec<Filter> = Vec::new();

        for (key, value) in query.pairs() {
            let segments = key_segments(key);
            if RESERVED.contains(&segments[0]) {
                continue;
            }
            let (field, op) = match segments.as_slice() {
                [field] => (*field, FilterOp::Eq),
                [field, op] => match FilterOp::parse(op) {
                    Some(op) => (*field, op),
                    None => continue,
                },
                _ => continue,
            };
            if field.is_empty() {
                continue;
            }

            match filters
                .iter_mut()
                .find(|f| f.op == FilterOp::Eq && op == FilterOp::Eq && f.field == field)
            {
                Some(existing) => existing.values.push(value.clone()),
                None => filters.push(Filter {
                    field: field.to_string(),
                    op,
                    values: vec![value.clone()],
                }),
            }
        }

        let sort = parse_sort(query.get("sort").unwrap_or(DEFAULT_SORT));

        let projection = match query.get("fields") {
            Some(fields) => parse_projection(fields),
            None => Projection::All,
        };

        let page = query
            .get("page")
            .and_then(|p| p.trim().parse::<usize>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1);
        let limit = query
            .get("limit")
            .and_then(|l| l.trim().parse::<usize>().ok())
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_LIMIT);

        Self {
            filters,
            sort,
            projection,
            page,
            limit,
        }
    }

    /// Filter, sort, paginate and project a set of documents.
    pub fn apply(&self, docs: Vec<Value>) -> Vec<Value> {
        let mut docs: Vec<Value> = docs
            .into_iter()
            .filter(|doc| self.filters.iter().all(|f| matches(doc, f)))
            .collect();

        docs.sort_by(|a, b| {
            self.sort
                .iter()
                .map(|key| {
                    let ord = compare_values(a.get(&key.field), b.get(&key.field));
                    if key.descending {
                        ord.reverse()
                    } else {
                        ord
                    }
                })
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        let skip = (self.page - 1).saturating_mul(self.limit);
        docs.into_iter()
            .skip(skip)
            .take(self.limit)
            .map(|doc| project(doc, &self.projection))
            .collect()
    }
}

fn parse_sort(raw: &str) -> Vec<SortKey> {
    raw.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(|f| match f.strip_prefix('-') {
            Some(field) => SortKey {
                field: field.to_string(),
                descending: true,
            },
            None => SortKey {
                field: f.to_string(),
                descending: false,
            },
        })
        .collect()
}

fn parse_projection(raw: &str) -> Projection {
    let fields: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();
    if fields.is_empty() {
        return Projection::All;
    }
    if fields.iter().all(|f| f.starts_with('-')) {
        Projection::Exclude(fields.iter().map(|f| f[1..].to_string()).collect())
    } else {
        Projection::Include(
            fields
                .iter()
                .filter(|f| !f.starts_with('-'))
                .map(|f| f.to_string())
                .collect(),
        )
    }
}

fn project(doc: Value, projection: &Projection) -> Value {
    match (doc, projection) {
        (Value::Object(mut map), Projection::Include(fields)) => {
            map.retain(|key, _| key == "id" || fields.iter().any(|f| f == key));
            Value::Object(map)
        }
        (Value::Object(mut map), Projection::Exclude(fields)) => {
            map.retain(|key, _| !fields.iter().any(|f| f == key));
            Value::Object(map)
        }
        (doc, _) => doc,
    }
}

fn matches(doc: &Value, filter: &Filter) -> bool {
    let Some(actual) = doc.get(&filter.field) else {
        return false;
    };
    match filter.op {
        FilterOp::Eq => filter
            .values
            .iter()
            .any(|v| compare_raw(actual, v) == Some(Ordering::Equal)),
        op => filter.values.iter().all(|v| match compare_raw(actual, v) {
            Some(ord) => match op {
                FilterOp::Gt => ord == Ordering::Greater,
                FilterOp::Gte => ord != Ordering::Less,
                FilterOp::Lt => ord == Ordering::Less,
                FilterOp::Lte => ord != Ordering::Greater,
                FilterOp::Eq => ord == Ordering::Equal,
            },
            None => false,
        }),
    }
}

/// Compare a document value against a raw query-string value.
fn compare_raw(actual: &Value, raw: &str) -> Option<Ordering> {
    match actual {
        Value::Number(n) => {
            let expected: f64 = raw.trim().parse().ok()?;
            n.as_f64()?.partial_cmp(&expected)
        }
        Value::String(s) => Some(s.as_str().cmp(raw)),
        Value::Bool(b) => raw.trim().parse::<bool>().ok().map(|r| b.cmp(&r)),
        _ => None,
    }
}

/// Ordering for sort keys; missing and null values sort last.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}
