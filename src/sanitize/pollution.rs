//! HTTP parameter pollution prevention.
//!
//! A repeated query parameter collapses to its last value unless the
//! parameter is whitelisted, in which case every value is kept.

use std::collections::HashSet;

use crate::http::query::QueryString;

#[derive(Debug, Clone, Default)]
pub struct PollutionFilter {
    whitelist: HashSet<String>,
}

impl PollutionFilter {
    pub fn new<I, S>(whitelist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            whitelist: whitelist.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_whitelisted(&self, key: &str) -> bool {
        self.whitelist.contains(key)
    }

    /// Collapse repeated keys in place. Returns the keys that were collapsed.
    pub fn apply(&self, query: &mut QueryString) -> Vec<String> {
        let pairs = query.pairs_mut();
        let mut polluted = Vec::new();
        let mut kept = Vec::with_capacity(pairs.len());

        for (idx, (key, value)) in pairs.iter().enumerate() {
            if self.is_whitelisted(key) {
                kept.push((key.clone(), value.clone()));
                continue;
            }
            let repeated_later = pairs[idx + 1..].iter().any(|(k, _)| k == key);
            if repeated_later {
                if !polluted.contains(key) {
                    polluted.push(key.clone());
                }
            } else {
                kept.push((key.clone(), value.clone()));
            }
        }

        *pairs = kept;
        polluted
    }
}
