//! Cache keys.

use std::fmt;

use crate::routing::{matcher, Route};

/// Identity of a cacheable response: method, route template, resource.
///
/// Fields are length-prefixed so distinct inputs can never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(route: Route, resource: Option<&str>, query: Option<&str>) -> Self {
        let mut key = format!("{} {}", route.method(), route.template());
        for part in [resource, query] {
            match part {
                Some(value) => key.push_str(&format!(" {}:{}", value.len(), value)),
                None => key.push_str(" -"),
            }
        }
        Self(key)
    }

    /// Build the key for a concrete request target such as
    /// `/accounts/42/balance?from=2024`.
    pub fn for_request(route: Route, path_and_query: &str) -> Self {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path_and_query, None),
        };
        Self::new(route, matcher::resource_id(route.template(), path), query)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
