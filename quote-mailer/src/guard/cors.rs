//! CORS origin resolution against a fixed allow-list.

use axum::http::{
    header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN},
    HeaderMap, HeaderValue,
};

use crate::config::DEFAULT_ALLOWED_ORIGINS;

/// Headers the site's forms may send.
pub const ALLOWED_REQUEST_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed: Vec<String>,
}

impl CorsPolicy {
    /// Build a policy from an ordered allow-list. An empty list falls back
    /// to the built-in origins so there is always a default.
    pub fn new(allowed: Vec<String>) -> Self {
        let allowed = if allowed.is_empty() {
            DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect()
        } else {
            allowed
        };
        Self { allowed }
    }

    pub fn default_origin(&self) -> &str {
        &self.allowed[0]
    }

    /// Echo the origin back when allowed, otherwise answer with the default.
    pub fn resolve<'a>(&'a self, origin: Option<&str>) -> &'a str {
        origin
            .and_then(|o| self.allowed.iter().find(|allowed| allowed.as_str() == o))
            .map(String::as_str)
            .unwrap_or_else(|| self.default_origin())
    }

    /// The two CORS headers attached to every response.
    pub fn headers(&self, origin: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        // Allow-list entries come from config; skip one that is not a valid header value.
        if let Ok(value) = HeaderValue::from_str(self.resolve(origin)) {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_REQUEST_HEADERS),
        );
        headers
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
