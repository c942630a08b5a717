//! Request guards applied before a submission is composed.
//!
//! ```text
//! Origin → CorsPolicy    client key → RateLimiter    fields → sanitize / validate
//! ```

pub mod cors;
pub mod rate_limit;
pub mod sanitize;

pub use cors::{CorsPolicy, ALLOWED_REQUEST_HEADERS};
pub use rate_limit::{
    client_key, InMemoryRateLimitStore, RateLimitDecision, RateLimitRecord, RateLimitStore,
    RateLimiter,
};
pub use sanitize::{escape_html, sanitize, sanitize_str, validate_email, validate_phone};
