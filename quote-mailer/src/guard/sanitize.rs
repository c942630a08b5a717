//! Field sanitization and format checks.
//!
//! [`sanitize`] truncates before it strips patterns. A pattern cut by the
//! truncation boundary can survive partially; the field caps keep that
//! fragment short.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static JAVASCRIPT_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript:").expect("valid regex"));

static EVENT_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)on[a-z0-9_]+=").expect("valid regex"));

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

static PHONE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9\s\-+().]{6,20}$").expect("valid regex"));

const MAX_EMAIL_LENGTH: usize = 255;

/// Sanitize a JSON value. Anything that is not a string yields `""`.
pub fn sanitize(raw: Option<&Value>, max_length: usize) -> String {
    match raw {
        Some(Value::String(s)) => sanitize_str(s, max_length),
        _ => String::new(),
    }
}

/// Trim, cap at `max_length` characters, then strip markup and script vectors.
pub fn sanitize_str(raw: &str, max_length: usize) -> String {
    let truncated: String = raw.trim().chars().take(max_length).collect();
    let without_brackets = truncated.replace(['<', '>'], "");
    let without_scheme = JAVASCRIPT_SCHEME.replace_all(&without_brackets, "");
    EVENT_HANDLER.replace_all(&without_scheme, "").into_owned()
}

pub fn validate_email(value: &str) -> bool {
    EMAIL_SHAPE.is_match(value) && value.chars().count() <= MAX_EMAIL_LENGTH
}

pub fn validate_phone(value: &str) -> bool {
    PHONE_SHAPE.is_match(value)
}

/// Replace the five HTML-special characters with entities.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
