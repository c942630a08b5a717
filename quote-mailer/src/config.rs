//! Configuration module for environment variable parsing.
//!
//! Every setting has a default so the mailer boots with nothing but
//! `RESEND_API_KEY` set.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;
use url::Url;

/// Origins allowed to call the endpoint. The first entry is the fallback
/// origin echoed back to unknown callers.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://hdconnect.fr",
    "https://www.hdconnect.fr",
    "https://blend-magic-homepage.lovable.app",
    "http://localhost:5173",
    "http://localhost:3000",
];

pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Resend API key; delivery fails when absent
    pub resend_api_key: Option<String>,

    /// Base URL of the Resend API
    pub resend_api_url: Url,

    /// Timeout for a single call to the email provider, in milliseconds
    pub resend_timeout_ms: u64,

    /// Sender address on every outbound email
    pub sender_email: String,

    /// Mailbox receiving the form submissions
    pub target_email: String,

    /// CORS allow-list, first entry is the default origin
    pub allowed_origins: Vec<String>,

    /// Maximum submissions per client per window
    pub rate_limit_max: u32,

    /// Length of a rate-limit window, in seconds
    pub rate_limit_window_secs: u64,

    /// Maximum accepted request body, in bytes
    pub max_body_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            resend_api_key: None,
            resend_api_url: default_resend_url(),
            resend_timeout_ms: 10_000,
            sender_email: "onboarding@resend.dev".to_string(),
            target_email: "kamal@hdconnect.fr".to_string(),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rate_limit_max: 5,
            rate_limit_window_secs: 60 * 60,
            max_body_size: 50 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            port: parse_or("PORT", defaults.port),

            resend_api_key: env::var("RESEND_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),

            resend_api_url: parse_url("RESEND_API_URL").unwrap_or(defaults.resend_api_url),

            resend_timeout_ms: parse_or("RESEND_TIMEOUT_MS", defaults.resend_timeout_ms),

            sender_email: env::var("SENDER_EMAIL").unwrap_or(defaults.sender_email),

            target_email: env::var("TARGET_EMAIL").unwrap_or(defaults.target_email),

            allowed_origins: parse_csv("ALLOWED_ORIGINS")
                .filter(|origins| !origins.is_empty())
                .unwrap_or(defaults.allowed_origins),

            rate_limit_max: parse_or("RATE_LIMIT_MAX", defaults.rate_limit_max),

            rate_limit_window_secs: parse_or(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window_secs,
            ),

            max_body_size: parse_or("MAX_BODY_SIZE", defaults.max_body_size),
        }
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn resend_timeout(&self) -> Duration {
        Duration::from_millis(self.resend_timeout_ms)
    }
}

fn default_resend_url() -> Url {
    Url::parse(DEFAULT_RESEND_API_URL).expect("default Resend URL is valid")
}

/// Parse a variable, falling back to `default` when unset or malformed.
fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

fn parse_url(name: &str) -> Option<Url> {
    let raw = env::var(name).ok()?;
    match Url::parse(raw.trim()) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(url),
        _ => {
            warn!(env_var = name, value = %raw, "Invalid URL, using default");
            None
        }
    }
}

/// Parse a comma-separated list of strings.
fn parse_csv(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
