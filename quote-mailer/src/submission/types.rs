//! Submission payload types.
//!
//! The forms post loosely shaped JSON. Personal fields may sit at the top
//! level or under `clientInfo`; [`SanitizedFields::from_submission`] merges
//! both shapes into one record.

use serde_json::{Map, Number, Value};

use crate::guard::{sanitize, sanitize_str, validate_email, validate_phone};
use crate::SubmissionError;

/// Cap for free-form single-line fields.
pub const MAX_FIELD_LENGTH: usize = 500;

/// Cap for message and description bodies.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Raw submission body as decoded from JSON.
#[derive(Debug, Clone, Default)]
pub struct RawSubmission {
    root: Map<String, Value>,
}

impl RawSubmission {
    /// Decode a request body. A body that is valid JSON but not an object
    /// yields an empty submission.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(body)?;
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(root) => Self { root },
            _ => Self::default(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.root.get(name)
    }

    fn client_info(&self, name: &str) -> Option<&Value> {
        self.root.get("clientInfo")?.as_object()?.get(name)
    }

    /// `quoteData.details`, when it is an object.
    pub fn quote_details(&self) -> Option<&Map<String, Value>> {
        self.root.get("quoteData")?.as_object()?.get("details")?.as_object()
    }

    /// `interventionData`, when it is an object.
    pub fn intervention(&self) -> Option<&Map<String, Value>> {
        self.root.get("interventionData")?.as_object()
    }

    /// Top-level value unless falsy, then the `clientInfo` counterpart.
    fn personal(&self, name: &str) -> Option<&Value> {
        self.field(name)
            .filter(|v| is_truthy(v))
            .or_else(|| self.client_info(name))
    }
}

/// JSON truthiness as the site's frontend understands it.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render any JSON value as text, the way the site stringifies form values.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => display_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Integral floats print without a fraction (`120.0` → `120`).
fn display_number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}

/// Sanitized, length-capped view of a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizedFields {
    pub request_type: String,
    pub selected_service: String,
    pub selected_problem: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub message: String,
    pub timeline: String,
    pub budget: String,
    pub description: String,
    pub urgency: String,
}

impl SanitizedFields {
    pub fn from_submission(raw: &RawSubmission) -> Self {
        Self {
            request_type: sanitize(raw.field("requestType"), 50),
            selected_service: sanitize(raw.field("selectedService"), 100),
            selected_problem: sanitize(raw.field("selectedProblem"), 100),
            name: sanitize(raw.personal("name"), 100),
            email: sanitize(raw.personal("email"), 255),
            phone: sanitize(raw.personal("phone"), 20),
            address: sanitize(raw.personal("address"), 200),
            message: sanitize(raw.personal("message"), MAX_MESSAGE_LENGTH),
            timeline: sanitize(raw.personal("timeline"), 100),
            budget: sanitize(raw.personal("budget"), 50),
            description: sanitize(raw.field("description"), MAX_MESSAGE_LENGTH),
            urgency: sanitize(raw.field("urgency"), 50),
        }
    }

    /// Reject malformed contact details. Empty fields are allowed.
    pub fn validate(&self) -> Result<(), SubmissionError> {
        if !self.email.is_empty() && !validate_email(&self.email) {
            return Err(SubmissionError::InvalidEmail);
        }
        if !self.phone.is_empty() && !validate_phone(&self.phone) {
            return Err(SubmissionError::InvalidPhone);
        }
        Ok(())
    }

    /// Address to reply to, when the visitor left a usable one.
    pub fn reply_to(&self) -> Option<&str> {
        Some(self.email.as_str()).filter(|e| !e.is_empty() && validate_email(e))
    }

    pub fn kind(&self) -> RequestKind {
        RequestKind::parse(&self.request_type)
    }
}

/// Which form produced the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Quote,
    Intervention,
    Generic,
}

impl RequestKind {
    pub fn parse(request_type: &str) -> Self {
        match request_type {
            "quote" => RequestKind::Quote,
            "intervention" => RequestKind::Intervention,
            _ => RequestKind::Generic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Quote => "quote",
            RequestKind::Intervention => "intervention",
            RequestKind::Generic => "generic",
        }
    }
}

/// Intervention details, sanitized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterventionDetails {
    pub description: String,
    pub worked_before: String,
    pub location_type: String,
}

impl InterventionDetails {
    pub fn from_map(data: &Map<String, Value>) -> Self {
        let worked_before = match data.get("workedBefore") {
            Some(Value::Bool(true)) => "Oui".to_string(),
            Some(Value::Bool(false)) => "Non".to_string(),
            other => sanitize(other, 50),
        };
        Self {
            description: sanitize(data.get("description"), MAX_MESSAGE_LENGTH),
            worked_before,
            location_type: sanitize(data.get("locationType"), 100),
        }
    }
}

/// Sanitized `quoteData.details` entries, in submission order.
pub fn quote_detail_lines(details: &Map<String, Value>) -> Vec<(String, String)> {
    details
        .iter()
        .map(|(key, value)| {
            (
                sanitize_str(key, 50),
                sanitize_str(&display_value(value), MAX_FIELD_LENGTH),
            )
        })
        .collect()
}
