//! HD Connect mailer - quote and contact form submissions to email.
//!
//! One endpoint receives the site's form posts, guards them and forwards a
//! plain-text summary to the business mailbox through Resend.
//!
//! ## Architecture
//!
//! ```text
//! Form POST → CORS / rate limit / size → sanitize + validate → compose → Resend
//! ```

pub mod config;
pub mod delivery;
pub mod error;
pub mod guard;
pub mod submission;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use delivery::{DeliveryError, Mailer, OutboundEmail, ResendMailer};
pub use error::SubmissionError;
pub use submission::{compose, ComposedEmail, RawSubmission, RequestKind, SanitizedFields};
pub use web::{router, AppState};
