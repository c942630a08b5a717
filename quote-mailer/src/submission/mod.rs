//! Form submission handling.
//!
//! ## Processing Flow
//!
//! ```text
//! JSON body → RawSubmission → SanitizedFields → validate() → compose() → ComposedEmail
//! ```

pub mod compose;
pub mod types;

pub use compose::{compose, ComposedEmail, RequestMeta};
pub use types::{
    display_value, InterventionDetails, RawSubmission, RequestKind, SanitizedFields,
    MAX_FIELD_LENGTH, MAX_MESSAGE_LENGTH,
};
