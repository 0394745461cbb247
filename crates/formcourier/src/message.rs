//! Contact form message types.
//!
//! This module defines the [`Message`] submitted to the form-relay endpoint
//! and the field-level validation applied before any request is made.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A minimal "looks like an address" shape: local part, `@`, domain with a dot.
/// Deliberately loose; the relay service performs its own verification.
const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

/// A contact form message.
///
/// All fields are trimmed on construction. `subject` is optional; an empty
/// or whitespace-only subject is normalized to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Sender's name.
    pub name: String,
    /// Sender's reply address.
    pub email: String,
    /// Optional subject line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// The message body.
    pub body: String,
}

impl Message {
    /// Create a new message from raw form field values.
    ///
    /// Trims every field and drops an empty subject.
    #[must_use]
    pub fn new(
        name: impl AsRef<str>,
        email: impl AsRef<str>,
        subject: Option<&str>,
        body: impl AsRef<str>,
    ) -> Self {
        let subject = subject
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);
        Self {
            name: name.as_ref().trim().to_string(),
            email: email.as_ref().trim().to_string(),
            subject,
            body: body.as_ref().trim().to_string(),
        }
    }

    /// Validate the message fields.
    ///
    /// `name`, `email`, and `body` must be non-empty, and `email` must pass
    /// a minimal shape check.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] for the first empty required field,
    /// or [`Error::InvalidEmail`] for a malformed address.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::missing_field("name"));
        }
        if self.email.is_empty() {
            return Err(Error::missing_field("email"));
        }
        if self.body.is_empty() {
            return Err(Error::missing_field("message"));
        }
        if !email_regex().is_match(&self.email) {
            return Err(Error::invalid_email(self.email.clone()));
        }
        Ok(())
    }

    /// The subject as sent on the wire (empty string when absent).
    #[must_use]
    pub fn subject_or_empty(&self) -> &str {
        self.subject.as_deref().unwrap_or("")
    }
}
