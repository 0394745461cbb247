//! Transient user-facing status notices.
//!
//! Every submission attempt ends in a [`Notice`]: short text, a severity, and
//! how long the UI surface should keep it visible before fading it out. The
//! controller never touches a UI toolkit directly; notices are delivered
//! through the injected [`Notifier`] seam.

use std::time::Duration;

use tracing::{error, info};

use crate::error::Error;

/// Default time a notice stays visible before the surface hides it.
pub const DEFAULT_VISIBLE: Duration = Duration::from_secs(5);

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// The submission was accepted.
    Success,
    /// The submission failed or was rejected.
    Error,
}

/// A transient status message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub kind: NoticeKind,
    /// User-facing text.
    pub text: String,
    /// How long the surface should keep the notice visible.
    pub visible_for: Duration,
}

impl Notice {
    /// Create a success notice.
    #[must_use]
    pub fn success(text: impl Into<String>, visible_for: Duration) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
            visible_for,
        }
    }

    /// Create an error notice.
    #[must_use]
    pub fn failure(text: impl Into<String>, visible_for: Duration) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
            visible_for,
        }
    }

    /// Build the error notice for a failed submission attempt.
    ///
    /// Texts follow the original workflow's wording: validation and rate
    /// limit problems are explained, remote and transport failures get a
    /// generic message (the detail goes to the diagnostic log instead).
    #[must_use]
    pub fn for_error(err: &Error, visible_for: Duration) -> Self {
        let text = match err {
            Error::MissingField { .. } => {
                "Please fill in name, email and message.".to_string()
            }
            Error::InvalidEmail { .. } => "Please enter a valid email address.".to_string(),
            Error::DailyLimitReached { cap } => format!(
                "You can only send {cap} messages per day. Please try again tomorrow."
            ),
            Error::CooldownActive { remaining_ms } => format!(
                "Please wait {} before sending another message.",
                humanize_ms(*remaining_ms)
            ),
            Error::SubmissionInFlight => {
                "A message is already being sent. Please wait.".to_string()
            }
            Error::Network { .. } => "Network error while sending the message.".to_string(),
            _ => "Failed to send message. Please try again later.".to_string(),
        };
        Self::failure(text, visible_for)
    }
}

/// Rough human-readable rendering of a millisecond duration.
fn humanize_ms(ms: i64) -> String {
    let minutes = (ms + 59_999) / 60_000;
    if minutes < 60 {
        format!("about {minutes} minute(s)")
    } else {
        let hours = (minutes + 59) / 60;
        format!("about {hours} hour(s)")
    }
}

/// Sink for notices.
///
/// Implementations decide how a notice becomes visible and how the fade-out
/// after [`Notice::visible_for`] happens; the controller only emits.
pub trait Notifier {
    /// Deliver a notice to the user.
    fn notify(&mut self, notice: &Notice);
}

/// Notifier that forwards notices to the diagnostic log.
///
/// Useful for headless callers that only want the library workflow.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, notice: &Notice) {
        match notice.kind {
            NoticeKind::Success => info!("{}", notice.text),
            NoticeKind::Error => error!("{}", notice.text),
        }
    }
}
