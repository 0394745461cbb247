//! Outbound transport to the form-relay endpoint.
//!
//! The relay service (a hosted form processor such as Formspree) accepts a
//! `multipart/form-data` POST and, when asked via `Accept: application/json`,
//! answers failures with a structured `{"error": "..."}` body. The transport
//! sits behind the [`Relay`] trait so the submission controller can be tested
//! without a network.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::multipart::Form;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::message::Message;

/// Transport for delivering a message to the relay endpoint.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Deliver the message.
    ///
    /// Exactly one request per call; no retries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemoteRejected`] when the endpoint answers with a
    /// non-success status, or [`Error::Network`] when no response arrives.
    async fn deliver(&self, message: &Message) -> Result<()>;
}

/// HTTP relay backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpRelay {
    client: reqwest::Client,
    endpoint: String,
    honeypot_field: Option<String>,
}

impl HttpRelay {
    /// Create a relay for the given endpoint URL.
    ///
    /// `honeypot_field`, when set, is included in every submission as an
    /// empty hidden field; relay services treat a filled honeypot as spam.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, honeypot_field: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            honeypot_field,
        }
    }

    /// The configured endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_form(&self, message: &Message) -> Form {
        let mut form = Form::new()
            .text("name", message.name.clone())
            .text("email", message.email.clone())
            .text("subject", message.subject_or_empty().to_string())
            .text("message", message.body.clone());
        if let Some(field) = &self.honeypot_field {
            form = form.text(field.clone(), String::new());
        }
        form
    }
}

#[async_trait]
impl Relay for HttpRelay {
    async fn deliver(&self, message: &Message) -> Result<()> {
        debug!("POST {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .multipart(self.build_form(message))
            .send()
            .await
            .map_err(|err| Error::network(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!("Relay accepted the message ({status})");
            return Ok(());
        }

        let detail = match response.bytes().await {
            Ok(body) => remote_error_message(&body),
            Err(_) => "<no body>".to_string(),
        };
        error!("Relay rejected the message: {status} {detail}");
        Err(Error::remote_rejected(status.as_u16(), detail))
    }
}

/// Extract a human-readable message from a non-success response body.
///
/// Prefers the `error` field of a JSON body, falls back to the whole JSON
/// document, then to the raw text, then to a placeholder.
fn remote_error_message(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        if let Some(error) = value.get("error").and_then(serde_json::Value::as_str) {
            return error.to_string();
        }
        return value.to_string();
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        "<no body>".to_string()
    } else {
        text
    }
}
