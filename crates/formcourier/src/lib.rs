//! `formcourier` - A rate-limited contact form submission client
//!
//! This library drives contact form submissions to a hosted form-relay
//! endpoint: it validates the message fields, enforces a locally persisted
//! rate limit, delivers the message over HTTP, and commits quota state only
//! after the relay confirms acceptance.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod message;
pub mod notice;
pub mod quota;
pub mod relay;
pub mod store;

pub use config::Config;
pub use controller::{Controller, Outcome};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use message::Message;
pub use notice::{Notice, NoticeKind, Notifier};
pub use quota::{Quota, QuotaPolicy, QuotaStatus};
pub use relay::{HttpRelay, Relay};
pub use store::{FileStore, MemoryStore, StateStore};
