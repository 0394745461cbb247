//! Rate limiting for form submissions.
//!
//! Two policies are supported, reflecting the two schemas this workflow has
//! shipped with: a daily counter (default, N sends per calendar day) and a
//! single-timestamp cooldown (one send per window). State is read before
//! every attempt and committed only after a confirmed-successful send, so a
//! rejected or failed request never consumes quota.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::store::StateStore;

/// Default number of sends allowed per calendar day.
pub const DEFAULT_DAILY_CAP: u32 = 5;

/// Default cooldown window in hours.
pub const DEFAULT_COOLDOWN_HOURS: u32 = 24;

/// Maximum number of send timestamps retained in the daily record.
pub const TIMESTAMP_HISTORY_LIMIT: usize = 20;

/// Store key for the daily counter record (JSON-encoded).
pub const DAILY_STATE_KEY: &str = "quota.daily.v1";

/// Store key for the last-sent timestamp (epoch milliseconds as a string).
pub const LAST_SENT_STATE_KEY: &str = "quota.last_sent.v1";

/// Which rate-limit policy is in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaPolicy {
    /// Allow up to a fixed number of sends per calendar day.
    #[default]
    DailyCount,
    /// Allow one send per cooldown window.
    Cooldown,
}

impl std::fmt::Display for QuotaPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DailyCount => write!(f, "daily_count"),
            Self::Cooldown => write!(f, "cooldown"),
        }
    }
}

/// Persisted record for the daily counter policy.
///
/// `count` resets whenever `date` is not today; `timestamps` keeps the most
/// recent sends, oldest evicted past [`TIMESTAMP_HISTORY_LIMIT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// The calendar day this record covers.
    pub date: NaiveDate,
    /// Number of successful sends on `date`.
    pub count: u32,
    /// Epoch milliseconds of recent successful sends.
    pub timestamps: Vec<i64>,
}

impl DailyRecord {
    /// Create a fresh record for the given day.
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            count: 0,
            timestamps: Vec::new(),
        }
    }

    /// Return this record rolled forward to `today`.
    ///
    /// A record dated any other day resets to a fresh one; the count from a
    /// previous day never carries over.
    #[must_use]
    pub fn rolled_to(self, today: NaiveDate) -> Self {
        if self.date == today {
            self
        } else {
            Self::new(today)
        }
    }

    /// Record one successful send at `now_ms`.
    pub fn record_send(&mut self, now_ms: i64) {
        self.count = self.count.saturating_add(1);
        self.timestamps.push(now_ms);
        while self.timestamps.len() > TIMESTAMP_HISTORY_LIMIT {
            self.timestamps.remove(0);
        }
    }

    /// Sends remaining under the given cap.
    #[must_use]
    pub fn remaining(&self, cap: u32) -> u32 {
        cap.saturating_sub(self.count)
    }
}

/// Current quota standing, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "policy")]
pub enum QuotaStatus {
    /// Standing under the daily counter policy.
    DailyCount {
        /// The day the counter covers.
        date: NaiveDate,
        /// Sends used today.
        used: u32,
        /// The configured cap.
        cap: u32,
        /// Sends remaining today.
        remaining: u32,
    },
    /// Standing under the cooldown policy.
    Cooldown {
        /// Epoch milliseconds of the last successful send, if any.
        last_sent_ms: Option<i64>,
        /// Milliseconds until the next send is allowed (0 when ready).
        remaining_ms: i64,
    },
}

/// The rate-limit gate.
///
/// Stateless itself; all persistence goes through an injected [`StateStore`].
/// [`Quota::check`] never mutates the store, [`Quota::commit`] is the only
/// writer and must be called only after a confirmed `2xx` from the relay.
#[derive(Debug, Clone)]
pub struct Quota {
    policy: QuotaPolicy,
    daily_cap: u32,
    cooldown_ms: i64,
}

impl Quota {
    /// Create a quota gate.
    #[must_use]
    pub fn new(policy: QuotaPolicy, daily_cap: u32, cooldown: chrono::Duration) -> Self {
        Self {
            policy,
            daily_cap,
            cooldown_ms: cooldown.num_milliseconds(),
        }
    }

    /// The policy in force.
    #[must_use]
    pub fn policy(&self) -> QuotaPolicy {
        self.policy
    }

    /// The configured daily cap.
    #[must_use]
    pub fn daily_cap(&self) -> u32 {
        self.daily_cap
    }

    /// Check whether a send is currently permitted.
    ///
    /// Read-only: the stored record is never touched here, even when a day
    /// rollover is observed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DailyLimitReached`] or [`Error::CooldownActive`] when
    /// the policy blocks the send, or a store error if state cannot be read.
    pub fn check<S: StateStore>(&self, store: &S, now: DateTime<Utc>) -> Result<()> {
        match self.policy {
            QuotaPolicy::DailyCount => {
                let record = Self::load_daily(store, now.date_naive())?;
                if record.count >= self.daily_cap {
                    debug!("Daily quota exhausted: {} sent on {}", record.count, record.date);
                    return Err(Error::DailyLimitReached {
                        cap: self.daily_cap,
                    });
                }
                Ok(())
            }
            QuotaPolicy::Cooldown => {
                let Some(last_sent) = Self::load_last_sent(store)? else {
                    return Ok(());
                };
                let elapsed = now.timestamp_millis() - last_sent;
                if elapsed < self.cooldown_ms {
                    let remaining_ms = self.cooldown_ms - elapsed;
                    debug!("Cooldown active for another {remaining_ms}ms");
                    return Err(Error::CooldownActive { remaining_ms });
                }
                Ok(())
            }
        }
    }

    /// Commit a confirmed-successful send to the store.
    ///
    /// Returns the remaining allowance under the daily counter policy, or
    /// `None` under the cooldown policy.
    ///
    /// # Errors
    ///
    /// Returns an error if state cannot be read or written.
    pub fn commit<S: StateStore>(
        &self,
        store: &mut S,
        now: DateTime<Utc>,
    ) -> Result<Option<u32>> {
        match self.policy {
            QuotaPolicy::DailyCount => {
                let mut record = Self::load_daily(store, now.date_naive())?;
                record.record_send(now.timestamp_millis());
                store.set(DAILY_STATE_KEY, &serde_json::to_string(&record)?)?;
                Ok(Some(record.remaining(self.daily_cap)))
            }
            QuotaPolicy::Cooldown => {
                store.set(LAST_SENT_STATE_KEY, &now.timestamp_millis().to_string())?;
                Ok(None)
            }
        }
    }

    /// Current standing under the active policy.
    ///
    /// # Errors
    ///
    /// Returns an error if state cannot be read.
    pub fn status<S: StateStore>(&self, store: &S, now: DateTime<Utc>) -> Result<QuotaStatus> {
        match self.policy {
            QuotaPolicy::DailyCount => {
                let record = Self::load_daily(store, now.date_naive())?;
                Ok(QuotaStatus::DailyCount {
                    date: record.date,
                    used: record.count,
                    cap: self.daily_cap,
                    remaining: record.remaining(self.daily_cap),
                })
            }
            QuotaPolicy::Cooldown => {
                let last_sent_ms = Self::load_last_sent(store)?;
                let remaining_ms = last_sent_ms
                    .map(|last| (self.cooldown_ms - (now.timestamp_millis() - last)).max(0))
                    .unwrap_or(0);
                Ok(QuotaStatus::Cooldown {
                    last_sent_ms,
                    remaining_ms,
                })
            }
        }
    }

    /// Remove all persisted quota state.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn reset<S: StateStore>(store: &mut S) -> Result<()> {
        store.remove(DAILY_STATE_KEY)?;
        store.remove(LAST_SENT_STATE_KEY)?;
        Ok(())
    }

    /// Load the daily record, rolled forward to `today`.
    ///
    /// An unparseable stored record is logged and treated as absent.
    fn load_daily<S: StateStore>(store: &S, today: NaiveDate) -> Result<DailyRecord> {
        let record = match store.get(DAILY_STATE_KEY)? {
            Some(raw) => match serde_json::from_str::<DailyRecord>(&raw) {
                Ok(record) => record,
                Err(err) => {
                    warn!("Stored quota record is unparseable, starting fresh: {err}");
                    DailyRecord::new(today)
                }
            },
            None => DailyRecord::new(today),
        };
        Ok(record.rolled_to(today))
    }

    /// Load the last-sent timestamp, if present and parseable.
    fn load_last_sent<S: StateStore>(store: &S) -> Result<Option<i64>> {
        let Some(raw) = store.get(LAST_SENT_STATE_KEY)? else {
            return Ok(None);
        };
        match raw.parse::<i64>() {
            Ok(ms) => Ok(Some(ms)),
            Err(err) => {
                warn!("Stored last-sent timestamp is unparseable, ignoring: {err}");
                Ok(None)
            }
        }
    }
}

impl Default for Quota {
    fn default() -> Self {
        Self::new(
            QuotaPolicy::default(),
            DEFAULT_DAILY_CAP,
            chrono::Duration::hours(i64::from(DEFAULT_COOLDOWN_HOURS)),
        )
    }
}
