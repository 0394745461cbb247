//! The submission controller.
//!
//! Drives one submission attempt through the workflow
//! `Idle → Validating → RateChecking → Sending` and back to `Idle`. Quota
//! state is committed only after the relay confirms acceptance, so remote
//! rejections and transport failures never consume allowance. An explicit
//! in-flight guard rejects overlapping attempts instead of letting them race.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::message::Message;
use crate::notice::{Notice, Notifier, DEFAULT_VISIBLE};
use crate::quota::Quota;
use crate::relay::Relay;
use crate::store::StateStore;

/// The result of a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Sends remaining today (daily counter policy only).
    pub remaining: Option<u32>,
}

/// Coordinates validation, rate limiting, delivery, and status notices.
///
/// All collaborators are injected: the state store stands in for the
/// browser-local storage of the original workflow, the relay for its `fetch`
/// call, and the notifier for its status element.
#[derive(Debug)]
pub struct Controller<S, R, N> {
    store: S,
    relay: R,
    notifier: N,
    quota: Quota,
    notice_visible: Duration,
    in_flight: bool,
}

impl<S, R, N> Controller<S, R, N>
where
    S: StateStore,
    R: Relay,
    N: Notifier,
{
    /// Create a controller with the default notice duration.
    #[must_use]
    pub fn new(store: S, relay: R, notifier: N, quota: Quota) -> Self {
        Self {
            store,
            relay,
            notifier,
            quota,
            notice_visible: DEFAULT_VISIBLE,
            in_flight: false,
        }
    }

    /// Override how long emitted notices stay visible.
    #[must_use]
    pub fn with_notice_visible(mut self, visible: Duration) -> Self {
        self.notice_visible = visible;
        self
    }

    /// Submit a message.
    ///
    /// Exactly one outbound request is made, and only when validation and the
    /// rate check pass. Every outcome, success or failure, emits a transient
    /// notice; failures additionally go to the diagnostic log. The attempt is
    /// terminal either way; retrying is the caller's decision.
    ///
    /// # Errors
    ///
    /// Returns the validation, rate limit, remote, network, or busy error
    /// that ended the attempt.
    pub async fn submit(&mut self, message: &Message, now: DateTime<Utc>) -> Result<Outcome> {
        if self.in_flight {
            let err = Error::SubmissionInFlight;
            warn!("Rejected overlapping submission attempt");
            self.notifier
                .notify(&Notice::for_error(&err, self.notice_visible));
            return Err(err);
        }

        self.in_flight = true;
        let result = self.run_attempt(message, now).await;
        self.in_flight = false;

        match &result {
            Ok(outcome) => {
                self.notifier.notify(&Notice::success(
                    success_text(outcome.remaining),
                    self.notice_visible,
                ));
            }
            Err(err) => {
                warn!("Submission failed: {err}");
                self.notifier
                    .notify(&Notice::for_error(err, self.notice_visible));
            }
        }
        result
    }

    async fn run_attempt(&mut self, message: &Message, now: DateTime<Utc>) -> Result<Outcome> {
        debug!("Validating message fields");
        message.validate()?;

        debug!("Checking rate limit");
        self.quota.check(&self.store, now)?;

        debug!("Sending message to relay");
        self.relay.deliver(message).await?;

        // The send is confirmed; a state write failure must not turn it into
        // a reported failure.
        let remaining = match self.quota.commit(&mut self.store, now) {
            Ok(remaining) => remaining,
            Err(err) => {
                warn!("Send succeeded but quota state could not be saved: {err}");
                None
            }
        };
        Ok(Outcome { remaining })
    }
}

/// Success notice text, mirroring the original workflow's wording.
fn success_text(remaining: Option<u32>) -> String {
    match remaining {
        Some(0) => "Message sent successfully! You have reached your daily limit.".to_string(),
        Some(n) => format!("Message sent successfully! You have {n} message(s) left today."),
        None => "Message sent successfully!".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeKind;
    use crate::quota::{QuotaPolicy, DAILY_STATE_KEY};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Clone, Copy)]
    enum MockMode {
        Accept,
        Reject(u16),
        NetworkFail,
    }

    /// Relay double that counts delivery attempts.
    struct MockRelay {
        mode: MockMode,
        calls: Arc<AtomicUsize>,
    }

    impl MockRelay {
        fn new(mode: MockMode) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    mode,
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl Relay for MockRelay {
        async fn deliver(&self, _message: &Message) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.mode {
                MockMode::Accept => Ok(()),
                MockMode::Reject(status) => Err(Error::remote_rejected(status, "rejected")),
                MockMode::NetworkFail => Err(Error::network("connection refused")),
            }
        }
    }

    #[derive(Debug, Default)]
    struct RecordingNotifier {
        notices: Vec<Notice>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&mut self, notice: &Notice) {
            self.notices.push(notice.clone());
        }
    }

    fn daily_quota(cap: u32) -> Quota {
        Quota::new(QuotaPolicy::DailyCount, cap, chrono::Duration::hours(24))
    }

    fn controller(
        cap: u32,
        mode: MockMode,
    ) -> (
        Controller<MemoryStore, MockRelay, RecordingNotifier>,
        Arc<AtomicUsize>,
    ) {
        let (relay, calls) = MockRelay::new(mode);
        (
            Controller::new(
                MemoryStore::new(),
                relay,
                RecordingNotifier::default(),
                daily_quota(cap),
            ),
            calls,
        )
    }

    fn valid_message() -> Message {
        Message::new("Ada", "ada@example.com", Some("Hi"), "Hello there")
    }

    fn noon(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_blank_field_never_sends() {
        let (mut ctrl, calls) = controller(5, MockMode::Accept);
        let message = Message::new("", "ada@example.com", None, "Hello");

        let err = ctrl.submit(&message, noon(1)).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(ctrl.notifier.notices.len(), 1);
        assert_eq!(ctrl.notifier.notices[0].kind, NoticeKind::Error);
    }

    #[tokio::test]
    async fn test_fresh_store_success_scenario() {
        let (mut ctrl, calls) = controller(5, MockMode::Accept);

        let outcome = ctrl.submit(&valid_message(), noon(1)).await.unwrap();
        assert_eq!(outcome.remaining, Some(4));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let raw = ctrl.store.get(DAILY_STATE_KEY).unwrap().unwrap();
        let record: crate::quota::DailyRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(record.count, 1);
        assert_eq!(record.timestamps.len(), 1);

        let notice = &ctrl.notifier.notices[0];
        assert_eq!(notice.kind, NoticeKind::Success);
        assert!(notice.text.contains("4 message(s) left today"));
        assert_eq!(notice.visible_for, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_cap_plus_one_rejected_without_request() {
        let cap = 3;
        let (mut ctrl, calls) = controller(cap, MockMode::Accept);

        for _ in 0..cap {
            ctrl.submit(&valid_message(), noon(1)).await.unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), cap as usize);

        let before = ctrl.store.get(DAILY_STATE_KEY).unwrap();
        let err = ctrl.submit(&valid_message(), noon(1)).await.unwrap_err();
        assert!(matches!(err, Error::DailyLimitReached { cap: 3 }));
        // No extra request, and the stored record is byte-for-byte unchanged.
        assert_eq!(calls.load(Ordering::SeqCst), cap as usize);
        assert_eq!(ctrl.store.get(DAILY_STATE_KEY).unwrap(), before);
    }

    #[tokio::test]
    async fn test_remote_rejection_leaves_state_unchanged() {
        let (mut ctrl, calls) = controller(5, MockMode::Reject(500));

        let before = ctrl.store.get(DAILY_STATE_KEY).unwrap();
        let err = ctrl.submit(&valid_message(), noon(1)).await.unwrap_err();
        assert!(matches!(err, Error::RemoteRejected { status: 500, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(ctrl.store.get(DAILY_STATE_KEY).unwrap(), before);

        let notice = &ctrl.notifier.notices[0];
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.text, "Failed to send message. Please try again later.");
    }

    #[tokio::test]
    async fn test_network_failure_leaves_state_unchanged() {
        let (mut ctrl, _calls) = controller(5, MockMode::NetworkFail);

        let err = ctrl.submit(&valid_message(), noon(1)).await.unwrap_err();
        assert!(matches!(err, Error::Network { .. }));
        assert_eq!(ctrl.store.get(DAILY_STATE_KEY).unwrap(), None);

        let notice = &ctrl.notifier.notices[0];
        assert_eq!(notice.text, "Network error while sending the message.");
    }

    #[tokio::test]
    async fn test_day_rollover_resets_allowance() {
        let (mut ctrl, _calls) = controller(2, MockMode::Accept);

        ctrl.submit(&valid_message(), noon(1)).await.unwrap();
        ctrl.submit(&valid_message(), noon(1)).await.unwrap();
        assert!(ctrl.submit(&valid_message(), noon(1)).await.is_err());

        // Yesterday's exhausted record permits a send today, restarting at 1.
        let outcome = ctrl.submit(&valid_message(), noon(2)).await.unwrap();
        assert_eq!(outcome.remaining, Some(1));

        let raw = ctrl.store.get(DAILY_STATE_KEY).unwrap().unwrap();
        let record: crate::quota::DailyRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(record.count, 1);
    }

    #[tokio::test]
    async fn test_final_send_reports_limit_reached() {
        let (mut ctrl, _calls) = controller(1, MockMode::Accept);

        let outcome = ctrl.submit(&valid_message(), noon(1)).await.unwrap();
        assert_eq!(outcome.remaining, Some(0));
        assert!(ctrl.notifier.notices[0]
            .text
            .contains("reached your daily limit"));
    }

    #[tokio::test]
    async fn test_in_flight_guard_rejects_overlap() {
        let (mut ctrl, calls) = controller(5, MockMode::Accept);
        ctrl.in_flight = true;

        let err = ctrl.submit(&valid_message(), noon(1)).await.unwrap_err();
        assert!(matches!(err, Error::SubmissionInFlight));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(ctrl.notifier.notices.len(), 1);

        // Releasing the guard lets the next attempt through.
        ctrl.in_flight = false;
        assert!(ctrl.submit(&valid_message(), noon(1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_guard_released_after_failure() {
        let (mut ctrl, _calls) = controller(5, MockMode::NetworkFail);
        assert!(ctrl.submit(&valid_message(), noon(1)).await.is_err());
        assert!(!ctrl.in_flight);
    }

    #[tokio::test]
    async fn test_no_deduplication_of_identical_messages() {
        let (mut ctrl, calls) = controller(5, MockMode::Accept);
        let message = valid_message();

        ctrl.submit(&message, noon(1)).await.unwrap();
        let outcome = ctrl.submit(&message, noon(1)).await.unwrap();
        // Same inputs send a second independent request.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(outcome.remaining, Some(3));
    }

    #[tokio::test]
    async fn test_cooldown_policy_success_has_no_remaining() {
        let (relay, _calls) = MockRelay::new(MockMode::Accept);
        let quota = Quota::new(QuotaPolicy::Cooldown, 1, chrono::Duration::hours(24));
        let mut ctrl = Controller::new(MemoryStore::new(), relay, RecordingNotifier::default(), quota);

        let outcome = ctrl.submit(&valid_message(), noon(1)).await.unwrap();
        assert_eq!(outcome.remaining, None);
        assert_eq!(ctrl.notifier.notices[0].text, "Message sent successfully!");

        let err = ctrl.submit(&valid_message(), noon(1)).await.unwrap_err();
        assert!(matches!(err, Error::CooldownActive { .. }));
    }

    #[tokio::test]
    async fn test_notice_visible_override() {
        let (relay, _calls) = MockRelay::new(MockMode::Accept);
        let mut ctrl = Controller::new(
            MemoryStore::new(),
            relay,
            RecordingNotifier::default(),
            daily_quota(5),
        )
        .with_notice_visible(Duration::from_secs(2));

        ctrl.submit(&valid_message(), noon(1)).await.unwrap();
        assert_eq!(ctrl.notifier.notices[0].visible_for, Duration::from_secs(2));
    }

    #[test]
    fn test_success_text_variants() {
        assert!(success_text(Some(3)).contains("3 message(s) left today"));
        assert!(success_text(Some(0)).contains("reached your daily limit"));
        assert_eq!(success_text(None), "Message sent successfully!");
    }
}
