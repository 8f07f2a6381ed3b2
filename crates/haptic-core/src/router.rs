use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::analysis::{self, ParsedFeedback};
use crate::catalog::{PatternCatalog, PatternDefinition};
use crate::config::Config;
use crate::cue::Cue;
use crate::ledger::{DeliveryLedger, Sighting};
use crate::protocol::{Ack, Command, Inbound};
use crate::sequencer::{FiredPulse, HapticOutput, HapticSequencer, RunId};
use crate::state::{CoachingState, LinkStatus, PresentationSnapshot};
use crate::types::HapticStrength;

// ---------------------------------------------------------------------------
// RouterOptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub dismiss_after: Duration,
    pub dedup_window: usize,
    pub device_name: String,
}

impl RouterOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            dismiss_after: Duration::from_millis(config.notification.dismiss_after_ms),
            dedup_window: config.delivery.dedup_window,
            device_name: config.device.name.clone(),
        }
    }
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Notification {
    visible: bool,
    text: String,
    /// Deadline of the most recent notification only; showing a new one
    /// replaces it, so an older timer can never hide a newer message.
    dismiss_at: Option<Instant>,
}

// ---------------------------------------------------------------------------
// MessageRouter
// ---------------------------------------------------------------------------

/// Sole owner of coaching state. Turns inbound envelopes into state changes
/// and haptic runs, and answers each one with an [`Ack`].
///
/// The router holds no clock: every entry point takes `now`, and the owner
/// calls [`tick`](MessageRouter::tick) at [`next_deadline`](MessageRouter::next_deadline).
pub struct MessageRouter<O> {
    sequencer: HapticSequencer<O>,
    coaching: CoachingState,
    notification: Notification,
    navigate_to_session: bool,
    link: LinkStatus,
    ledger: DeliveryLedger,
    options: RouterOptions,
}

impl<O: HapticOutput> MessageRouter<O> {
    pub fn new(catalog: Arc<PatternCatalog>, output: O, options: RouterOptions) -> Self {
        Self {
            sequencer: HapticSequencer::new(catalog, output),
            coaching: CoachingState::default(),
            notification: Notification::default(),
            navigate_to_session: false,
            link: LinkStatus::default(),
            ledger: DeliveryLedger::new(options.dedup_window),
            options,
        }
    }

    /// Decode and apply one inbound payload.
    ///
    /// Always returns an acknowledgment. Unrecognized or malformed messages
    /// change nothing. A repeat of an already-applied `(action, timestamp)`,
    /// or one older than the newest applied for its action, is acknowledged
    /// but not applied.
    pub fn handle(&mut self, payload: &Value, now: Instant) -> Ack {
        let inbound = Inbound::decode(payload);
        let ack = Ack::received(inbound.echo_action(), true);

        match inbound.command {
            Err(rejection) => {
                tracing::debug!(%rejection, "inbound message ignored");
            }
            Ok(command) => {
                let sighting = inbound
                    .timestamp
                    .map(|ts| self.ledger.observe(command.action(), ts))
                    .unwrap_or(Sighting::Fresh);
                if sighting.is_fresh() {
                    self.apply(command, now);
                } else {
                    tracing::debug!(
                        action = command.action(),
                        sighting = sighting.as_str(),
                        "delivery skipped"
                    );
                }
            }
        }
        ack
    }

    /// Apply an already-decoded command.
    pub fn apply(&mut self, command: Command, now: Instant) {
        match command {
            Command::StartSession { session_type } => {
                tracing::info!(session_type = %session_type, "session started");
                self.coaching.session_active = true;
                self.navigate_to_session = true;
                self.show_notification(&format!("{session_type} 세션이 시작되었습니다"), now);
                self.coaching.session_type_label = session_type;
            }
            Command::StopSession => {
                tracing::info!("session stopped");
                self.coaching.session_active = false;
                self.navigate_to_session = false;
                self.show_notification("세션이 종료되었습니다", now);
            }
            Command::HapticFeedback { message } => {
                self.show_notification(&message, now);
                match analysis::parse(&message) {
                    ParsedFeedback::Metrics(reading) => self.coaching.merge_reading(&reading),
                    ParsedFeedback::Freeform { feedback } => self.coaching.feedback_text = feedback,
                }
            }
            Command::HapticFeedbackWithPattern {
                message,
                pattern,
                category,
                pattern_id,
            } => {
                tracing::info!(pattern_id = %pattern_id, category = %category, "pattern feedback");
                self.show_text(message, now);
                self.sequencer.trigger(&pattern_id, Some(&pattern), now);
            }
            Command::RealtimeAnalysis(update) => {
                self.coaching.merge_analysis(&update);
                if let Some(feedback) = update.feedback.as_deref().filter(|f| !f.is_empty()) {
                    self.show_notification(feedback, now);
                }
            }
        }
    }

    /// Trigger a catalog pattern directly.
    pub fn trigger(&mut self, pattern_id: &str, variant: Option<&str>, now: Instant) -> RunId {
        self.sequencer.trigger(pattern_id, variant, now)
    }

    /// Play the settings-driven test sequence.
    pub fn play_test(&mut self, strength: HapticStrength, count: u8, now: Instant) -> RunId {
        self.sequencer
            .play(PatternDefinition::test_sequence(strength, count), now)
    }

    pub fn set_link(&mut self, link: LinkStatus) {
        self.link = link;
    }

    pub fn link(&self) -> &LinkStatus {
        &self.link
    }

    /// Earliest pending pulse or notification dismissal.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.sequencer.next_deadline(), self.notification.dismiss_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire whatever is due at `now`.
    pub fn tick(&mut self, now: Instant) -> Vec<FiredPulse> {
        let fired = self.sequencer.fire_due(now);
        if self.notification.dismiss_at.is_some_and(|at| at <= now) {
            self.notification.visible = false;
            self.notification.dismiss_at = None;
        }
        fired
    }

    pub fn coaching(&self) -> &CoachingState {
        &self.coaching
    }

    pub fn snapshot(&self) -> PresentationSnapshot {
        PresentationSnapshot {
            coaching: self.coaching.clone(),
            notification_visible: self.notification.visible,
            notification_text: self.notification.text.clone(),
            navigate_to_session: self.navigate_to_session,
            connected: self.link.connected(),
            peer_label: self.link.label(&self.options.device_name),
            busy: self.sequencer.is_busy(),
        }
    }

    /// Show `text` and play the cue its content suggests.
    fn show_notification(&mut self, text: &str, now: Instant) {
        self.show_text(text.to_string(), now);
        let cue = Cue::classify(text);
        tracing::debug!(cue = cue.as_str(), "notification cue");
        self.sequencer.play(cue.pattern(), now);
    }

    fn show_text(&mut self, text: String, now: Instant) {
        self.notification.visible = true;
        self.notification.text = text;
        self.notification.dismiss_at = Some(now + self.options.dismiss_after);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::PulseRecorder;
    use crate::types::Intensity::{Light, Medium, Strong, Success};
    use serde_json::json;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn router() -> (MessageRouter<PulseRecorder>, PulseRecorder) {
        let rec = PulseRecorder::new();
        let r = MessageRouter::new(
            Arc::new(PatternCatalog::builtin().unwrap()),
            rec.clone(),
            RouterOptions::default(),
        );
        (r, rec)
    }

    #[test]
    fn start_session_sets_flags_and_acks() {
        let (mut r, _) = router();
        let t0 = Instant::now();
        let ack = r.handle(&json!({"action": "startSession", "sessionType": "T"}), t0);

        assert_eq!(ack.status, "received");
        assert_eq!(ack.echoed_action, "startSession");
        assert!(ack.sender_active);

        let snap = r.snapshot();
        assert!(snap.coaching.session_active);
        assert_eq!(snap.coaching.session_type_label, "T");
        assert!(snap.navigate_to_session);
        assert!(snap.notification_visible);
        assert_eq!(snap.notification_text, "T 세션이 시작되었습니다");
    }

    #[test]
    fn stop_session_clears_flags() {
        let (mut r, _) = router();
        let t0 = Instant::now();
        r.handle(&json!({"action": "startSession", "sessionType": "T"}), t0);
        let ack = r.handle(&json!({"action": "stopSession"}), t0 + ms(10));

        assert_eq!(ack.echoed_action, "stopSession");
        let snap = r.snapshot();
        assert!(!snap.coaching.session_active);
        assert!(!snap.navigate_to_session);
        assert_eq!(snap.notification_text, "세션이 종료되었습니다");
    }

    #[test]
    fn start_session_without_type_is_a_noop() {
        let (mut r, rec) = router();
        let t0 = Instant::now();
        let ack = r.handle(&json!({"action": "startSession"}), t0);
        assert_eq!(ack.echoed_action, "startSession");
        assert!(!r.coaching().session_active);
        assert!(!r.snapshot().notification_visible);
        r.tick(t0 + ms(1_000));
        assert!(rec.pulses().is_empty());
    }

    #[test]
    fn realtime_analysis_changes_only_present_fields() {
        let (mut r, _) = router();
        let before = r.coaching().clone();
        r.handle(&json!({"action": "realtimeAnalysis", "likability": 55}), Instant::now());

        let after = r.coaching();
        assert_eq!(after.likability, 55);
        assert_eq!(after.interest, before.interest);
        assert_eq!(after.speaking_speed, before.speaking_speed);
        assert_eq!(after.emotion, before.emotion);
        assert!(!r.snapshot().notification_visible);
    }

    #[test]
    fn realtime_analysis_feedback_shows_notification() {
        let (mut r, rec) = router();
        let t0 = Instant::now();
        r.handle(
            &json!({"action": "realtimeAnalysis", "emotion": "중립", "feedback": "💡 질문해보세요"}),
            t0,
        );
        let snap = r.snapshot();
        assert_eq!(snap.coaching.emotion, "중립");
        assert_eq!(snap.coaching.feedback_text, "💡 질문해보세요");
        assert!(snap.notification_visible);
        r.tick(t0 + ms(150));
        assert_eq!(rec.pulses(), vec![Light, Light]);
    }

    #[test]
    fn empty_feedback_updates_text_without_notification() {
        let (mut r, _) = router();
        r.handle(&json!({"action": "realtimeAnalysis", "feedback": ""}), Instant::now());
        assert!(!r.snapshot().notification_visible);
        assert_eq!(r.coaching().feedback_text, "");
    }

    #[test]
    fn haptic_feedback_parses_metrics() {
        let (mut r, rec) = router();
        let t0 = Instant::now();
        r.handle(
            &json!({"action": "hapticFeedback", "message": "호감도: 61%, 관심도: 47%"}),
            t0,
        );
        assert_eq!(r.coaching().likability, 61);
        assert_eq!(r.coaching().interest, 47);
        assert_eq!(r.coaching().feedback_text, "");
        r.tick(t0);
        assert_eq!(rec.pulses(), vec![Strong]);
    }

    #[test]
    fn haptic_feedback_freeform_sets_feedback_and_cue() {
        let (mut r, rec) = router();
        let t0 = Instant::now();
        r.handle(&json!({"action": "hapticFeedback", "message": "🎉 잘하고 있어요"}), t0);
        assert_eq!(r.coaching().feedback_text, "🎉 잘하고 있어요");
        r.tick(t0 + ms(300));
        assert_eq!(rec.pulses(), vec![Success, Success]);
    }

    #[test]
    fn bad_metric_keeps_previous_value() {
        let (mut r, _) = router();
        let t0 = Instant::now();
        r.handle(&json!({"action": "realtimeAnalysis", "likability": 40}), t0);
        r.handle(
            &json!({"action": "hapticFeedback", "message": "호감도: ??%, 관심도: 30%"}),
            t0,
        );
        assert_eq!(r.coaching().likability, 40);
        assert_eq!(r.coaching().interest, 30);
    }

    #[test]
    fn explicit_pattern_bypasses_cue() {
        let (mut r, rec) = router();
        let t0 = Instant::now();
        r.handle(
            &json!({
                "action": "hapticFeedbackWithPattern",
                "message": "🚀 목소리를 낮춰보세요",
                "pattern": "volume_loud",
                "category": "speaker",
                "patternId": "S2"
            }),
            t0,
        );
        assert_eq!(r.snapshot().notification_text, "🚀 목소리를 낮춰보세요");
        r.tick(t0 + ms(1_000));
        // S2 mirrored, not the warning cue.
        assert_eq!(rec.pulses(), vec![Strong, Light]);
    }

    #[test]
    fn pattern_feedback_missing_field_is_noop() {
        let (mut r, rec) = router();
        let t0 = Instant::now();
        r.handle(
            &json!({"action": "hapticFeedbackWithPattern", "message": "m", "patternId": "S1"}),
            t0,
        );
        assert!(!r.snapshot().notification_visible);
        r.tick(t0 + ms(1_000));
        assert!(rec.pulses().is_empty());
    }

    #[test]
    fn unrecognized_action_still_acks() {
        let (mut r, _) = router();
        let before = r.snapshot();
        let ack = r.handle(&json!({"action": "somethingNew", "x": 1}), Instant::now());
        assert_eq!(ack.status, "received");
        assert_eq!(ack.echoed_action, "somethingNew");
        assert_eq!(r.snapshot(), before);

        let ack = r.handle(&json!({"hello": "world"}), Instant::now());
        assert_eq!(ack.echoed_action, "unknown");
    }

    #[test]
    fn notification_dismisses_after_five_seconds() {
        let (mut r, _) = router();
        let t0 = Instant::now();
        r.handle(&json!({"action": "hapticFeedback", "message": "hi"}), t0);
        r.tick(t0 + ms(4_999));
        assert!(r.snapshot().notification_visible);
        r.tick(t0 + ms(5_000));
        assert!(!r.snapshot().notification_visible);
        assert_eq!(r.next_deadline(), None);
    }

    #[test]
    fn newer_notification_resets_dismiss_timer() {
        let (mut r, _) = router();
        let t0 = Instant::now();
        r.handle(&json!({"action": "hapticFeedback", "message": "one"}), t0);
        r.handle(&json!({"action": "hapticFeedback", "message": "two"}), t0 + ms(3_000));
        r.tick(t0 + ms(5_000));
        let snap = r.snapshot();
        assert!(snap.notification_visible);
        assert_eq!(snap.notification_text, "two");
        r.tick(t0 + ms(8_000));
        assert!(!r.snapshot().notification_visible);
    }

    #[test]
    fn dismiss_is_independent_of_pulses() {
        let (mut r, _) = router();
        let t0 = Instant::now();
        r.handle(
            &json!({
                "action": "hapticFeedbackWithPattern",
                "message": "m", "pattern": "p", "category": "c", "patternId": "L1"
            }),
            t0,
        );
        assert_eq!(r.next_deadline(), Some(t0));
        r.tick(t0 + ms(700));
        assert!(!r.snapshot().busy);
        assert!(r.snapshot().notification_visible);
        assert_eq!(r.next_deadline(), Some(t0 + ms(5_000)));
    }

    #[test]
    fn duplicate_delivery_is_applied_once() {
        let (mut r, rec) = router();
        let t0 = Instant::now();
        let msg = json!({"action": "hapticFeedback", "message": "hi", "timestamp": 100.25});
        r.handle(&msg, t0);
        r.tick(t0 + ms(1_000));
        let ack = r.handle(&msg, t0 + ms(1_000));
        r.tick(t0 + ms(2_000));
        assert_eq!(ack.echoed_action, "hapticFeedback");
        assert_eq!(rec.pulses(), vec![Strong]);
    }

    #[test]
    fn late_older_analysis_does_not_overwrite_newer() {
        let (mut r, _) = router();
        let t0 = Instant::now();
        r.handle(
            &json!({"action": "realtimeAnalysis", "likability": 60, "timestamp": 200.0}),
            t0,
        );
        let ack = r.handle(
            &json!({"action": "realtimeAnalysis", "likability": 50, "timestamp": 100.0}),
            t0 + ms(10),
        );
        assert_eq!(ack.status, "received");
        assert_eq!(ack.echoed_action, "realtimeAnalysis");
        assert_eq!(r.coaching().likability, 60);

        r.handle(
            &json!({"action": "realtimeAnalysis", "likability": 70, "timestamp": 300.0}),
            t0 + ms(20),
        );
        assert_eq!(r.coaching().likability, 70);
    }

    #[test]
    fn messages_without_timestamp_are_never_deduplicated() {
        let (mut r, rec) = router();
        let t0 = Instant::now();
        let msg = json!({"action": "hapticFeedback", "message": "hi"});
        r.handle(&msg, t0);
        r.tick(t0);
        r.handle(&msg, t0 + ms(10));
        r.tick(t0 + ms(10));
        assert_eq!(rec.pulses(), vec![Strong, Strong]);
    }

    #[test]
    fn test_sequence_runs_through_sequencer() {
        let (mut r, rec) = router();
        let t0 = Instant::now();
        r.play_test(HapticStrength::Basic, 1, t0);
        assert!(r.snapshot().busy);
        r.tick(t0 + ms(50));
        assert_eq!(rec.pulses(), vec![Medium, Strong]);
        assert!(!r.snapshot().busy);
    }

    #[test]
    fn snapshot_reflects_link() {
        let (mut r, _) = router();
        r.set_link(LinkStatus {
            activated: true,
            reachable: true,
            settled: true,
        });
        let snap = r.snapshot();
        assert!(snap.connected);
        assert_eq!(snap.peer_label, "연결됨: Apple Watch");
    }
}
