//! Deferred error-announcement state machine.
//!
//! Invalid content is not announced on the keystroke that produced it. Each
//! validating widget owns a [`FeedbackMachine`] that tracks content validity
//! and decides when the error becomes visible:
//!
//! ```text
//! Clean ──edit──▶ DirtyPending ──validation fails──▶ InvalidSilent
//!   ▲                                                    │
//!   │                                    complaint delay elapses
//!   │                                                    ▼
//!   └───────────── content validates ────────── InvalidAnnounced
//! ```
//!
//! While `InvalidAnnounced`, the widget background alternates on a repeating
//! timer and an error popup anchored to the widget shows the failure
//! message. The moment content validates again every announcement timer is
//! cancelled synchronously - no stale timer may fire after the transition.
//!
//! The delay and cadences are configuration ([`FeedbackConfig`]), not
//! constants.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use trellis_core::{Scheduler, TimerId};

/// Visual error surface a widget exposes to the feedback machinery.
///
/// The host toolkit does the actual rendering; the binding layer only
/// toggles state through this trait.
pub trait FeedbackSurface: Send + Sync {
    /// Turn the error background tint on or off.
    fn set_error_tint(&self, on: bool);

    /// Show the error popup anchored to the widget.
    fn show_error_popup(&self, message: &str);

    /// Hide the error popup.
    fn hide_error_popup(&self);

    /// Show or hide the persistent "missing input" indicator.
    fn set_missing_indicator(&self, on: bool);
}

/// The announcement phase of a validating widget's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedbackPhase {
    /// Content is valid (or untouched).
    #[default]
    Clean,
    /// The user edited; the content has not been re-validated yet.
    DirtyPending,
    /// Content failed validation but the complaint delay has not elapsed.
    InvalidSilent,
    /// The error indicator and popup are visible.
    InvalidAnnounced,
}

/// Timing configuration for error announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackConfig {
    /// Grace period after the last edit before an error is announced.
    pub complaint_delay: Duration,
    /// Cadence of the background-tint alternation while announced.
    pub blink_interval: Duration,
    /// How often the elapsed-time check runs while content is invalid.
    /// This check fires outside the critical edit path.
    pub poll_interval: Duration,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            complaint_delay: Duration::from_secs(1),
            blink_interval: Duration::from_millis(500),
            poll_interval: Duration::from_millis(200),
        }
    }
}

struct FeedbackState {
    phase: FeedbackPhase,
    /// The failure message to display; validator messages land here.
    message: Option<String>,
    /// When the user last edited the content.
    last_edit: Option<Instant>,
    /// Repeating elapsed-time check, running while invalid and unannounced.
    poll_timer: Option<TimerId>,
    /// Repeating background alternation, running while announced.
    blink_timer: Option<TimerId>,
    /// Current tint phase of the alternation.
    tint_on: bool,
}

/// Per-widget validation feedback state machine.
///
/// Created by a widget adapter; the adapter reports edits and validation
/// outcomes, and the machine drives the [`FeedbackSurface`] and its own
/// timers. All timers are owned by the machine and cancelled synchronously
/// whenever content turns valid, the adapter detaches, or the machine is
/// dropped.
pub struct FeedbackMachine {
    scheduler: Arc<Scheduler>,
    surface: Arc<dyn FeedbackSurface>,
    config: FeedbackConfig,
    state: Mutex<FeedbackState>,
}

impl FeedbackMachine {
    /// Create a machine bound to a scheduler and a widget's error surface.
    pub fn new(
        scheduler: Arc<Scheduler>,
        surface: Arc<dyn FeedbackSurface>,
        config: FeedbackConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            scheduler,
            surface,
            config,
            state: Mutex::new(FeedbackState {
                phase: FeedbackPhase::Clean,
                message: None,
                last_edit: None,
                poll_timer: None,
                blink_timer: None,
                tint_on: false,
            }),
        })
    }

    /// The current phase.
    pub fn phase(&self) -> FeedbackPhase {
        self.state.lock().phase
    }

    /// The failure message currently attached, if any.
    pub fn message(&self) -> Option<String> {
        self.state.lock().message.clone()
    }

    /// Record a user edit at `now`.
    ///
    /// Restarts the complaint grace period; a `Clean` widget becomes
    /// `DirtyPending` until re-validation reports an outcome.
    pub fn edited(&self, now: Instant) {
        let mut state = self.state.lock();
        state.last_edit = Some(now);
        if state.phase == FeedbackPhase::Clean {
            state.phase = FeedbackPhase::DirtyPending;
        }
    }

    /// Report that re-validation failed with `message`.
    ///
    /// Enters `InvalidSilent` (starting the elapsed-time check) unless the
    /// error is already announced, in which case the displayed message is
    /// refreshed in place.
    pub fn invalid(self: &Arc<Self>, message: impl Into<String>, now: Instant) {
        let message = message.into();
        let mut state = self.state.lock();
        state.message = Some(message.clone());
        if state.last_edit.is_none() {
            state.last_edit = Some(now);
        }

        match state.phase {
            FeedbackPhase::InvalidAnnounced => {
                drop(state);
                self.surface.show_error_popup(&message);
            }
            _ => {
                state.phase = FeedbackPhase::InvalidSilent;
                if state.poll_timer.is_none() {
                    let weak = Arc::downgrade(self);
                    let id = self.scheduler.every(self.config.poll_interval, move || {
                        if let Some(machine) = Weak::upgrade(&weak) {
                            machine.poll(Instant::now());
                        }
                    });
                    state.poll_timer = Some(id);
                }
                tracing::debug!(
                    target: "trellis::validate",
                    %message,
                    "content invalid, complaint pending"
                );
            }
        }
    }

    /// Report that re-validation succeeded.
    ///
    /// Transitions to `Clean` immediately: all announcement timers are
    /// cancelled at this point and the visuals are cleared, so nothing
    /// scheduled before the transition can fire afterwards.
    pub fn valid(&self) {
        let mut state = self.state.lock();
        self.cancel_timers(&mut state);
        state.phase = FeedbackPhase::Clean;
        state.message = None;
        let had_tint = std::mem::take(&mut state.tint_on);
        drop(state);

        if had_tint {
            self.surface.set_error_tint(false);
        }
        self.surface.hide_error_popup();
    }

    /// Elapsed-time check; promoted to a timer callback by [`invalid`].
    ///
    /// Public so hosts that drive their own idle loop can invoke it
    /// directly with an explicit clock.
    pub fn poll(self: &Arc<Self>, now: Instant) {
        let mut state = self.state.lock();
        if state.phase != FeedbackPhase::InvalidSilent {
            return;
        }
        let Some(last_edit) = state.last_edit else {
            return;
        };
        if now.duration_since(last_edit) < self.config.complaint_delay {
            return;
        }

        // Announce: the poll has done its job, the blinker takes over.
        state.phase = FeedbackPhase::InvalidAnnounced;
        if let Some(id) = state.poll_timer.take() {
            let _ = self.scheduler.cancel(id);
        }
        state.tint_on = true;
        let weak = Arc::downgrade(self);
        let id = self.scheduler.every(self.config.blink_interval, move || {
            if let Some(machine) = Weak::upgrade(&weak) {
                machine.blink();
            }
        });
        state.blink_timer = Some(id);
        let message = state.message.clone().unwrap_or_default();
        drop(state);

        tracing::debug!(target: "trellis::validate", %message, "announcing invalid content");
        self.surface.set_error_tint(true);
        self.surface.show_error_popup(&message);
    }

    /// One tick of the background alternation.
    fn blink(&self) {
        let mut state = self.state.lock();
        if state.phase != FeedbackPhase::InvalidAnnounced {
            return;
        }
        state.tint_on = !state.tint_on;
        let on = state.tint_on;
        drop(state);
        self.surface.set_error_tint(on);
    }

    /// Cancel all timers and clear visuals without changing the message.
    ///
    /// Called when the owning adapter detaches or its widget goes away.
    pub fn detach(&self) {
        let mut state = self.state.lock();
        self.cancel_timers(&mut state);
        state.phase = FeedbackPhase::Clean;
        let had_tint = std::mem::take(&mut state.tint_on);
        drop(state);

        if had_tint {
            self.surface.set_error_tint(false);
        }
        self.surface.hide_error_popup();
    }

    fn cancel_timers(&self, state: &mut FeedbackState) {
        if let Some(id) = state.poll_timer.take() {
            let _ = self.scheduler.cancel(id);
        }
        if let Some(id) = state.blink_timer.take() {
            let _ = self.scheduler.cancel(id);
        }
    }
}

impl Drop for FeedbackMachine {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        self.cancel_timers(&mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct SurfaceState {
        tint: bool,
        popup: Option<String>,
        missing: bool,
        tint_changes: usize,
    }

    #[derive(Default)]
    struct TestSurface {
        state: Mutex<SurfaceState>,
    }

    impl FeedbackSurface for TestSurface {
        fn set_error_tint(&self, on: bool) {
            let mut s = self.state.lock();
            s.tint = on;
            s.tint_changes += 1;
        }
        fn show_error_popup(&self, message: &str) {
            self.state.lock().popup = Some(message.to_string());
        }
        fn hide_error_popup(&self) {
            self.state.lock().popup = None;
        }
        fn set_missing_indicator(&self, on: bool) {
            self.state.lock().missing = on;
        }
    }

    fn machine() -> (Arc<Scheduler>, Arc<TestSurface>, Arc<FeedbackMachine>, Instant) {
        let scheduler = Arc::new(Scheduler::new());
        let surface = Arc::new(TestSurface::default());
        let machine = FeedbackMachine::new(
            scheduler.clone(),
            surface.clone(),
            FeedbackConfig::default(),
        );
        (scheduler, surface, machine, Instant::now())
    }

    #[test]
    fn test_clean_to_dirty_on_edit() {
        let (_, _, machine, t0) = machine();
        assert_eq!(machine.phase(), FeedbackPhase::Clean);
        machine.edited(t0);
        assert_eq!(machine.phase(), FeedbackPhase::DirtyPending);
    }

    #[test]
    fn test_invalid_stays_silent_before_delay() {
        let (scheduler, surface, machine, t0) = machine();
        machine.edited(t0);
        machine.invalid("bad number", t0);
        assert_eq!(machine.phase(), FeedbackPhase::InvalidSilent);

        // Polls before the complaint delay do not announce.
        scheduler.pump_at(t0 + Duration::from_millis(400));
        machine.poll(t0 + Duration::from_millis(400));
        assert_eq!(machine.phase(), FeedbackPhase::InvalidSilent);
        assert!(surface.state.lock().popup.is_none());
        assert!(!surface.state.lock().tint);
    }

    #[test]
    fn test_announces_after_delay() {
        let (_, surface, machine, t0) = machine();
        machine.edited(t0);
        machine.invalid("bad number", t0);

        machine.poll(t0 + Duration::from_millis(1100));
        assert_eq!(machine.phase(), FeedbackPhase::InvalidAnnounced);
        let s = surface.state.lock();
        assert!(s.tint);
        assert_eq!(s.popup.as_deref(), Some("bad number"));
    }

    #[test]
    fn test_edit_restarts_grace_period() {
        let (_, _, machine, t0) = machine();
        machine.edited(t0);
        machine.invalid("bad", t0);

        // Another edit 800ms in pushes the deadline out.
        let t1 = t0 + Duration::from_millis(800);
        machine.edited(t1);
        machine.invalid("still bad", t1);

        machine.poll(t0 + Duration::from_millis(1100));
        assert_eq!(machine.phase(), FeedbackPhase::InvalidSilent);
        machine.poll(t1 + Duration::from_millis(1100));
        assert_eq!(machine.phase(), FeedbackPhase::InvalidAnnounced);
    }

    #[test]
    fn test_valid_cancels_everything_synchronously() {
        let (scheduler, surface, machine, t0) = machine();
        machine.edited(t0);
        machine.invalid("bad", t0);
        machine.poll(t0 + Duration::from_secs(2));
        assert_eq!(machine.phase(), FeedbackPhase::InvalidAnnounced);
        assert!(scheduler.active_count() > 0);

        machine.valid();
        assert_eq!(machine.phase(), FeedbackPhase::Clean);
        assert_eq!(machine.message(), None);
        // All timers are gone the moment valid() returns.
        assert_eq!(scheduler.active_count(), 0);
        let s = surface.state.lock();
        assert!(!s.tint);
        assert!(s.popup.is_none());
        drop(s);

        // A pump far in the future runs nothing stale.
        assert_eq!(scheduler.pump_at(t0 + Duration::from_secs(60)), 0);
        assert_eq!(machine.phase(), FeedbackPhase::Clean);
    }

    #[test]
    fn test_valid_before_delay_never_announces() {
        let (scheduler, surface, machine, t0) = machine();
        machine.edited(t0);
        machine.invalid("bad", t0);
        machine.valid();

        scheduler.pump_at(t0 + Duration::from_secs(10));
        assert_eq!(machine.phase(), FeedbackPhase::Clean);
        assert!(surface.state.lock().popup.is_none());
        assert_eq!(surface.state.lock().tint_changes, 0);
    }

    #[test]
    fn test_blink_alternates_tint() {
        let (_, surface, machine, t0) = machine();
        machine.edited(t0);
        machine.invalid("bad", t0);
        machine.poll(t0 + Duration::from_secs(2));
        assert!(surface.state.lock().tint);

        machine.blink();
        assert!(!surface.state.lock().tint);
        machine.blink();
        assert!(surface.state.lock().tint);
    }

    #[test]
    fn test_announced_message_refreshes_in_place() {
        let (_, surface, machine, t0) = machine();
        machine.edited(t0);
        machine.invalid("first", t0);
        machine.poll(t0 + Duration::from_secs(2));
        assert_eq!(surface.state.lock().popup.as_deref(), Some("first"));

        machine.invalid("second", t0 + Duration::from_secs(3));
        assert_eq!(machine.phase(), FeedbackPhase::InvalidAnnounced);
        assert_eq!(surface.state.lock().popup.as_deref(), Some("second"));
    }

    #[test]
    fn test_poll_timer_drives_announcement_through_scheduler() {
        let scheduler = Arc::new(Scheduler::new());
        let surface = Arc::new(TestSurface::default());
        let machine = FeedbackMachine::new(
            scheduler.clone(),
            surface.clone(),
            FeedbackConfig {
                // Zero delay so the scheduler-driven poll (which reads the
                // real clock) announces on its first tick.
                complaint_delay: Duration::ZERO,
                ..FeedbackConfig::default()
            },
        );
        let t0 = Instant::now();
        machine.edited(t0);
        machine.invalid("bad", t0);
        assert_eq!(machine.phase(), FeedbackPhase::InvalidSilent);

        scheduler.pump_at(t0 + Duration::from_secs(1));
        assert_eq!(machine.phase(), FeedbackPhase::InvalidAnnounced);
    }

    #[test]
    fn test_detach_cancels_timers() {
        let (scheduler, _, machine, t0) = machine();
        machine.edited(t0);
        machine.invalid("bad", t0);
        machine.poll(t0 + Duration::from_secs(2));
        assert!(scheduler.active_count() > 0);

        machine.detach();
        assert_eq!(scheduler.active_count(), 0);
        assert_eq!(machine.phase(), FeedbackPhase::Clean);
    }
}
