//! Running timer ledger.
//!
//! The ledger is a wall-clock-based accounting structure: it stores, per
//! timer, the start of the current unpaused interval plus whole seconds
//! banked from earlier intervals, and computes elapsed time on demand. It
//! holds no thread and no countdown -- the caller reads elapsed time as
//! often as it likes, sharing one "now" per render pass so two reads in the
//! same frame cannot disagree by a tick.
//!
//! ## Lifecycle
//!
//! ```text
//! start -> (pause <-> resume)* -> stop (commits a TimeSession) | discard
//! ```
//!
//! Timers survive restarts: the serialized `RunningTimer` records are
//! persisted externally and fed back through [`TimerLedger::restore`], and
//! elapsed time recomputes from the persisted state instead of resetting.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::daykey::RolloverHour;
use crate::error::{CoreError, Result, TimerError};
use crate::events::{event_time, Event};

use super::session::TimeSession;

/// Opaque id of a running timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(Uuid);

impl TimerId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TimerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Foreign key to the activity being timed. Ownership stays with the
/// surrounding application; the engine never dereferences it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Normal,
    Pomodoro,
}

/// Whether the timer is currently accumulating time.
///
/// Modeled as a two-variant enum rather than an optional `paused_at` field:
/// exactly one of running/paused holds, and resume swaps the variant in one
/// step so there is no window where both a stale start and a pause marker
/// exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RunState {
    Running { started_at_ms: i64 },
    Paused { paused_at_ms: i64 },
}

/// One in-progress, uncommitted work interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningTimer {
    pub id: TimerId,
    pub subject_id: SubjectId,
    #[serde(flatten)]
    pub run_state: RunState,
    /// Whole seconds banked from intervals before the most recent pause.
    pub accumulated_secs: i64,
    pub mode: TimerMode,
}

impl RunningTimer {
    /// Elapsed seconds at the given instant.
    ///
    /// Banked seconds plus, while running, the truncated seconds of the
    /// open interval. Constant while paused.
    pub fn elapsed_secs_at(&self, now_ms: i64) -> i64 {
        match self.run_state {
            RunState::Running { started_at_ms } => {
                self.accumulated_secs + ((now_ms - started_at_ms) / 1000).max(0)
            }
            RunState::Paused { .. } => self.accumulated_secs,
        }
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.run_state, RunState::Paused { .. })
    }
}

/// Read-model row for a UI render pass; all rows share one "now".
#[derive(Debug, Clone, Serialize)]
pub struct TimerStatus {
    pub id: TimerId,
    pub subject_id: SubjectId,
    pub mode: TimerMode,
    pub paused: bool,
    pub elapsed_secs: i64,
}

/// In-memory set of running timers with an injected clock.
///
/// Commands push emitted events onto an internal list; the caller drains
/// them with [`TimerLedger::drain_events`] and decides how to deliver them.
pub struct TimerLedger {
    clock: Arc<dyn Clock>,
    timers: BTreeMap<TimerId, RunningTimer>,
    events: Vec<Event>,
}

impl TimerLedger {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            timers: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn get(&self, id: TimerId) -> Option<&RunningTimer> {
        self.timers.get(&id)
    }

    pub fn running_for(&self, subject_id: &SubjectId) -> Option<&RunningTimer> {
        self.timers.values().find(|t| &t.subject_id == subject_id)
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Elapsed seconds per the ledger's clock.
    pub fn elapsed_secs(&self, id: TimerId) -> Result<i64, TimerError> {
        self.elapsed_secs_at(id, self.clock.now_ms())
    }

    /// Elapsed seconds at a caller-supplied instant. Use one shared `now`
    /// across reads that must agree within a render pass.
    pub fn elapsed_secs_at(&self, id: TimerId, now_ms: i64) -> Result<i64, TimerError> {
        self.timers
            .get(&id)
            .map(|t| t.elapsed_secs_at(now_ms))
            .ok_or(TimerError::NotFound(id))
    }

    /// Snapshot all timers against a single shared instant.
    pub fn status(&self) -> Vec<TimerStatus> {
        let now = self.clock.now_ms();
        self.timers
            .values()
            .map(|t| TimerStatus {
                id: t.id,
                subject_id: t.subject_id.clone(),
                mode: t.mode,
                paused: t.is_paused(),
                elapsed_secs: t.elapsed_secs_at(now),
            })
            .collect()
    }

    /// Clone of all live timers, for persistence.
    pub fn snapshot(&self) -> Vec<RunningTimer> {
        self.timers.values().cloned().collect()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a new timer for a subject.
    ///
    /// Rejects with [`TimerError::AlreadyRunning`] if the subject already
    /// has a live (running or paused) timer in this ledger.
    pub fn start(&mut self, subject_id: SubjectId, mode: TimerMode) -> Result<TimerId, TimerError> {
        if self.running_for(&subject_id).is_some() {
            return Err(TimerError::AlreadyRunning(subject_id));
        }
        let now = self.clock.now_ms();
        let id = TimerId::generate();
        let timer = RunningTimer {
            id,
            subject_id: subject_id.clone(),
            run_state: RunState::Running { started_at_ms: now },
            accumulated_secs: 0,
            mode,
        };
        self.timers.insert(id, timer);
        self.events.push(Event::TimerStarted {
            timer_id: id,
            subject_id,
            mode,
            at: event_time(now),
        });
        Ok(id)
    }

    /// Pause a timer, banking the open interval with integer-second
    /// truncation. Idempotent: pausing a paused timer changes nothing and
    /// emits nothing.
    pub fn pause(&mut self, id: TimerId) -> Result<(), TimerError> {
        let now = self.clock.now_ms();
        let timer = self.timers.get_mut(&id).ok_or(TimerError::NotFound(id))?;
        if let RunState::Running { started_at_ms } = timer.run_state {
            timer.accumulated_secs += ((now - started_at_ms) / 1000).max(0);
            timer.run_state = RunState::Paused { paused_at_ms: now };
            self.events.push(Event::TimerPaused {
                timer_id: id,
                elapsed_secs: timer.accumulated_secs,
                at: event_time(now),
            });
        }
        Ok(())
    }

    /// Resume a paused timer. The open interval restarts at "now"; the
    /// variant swap clears the pause marker in the same step. Idempotent.
    pub fn resume(&mut self, id: TimerId) -> Result<(), TimerError> {
        let now = self.clock.now_ms();
        let timer = self.timers.get_mut(&id).ok_or(TimerError::NotFound(id))?;
        if timer.is_paused() {
            timer.run_state = RunState::Running { started_at_ms: now };
            self.events.push(Event::TimerResumed {
                timer_id: id,
                elapsed_secs: timer.accumulated_secs,
                at: event_time(now),
            });
        }
        Ok(())
    }

    /// Stop a timer and commit it as a [`TimeSession`].
    pub fn stop(&mut self, id: TimerId, rollover: RolloverHour) -> Result<TimeSession> {
        self.stop_with(id, rollover, |_| Ok(()))
    }

    /// Stop a timer, running `persist` on the committed session before the
    /// timer leaves the ledger.
    ///
    /// If `persist` fails the timer stays in the ledger untouched, so no
    /// accounted time is lost when the external store rejects the write.
    /// Removal and session creation are never observable separately.
    pub fn stop_with(
        &mut self,
        id: TimerId,
        rollover: RolloverHour,
        persist: impl FnOnce(&TimeSession) -> Result<()>,
    ) -> Result<TimeSession> {
        let timer = self.timers.get(&id).ok_or(TimerError::NotFound(id))?;
        let now = self.clock.now_ms();
        let session = TimeSession::commit(timer, now, rollover);
        persist(&session)?;

        let timer = self
            .timers
            .remove(&id)
            .ok_or(CoreError::Timer(TimerError::NotFound(id)))?;
        self.events.push(Event::TimerStopped {
            timer_id: id,
            subject_id: timer.subject_id,
            duration_secs: session.duration_secs,
            at: event_time(now),
        });
        self.events.push(Event::SessionCreated {
            session_id: session.id,
            subject_id: session.subject_id.clone(),
            date_key: session.date_key,
            duration_secs: session.duration_secs,
            at: event_time(now),
        });
        Ok(session)
    }

    /// Remove a timer without producing a session. No event beyond removal.
    pub fn discard(&mut self, id: TimerId) -> Result<(), TimerError> {
        self.timers
            .remove(&id)
            .map(|_| ())
            .ok_or(TimerError::NotFound(id))
    }

    /// Rehydrate persisted timers after a restart. Elapsed time picks up
    /// from the persisted state; it is never reset.
    pub fn restore(&mut self, timers: impl IntoIterator<Item = RunningTimer>) {
        for timer in timers {
            self.timers.insert(timer.id, timer);
        }
    }

    /// Take all emitted events, leaving the list empty.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use proptest::prelude::*;

    fn ledger_at(start_ms: i64) -> (TimerLedger, Arc<FakeClock>) {
        let clock = FakeClock::shared(start_ms);
        (TimerLedger::new(clock.clone()), clock)
    }

    #[test]
    fn start_creates_running_timer() {
        let (mut ledger, _clock) = ledger_at(0);
        let id = ledger.start("math".into(), TimerMode::Normal).unwrap();
        let timer = ledger.get(id).unwrap();
        assert!(!timer.is_paused());
        assert_eq!(ledger.elapsed_secs(id).unwrap(), 0);
    }

    #[test]
    fn start_rejects_second_timer_for_same_subject() {
        let (mut ledger, _clock) = ledger_at(0);
        ledger.start("math".into(), TimerMode::Normal).unwrap();
        let err = ledger.start("math".into(), TimerMode::Normal).unwrap_err();
        assert_eq!(err, TimerError::AlreadyRunning("math".into()));
        // A different subject is fine.
        assert!(ledger.start("physics".into(), TimerMode::Normal).is_ok());
    }

    #[test]
    fn elapsed_counts_whole_seconds_while_running() {
        let (mut ledger, clock) = ledger_at(0);
        let id = ledger.start("math".into(), TimerMode::Normal).unwrap();
        clock.advance_ms(4_999);
        assert_eq!(ledger.elapsed_secs(id).unwrap(), 4);
        clock.advance_ms(1);
        assert_eq!(ledger.elapsed_secs(id).unwrap(), 5);
    }

    #[test]
    fn pause_freezes_elapsed_and_truncates() {
        let (mut ledger, clock) = ledger_at(0);
        let id = ledger.start("math".into(), TimerMode::Normal).unwrap();
        clock.advance_ms(10_900);
        ledger.pause(id).unwrap();
        // 10.9s truncates to 10, never rounds up.
        assert_eq!(ledger.elapsed_secs(id).unwrap(), 10);
        clock.advance_secs(500);
        assert_eq!(ledger.elapsed_secs(id).unwrap(), 10);
    }

    #[test]
    fn pause_twice_equals_pause_once() {
        let (mut ledger, clock) = ledger_at(0);
        let id = ledger.start("math".into(), TimerMode::Normal).unwrap();
        clock.advance_secs(30);
        ledger.pause(id).unwrap();
        let events_after_first = ledger.drain_events().len();
        ledger.pause(id).unwrap();
        assert_eq!(ledger.elapsed_secs(id).unwrap(), 30);
        assert!(ledger.drain_events().is_empty());
        assert!(events_after_first > 0);
    }

    #[test]
    fn resume_restarts_open_interval_at_now() {
        let (mut ledger, clock) = ledger_at(0);
        let id = ledger.start("math".into(), TimerMode::Normal).unwrap();
        clock.advance_secs(125);
        ledger.pause(id).unwrap();
        clock.advance_secs(75);
        ledger.resume(id).unwrap();
        clock.advance_secs(60);
        assert_eq!(ledger.elapsed_secs(id).unwrap(), 185);
    }

    #[test]
    fn resume_on_running_timer_is_noop() {
        let (mut ledger, clock) = ledger_at(0);
        let id = ledger.start("math".into(), TimerMode::Normal).unwrap();
        clock.advance_secs(10);
        ledger.drain_events();
        ledger.resume(id).unwrap();
        assert!(ledger.drain_events().is_empty());
        assert_eq!(ledger.elapsed_secs(id).unwrap(), 10);
    }

    #[test]
    fn stop_commits_session_and_removes_timer() {
        let (mut ledger, clock) = ledger_at(1_000_000);
        let id = ledger.start("math".into(), TimerMode::Normal).unwrap();
        clock.advance_secs(600);
        let session = ledger.stop(id, RolloverHour::MIDNIGHT).unwrap();
        assert_eq!(session.duration_secs, 600);
        assert!(ledger.get(id).is_none());
        assert!(matches!(
            ledger.elapsed_secs(id),
            Err(TimerError::NotFound(_))
        ));
    }

    #[test]
    fn stop_emits_stopped_then_session_created() {
        let (mut ledger, clock) = ledger_at(0);
        let id = ledger.start("math".into(), TimerMode::Normal).unwrap();
        clock.advance_secs(60);
        ledger.drain_events();
        ledger.stop(id, RolloverHour::MIDNIGHT).unwrap();
        let events = ledger.drain_events();
        assert!(matches!(events[0], Event::TimerStopped { .. }));
        assert!(matches!(events[1], Event::SessionCreated { .. }));
    }

    #[test]
    fn failed_persist_keeps_timer_in_ledger() {
        let (mut ledger, clock) = ledger_at(0);
        let id = ledger.start("math".into(), TimerMode::Normal).unwrap();
        clock.advance_secs(60);
        ledger.drain_events();
        let result = ledger.stop_with(id, RolloverHour::MIDNIGHT, |_| {
            Err(CoreError::Custom("store rejected write".into()))
        });
        assert!(result.is_err());
        assert!(ledger.get(id).is_some());
        assert!(ledger.drain_events().is_empty());
        assert_eq!(ledger.elapsed_secs(id).unwrap(), 60);
    }

    #[test]
    fn discard_removes_without_session_or_event() {
        let (mut ledger, _clock) = ledger_at(0);
        let id = ledger.start("math".into(), TimerMode::Normal).unwrap();
        ledger.drain_events();
        ledger.discard(id).unwrap();
        assert!(ledger.get(id).is_none());
        assert!(ledger.drain_events().is_empty());
        assert_eq!(ledger.discard(id), Err(TimerError::NotFound(id)));
    }

    #[test]
    fn restore_rehydrates_persisted_timer() {
        let (mut ledger, clock) = ledger_at(0);
        let id = ledger.start("math".into(), TimerMode::Normal).unwrap();
        clock.advance_secs(90);
        ledger.pause(id).unwrap();
        let persisted = serde_json::to_string(&ledger.snapshot()).unwrap();

        // Simulated restart: fresh ledger, same clock, state from disk.
        let mut reborn = TimerLedger::new(clock.clone());
        let timers: Vec<RunningTimer> = serde_json::from_str(&persisted).unwrap();
        reborn.restore(timers);
        assert_eq!(reborn.elapsed_secs(id).unwrap(), 90);
        reborn.resume(id).unwrap();
        clock.advance_secs(10);
        assert_eq!(reborn.elapsed_secs(id).unwrap(), 100);
    }

    #[test]
    fn status_rows_share_one_now() {
        let (mut ledger, clock) = ledger_at(0);
        let a = ledger.start("math".into(), TimerMode::Normal).unwrap();
        let b = ledger.start("physics".into(), TimerMode::Pomodoro).unwrap();
        clock.advance_secs(42);
        let status = ledger.status();
        assert_eq!(status.len(), 2);
        for row in &status {
            assert_eq!(row.elapsed_secs, 42);
        }
        assert!(status.iter().any(|r| r.id == a));
        assert!(status.iter().any(|r| r.id == b));
    }

    proptest! {
        /// Elapsed time never decreases while running and never moves
        /// while paused, under arbitrary pause/resume interleavings.
        #[test]
        fn elapsed_is_monotonic(steps in prop::collection::vec((0u8..3, 1i64..600), 1..40)) {
            let (mut ledger, clock) = ledger_at(0);
            let id = ledger.start("math".into(), TimerMode::Normal).unwrap();
            let mut last = 0i64;
            for (op, secs) in steps {
                match op {
                    0 => clock.advance_secs(secs),
                    1 => {
                        let paused = ledger.get(id).unwrap().is_paused();
                        let before = ledger.elapsed_secs(id).unwrap();
                        ledger.pause(id).unwrap();
                        clock.advance_secs(secs);
                        if !paused {
                            // Truncation may drop a sub-second remainder,
                            // never more than one whole second.
                            prop_assert!(ledger.elapsed_secs(id).unwrap() <= before);
                            prop_assert!(ledger.elapsed_secs(id).unwrap() >= before - 1);
                        }
                        // Constant while paused.
                        let frozen = ledger.elapsed_secs(id).unwrap();
                        clock.advance_secs(secs);
                        prop_assert_eq!(ledger.elapsed_secs(id).unwrap(), frozen);
                    }
                    _ => ledger.resume(id).unwrap(),
                }
                let now = ledger.elapsed_secs(id).unwrap();
                // Whole-second monotonicity, modulo the truncation at pause.
                prop_assert!(now >= last - 1);
                last = now;
            }
        }

        /// durationSec of the committed session equals elapsed seconds
        /// read immediately before stop, for all interleavings.
        #[test]
        fn commit_conserves_elapsed(steps in prop::collection::vec((0u8..3, 1i64..600), 0..30)) {
            let (mut ledger, clock) = ledger_at(0);
            let id = ledger.start("math".into(), TimerMode::Normal).unwrap();
            for (op, secs) in steps {
                match op {
                    0 => clock.advance_secs(secs),
                    1 => ledger.pause(id).unwrap(),
                    _ => ledger.resume(id).unwrap(),
                }
            }
            let before = ledger.elapsed_secs(id).unwrap();
            let session = ledger.stop(id, RolloverHour::MIDNIGHT).unwrap();
            prop_assert_eq!(session.duration_secs, before);
        }
    }
}
