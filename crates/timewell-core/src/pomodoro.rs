//! Pomodoro phase machine.
//!
//! A single-timer state machine driven by a caller-supplied 1-second tick.
//! There is no internal thread: an external scheduler calls `tick()` once
//! per second and phase transitions happen as a side effect of ticking (or
//! of a manual `skip`).
//!
//! ## Phase cycle
//!
//! ```text
//! Idle -> Work -> (ShortBreak | LongBreak) -> Work -> ...
//! ```
//!
//! `stop` returns to `Idle` from any state and is the only place the
//! completed-session counter resets. Commands called in an invalid state
//! (skip while idle, start while running) are silent no-ops: the UI may
//! legitimately race with background ticks.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::{PomodoroError, ValidationError};
use crate::events::{event_time, Event};
use crate::timer::SubjectId;

/// One state of the pomodoro machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Idle,
    Work,
    ShortBreak,
    LongBreak,
}

/// Immutable-per-use pomodoro configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroConfig {
    #[serde(default = "default_work_secs")]
    pub work_secs: i64,
    #[serde(default = "default_short_break_secs")]
    pub short_break_secs: i64,
    #[serde(default = "default_long_break_secs")]
    pub long_break_secs: i64,
    #[serde(default = "default_sessions_before_long_break")]
    pub sessions_before_long_break: u32,
    #[serde(default = "default_true")]
    pub auto_start_breaks: bool,
    #[serde(default = "default_true")]
    pub auto_start_work: bool,
}

fn default_work_secs() -> i64 {
    25 * 60
}
fn default_short_break_secs() -> i64 {
    5 * 60
}
fn default_long_break_secs() -> i64 {
    15 * 60
}
fn default_sessions_before_long_break() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_secs: default_work_secs(),
            short_break_secs: default_short_break_secs(),
            long_break_secs: default_long_break_secs(),
            sessions_before_long_break: default_sessions_before_long_break(),
            auto_start_breaks: true,
            auto_start_work: true,
        }
    }
}

impl PomodoroConfig {
    /// Check at configuration time; the machine assumes a valid config.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("work_secs", self.work_secs),
            ("short_break_secs", self.short_break_secs),
            ("long_break_secs", self.long_break_secs),
        ] {
            if value <= 0 {
                return Err(ValidationError::InvalidValue {
                    field: field.to_string(),
                    message: format!("duration must be positive, got {value}"),
                });
            }
        }
        if self.sessions_before_long_break < 1 {
            return Err(ValidationError::InvalidValue {
                field: "sessions_before_long_break".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    fn duration_of(&self, phase: Phase) -> i64 {
        match phase {
            Phase::Idle => 0,
            Phase::Work => self.work_secs,
            Phase::ShortBreak => self.short_break_secs,
            Phase::LongBreak => self.long_break_secs,
        }
    }
}

/// Serializable machine state, persisted between CLI invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PomodoroState {
    /// Last-used config; doubles as the default for the next `start`.
    pub config: Option<PomodoroConfig>,
    pub phase: Phase,
    /// Ticking or paused-but-not-idle.
    pub is_active: bool,
    pub time_remaining_secs: i64,
    /// Monotonic within a run; resets only on explicit `stop`.
    pub sessions_completed: u32,
    pub linked_subject_id: Option<SubjectId>,
}

impl Default for PomodoroState {
    fn default() -> Self {
        Self {
            config: None,
            phase: Phase::Idle,
            is_active: false,
            time_remaining_secs: 0,
            sessions_completed: 0,
            linked_subject_id: None,
        }
    }
}

/// The pomodoro phase machine.
///
/// Emitted events accumulate internally and are drained by the caller,
/// like the timer ledger's.
pub struct PomodoroMachine {
    clock: Arc<dyn Clock>,
    state: PomodoroState,
    events: Vec<Event>,
}

impl PomodoroMachine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::from_state(clock, PomodoroState::default())
    }

    /// Rehydrate from persisted state.
    pub fn from_state(clock: Arc<dyn Clock>, state: PomodoroState) -> Self {
        Self {
            clock,
            state,
            events: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    pub fn time_remaining_secs(&self) -> i64 {
        self.state.time_remaining_secs
    }

    pub fn sessions_completed(&self) -> u32 {
        self.state.sessions_completed
    }

    pub fn linked_subject_id(&self) -> Option<&SubjectId> {
        self.state.linked_subject_id.as_ref()
    }

    pub fn config(&self) -> Option<&PomodoroConfig> {
        self.state.config.as_ref()
    }

    /// Persistable snapshot of the machine state.
    pub fn state(&self) -> &PomodoroState {
        &self.state
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Install a default config for subsequent `start` calls.
    pub fn set_config(&mut self, config: PomodoroConfig) {
        self.state.config = Some(config);
    }

    /// Start a run. Only valid from `Idle`; otherwise a silent no-op.
    ///
    /// Uses `config` when given, else the last-used/default config.
    /// Fails with [`PomodoroError::ConfigurationMissing`] when neither
    /// exists, or [`PomodoroError::InvalidConfiguration`] when the chosen
    /// config fails validation -- both need user action, so they are not
    /// silent.
    pub fn start(
        &mut self,
        subject_id: SubjectId,
        config: Option<PomodoroConfig>,
    ) -> Result<(), PomodoroError> {
        if self.state.phase != Phase::Idle {
            return Ok(());
        }
        let cfg = config
            .or_else(|| self.state.config.clone())
            .ok_or(PomodoroError::ConfigurationMissing)?;
        cfg.validate()?;
        self.state.phase = Phase::Work;
        self.state.time_remaining_secs = cfg.work_secs;
        self.state.sessions_completed = 0;
        self.state.is_active = true;
        self.state.linked_subject_id = Some(subject_id.clone());
        self.events.push(Event::PomodoroStarted {
            subject_id,
            work_secs: cfg.work_secs,
            at: event_time(self.clock.now_ms()),
        });
        self.state.config = Some(cfg);
        Ok(())
    }

    /// One second of progress. No-op unless active with time remaining;
    /// reaching zero fires the phase transition.
    pub fn tick(&mut self) {
        if !self.state.is_active || self.state.time_remaining_secs == 0 {
            return;
        }
        self.state.time_remaining_secs -= 1;
        if self.state.time_remaining_secs == 0 {
            self.advance();
        }
    }

    /// Apply the transition immediately, whatever the remaining time.
    /// Silent no-op while idle.
    pub fn skip(&mut self) {
        if self.state.phase == Phase::Idle {
            return;
        }
        self.advance();
    }

    /// Suspend ticking. Phase and remaining time are untouched.
    pub fn pause(&mut self) {
        if self.state.phase != Phase::Idle {
            self.state.is_active = false;
        }
    }

    /// Resume ticking. Phase and remaining time are untouched.
    pub fn resume(&mut self) {
        if self.state.phase != Phase::Idle {
            self.state.is_active = true;
        }
    }

    /// Return to `Idle` from any state. The only reset of the
    /// completed-session counter.
    pub fn stop(&mut self) {
        if self.state.phase == Phase::Idle {
            return;
        }
        self.events.push(Event::PomodoroStopped {
            sessions_completed: self.state.sessions_completed,
            at: event_time(self.clock.now_ms()),
        });
        self.state.phase = Phase::Idle;
        self.state.is_active = false;
        self.state.time_remaining_secs = 0;
        self.state.sessions_completed = 0;
        self.state.linked_subject_id = None;
    }

    /// Take all emitted events, leaving the list empty.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn advance(&mut self) {
        let Some(cfg) = self.state.config.clone() else {
            return;
        };
        let completed = self.state.phase;
        let (next, is_long_break_next) = match completed {
            Phase::Idle => return,
            Phase::Work => {
                self.state.sessions_completed += 1;
                let long = self.state.sessions_completed % cfg.sessions_before_long_break == 0;
                (if long { Phase::LongBreak } else { Phase::ShortBreak }, long)
            }
            Phase::ShortBreak | Phase::LongBreak => (Phase::Work, false),
        };
        self.state.phase = next;
        self.state.time_remaining_secs = cfg.duration_of(next);
        self.state.is_active = match next {
            Phase::Work => cfg.auto_start_work,
            _ => cfg.auto_start_breaks,
        };
        self.events.push(Event::PomodoroCompleted {
            session_number: self.state.sessions_completed,
            completed_phase: completed,
            is_long_break_next,
            at: event_time(self.clock.now_ms()),
        });
    }
}
