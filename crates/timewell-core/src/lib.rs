//! # Timewell Core Library
//!
//! This library provides the temporal accounting engine behind Timewell:
//! tracking elapsed wall-clock time across pause/resume cycles, committing
//! finished work into day-bucketed session records, driving a Pomodoro
//! work/break phase machine, and deriving streak statistics from sparse
//! daily logs. The CLI binary is a thin layer over the same core.
//!
//! ## Architecture
//!
//! - **Timer Ledger**: in-memory set of running timers, wall-clock based.
//!   The caller is responsible for reading elapsed time periodically.
//! - **Pomodoro Machine**: a caller-ticked phase state machine. One `tick()`
//!   per second; phase transitions are a side effect of ticking.
//! - **Streak Engine**: pure function over day-keyed daily logs.
//! - **Storage**: SQLite-based session/log storage and TOML configuration.
//!
//! ## Key Components
//!
//! - [`TimerLedger`]: running timer lifecycle and session commit
//! - [`PomodoroMachine`]: work/break phase state machine
//! - [`compute_streaks`]: current/longest streak derivation
//! - [`Database`]: session and daily-log persistence
//! - [`Config`]: application configuration management

pub mod clock;
pub mod daykey;
pub mod error;
pub mod events;
pub mod pomodoro;
pub mod storage;
pub mod streak;
pub mod timer;

pub use clock::{Clock, FakeClock, SystemClock};
pub use daykey::{DayKey, RolloverHour};
pub use error::{
    ConfigError, CoreError, DatabaseError, PomodoroError, TimerError, ValidationError,
};
pub use events::Event;
pub use pomodoro::{Phase, PomodoroConfig, PomodoroMachine, PomodoroState};
pub use storage::{Config, Database, DayStats, TotalStats};
pub use streak::{compute_streaks, DailyLog, LogOutcome, StreakResult};
pub use timer::{
    RunState, RunningTimer, SessionId, SubjectId, TimeSession, TimerId, TimerLedger, TimerMode,
    TimerStatus,
};
