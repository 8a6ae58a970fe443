use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::daykey::DayKey;
use crate::pomodoro::Phase;
use crate::timer::{SessionId, SubjectId, TimerId, TimerMode};

/// Every state change in the engine produces an Event.
///
/// Engines accumulate events in an internal list that the caller drains;
/// how they are propagated (channels, callbacks, polling) is the caller's
/// concern. Notification and UI collaborators subscribe to these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    TimerStarted {
        timer_id: TimerId,
        subject_id: SubjectId,
        mode: TimerMode,
        at: DateTime<Utc>,
    },
    TimerPaused {
        timer_id: TimerId,
        elapsed_secs: i64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        timer_id: TimerId,
        elapsed_secs: i64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        timer_id: TimerId,
        subject_id: SubjectId,
        duration_secs: i64,
        at: DateTime<Utc>,
    },
    SessionCreated {
        session_id: SessionId,
        subject_id: SubjectId,
        date_key: DayKey,
        duration_secs: i64,
        at: DateTime<Utc>,
    },
    PomodoroStarted {
        subject_id: SubjectId,
        work_secs: i64,
        at: DateTime<Utc>,
    },
    /// A work or break phase ran to completion (ticked to zero or skipped).
    PomodoroCompleted {
        session_number: u32,
        completed_phase: Phase,
        is_long_break_next: bool,
        at: DateTime<Utc>,
    },
    PomodoroStopped {
        sessions_completed: u32,
        at: DateTime<Utc>,
    },
}

/// Epoch-millisecond instant as an event timestamp.
pub(crate) fn event_time(epoch_ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(epoch_ms).unwrap_or(DateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_tag_with_screaming_snake_type() {
        let ev = Event::PomodoroStopped {
            sessions_completed: 3,
            at: event_time(0),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "POMODORO_STOPPED");
        assert_eq!(json["sessions_completed"], 3);
    }
}
