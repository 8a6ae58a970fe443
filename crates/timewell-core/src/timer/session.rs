//! Committed time sessions.
//!
//! A stopped timer becomes a `TimeSession`: one flat, immutable interval.
//! Pause/resume sub-intervals are collapsed at commit -- the record keeps
//! only the reconstructed span, so per-interval pause analytics are not
//! recoverable from sessions. That loss is intentional and documented.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::daykey::{DayKey, RolloverHour};
use crate::events::event_time;

use super::ledger::{RunningTimer, SubjectId};

/// Opaque id of a committed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// An immutable historical record of one work interval.
///
/// Only the free-text note (and with it `updated_at`) may change after
/// commit; everything else is written once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSession {
    pub id: SessionId,
    pub subject_id: SubjectId,
    pub start_at_ms: i64,
    pub end_at_ms: i64,
    /// Authoritative duration. Equals `end_at - start_at` in seconds today,
    /// but stored separately so future merge logic may trim gaps without
    /// rewriting the endpoints.
    pub duration_secs: i64,
    /// Resolved once at commit time from `start_at_ms`, never recomputed.
    /// Keying on the start keeps a session that crosses the rollover
    /// boundary filed under the day it began.
    pub date_key: DayKey,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeSession {
    /// Reconcile a stopped timer into one flat interval.
    ///
    /// `start_at` is reconstructed as `now - elapsed`, not the literal last
    /// resume instant, because elapsed time may span several pause/resume
    /// cycles.
    pub(crate) fn commit(timer: &RunningTimer, now_ms: i64, rollover: RolloverHour) -> Self {
        let elapsed_secs = timer.elapsed_secs_at(now_ms);
        let start_at_ms = now_ms - elapsed_secs * 1000;
        let at = event_time(now_ms);
        Self {
            id: SessionId::generate(),
            subject_id: timer.subject_id.clone(),
            start_at_ms,
            end_at_ms: now_ms,
            duration_secs: elapsed_secs,
            date_key: DayKey::resolve_ms(start_at_ms, rollover),
            note: None,
            created_at: at,
            updated_at: at,
        }
    }
}
