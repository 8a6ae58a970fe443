//! Streak derivation.
//!
//! Pure, stateless computation over day-keyed daily logs. Results are
//! derived on every read and never persisted.
//!
//! The load-bearing rule: a day with no log at all counts exactly like an
//! explicitly incomplete day. Skipping missing days would round streaks up.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::daykey::DayKey;

/// Completion evidence for one trackable item on one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LogOutcome {
    /// Explicit yes/no completion.
    Done { done: bool },
    /// Numeric progress compared against a target.
    Measured { value: f64, target: f64 },
}

impl LogOutcome {
    pub fn is_complete(&self) -> bool {
        match *self {
            LogOutcome::Done { done } => done,
            LogOutcome::Measured { value, target } => value >= target,
        }
    }
}

/// One log record for a (trackable item, day) pair. The item itself is
/// implied by the collection the caller passes in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyLog {
    pub date_key: DayKey,
    pub outcome: LogOutcome,
}

/// Derived streak counts; recomputed on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakResult {
    /// Consecutive complete days walking backward from the window end,
    /// stopping at the first incomplete or missing day.
    pub current_streak: u32,
    /// Longest run of consecutive complete days anywhere in the window.
    pub longest_streak: u32,
}

/// Compute streaks over the `window_days` days ending at `window_end`
/// (inclusive).
///
/// The window length is the caller's choice (30 or 90 days, typically);
/// this function does not assume "all history". When several logs carry
/// the same day key, the last one in `logs` wins.
pub fn compute_streaks(logs: &[DailyLog], window_end: DayKey, window_days: u32) -> StreakResult {
    let complete: HashMap<DayKey, bool> = logs
        .iter()
        .map(|log| (log.date_key, log.outcome.is_complete()))
        .collect();

    let mut result = StreakResult::default();
    let mut run = 0u32;
    let mut still_current = true;
    let mut day = window_end;

    for _ in 0..window_days {
        if complete.get(&day).copied().unwrap_or(false) {
            run += 1;
            result.longest_streak = result.longest_streak.max(run);
            if still_current {
                result.current_streak += 1;
            }
        } else {
            run = 0;
            still_current = false;
        }
        day = day.pred();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    fn done(s: &str) -> DailyLog {
        DailyLog {
            date_key: key(s),
            outcome: LogOutcome::Done { done: true },
        }
    }

    fn missed(s: &str) -> DailyLog {
        DailyLog {
            date_key: key(s),
            outcome: LogOutcome::Done { done: false },
        }
    }

    #[test]
    fn empty_logs_yield_zero_streaks() {
        let result = compute_streaks(&[], key("2026-03-10"), 30);
        assert_eq!(result, StreakResult::default());
    }

    #[test]
    fn missing_day_breaks_current_streak() {
        // done, done, missing, done walking backward from "today".
        let logs = [done("2026-03-10"), done("2026-03-09"), done("2026-03-07")];
        let result = compute_streaks(&logs, key("2026-03-10"), 30);
        assert_eq!(result.current_streak, 2);
        assert_eq!(result.longest_streak, 2);
    }

    #[test]
    fn spec_example_current_one_longest_two() {
        // Backward from today: today done, yesterday missing, then two done.
        let logs = [done("2026-03-10"), done("2026-03-08"), done("2026-03-07")];
        let result = compute_streaks(&logs, key("2026-03-10"), 30);
        assert_eq!(result.current_streak, 1);
        assert_eq!(result.longest_streak, 2);
    }

    #[test]
    fn explicit_incomplete_equals_missing() {
        let with_gap = [done("2026-03-10"), done("2026-03-08")];
        let with_miss = [done("2026-03-10"), missed("2026-03-09"), done("2026-03-08")];
        let end = key("2026-03-10");
        assert_eq!(
            compute_streaks(&with_gap, end, 30),
            compute_streaks(&with_miss, end, 30)
        );
    }

    #[test]
    fn incomplete_today_zeroes_current_but_not_longest() {
        let logs = [missed("2026-03-10"), done("2026-03-09"), done("2026-03-08")];
        let result = compute_streaks(&logs, key("2026-03-10"), 30);
        assert_eq!(result.current_streak, 0);
        assert_eq!(result.longest_streak, 2);
    }

    #[test]
    fn measured_log_compares_value_to_target() {
        let logs = [
            DailyLog {
                date_key: key("2026-03-10"),
                outcome: LogOutcome::Measured {
                    value: 30.0,
                    target: 25.0,
                },
            },
            DailyLog {
                date_key: key("2026-03-09"),
                outcome: LogOutcome::Measured {
                    value: 10.0,
                    target: 25.0,
                },
            },
            done("2026-03-08"),
        ];
        let result = compute_streaks(&logs, key("2026-03-10"), 30);
        assert_eq!(result.current_streak, 1);
        assert_eq!(result.longest_streak, 1);
    }

    #[test]
    fn window_bounds_the_scan() {
        // A long run further back than the window is invisible.
        let logs = [
            done("2026-03-01"),
            done("2026-02-28"),
            done("2026-02-27"),
            done("2026-03-10"),
        ];
        let result = compute_streaks(&logs, key("2026-03-10"), 5);
        assert_eq!(result.current_streak, 1);
        assert_eq!(result.longest_streak, 1);
    }

    #[test]
    fn full_window_run_counts_everywhere() {
        let logs: Vec<DailyLog> = (0u64..7)
            .map(|i| DailyLog {
                date_key: key("2026-03-10").back(i),
                outcome: LogOutcome::Done { done: true },
            })
            .collect();
        let result = compute_streaks(&logs, key("2026-03-10"), 7);
        assert_eq!(result.current_streak, 7);
        assert_eq!(result.longest_streak, 7);
    }

    #[test]
    fn longest_run_in_window_interior() {
        let logs = [
            done("2026-03-10"),
            done("2026-03-07"),
            done("2026-03-06"),
            done("2026-03-05"),
        ];
        let result = compute_streaks(&logs, key("2026-03-10"), 30);
        assert_eq!(result.current_streak, 1);
        assert_eq!(result.longest_streak, 3);
    }
}
