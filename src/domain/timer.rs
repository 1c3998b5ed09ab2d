use crate::domain::models::{EntityId, SessionType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
}

impl TimerPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Running { time_left: u32 },
    /// Countdown reached zero; the timer has already been reset.
    Completed { elapsed_seconds: u32 },
}

/// Countdown projection of the current session.
///
/// `time_left` is derived from the wall clock: `paused_time` holds the
/// milliseconds run before the current segment and `start_time` marks the
/// beginning of that segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerState {
    pub is_running: bool,
    pub is_paused: bool,
    pub time_left: u32,
    pub total_time: u32,
    pub session_type: SessionType,
    pub task_id: Option<EntityId>,
    pub start_time: Option<DateTime<Utc>>,
    pub paused_time: i64,
}

impl TimerState {
    pub fn started(
        total_seconds: u32,
        session_type: SessionType,
        task_id: Option<EntityId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            is_running: true,
            is_paused: false,
            time_left: total_seconds,
            total_time: total_seconds,
            session_type,
            task_id,
            start_time: Some(now),
            paused_time: 0,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        if self.is_running {
            TimerPhase::Running
        } else if self.is_paused {
            TimerPhase::Paused
        } else {
            TimerPhase::Idle
        }
    }

    pub fn elapsed_millis(&self, now: DateTime<Utc>) -> i64 {
        let segment = match (self.is_running, self.start_time) {
            (true, Some(start)) => (now - start).num_milliseconds().max(0),
            _ => 0,
        };
        self.paused_time.max(0).saturating_add(segment)
    }

    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u32 {
        let seconds = self.elapsed_millis(now) / 1000;
        u32::try_from(seconds).unwrap_or(u32::MAX)
    }

    /// Seconds counted down so far, never more than `total_time`.
    pub fn counted_seconds(&self, now: DateTime<Utc>) -> u32 {
        self.elapsed_seconds(now).min(self.total_time)
    }

    pub fn remaining_at(&self, now: DateTime<Utc>) -> u32 {
        self.total_time.saturating_sub(self.elapsed_seconds(now))
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        self.paused_time = self.elapsed_millis(now);
        self.time_left = self.total_time.saturating_sub(self.elapsed_seconds(now));
        self.is_running = false;
        self.is_paused = true;
    }

    pub fn resume(&mut self, now: DateTime<Utc>) {
        self.start_time = Some(now);
        self.is_running = true;
        self.is_paused = false;
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if self.phase() != TimerPhase::Running {
            return TickOutcome::Idle;
        }
        let time_left = self.remaining_at(now);
        if time_left > 0 {
            self.time_left = time_left;
            return TickOutcome::Running { time_left };
        }

        let elapsed_seconds = self.counted_seconds(now);
        self.reset();
        TickOutcome::Completed { elapsed_seconds }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Re-derives a persisted timer against the wall clock.
    ///
    /// Inconsistent flag combinations collapse to idle.
    pub fn rehydrate(&mut self, now: DateTime<Utc>) {
        let consistent = match self.phase() {
            TimerPhase::Idle => true,
            TimerPhase::Running => !self.is_paused && self.start_time.is_some(),
            TimerPhase::Paused => true,
        };
        if !consistent || (self.total_time == 0 && self.phase() != TimerPhase::Idle) {
            self.reset();
            return;
        }
        if self.phase() != TimerPhase::Idle {
            self.time_left = self.remaining_at(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-16T09:00:00Z")
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    #[test]
    fn tick_uses_wall_clock_delta() {
        let mut timer = TimerState::started(1500, SessionType::Focus, None, start());
        // A single late tick after a suspended tab still reflects real time.
        let outcome = timer.tick(start() + Duration::seconds(600));
        assert_eq!(outcome, TickOutcome::Running { time_left: 900 });
        assert_eq!(timer.time_left, 900);
    }

    #[test]
    fn tick_completes_and_resets() {
        let mut timer = TimerState::started(60, SessionType::Break, Some(7), start());
        let outcome = timer.tick(start() + Duration::seconds(95));
        assert_eq!(outcome, TickOutcome::Completed { elapsed_seconds: 60 });
        assert_eq!(timer, TimerState::default());
        assert_eq!(timer.phase(), TimerPhase::Idle);
    }

    #[test]
    fn paused_time_is_excluded_from_countdown() {
        let mut timer = TimerState::started(300, SessionType::Focus, None, start());
        timer.pause(start() + Duration::seconds(100));
        assert_eq!(timer.phase(), TimerPhase::Paused);
        assert_eq!(timer.time_left, 200);

        // Ticks while paused do nothing.
        assert_eq!(timer.tick(start() + Duration::seconds(5000)), TickOutcome::Idle);

        timer.resume(start() + Duration::seconds(1000));
        assert_eq!(
            timer.tick(start() + Duration::seconds(1150)),
            TickOutcome::Running { time_left: 50 }
        );
        assert_eq!(
            timer.tick(start() + Duration::seconds(1200)),
            TickOutcome::Completed { elapsed_seconds: 300 }
        );
    }

    #[test]
    fn rehydrate_recomputes_running_timer() {
        let mut timer = TimerState::started(1500, SessionType::Focus, None, start());
        timer.time_left = 1500;
        timer.rehydrate(start() + Duration::seconds(1499));
        assert_eq!(timer.time_left, 1);
        assert_eq!(timer.phase(), TimerPhase::Running);
    }

    #[test]
    fn rehydrate_collapses_inconsistent_state() {
        let mut timer = TimerState {
            is_running: true,
            start_time: None,
            total_time: 100,
            time_left: 40,
            ..TimerState::default()
        };
        timer.rehydrate(start());
        assert_eq!(timer, TimerState::default());
    }

    proptest! {
        #[test]
        fn time_left_never_exceeds_total_or_goes_negative(
            total in 1u32..10_000,
            first in 0i64..20_000,
            pause_len in 0i64..20_000,
            second in 0i64..20_000,
        ) {
            let mut timer = TimerState::started(total, SessionType::Focus, None, start());
            let paused_at = start() + Duration::seconds(first);
            if let TickOutcome::Running { time_left } = timer.tick(paused_at) {
                prop_assert!(time_left <= total);
                timer.pause(paused_at);
                let resumed_at = paused_at + Duration::seconds(pause_len);
                timer.resume(resumed_at);
                match timer.tick(resumed_at + Duration::seconds(second)) {
                    TickOutcome::Running { time_left } => {
                        prop_assert!(time_left > 0 && time_left <= total);
                        prop_assert_eq!(
                            i64::from(time_left),
                            (i64::from(total) - first - second).max(0)
                        );
                    }
                    TickOutcome::Completed { elapsed_seconds } => {
                        prop_assert_eq!(elapsed_seconds, total);
                        prop_assert!(first + second >= i64::from(total));
                    }
                    TickOutcome::Idle => prop_assert!(false, "running timer reported idle"),
                }
            } else {
                prop_assert!(first >= i64::from(total));
            }
        }
    }
}
