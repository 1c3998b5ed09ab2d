use crate::infrastructure::error::InfraError;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

/// Owns the single periodic tick task.
#[derive(Debug)]
pub struct TimerDriver {
    period: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Default for TimerDriver {
    fn default() -> Self {
        Self::new(TICK_PERIOD)
    }
}

impl TimerDriver {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            handle: Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Spawns the tick loop, aborting any loop already alive.
    ///
    /// The loop ends when `on_tick` returns [`TickControl::Stop`] or on
    /// [`TimerDriver::cancel`].
    pub fn start<F>(&self, mut on_tick: F) -> Result<(), InfraError>
    where
        F: FnMut() -> TickControl + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|error| {
            InfraError::Persistence(format!("timer driver needs a tokio runtime: {error}"))
        })?;
        let period = self.period;
        let mut guard = self.lock()?;
        if let Some(previous) = guard.take() {
            previous.abort();
        }
        *guard = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick of an interval completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if on_tick() == TickControl::Stop {
                    break;
                }
            }
        }));
        Ok(())
    }

    pub fn cancel(&self) {
        let Ok(mut guard) = self.handle.lock() else {
            return;
        };
        if let Some(handle) = guard.take() {
            handle.abort();
            tracing::debug!("timer driver cancelled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle
            .lock()
            .map(|guard| guard.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<JoinHandle<()>>>, InfraError> {
        self.handle.lock().map_err(|error| {
            InfraError::Persistence(format!("timer driver lock poisoned: {error}"))
        })
    }
}

impl Drop for TimerDriver {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn loop_stops_when_callback_says_so() {
        let driver = TimerDriver::new(Duration::from_millis(10));
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        driver
            .start(move || {
                if counter.fetch_add(1, Ordering::SeqCst) + 1 >= 3 {
                    TickControl::Stop
                } else {
                    TickControl::Continue
                }
            })
            .expect("start driver");

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert!(!driver.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_previous_loop() {
        let driver = TimerDriver::new(Duration::from_millis(10));
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let counter = first.clone();
        driver
            .start(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                TickControl::Continue
            })
            .expect("start first");
        let counter = second.clone();
        driver
            .start(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                TickControl::Continue
            })
            .expect("start second");

        tokio::time::sleep(Duration::from_millis(55)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert!(second.load(Ordering::SeqCst) >= 1);

        driver.cancel();
        let frozen = second.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(second.load(Ordering::SeqCst), frozen);
        assert!(!driver.is_active());
    }

    #[test]
    fn start_outside_runtime_is_an_error() {
        let driver = TimerDriver::default();
        assert!(driver.start(|| TickControl::Stop).is_err());
    }
}
