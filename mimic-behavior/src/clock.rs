//! Clock capability: wall-clock reads and waiting.
//!
//! [`SystemClock`] reads local time and sleeps on the tokio timer.
//! [`ManualClock`] keeps a virtual time that only moves when a caller sleeps
//! or advances it, so hour-long waits finish instantly in tests.

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta};
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Port for reading local wall-clock time and waiting.
#[async_trait]
pub trait Clock: Send + Sync + Debug {
    /// Current local time. Calendar-day and hour-of-day decisions use this.
    fn now(&self) -> DateTime<Local>;

    /// Wait for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Production clock backed by `chrono::Local` and `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug)]
struct ManualState {
    now: DateTime<Local>,
    sleeps: Vec<Duration>,
}

/// Virtual clock whose `sleep` advances time instead of waiting.
///
/// Clones share the same timeline, so a test can keep one handle while a
/// controller owns another.
///
/// ```
/// use mimic_behavior::clock::{Clock, ManualClock};
/// use chrono::{Local, TimeZone, Timelike};
/// use std::time::Duration;
///
/// let start = Local.with_ymd_and_hms(2024, 6, 12, 8, 0, 0).unwrap();
/// let clock = ManualClock::new(start);
/// clock.advance(Duration::from_secs(3600));
/// assert_eq!(clock.now().hour(), 9);
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    state: Arc<Mutex<ManualState>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                now: start,
                sleeps: Vec::new(),
            })),
        }
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        let mut state = self.lock();
        state.now = shift(state.now, duration);
    }

    /// Jump to a specific instant.
    pub fn set(&self, instant: DateTime<Local>) {
        self.lock().now = instant;
    }

    /// Every duration passed to [`Clock::sleep`], in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    /// Sum of all recorded sleeps.
    pub fn total_slept(&self) -> Duration {
        self.lock().sleeps.iter().sum()
    }

    /// Forget recorded sleeps; the current time is kept.
    pub fn clear_sleeps(&self) {
        self.lock().sleeps.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state
            .lock()
            .expect("ManualClock mutex poisoned - a test thread panicked while holding the lock")
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.lock().now
    }

    async fn sleep(&self, duration: Duration) {
        let mut state = self.lock();
        state.now = shift(state.now, duration);
        state.sleeps.push(duration);
    }
}

fn shift(at: DateTime<Local>, by: Duration) -> DateTime<Local> {
    TimeDelta::from_std(by)
        .ok()
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(at)
}
