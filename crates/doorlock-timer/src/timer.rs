//! Reusable one-shot and periodic timers.
//!
//! A [`Timer`] is a single-owner handle bound to a callback at creation. It
//! can be armed, re-armed with a new period, disarmed and armed again any
//! number of times without being recreated. Every arm first cancels the
//! pending arming, so a timer never has two schedules in flight.
//!
//! # Architecture
//!
//! ```text
//!  Timer::arm ──► lock slot ──► abort previous task ──► generation += 1
//!                                                     └► spawn sleeper(generation)
//!
//!  sleeper wakes ──► lock slot ──► generation unchanged? ──► callback()
//!                                         │
//!                                         └─ no ──► exit silently
//! ```
//!
//! The generation check covers the window where a sleeper has already woken
//! but not yet claimed the slot when a re-arm aborts it.
//!
//! Callbacks run on the Tokio task of the timer and must be short and
//! non-blocking: perform a transition or enqueue work, nothing more.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

use crate::error::{Result, TimerError};

/// Callback bound to a timer.
pub type TimerCallback = Arc<dyn Fn() + Send + Sync>;

/// Whether a timer fires once per arming or repeatedly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    OneShot,
    Periodic,
}

/// Factory for timers that share one armed-timer counter.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::time::Duration;
/// use doorlock_timer::TimerService;
///
/// #[tokio::main(flavor = "current_thread", start_paused = true)]
/// async fn main() -> doorlock_timer::Result<()> {
///     let service = TimerService::new();
///     let fired = Arc::new(AtomicUsize::new(0));
///     let counter = Arc::clone(&fired);
///
///     let timer = service.one_shot("example", Duration::from_secs(1), move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     });
///
///     timer.arm()?;
///     timer.arm()?; // re-arm replaces the first schedule
///     assert_eq!(service.armed_count(), 1);
///
///     tokio::time::sleep(Duration::from_secs(2)).await;
///     assert_eq!(fired.load(Ordering::SeqCst), 1);
///     assert_eq!(service.armed_count(), 0);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TimerService {
    armed: Arc<AtomicUsize>,
}

impl TimerService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a disarmed timer.
    pub fn create(
        &self,
        name: impl Into<String>,
        mode: TimerMode,
        period: Duration,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Timer {
        Timer {
            shared: Arc::new(Shared {
                name: name.into(),
                mode,
                callback: Arc::new(callback),
                slot: Mutex::new(Slot {
                    period,
                    generation: 0,
                    task: None,
                    deadline: None,
                }),
                armed: Arc::clone(&self.armed),
            }),
        }
    }

    /// Create a disarmed one-shot timer.
    pub fn one_shot(
        &self,
        name: impl Into<String>,
        period: Duration,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Timer {
        self.create(name, TimerMode::OneShot, period, callback)
    }

    /// Create a disarmed periodic timer.
    pub fn periodic(
        &self,
        name: impl Into<String>,
        period: Duration,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Timer {
        self.create(name, TimerMode::Periodic, period, callback)
    }

    /// Number of timers from this service that are currently armed.
    pub fn armed_count(&self) -> usize {
        self.armed.load(Ordering::SeqCst)
    }
}

struct Slot {
    period: Duration,
    generation: u64,
    task: Option<JoinHandle<()>>,
    deadline: Option<Instant>,
}

struct Shared {
    name: String,
    mode: TimerMode,
    callback: TimerCallback,
    slot: Mutex<Slot>,
    armed: Arc<AtomicUsize>,
}

impl Shared {
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Release the slot held by a one-shot arming that is about to fire.
    fn claim(&self, generation: u64) -> bool {
        let mut slot = self.slot();
        if slot.generation != generation {
            return false;
        }
        if slot.task.take().is_some() {
            self.armed.fetch_sub(1, Ordering::SeqCst);
        }
        slot.deadline = None;
        true
    }

    fn is_current(&self, generation: u64) -> bool {
        self.slot().generation == generation
    }
}

/// A reusable timer handle.
///
/// Not `Clone`: the owner is the only party that can arm it, which rules out
/// two schedules racing each other. Dropping the handle disarms the timer.
pub struct Timer {
    shared: Arc<Shared>,
}

impl Timer {
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn mode(&self) -> TimerMode {
        self.shared.mode
    }

    /// Period used by the next arming.
    pub fn period(&self) -> Duration {
        self.shared.slot().period
    }

    pub fn is_armed(&self) -> bool {
        self.shared.slot().task.is_some()
    }

    /// When a one-shot arming will fire, if armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.shared.slot().deadline
    }

    /// Arm (or re-arm) with the current period.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::NoRuntime` when called outside a Tokio runtime
    /// and `TimerError::ZeroPeriod` for a periodic timer with a zero period.
    pub fn arm(&self) -> Result<()> {
        self.schedule(None)
    }

    /// Re-arm with a new period, which also becomes the default for later
    /// arms.
    ///
    /// # Errors
    ///
    /// As [`arm`](Self::arm).
    pub fn arm_with(&self, period: Duration) -> Result<()> {
        self.schedule(Some(period))
    }

    /// Cancel the pending arming, if any.
    ///
    /// Returns `true` if the timer was armed.
    pub fn disarm(&self) -> bool {
        let mut slot = self.shared.slot();
        slot.generation = slot.generation.wrapping_add(1);
        slot.deadline = None;
        match slot.task.take() {
            Some(task) => {
                task.abort();
                self.shared.armed.fetch_sub(1, Ordering::SeqCst);
                trace!("Timer {} disarmed", self.shared.name);
                true
            }
            None => false,
        }
    }

    /// Disarm and release the timer.
    pub fn delete(self) {
        drop(self);
    }

    fn schedule(&self, period: Option<Duration>) -> Result<()> {
        let runtime = Handle::try_current().map_err(|_| TimerError::NoRuntime {
            timer: self.shared.name.clone(),
        })?;

        let mut slot = self.shared.slot();
        let period = period.unwrap_or(slot.period);
        if self.shared.mode == TimerMode::Periodic && period.is_zero() {
            return Err(TimerError::ZeroPeriod {
                timer: self.shared.name.clone(),
            });
        }
        slot.period = period;

        if let Some(previous) = slot.task.take() {
            previous.abort();
            self.shared.armed.fetch_sub(1, Ordering::SeqCst);
        }

        slot.generation = slot.generation.wrapping_add(1);
        let generation = slot.generation;
        slot.deadline = match self.shared.mode {
            TimerMode::OneShot => Some(Instant::now() + period),
            TimerMode::Periodic => None,
        };

        let shared = Arc::clone(&self.shared);
        slot.task = Some(runtime.spawn(run(shared, generation, period)));
        self.shared.armed.fetch_add(1, Ordering::SeqCst);

        debug!(
            "Timer {} armed ({:?}, {}ms)",
            self.shared.name,
            self.shared.mode,
            period.as_millis()
        );
        Ok(())
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.disarm();
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.shared.slot();
        f.debug_struct("Timer")
            .field("name", &self.shared.name)
            .field("mode", &self.shared.mode)
            .field("period", &slot.period)
            .field("armed", &slot.task.is_some())
            .finish()
    }
}

async fn run(shared: Arc<Shared>, generation: u64, period: Duration) {
    match shared.mode {
        TimerMode::OneShot => {
            tokio::time::sleep(period).await;
            if !shared.claim(generation) {
                return;
            }
            trace!("Timer {} fired", shared.name);
            (shared.callback)();
        }
        TimerMode::Periodic => {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !shared.is_current(generation) {
                    return;
                }
                trace!("Timer {} tick", shared.name);
                (shared.callback)();
            }
        }
    }
}
