//! Door lock controller.
//!
//! The controller is the single owner of the bolt actuator and of the
//! authoritative [`DoorStatus`]. Commands (from the transport or keypad,
//! via the command worker), sensor readings (from the position worker) and
//! relock expiries (from the timer service) all converge here.
//!
//! # States
//!
//! ```text
//!            unlock()                      relock timer expires
//!  Locked ─────────────► Unlocked ─────────────────────────────► Locked
//!    ▲                    │   │                                      │
//!    └──── lock() ────────┘   └─ door opens: relock suspended ◄──────┘
//!                                door closes: relock re-armed
//! ```
//!
//! # Concurrency
//!
//! Bolt writes and state updates happen under one mutex, so actuations never
//! interleave. Observers are called after that mutex is released, which lets
//! an observer call back into the controller.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use doorlock_controller::DoorLockController;
//! use doorlock_core::{LockConfig, LockState};
//! use doorlock_hardware::{Bolt, PinId, mock::MockOutputPin};
//! use doorlock_timer::TimerService;
//!
//! #[tokio::main(flavor = "current_thread", start_paused = true)]
//! async fn main() {
//!     let (pin, _handle) = MockOutputPin::new(PinId(0));
//!     let timers = TimerService::new();
//!     let controller = DoorLockController::new(Bolt::new(pin), LockConfig::default(), &timers);
//!
//!     controller.unlock();
//!     assert_eq!(controller.get_state().lock, LockState::Unlocked);
//!
//!     // No door sensor reading yet: the default policy relocks on schedule.
//!     tokio::time::sleep(Duration::from_secs(6)).await;
//!     assert_eq!(controller.get_state().lock, LockState::Locked);
//! }
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::Duration;

use doorlock_core::constants::RELOCK_TIMER_NAME;
use doorlock_core::{DoorPosition, DoorReading, DoorStatus, LockConfig, LockState, RelockPolicy};
use doorlock_hardware::Bolt;
use doorlock_timer::{Timer, TimerService};
use tracing::{debug, error, info, trace, warn};

use crate::observer::LockObserver;

/// What to run after a relock has locked the bolt.
enum Completion {
    /// Automatic relock: tell the registered observer.
    Observer,

    /// Explicit relock: run the caller's callback.
    Callback(Box<dyn FnOnce(DoorStatus) + Send>),
}

struct PendingRelock {
    completion: Completion,

    /// Skip the lock if the door reads open when the timer fires.
    gated: bool,
}

impl PendingRelock {
    fn is_automatic(&self) -> bool {
        matches!(self.completion, Completion::Observer)
    }
}

struct State {
    bolt: Bolt,
    lock: LockState,
    door: Option<DoorReading>,
}

impl State {
    fn status(&self) -> DoorStatus {
        DoorStatus::new(self.lock, self.door)
    }
}

struct Inner {
    state: Mutex<State>,
    observer: RwLock<Option<Arc<dyn LockObserver>>>,
    pending_relock: Mutex<Option<PendingRelock>>,
    relock_timer: Timer,
    config: LockConfig,
}

/// Handle to the door lock controller.
///
/// Cheap to clone; all clones share one controller.
#[derive(Clone)]
pub struct DoorLockController {
    inner: Arc<Inner>,
}

impl DoorLockController {
    /// Create a controller with the bolt locked.
    pub fn new(bolt: Bolt, config: LockConfig, timers: &TimerService) -> Self {
        Self::builder(bolt)
            .with_config(config)
            .with_timers(timers.clone())
            .build()
    }

    /// Create a builder for a controller with custom configuration.
    pub fn builder(bolt: Bolt) -> DoorLockControllerBuilder {
        DoorLockControllerBuilder {
            bolt,
            config: LockConfig::default(),
            timers: TimerService::new(),
            initial_state: LockState::Locked,
        }
    }

    /// Retract the bolt.
    ///
    /// Idempotent: an unlocked bolt is driven again and observers are still
    /// notified. Arms the relock timer according to the relock policy.
    pub fn unlock(&self) {
        let status = self.inner.actuate(LockState::Unlocked);
        info!("Bolt unlocked ({})", status);
        self.inner.notify(status);
        self.inner.auto_relock(status);
    }

    /// Extend the bolt, cancelling any pending relock. Idempotent.
    pub fn lock(&self) {
        if self.inner.cancel_relock() {
            debug!("Pending relock cancelled by explicit lock");
        }
        let status = self.inner.actuate(LockState::Locked);
        info!("Bolt locked ({})", status);
        self.inner.notify(status);
    }

    /// Lock after `duration`, then call `on_complete` with the new status.
    ///
    /// Re-arming replaces the pending relock: the previous schedule is
    /// cancelled and its callback dropped without running. Automatic relocks
    /// triggered by unlocks or door readings never replace it. A zero duration
    /// locks immediately. If the timer cannot be armed the bolt is locked
    /// immediately instead of being left open.
    pub fn begin_relock_timer(
        &self,
        duration: Duration,
        on_complete: impl FnOnce(DoorStatus) + Send + 'static,
    ) {
        self.inner.arm_relock(
            duration,
            PendingRelock {
                completion: Completion::Callback(Box::new(on_complete)),
                gated: false,
            },
        );
    }

    /// Current status, without side effects.
    pub fn get_state(&self) -> DoorStatus {
        self.inner.state().status()
    }

    /// Install the observer, replacing any previous one.
    pub fn register_observer(&self, observer: Arc<dyn LockObserver>) {
        let mut slot = self.inner.observer.write().unwrap_or_else(PoisonError::into_inner);
        if slot.replace(observer).is_some() {
            debug!("Lock observer replaced");
        }
    }

    /// Remove the observer.
    pub fn clear_observer(&self) {
        self.inner
            .observer
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Record a settled door-position reading.
    ///
    /// Observers are notified only when the position changes. Under
    /// [`RelockPolicy::WhenClosed`] an unlocked door that opens suspends the
    /// automatic relock, and one that closes re-arms it.
    pub fn update_door_position(&self, position: DoorPosition) {
        let (status, changed) = {
            let mut guard = self.inner.state();
            let state = &mut *guard;
            let changed = match state.door {
                Some(ref mut reading) => reading.apply(position),
                None => {
                    state.door = Some(DoorReading::now(position));
                    true
                }
            };
            (state.status(), changed)
        };

        if !changed {
            trace!("Door position unchanged ({})", position);
            return;
        }

        info!("Door {} ({})", position, status);
        self.inner.notify(status);

        if status.lock.is_unlocked() && self.inner.config.relock_policy == RelockPolicy::WhenClosed
        {
            match position {
                DoorPosition::Open => self.inner.suspend_gated_relock(),
                DoorPosition::Closed => self.inner.auto_relock(status),
            }
        }
    }

    /// Returns `true` while a relock is scheduled.
    pub fn relock_pending(&self) -> bool {
        self.inner.relock_timer.is_armed()
    }

    pub fn config(&self) -> &LockConfig {
        &self.inner.config
    }
}

impl fmt::Debug for DoorLockController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoorLockController")
            .field("status", &self.get_state())
            .field("relock_timer", &self.inner.relock_timer)
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pending(&self) -> MutexGuard<'_, Option<PendingRelock>> {
        self.pending_relock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn actuate(&self, target: LockState) -> DoorStatus {
        let mut state = self.state();
        // No feedback line: the commanded state is recorded even if the
        // write fails, and the door sensor is the cross-check.
        if let Err(e) = state.bolt.drive(target) {
            error!("Failed to drive bolt to {}: {}", target, e);
        }
        state.lock = target;
        state.status()
    }

    fn observer(&self) -> Option<Arc<dyn LockObserver>> {
        self.observer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn notify(&self, status: DoorStatus) {
        if let Some(observer) = self.observer() {
            observer.on_state_change(status);
        }
    }

    fn cancel_relock(&self) -> bool {
        let mut pending = self.pending();
        pending.take();
        self.relock_timer.disarm()
    }

    fn suspend_gated_relock(&self) {
        let mut pending = self.pending();
        if pending.as_ref().is_some_and(|p| p.gated) {
            pending.take();
            self.relock_timer.disarm();
            debug!("Door opened, auto-relock suspended");
        }
    }

    fn auto_relock(&self, status: DoorStatus) {
        let gated = match self.config.relock_policy {
            RelockPolicy::Disabled => return,
            RelockPolicy::Always => false,
            RelockPolicy::WhenClosed => {
                if status.door_is_open() {
                    debug!("Door open, auto-relock deferred until it closes");
                    return;
                }
                true
            }
        };

        self.arm_relock(
            self.config.relock_duration(),
            PendingRelock {
                completion: Completion::Observer,
                gated,
            },
        );
    }

    fn arm_relock(&self, duration: Duration, relock: PendingRelock) {
        let mut pending = self.pending();
        // A caller's relock keeps its own duration and callback; only the
        // caller replaces it.
        if relock.is_automatic() && pending.as_ref().is_some_and(|p| !p.is_automatic()) {
            debug!("Explicit relock pending, automatic relock not armed");
            return;
        }

        if duration.is_zero() {
            pending.take();
            self.relock_timer.disarm();
            drop(pending);
            debug!("Relock duration is zero, locking immediately");
            self.complete_relock(relock);
            return;
        }

        *pending = Some(relock);
        match self.relock_timer.arm_with(duration) {
            Ok(()) => info!("Relock timer armed for {}ms", duration.as_millis()),
            Err(e) => {
                warn!("Failed to arm relock timer, locking immediately: {}", e);
                let relock = pending.take();
                drop(pending);
                if let Some(relock) = relock {
                    self.complete_relock(relock);
                }
            }
        }
    }

    fn relock_fired(&self) {
        let relock = {
            let mut pending = self.pending();
            // Re-armed after this firing was claimed: the newer schedule
            // owns the pending relock.
            if self.relock_timer.is_armed() {
                return;
            }
            pending.take()
        };

        match relock {
            Some(relock) => {
                info!("Relock timer expired");
                self.complete_relock(relock);
            }
            None => trace!("Relock timer expired with nothing pending"),
        }
    }

    fn complete_relock(&self, relock: PendingRelock) {
        if relock.gated && self.state().status().door_is_open() {
            info!("Relock skipped, door is open");
            return;
        }

        let status = self.actuate(LockState::Locked);
        info!("Bolt relocked ({})", status);
        self.notify(status);

        match relock.completion {
            Completion::Observer => {
                if let Some(observer) = self.observer() {
                    observer.on_relock_complete(status);
                }
            }
            Completion::Callback(callback) => callback(status),
        }
    }
}

/// Builder for [`DoorLockController`].
///
/// # Examples
///
/// ```
/// use doorlock_controller::DoorLockController;
/// use doorlock_core::{LockConfig, LockState, RelockPolicy};
/// use doorlock_hardware::{Bolt, PinId, mock::MockOutputPin};
///
/// let (pin, _handle) = MockOutputPin::new(PinId(0));
/// let controller = DoorLockController::builder(Bolt::new(pin))
///     .with_config(LockConfig {
///         relock_policy: RelockPolicy::Disabled,
///         ..LockConfig::default()
///     })
///     .with_initial_state(LockState::Unlocked)
///     .build();
///
/// assert_eq!(controller.get_state().lock, LockState::Unlocked);
/// ```
pub struct DoorLockControllerBuilder {
    bolt: Bolt,
    config: LockConfig,
    timers: TimerService,
    initial_state: LockState,
}

impl DoorLockControllerBuilder {
    pub fn with_config(mut self, config: LockConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a timer service with other components.
    pub fn with_timers(mut self, timers: TimerService) -> Self {
        self.timers = timers;
        self
    }

    /// State the bolt is driven to on construction. Defaults to locked.
    pub fn with_initial_state(mut self, state: LockState) -> Self {
        self.initial_state = state;
        self
    }

    pub fn build(self) -> DoorLockController {
        let Self {
            mut bolt,
            config,
            timers,
            initial_state,
        } = self;

        if let Err(e) = bolt.drive(initial_state) {
            error!("Failed to drive bolt to initial state {}: {}", initial_state, e);
        }

        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let weak = weak.clone();
            let relock_timer =
                timers.one_shot(RELOCK_TIMER_NAME, config.relock_duration(), move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.relock_fired();
                    }
                });

            Inner {
                state: Mutex::new(State {
                    bolt,
                    lock: initial_state,
                    door: None,
                }),
                observer: RwLock::new(None),
                pending_relock: Mutex::new(None),
                relock_timer,
                config,
            }
        });

        info!("Door lock controller ready ({})", initial_state);
        DoorLockController { inner }
    }
}
