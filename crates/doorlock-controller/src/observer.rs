//! State-change observer interface.
//!
//! The transport layer registers exactly one observer with the controller.
//! Registering again replaces the previous observer; the transport is a
//! process-wide singleton, so a single slot is all it needs.
//!
//! Observers are called synchronously from whichever context produced the
//! change: a command worker, the sensor worker or the relock timer. They
//! must hand the status off (encode, enqueue) and return without blocking.

use doorlock_core::DoorStatus;

/// Receiver of lock status changes.
///
/// Closures `Fn(DoorStatus)` implement this trait, receiving state changes
/// only.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use doorlock_controller::LockObserver;
/// use doorlock_core::DoorStatus;
///
/// let observer: Arc<dyn LockObserver> = Arc::new(|status: DoorStatus| {
///     println!("{status}");
/// });
/// observer.on_state_change(DoorStatus::default());
/// ```
pub trait LockObserver: Send + Sync {
    /// Called after every bolt or door-position change.
    fn on_state_change(&self, status: DoorStatus);

    /// Called after an automatic relock has locked the bolt, following the
    /// `on_state_change` for the same transition.
    fn on_relock_complete(&self, status: DoorStatus) {
        let _ = status;
    }
}

impl<F> LockObserver for F
where
    F: Fn(DoorStatus) + Send + Sync,
{
    fn on_state_change(&self, status: DoorStatus) {
        self(status);
    }
}
