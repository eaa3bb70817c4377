//! Lock service exposed to the wireless transport.
//!
//! The service has two characteristics:
//!
//! - **lock state** (read, notify): the encoded [`DoorStatus`].
//! - **lock command** (write): any write means "unlock"; the payload is
//!   ignored.
//!
//! The service is the controller's observer. On every state change it encodes
//! the status once and hands it to the [`Notifier`] for each connection that
//! has subscribed. Connection events only gate delivery; they never change
//! lock state.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use doorlock_controller::{CommandSender, DoorLockController, LockCommand, LockObserver};
use doorlock_core::{DoorStatus, PayloadFormat, ServiceConfig};
use tracing::{debug, info, trace, warn};

use crate::payload::{LockStatePayload, hex};

/// Transport connection handle.
pub type ConnectionId = u16;

/// Delivers notifications to a connected peer.
///
/// Called from the context that changed the lock state; implementations
/// must queue the payload and return without blocking.
pub trait Notifier: Send + Sync {
    fn notify(&self, connection: ConnectionId, payload: Bytes);
}

impl<F> Notifier for F
where
    F: Fn(ConnectionId, Bytes) + Send + Sync,
{
    fn notify(&self, connection: ConnectionId, payload: Bytes) {
        self(connection, payload);
    }
}

/// Lock-state and lock-command characteristics.
pub struct LockService {
    controller: DoorLockController,
    commands: CommandSender,
    format: PayloadFormat,
    notifier: Arc<dyn Notifier>,
    /// Connected peers and whether each has enabled notifications.
    connections: Mutex<BTreeMap<ConnectionId, bool>>,
}

impl LockService {
    /// Create the service and register it as the controller's observer.
    ///
    /// The controller's observer slot holds the returned `Arc` and the
    /// service holds the controller, so neither is freed until
    /// [`detach`](Self::detach) clears the slot.
    pub fn register(
        controller: DoorLockController,
        commands: CommandSender,
        config: &ServiceConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Arc<Self> {
        let service = Arc::new(Self {
            controller: controller.clone(),
            commands,
            format: config.payload_format,
            notifier,
            connections: Mutex::new(BTreeMap::new()),
        });
        controller.register_observer(service.clone());
        info!("Lock service registered ({:?} payload)", service.format);
        service
    }

    /// Unregister from the controller, releasing its reference to the
    /// service.
    pub fn detach(&self) {
        self.controller.clear_observer();
    }

    fn connections(&self) -> MutexGuard<'_, BTreeMap<ConnectionId, bool>> {
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock-state read handler.
    pub fn read_lock_state(&self) -> Bytes {
        let status = self.controller.get_state();
        trace!("Lock state read ({})", status);
        LockStatePayload::encode(&status, self.format)
    }

    /// Lock-command write handler. Every write requests an unlock.
    pub fn write_lock_command(&self, connection: ConnectionId, payload: &[u8]) {
        debug!(
            "Lock command write from connection {} ({}), payload ignored",
            connection,
            hex(payload)
        );
        match self.commands.submit(LockCommand::Unlock) {
            Ok(()) => info!("Unlock requested by connection {}", connection),
            Err(e) => warn!("Unlock from connection {} dropped: {}", connection, e),
        }
    }

    pub fn on_connect(&self, connection: ConnectionId) {
        self.connections().insert(connection, false);
        info!("Connection {} established", connection);
    }

    pub fn on_disconnect(&self, connection: ConnectionId) {
        self.connections().remove(&connection);
        info!("Connection {} closed", connection);
    }

    /// Notification enable/disable on the lock-state characteristic.
    pub fn on_subscribe(&self, connection: ConnectionId, enabled: bool) {
        self.connections().insert(connection, enabled);
        debug!(
            "Connection {} {} lock state notifications",
            connection,
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// Connections with notifications enabled.
    pub fn subscribers(&self) -> Vec<ConnectionId> {
        self.connections()
            .iter()
            .filter_map(|(&connection, &subscribed)| subscribed.then_some(connection))
            .collect()
    }
}

impl LockObserver for LockService {
    fn on_state_change(&self, status: DoorStatus) {
        let subscribers = self.subscribers();
        if subscribers.is_empty() {
            trace!("No subscribers for {}", status);
            return;
        }

        let payload = LockStatePayload::encode(&status, self.format);
        for connection in subscribers {
            self.notifier.notify(connection, payload.clone());
        }
    }

    fn on_relock_complete(&self, status: DoorStatus) {
        debug!("Relock complete ({})", status);
    }
}

impl std::fmt::Debug for LockService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockService")
            .field("format", &self.format)
            .field("connections", &*self.connections())
            .finish()
    }
}

