//! Lock command queue and worker.
//!
//! Unlock and lock requests from the wireless transport and the keypad are
//! queued here and applied to the controller one at a time, in arrival
//! order. Producers never touch the bolt directly.
//!
//! ```text
//! ┌───────────┐
//! │ Transport │──┐    ┌──────────────────┐    ┌────────────┐    ┌────────────┐
//! └───────────┘  ├───►│  Command Queue   │───►│   Worker   │───►│ Controller │
//! ┌───────────┐  │    │  (bounded mpsc)  │    │ (one task) │    └────────────┘
//! │  Keypad   │──┘    └──────────────────┘    └────────────┘
//! └───────────┘
//! ```
//!
//! # Examples
//!
//! ```
//! use doorlock_controller::{DoorLockController, LockCommand, spawn_command_worker};
//! use doorlock_core::{LockConfig, LockState, RelockPolicy};
//! use doorlock_hardware::{Bolt, PinId, mock::MockOutputPin};
//! use doorlock_timer::TimerService;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> doorlock_controller::Result<()> {
//!     let (pin, _handle) = MockOutputPin::new(PinId(0));
//!     let config = LockConfig {
//!         relock_policy: RelockPolicy::Disabled,
//!         ..LockConfig::default()
//!     };
//!     let controller = DoorLockController::new(Bolt::new(pin), config, &TimerService::new());
//!
//!     let (commands, worker) = spawn_command_worker(controller.clone());
//!     commands.send(LockCommand::Unlock).await?;
//!
//!     drop(commands);
//!     worker.await.unwrap();
//!     assert_eq!(controller.get_state().lock, LockState::Unlocked);
//!     Ok(())
//! }
//! ```

use std::fmt;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::controller::DoorLockController;
use crate::error::{ControllerError, Result};

/// A request to move the bolt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockCommand {
    Unlock,
    Lock,
}

impl fmt::Display for LockCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockCommand::Unlock => write!(f, "unlock"),
            LockCommand::Lock => write!(f, "lock"),
        }
    }
}

/// Producer side of the command queue. Cloneable.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::Sender<LockCommand>,
}

impl CommandSender {
    /// Enqueue without waiting.
    ///
    /// Safe to call from synchronous callbacks such as a GATT write handler
    /// or a timer callback.
    ///
    /// # Errors
    ///
    /// `QueueFull` if the queue is at capacity, `WorkerStopped` if the worker
    /// has exited.
    pub fn submit(&self, command: LockCommand) -> Result<()> {
        self.tx.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(command) => ControllerError::QueueFull { command },
            mpsc::error::TrySendError::Closed(_) => ControllerError::WorkerStopped,
        })
    }

    /// Enqueue, waiting for room.
    ///
    /// # Errors
    ///
    /// `WorkerStopped` if the worker has exited.
    pub async fn send(&self, command: LockCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| ControllerError::WorkerStopped)
    }

    /// Returns `true` once the worker has exited.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Spawn the command worker with the capacity and settle time from the
/// controller's configuration.
///
/// The worker runs until every [`CommandSender`] is dropped and the queue is
/// drained.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub fn spawn_command_worker(controller: DoorLockController) -> (CommandSender, JoinHandle<()>) {
    let capacity = controller.config().command_queue_capacity.max(1);
    let (tx, rx) = mpsc::channel(capacity);
    let task = tokio::spawn(run(controller, rx));
    (CommandSender { tx }, task)
}

async fn run(controller: DoorLockController, mut rx: mpsc::Receiver<LockCommand>) {
    let settle = controller.config().actuation_settle();
    info!("Command worker started");

    while let Some(command) = rx.recv().await {
        debug!("Applying {} command", command);
        match command {
            LockCommand::Unlock => controller.unlock(),
            LockCommand::Lock => controller.lock(),
        }

        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }
    }

    warn!("Command worker stopped: all senders dropped");
}
