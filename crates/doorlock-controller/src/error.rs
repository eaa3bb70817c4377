//! Error types for the lock controller and its workers.

use doorlock_hardware::HardwareError;
use doorlock_timer::TimerError;

use crate::command::LockCommand;

/// Result type alias for controller operations.
pub type Result<T> = std::result::Result<T, ControllerError>;

/// Errors surfaced by the controller crate.
///
/// None of these reach the wireless layer; callers log them and fall back
/// to the locked state where a fallback exists.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// The command queue is full; the command was not accepted.
    #[error("Command queue full, dropped {command:?}")]
    QueueFull { command: LockCommand },

    /// The command worker has stopped.
    #[error("Command worker stopped")]
    WorkerStopped,

    /// A timer could not be armed.
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// A hardware line failed.
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),
}
