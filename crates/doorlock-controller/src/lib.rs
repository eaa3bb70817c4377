//! Door lock controller and its background workers.
//!
//! This crate owns the lock state. It contains the controller itself, the
//! command worker that serializes bolt actuations, and the door-position
//! pipeline that debounces the sensor line.

pub mod command;
pub mod controller;
pub mod error;
pub mod observer;
pub mod position;

pub use command::{CommandSender, LockCommand, spawn_command_worker};
pub use controller::{DoorLockController, DoorLockControllerBuilder};
pub use error::{ControllerError, Result};
pub use observer::LockObserver;
pub use position::{PositionHandle, PositionInterrupt, PositionWorker, SensorEvent};
