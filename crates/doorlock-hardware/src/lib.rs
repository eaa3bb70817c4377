//! Hardware abstraction layer for the door lock core.
//!
//! This crate is the only code that touches raw lines. It provides
//! trait-based abstractions for the three physical interfaces of the lock,
//! lock-level wrappers that own line polarity, and mock implementations for
//! development and testing without physical hardware.
//!
//! # Physical Interfaces
//!
//! - [`OutputPin`]: the digital output driving the bolt actuator.
//! - [`InputPin`]: the digital input of the door-position sensor, with an
//!   any-edge interrupt.
//! - [`MatrixScanner`]: an N x M key matrix.
//!
//! ```
//! use std::sync::Arc;
//! use doorlock_core::{DoorPosition, LockState, SignalLevel};
//! use doorlock_hardware::devices::{Bolt, DoorSensor};
//! use doorlock_hardware::mock::{MockInputPin, MockOutputPin};
//! use doorlock_hardware::types::PinId;
//!
//! let (bolt_pin, bolt_handle) = MockOutputPin::new(PinId(0));
//! let (dpi_pin, dpi_handle) = MockInputPin::new(PinId(1), SignalLevel::High);
//!
//! let mut bolt = Bolt::new(bolt_pin);
//! let sensor = DoorSensor::new(Arc::new(dpi_pin), SignalLevel::High);
//!
//! bolt.drive(LockState::Locked).unwrap();
//! assert_eq!(bolt_handle.level(), Some(SignalLevel::Low));
//! assert_eq!(sensor.read().unwrap(), DoorPosition::Closed);
//!
//! dpi_handle.set_level(SignalLevel::Low);
//! assert_eq!(sensor.read().unwrap(), DoorPosition::Open);
//! ```
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] which uses the
//! [`HardwareError`] error type.
//!
//! # Thread Safety
//!
//! Output lines require `Send`, input lines `Send + Sync` since the edge
//! handler and the sensor worker read them from different contexts.
//!
//! [`OutputPin`]: traits::OutputPin
//! [`InputPin`]: traits::InputPin
//! [`MatrixScanner`]: traits::MatrixScanner

pub mod devices;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::{Bolt, DoorSensor};
pub use error::{HardwareError, Result};
pub use traits::{EdgeHandler, InputPin, MatrixScanner, OutputPin};
pub use types::{Key, KeyCoord, Keymap, MatrixSize, PinId, ScanReport};
