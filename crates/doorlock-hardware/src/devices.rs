//! Lock-level wrappers over raw pins.
//!
//! [`Bolt`] translates a [`LockState`] into an output level and
//! [`DoorSensor`] translates an input level into a [`DoorPosition`]. Both
//! own the polarity of their line so nothing above this crate deals with
//! electrical levels.
//!
//! # Examples
//!
//! ```
//! use doorlock_core::{LockState, SignalLevel};
//! use doorlock_hardware::devices::Bolt;
//! use doorlock_hardware::mock::MockOutputPin;
//! use doorlock_hardware::types::PinId;
//!
//! let (pin, handle) = MockOutputPin::new(PinId(0));
//! let mut bolt = Bolt::new(pin);
//!
//! bolt.drive(LockState::Unlocked).unwrap();
//! assert_eq!(handle.level(), Some(SignalLevel::High));
//! ```

use std::fmt;
use std::sync::Arc;

use doorlock_core::{DoorPosition, LockState, SignalLevel};
use tracing::trace;

use crate::error::Result;
use crate::traits::{EdgeHandler, InputPin, OutputPin};
use crate::types::PinId;

/// Bolt actuator driven by a single digital output.
pub struct Bolt {
    pin: Box<dyn OutputPin>,
    unlocked_level: SignalLevel,
}

impl Bolt {
    /// Bolt that retracts when the line is driven high.
    pub fn new(pin: impl OutputPin + 'static) -> Self {
        Self::with_unlocked_level(pin, SignalLevel::High)
    }

    /// Bolt that retracts at `unlocked_level`.
    pub fn with_unlocked_level(pin: impl OutputPin + 'static, unlocked_level: SignalLevel) -> Self {
        Self {
            pin: Box::new(pin),
            unlocked_level,
        }
    }

    #[must_use]
    pub fn pin(&self) -> PinId {
        self.pin.pin()
    }

    /// Output level corresponding to `state`.
    #[must_use]
    pub fn level_for(&self, state: LockState) -> SignalLevel {
        match state {
            LockState::Unlocked => self.unlocked_level,
            LockState::Locked => self.unlocked_level.inverted(),
        }
    }

    /// Drive the bolt to `state`.
    ///
    /// # Errors
    ///
    /// Returns the pin's write error.
    pub fn drive(&mut self, state: LockState) -> Result<()> {
        let level = self.level_for(state);
        trace!("Driving bolt on {} to {:?} ({})", self.pin(), level, state);
        self.pin.set_level(level)
    }
}

impl fmt::Debug for Bolt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bolt")
            .field("pin", &self.pin())
            .field("unlocked_level", &self.unlocked_level)
            .finish()
    }
}

/// Door-position sensor on a single digital input.
#[derive(Clone)]
pub struct DoorSensor {
    pin: Arc<dyn InputPin>,
    closed_level: SignalLevel,
}

impl DoorSensor {
    pub fn new(pin: Arc<dyn InputPin>, closed_level: SignalLevel) -> Self {
        Self { pin, closed_level }
    }

    #[must_use]
    pub fn pin(&self) -> PinId {
        self.pin.pin()
    }

    /// Map a level to a position.
    #[must_use]
    pub fn position_for(&self, level: SignalLevel) -> DoorPosition {
        if level == self.closed_level {
            DoorPosition::Closed
        } else {
            DoorPosition::Open
        }
    }

    /// Sample the line and map it to a position.
    ///
    /// # Errors
    ///
    /// Returns the pin's read error.
    pub fn read(&self) -> Result<DoorPosition> {
        self.pin.level().map(|level| self.position_for(level))
    }

    /// Install the edge interrupt handler.
    ///
    /// # Errors
    ///
    /// Returns an error if the line does not support interrupts.
    pub fn on_edge(&self, handler: EdgeHandler) -> Result<()> {
        self.pin.on_edge(handler)
    }
}

impl fmt::Debug for DoorSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoorSensor")
            .field("pin", &self.pin())
            .field("closed_level", &self.closed_level)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockInputPin, MockOutputPin};

    #[test]
    fn test_bolt_default_polarity() {
        let (pin, handle) = MockOutputPin::new(PinId(0));
        let mut bolt = Bolt::new(pin);

        bolt.drive(LockState::Unlocked).unwrap();
        bolt.drive(LockState::Locked).unwrap();

        assert_eq!(handle.writes(), vec![SignalLevel::High, SignalLevel::Low]);
    }

    #[test]
    fn test_bolt_inverted_polarity() {
        let (pin, handle) = MockOutputPin::new(PinId(0));
        let mut bolt = Bolt::with_unlocked_level(pin, SignalLevel::Low);

        bolt.drive(LockState::Unlocked).unwrap();
        assert_eq!(handle.level(), Some(SignalLevel::Low));
    }

    #[test]
    fn test_bolt_propagates_write_failure() {
        let (pin, handle) = MockOutputPin::new(PinId(0));
        let mut bolt = Bolt::new(pin);
        handle.fail_writes(true);

        assert!(bolt.drive(LockState::Unlocked).is_err());
        assert_eq!(handle.write_count(), 0);
    }

    #[test]
    fn test_door_sensor_mapping() {
        let (pin, handle) = MockInputPin::new(PinId(1), SignalLevel::High);
        let sensor = DoorSensor::new(Arc::new(pin), SignalLevel::High);

        assert_eq!(sensor.read().unwrap(), DoorPosition::Closed);

        handle.set_level(SignalLevel::Low);
        assert_eq!(sensor.read().unwrap(), DoorPosition::Open);
    }

    #[test]
    fn test_door_sensor_active_low() {
        let (pin, _handle) = MockInputPin::new(PinId(1), SignalLevel::Low);
        let sensor = DoorSensor::new(Arc::new(pin), SignalLevel::Low);

        assert_eq!(sensor.read().unwrap(), DoorPosition::Closed);
        assert_eq!(sensor.position_for(SignalLevel::High), DoorPosition::Open);
    }
}
