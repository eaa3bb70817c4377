//! Runtime configuration for the door lock core.
//!
//! Every section derives `Default` from the values in
//! [`constants`](crate::constants), and every field is optional when the
//! configuration is loaded from JSON, so an empty object `{}` is a valid
//! configuration.
//!
//! # Examples
//!
//! ```
//! use doorlock_core::config::{DoorLockConfig, RelockPolicy};
//! use std::time::Duration;
//!
//! let config = DoorLockConfig::from_json_str(r#"{
//!     "lock": { "relock_duration_ms": 0, "relock_policy": "always" },
//!     "keypad": { "pin": "4321" }
//! }"#).unwrap();
//!
//! assert_eq!(config.lock.relock_duration(), Duration::ZERO);
//! assert_eq!(config.lock.relock_policy, RelockPolicy::Always);
//! assert_eq!(config.keypad.buffer_capacity, 6);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::{Error, Result};

/// When the controller arms the relock timer on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelockPolicy {
    /// Relock only while the door is not reported open.
    #[default]
    WhenClosed,

    /// Relock after every unlock regardless of the door position.
    Always,

    /// Never relock automatically.
    Disabled,
}

/// Electrical level of a digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalLevel {
    Low,
    High,
}

impl SignalLevel {
    #[must_use]
    pub fn inverted(self) -> Self {
        match self {
            SignalLevel::Low => SignalLevel::High,
            SignalLevel::High => SignalLevel::Low,
        }
    }
}

/// Shape of the lock-state payload handed to the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// One status byte: bolt state.
    Compact,

    /// Two bytes: bolt state, door position.
    #[default]
    Extended,
}

/// Lock controller settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    pub relock_duration_ms: u64,
    pub relock_policy: RelockPolicy,
    pub actuation_settle_ms: u64,
    pub command_queue_capacity: usize,
}

impl LockConfig {
    #[must_use]
    pub fn relock_duration(&self) -> Duration {
        Duration::from_millis(self.relock_duration_ms)
    }

    #[must_use]
    pub fn actuation_settle(&self) -> Duration {
        Duration::from_millis(self.actuation_settle_ms)
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            relock_duration_ms: DEFAULT_RELOCK_DURATION_MS,
            relock_policy: RelockPolicy::default(),
            actuation_settle_ms: DEFAULT_ACTUATION_SETTLE_MS,
            command_queue_capacity: DEFAULT_COMMAND_QUEUE_CAPACITY,
        }
    }
}

/// Door-position sensor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorSensorConfig {
    pub enabled: bool,

    /// Pin level that means "door closed".
    pub closed_level: SignalLevel,

    pub guard_interval_ms: u64,
    pub queue_capacity: usize,

    /// Re-sample the pin on this period even without edges.
    pub poll_interval_ms: Option<u64>,
}

impl DoorSensorConfig {
    #[must_use]
    pub fn guard_interval(&self) -> Duration {
        Duration::from_millis(self.guard_interval_ms)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_ms.map(Duration::from_millis)
    }
}

impl Default for DoorSensorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            closed_level: SignalLevel::High,
            guard_interval_ms: DEFAULT_GUARD_INTERVAL_MS,
            queue_capacity: DEFAULT_SENSOR_QUEUE_CAPACITY,
            poll_interval_ms: None,
        }
    }
}

/// Keypad matrix and decoder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeypadConfig {
    pub rows: u8,
    pub cols: u8,
    pub long_press_ms: u64,
    pub inactivity_timeout_ms: u64,
    pub buffer_capacity: usize,
    pub scan_interval_ms: u64,
    pub debounce_ticks: u8,

    /// Digits that must precede `#` for it to unlock. `None` accepts any
    /// buffer content.
    pub pin: Option<String>,
    pub max_pin_failures: u32,
    pub pin_lockout_ms: u64,
}

impl KeypadConfig {
    #[must_use]
    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    #[must_use]
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_millis(self.inactivity_timeout_ms)
    }

    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    #[must_use]
    pub fn pin_lockout(&self) -> Duration {
        Duration::from_millis(self.pin_lockout_ms)
    }
}

impl Default for KeypadConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_KEYPAD_ROWS,
            cols: DEFAULT_KEYPAD_COLS,
            long_press_ms: DEFAULT_LONG_PRESS_MS,
            inactivity_timeout_ms: DEFAULT_INACTIVITY_TIMEOUT_MS,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            scan_interval_ms: DEFAULT_SCAN_INTERVAL_MS,
            debounce_ticks: DEFAULT_DEBOUNCE_TICKS,
            pin: None,
            max_pin_failures: DEFAULT_MAX_PIN_FAILURES,
            pin_lockout_ms: DEFAULT_PIN_LOCKOUT_MS,
        }
    }
}

/// Transport-facing service settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub payload_format: PayloadFormat,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorLockConfig {
    pub lock: LockConfig,
    pub door_sensor: DoorSensorConfig,
    pub keypad: KeypadConfig,
    pub service: ServiceConfig,
}

impl DoorLockConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    /// Returns `Error::Json` on malformed input and `Error::Config` if the
    /// values fail [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check the values for consistency.
    ///
    /// # Errors
    /// Returns `Error::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.lock.command_queue_capacity == 0 {
            return Err(Error::config("lock.command_queue_capacity must be greater than zero"));
        }
        if self.door_sensor.queue_capacity == 0 {
            return Err(Error::config("door_sensor.queue_capacity must be greater than zero"));
        }
        if self.door_sensor.poll_interval_ms == Some(0) {
            return Err(Error::config("door_sensor.poll_interval_ms must be greater than zero"));
        }

        let keypad = &self.keypad;
        if keypad.rows == 0 || keypad.cols == 0 {
            return Err(Error::config(format!(
                "keypad matrix must have at least one row and column, got {}x{}",
                keypad.rows, keypad.cols
            )));
        }
        if keypad.buffer_capacity == 0 {
            return Err(Error::config("keypad.buffer_capacity must be greater than zero"));
        }
        if keypad.long_press_ms == 0 {
            return Err(Error::config("keypad.long_press_ms must be greater than zero"));
        }
        if keypad.scan_interval_ms == 0 {
            return Err(Error::config("keypad.scan_interval_ms must be greater than zero"));
        }
        if keypad.debounce_ticks == 0 {
            return Err(Error::config("keypad.debounce_ticks must be greater than zero"));
        }
        if let Some(pin) = &keypad.pin {
            if pin.is_empty() || !pin.chars().all(|c| c.is_ascii_digit()) {
                return Err(Error::InvalidPin("PIN must be one or more digits".to_string()));
            }
            if pin.len() > keypad.buffer_capacity {
                return Err(Error::InvalidPin(format!(
                    "PIN has {} digits but the buffer holds {}",
                    pin.len(),
                    keypad.buffer_capacity
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DoorLockConfig::default();
        config.validate().unwrap();

        assert_eq!(config.lock.relock_duration(), Duration::from_secs(5));
        assert_eq!(config.door_sensor.guard_interval(), Duration::from_millis(300));
        assert_eq!(config.door_sensor.queue_capacity, 10);
        assert_eq!(config.keypad.inactivity_timeout(), Duration::from_secs(3));
        assert_eq!(config.service.payload_format, PayloadFormat::Extended);
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = DoorLockConfig::from_json_str("{}").unwrap();
        assert_eq!(config, DoorLockConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = DoorLockConfig::from_json_str(
            r#"{ "door_sensor": { "closed_level": "low", "poll_interval_ms": 1000 } }"#,
        )
        .unwrap();

        assert_eq!(config.door_sensor.closed_level, SignalLevel::Low);
        assert_eq!(config.door_sensor.poll_interval(), Some(Duration::from_secs(1)));
        assert_eq!(config.door_sensor.guard_interval_ms, DEFAULT_GUARD_INTERVAL_MS);
    }

    #[test]
    fn test_zero_relock_duration_is_valid() {
        let config =
            DoorLockConfig::from_json_str(r#"{ "lock": { "relock_duration_ms": 0 } }"#).unwrap();
        assert!(config.lock.relock_duration().is_zero());
    }

    #[test]
    fn test_rejects_zero_buffer_capacity() {
        let result = DoorLockConfig::from_json_str(r#"{ "keypad": { "buffer_capacity": 0 } }"#);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_zero_poll_interval() {
        let result =
            DoorLockConfig::from_json_str(r#"{ "door_sensor": { "poll_interval_ms": 0 } }"#);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_non_digit_pin() {
        let result = DoorLockConfig::from_json_str(r#"{ "keypad": { "pin": "12a4" } }"#);
        assert!(matches!(result, Err(Error::InvalidPin(_))));
    }

    #[test]
    fn test_rejects_pin_longer_than_buffer() {
        let result = DoorLockConfig::from_json_str(
            r#"{ "keypad": { "pin": "1234567", "buffer_capacity": 6 } }"#,
        );
        assert!(matches!(result, Err(Error::InvalidPin(_))));
    }

    #[test]
    fn test_malformed_json() {
        let result = DoorLockConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_signal_level_inverted() {
        assert_eq!(SignalLevel::High.inverted(), SignalLevel::Low);
        assert_eq!(SignalLevel::Low.inverted(), SignalLevel::High);
    }
}
