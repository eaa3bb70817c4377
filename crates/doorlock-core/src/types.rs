use crate::{
    Result,
    constants::{WIRE_DOOR_CLOSED, WIRE_DOOR_OPEN, WIRE_LOCKED, WIRE_UNLOCKED},
    error::Error,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Commanded bolt position.
///
/// Mirrors the last actuator command issued, not a measured quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LockState {
    #[default]
    Locked = WIRE_LOCKED,
    Unlocked = WIRE_UNLOCKED,
}

impl LockState {
    /// Create a lock state from its wire code.
    ///
    /// # Errors
    /// Returns `Error::InvalidLockState` if the value is not 0 or 1.
    #[inline]
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            WIRE_LOCKED => Ok(LockState::Locked),
            WIRE_UNLOCKED => Ok(LockState::Unlocked),
            _ => Err(Error::InvalidLockState { code: value }),
        }
    }

    /// Convert the lock state to its wire code.
    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Returns `true` if the bolt is locked.
    #[inline]
    #[must_use]
    pub fn is_locked(self) -> bool {
        matches!(self, LockState::Locked)
    }

    /// Returns `true` if the bolt is unlocked.
    #[inline]
    #[must_use]
    pub fn is_unlocked(self) -> bool {
        matches!(self, LockState::Unlocked)
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LockState::Locked => write!(f, "Locked"),
            LockState::Unlocked => write!(f, "Unlocked"),
        }
    }
}

/// Physical door position reported by the door-position sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DoorPosition {
    Open = WIRE_DOOR_OPEN,
    Closed = WIRE_DOOR_CLOSED,
}

impl DoorPosition {
    /// Create a door position from its wire code.
    ///
    /// # Errors
    /// Returns `Error::InvalidDoorPosition` if the value is not 0 or 1.
    #[inline]
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            WIRE_DOOR_OPEN => Ok(DoorPosition::Open),
            WIRE_DOOR_CLOSED => Ok(DoorPosition::Closed),
            _ => Err(Error::InvalidDoorPosition { code: value }),
        }
    }

    /// Convert the door position to its wire code.
    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, DoorPosition::Open)
    }

    #[inline]
    #[must_use]
    pub fn is_closed(self) -> bool {
        matches!(self, DoorPosition::Closed)
    }
}

impl fmt::Display for DoorPosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DoorPosition::Open => write!(f, "Open"),
            DoorPosition::Closed => write!(f, "Closed"),
        }
    }
}

/// A door position together with the time it last changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorReading {
    pub position: DoorPosition,
    pub last_changed: DateTime<Utc>,
}

impl DoorReading {
    /// Create a reading stamped with the current time.
    #[must_use]
    pub fn now(position: DoorPosition) -> Self {
        Self {
            position,
            last_changed: Utc::now(),
        }
    }

    /// Apply a new position, refreshing `last_changed` only when it differs.
    ///
    /// Returns `true` if the position changed.
    pub fn apply(&mut self, position: DoorPosition) -> bool {
        if self.position == position {
            return false;
        }
        self.position = position;
        self.last_changed = Utc::now();
        true
    }
}

/// Snapshot of everything the controller knows about the door.
///
/// This is the value handed to observers and to the transport read path.
/// `door` is `None` when no position sensor is fitted or it has not reported
/// yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DoorStatus {
    pub lock: LockState,
    pub door: Option<DoorReading>,
}

impl DoorStatus {
    #[must_use]
    pub fn new(lock: LockState, door: Option<DoorReading>) -> Self {
        Self { lock, door }
    }

    /// Door position, if a reading exists.
    #[inline]
    #[must_use]
    pub fn door_position(&self) -> Option<DoorPosition> {
        self.door.map(|reading| reading.position)
    }

    /// Returns `true` if the sensor positively reports the door open.
    #[inline]
    #[must_use]
    pub fn door_is_open(&self) -> bool {
        self.door_position().is_some_and(DoorPosition::is_open)
    }
}

impl fmt::Display for DoorStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.door_position() {
            Some(position) => write!(f, "bolt={}, door={}", self.lock, position),
            None => write!(f, "bolt={}, door=unknown", self.lock),
        }
    }
}
