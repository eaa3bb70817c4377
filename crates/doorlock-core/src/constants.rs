//! Core constants for the door lock control core.
//!
//! This module centralizes the default timings, capacities and wire codes
//! used across the workspace. The configuration layer
//! ([`DoorLockConfig`](crate::config::DoorLockConfig)) falls back to these
//! values for every field that is not set explicitly.
//!
//! # Usage
//!
//! ```
//! use doorlock_core::constants::*;
//! use std::time::Duration;
//!
//! let guard = Duration::from_millis(DEFAULT_GUARD_INTERVAL_MS);
//! assert_eq!(guard, Duration::from_millis(300));
//! assert_eq!(DEFAULT_BUFFER_CAPACITY, 6);
//! ```

// ============================================================================
// Lock Controller
// ============================================================================

/// Default grace period before the bolt relocks after an unlock.
///
/// A value of zero means "lock immediately".
pub const DEFAULT_RELOCK_DURATION_MS: u64 = 5_000;

/// Default time the command worker waits after an actuation before it
/// takes the next queued command.
pub const DEFAULT_ACTUATION_SETTLE_MS: u64 = 0;

/// Default capacity of the lock command queue.
pub const DEFAULT_COMMAND_QUEUE_CAPACITY: usize = 16;

/// Name of the relock timer, as it appears in logs.
pub const RELOCK_TIMER_NAME: &str = "relock_timer";

// ============================================================================
// Door Position Sensor
// ============================================================================

/// Default guard interval applied after each sensor edge.
///
/// Mechanical bounce inside this window collapses into a single reading.
pub const DEFAULT_GUARD_INTERVAL_MS: u64 = 300;

/// Default capacity of the interrupt-to-worker edge queue.
///
/// Large enough to absorb one bouncing switch without blocking the
/// interrupt handler.
pub const DEFAULT_SENSOR_QUEUE_CAPACITY: usize = 10;

// ============================================================================
// Keypad
// ============================================================================

/// Default number of matrix rows (input lines).
pub const DEFAULT_KEYPAD_ROWS: u8 = 4;

/// Default number of matrix columns (output lines).
pub const DEFAULT_KEYPAD_COLS: u8 = 3;

/// Keymap of the standard 4x3 telephone keypad, indexed `[row][col]`.
pub const DEFAULT_KEYMAP: [[char; 3]; 4] = [
    ['1', '2', '3'],
    ['4', '5', '6'],
    ['7', '8', '9'],
    ['*', '0', '#'],
];

/// Default hold time after which a key press counts as a long press.
pub const DEFAULT_LONG_PRESS_MS: u64 = 1_000;

/// Default inactivity period after which the PIN buffer is cleared.
pub const DEFAULT_INACTIVITY_TIMEOUT_MS: u64 = 3_000;

/// Default capacity of the PIN buffer, in digits.
pub const DEFAULT_BUFFER_CAPACITY: usize = 6;

/// Default matrix scan interval.
pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 200;

/// Default number of consecutive scans a key must hold its state before a
/// press or release is reported.
pub const DEFAULT_DEBOUNCE_TICKS: u8 = 2;

/// Default number of consecutive PIN mismatches before submits are ignored.
pub const DEFAULT_MAX_PIN_FAILURES: u32 = 3;

/// Default period during which submits are ignored after too many
/// mismatches.
pub const DEFAULT_PIN_LOCKOUT_MS: u64 = 30_000;

/// Key that clears the PIN buffer on a short press.
pub const KEY_CLEAR: char = '*';

/// Key that submits the buffer (short press) or locks (long press).
pub const KEY_SUBMIT: char = '#';

// ============================================================================
// Wire Codes
// ============================================================================

/// Wire code for a locked bolt.
pub const WIRE_LOCKED: u8 = 0;

/// Wire code for an unlocked bolt.
pub const WIRE_UNLOCKED: u8 = 1;

/// Wire code for an open door (also used when no sensor reading exists).
pub const WIRE_DOOR_OPEN: u8 = 0;

/// Wire code for a closed door.
pub const WIRE_DOOR_CLOSED: u8 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keymap_matches_dimensions() {
        assert_eq!(DEFAULT_KEYMAP.len(), DEFAULT_KEYPAD_ROWS as usize);
        for row in DEFAULT_KEYMAP {
            assert_eq!(row.len(), DEFAULT_KEYPAD_COLS as usize);
        }
    }

    #[test]
    fn test_control_keys_present_in_keymap() {
        let keys: Vec<char> = DEFAULT_KEYMAP.iter().flatten().copied().collect();
        assert!(keys.contains(&KEY_CLEAR));
        assert!(keys.contains(&KEY_SUBMIT));
        assert_eq!(keys.iter().filter(|k| k.is_ascii_digit()).count(), 10);
    }

    #[test]
    fn test_timing_relationships() {
        // Bounce suppression must settle well before a key is considered held.
        assert!(DEFAULT_GUARD_INTERVAL_MS < DEFAULT_LONG_PRESS_MS);
        assert!(DEFAULT_LONG_PRESS_MS < DEFAULT_INACTIVITY_TIMEOUT_MS);
    }
}
