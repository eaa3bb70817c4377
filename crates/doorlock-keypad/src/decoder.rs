//! Keypad decoder.
//!
//! Turns debounced press/release reports into lock commands.
//!
//! # Key lifecycle
//!
//! ```text
//!  idle ──press──► pressed (long-press timer armed)
//!                    │
//!                    ├─ release before threshold ──► short-press action ──► idle
//!                    │
//!                    └─ threshold reached ──► long-press action
//!                                               │
//!                                               └─ release ──► idle (no action)
//! ```
//!
//! # Policy
//!
//! | Key   | Short press                          | Long press |
//! |-------|--------------------------------------|------------|
//! | digit | append to buffer, restart inactivity | none       |
//! | `*`   | clear buffer                         | none       |
//! | `#`   | unlock (PIN checked if set), clear   | lock       |
//!
//! The buffer is cleared after the inactivity timeout following the last
//! digit. Entering digits never unlocks on its own.
//!
//! # Timers
//!
//! The long-press and inactivity timers never touch decoder state. Their
//! callbacks send a [`KeypadEvent`] to the consumer task, which hands it back
//! through [`KeypadDecoder::handle_event`]. An event that arrives after the
//! state it refers to has moved on (key already released, new digit entered)
//! is recognized by its timestamp and discarded.

use std::collections::HashMap;
use std::time::Duration;

use doorlock_controller::LockCommand;
use doorlock_core::KeypadConfig;
use doorlock_hardware::{Key, KeyCoord, Keymap, ScanReport};
use doorlock_timer::{Timer, TimerService};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::buffer::PinBuffer;
use crate::error::{KeypadError, Result};
use crate::verifier::{PinCheck, PinVerifier};

const INACTIVITY_TIMER_NAME: &str = "keypad_inactivity";

/// Timer expiry delivered to the keypad consumer task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypadEvent {
    LongPress(KeyCoord),
    Inactivity,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    at: Instant,
    long_fired: bool,
}

/// Keypad state machine.
pub struct KeypadDecoder {
    keymap: Keymap,
    buffer: PinBuffer,
    verifier: Option<PinVerifier>,
    long_press: Duration,
    inactivity: Duration,
    pressed: HashMap<KeyCoord, Press>,
    long_press_timers: HashMap<KeyCoord, Timer>,
    inactivity_timer: Timer,
    last_digit_at: Option<Instant>,
}

impl KeypadDecoder {
    /// Create a decoder and the receiver its timers report to.
    ///
    /// # Errors
    ///
    /// Returns `KeypadError::Config` if the keymap does not match the
    /// configured matrix size.
    pub fn new(
        config: &KeypadConfig,
        keymap: Keymap,
        timers: &TimerService,
    ) -> Result<(Self, mpsc::UnboundedReceiver<KeypadEvent>)> {
        let size = keymap.size();
        if size.rows != config.rows || size.cols != config.cols {
            return Err(KeypadError::config(format!(
                "keymap is {}, matrix is {}x{}",
                size, config.rows, config.cols
            )));
        }

        let (tx, rx) = mpsc::unbounded_channel();

        let long_press_timers = (0..size.key_count())
            .filter_map(|index| size.coord_of(index))
            .map(|coord| {
                let tx = tx.clone();
                let timer = timers.one_shot(
                    format!("long_press_{}_{}", coord.row, coord.col),
                    config.long_press(),
                    move || {
                        let _ = tx.send(KeypadEvent::LongPress(coord));
                    },
                );
                (coord, timer)
            })
            .collect();

        let inactivity_timer = timers.one_shot(
            INACTIVITY_TIMER_NAME,
            config.inactivity_timeout(),
            move || {
                let _ = tx.send(KeypadEvent::Inactivity);
            },
        );

        let verifier = config.pin.as_deref().map(|pin| {
            PinVerifier::new(pin, config.max_pin_failures, config.pin_lockout())
        });

        let decoder = Self {
            keymap,
            buffer: PinBuffer::new(config.buffer_capacity),
            verifier,
            long_press: config.long_press(),
            inactivity: config.inactivity_timeout(),
            pressed: HashMap::new(),
            long_press_timers,
            inactivity_timer,
            last_digit_at: None,
        };
        Ok((decoder, rx))
    }

    /// Digits currently buffered.
    pub fn buffer(&self) -> &PinBuffer {
        &self.buffer
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    /// Process one scan report, presses first.
    pub fn handle_report(&mut self, report: &ScanReport) -> Vec<LockCommand> {
        let pressed = report.pressed.iter().filter_map(|&c| self.key_down(c));
        let mut commands: Vec<LockCommand> = pressed.collect();
        for &coord in &report.released {
            commands.extend(self.key_up(coord));
        }
        commands
    }

    /// A key was pressed.
    ///
    /// Never produces a command itself; returns `Option` so reports can be
    /// processed uniformly.
    pub fn key_down(&mut self, coord: KeyCoord) -> Option<LockCommand> {
        let key = self.key_at(coord)?;
        if self.pressed.contains_key(&coord) {
            trace!("Key {} already down", key);
            return None;
        }

        trace!("Key {} down", key);
        self.pressed.insert(
            coord,
            Press {
                at: Instant::now(),
                long_fired: false,
            },
        );
        if let Some(timer) = self.long_press_timers.get(&coord) {
            if let Err(e) = timer.arm() {
                warn!("Long press unavailable for key {}: {}", key, e);
            }
        }
        None
    }

    /// A key was released.
    pub fn key_up(&mut self, coord: KeyCoord) -> Option<LockCommand> {
        let key = self.key_at(coord)?;
        if let Some(timer) = self.long_press_timers.get(&coord) {
            timer.disarm();
        }

        let Some(press) = self.pressed.remove(&coord) else {
            trace!("Key {} released without a press", key);
            return None;
        };

        if press.long_fired {
            return None;
        }
        // Held past the threshold but the timer event has not been
        // processed yet.
        if press.at.elapsed() >= self.long_press {
            return self.long_press_action(key);
        }
        self.short_press_action(key)
    }

    /// Process a timer expiry.
    pub fn handle_event(&mut self, event: KeypadEvent) -> Option<LockCommand> {
        match event {
            KeypadEvent::LongPress(coord) => {
                let key = self.key_at(coord)?;
                let long_press = self.long_press;
                let press = self.pressed.get_mut(&coord)?;
                if press.long_fired || press.at.elapsed() < long_press {
                    trace!("Discarding stale long press for key {}", key);
                    return None;
                }
                press.long_fired = true;
                self.long_press_action(key)
            }
            KeypadEvent::Inactivity => {
                let stale = self
                    .last_digit_at
                    .is_none_or(|at| at.elapsed() < self.inactivity);
                if stale {
                    trace!("Discarding stale inactivity timeout");
                    return None;
                }
                if !self.buffer.is_empty() {
                    debug!("Keypad entry timed out, clearing {} digits", self.buffer.len());
                }
                self.clear_buffer();
                None
            }
        }
    }

    fn key_at(&self, coord: KeyCoord) -> Option<Key> {
        let key = self.keymap.key_at(coord);
        if key.is_none() {
            warn!("Ignoring key at invalid coordinate {}", coord);
        }
        key
    }

    fn short_press_action(&mut self, key: Key) -> Option<LockCommand> {
        match key {
            Key::Digit(digit) => {
                if let Some(evicted) = self.buffer.push(digit) {
                    trace!("Buffer full, dropped oldest digit {}", evicted);
                }
                self.last_digit_at = Some(Instant::now());
                if let Err(e) = self.inactivity_timer.arm() {
                    warn!("Keypad inactivity timeout unavailable: {}", e);
                }
                None
            }
            Key::Star => {
                debug!("Keypad entry cleared");
                self.clear_buffer();
                None
            }
            Key::Hash => {
                let command = self.submit();
                self.clear_buffer();
                command
            }
        }
    }

    fn long_press_action(&mut self, key: Key) -> Option<LockCommand> {
        match key {
            Key::Hash => {
                info!("Long press on {}, locking", key);
                Some(LockCommand::Lock)
            }
            _ => {
                debug!("Long press on {} has no action", key);
                None
            }
        }
    }

    fn submit(&mut self) -> Option<LockCommand> {
        let Some(verifier) = self.verifier.as_mut() else {
            info!("Keypad submit, unlocking");
            return Some(LockCommand::Unlock);
        };

        match verifier.verify(&self.buffer, Instant::now()) {
            PinCheck::Accepted => {
                info!("Keypad PIN accepted, unlocking");
                Some(LockCommand::Unlock)
            }
            PinCheck::Rejected { failures } => {
                warn!("Keypad PIN rejected ({} consecutive failures)", failures);
                None
            }
            PinCheck::LockedOut { remaining } => {
                warn!(
                    "Keypad locked out for another {}s, submit ignored",
                    remaining.as_secs()
                );
                None
            }
        }
    }

    fn clear_buffer(&mut self) {
        self.buffer.clear();
        self.last_digit_at = None;
        self.inactivity_timer.disarm();
    }
}

impl std::fmt::Debug for KeypadDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeypadDecoder")
            .field("size", &self.keymap.size())
            .field("buffered", &self.buffer.len())
            .field("pressed", &self.pressed.len())
            .field("pin_required", &self.verifier.is_some())
            .finish()
    }
}
