//! Mock GPIO lines.
//!
//! [`MockOutputPin`] records every level written to it; [`MockInputPin`]
//! reports a level set through its handle and raises the installed edge
//! handler whenever that level changes, the way a GPIO configured for
//! any-edge interrupts would.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use doorlock_core::SignalLevel;

use crate::error::{HardwareError, Result};
use crate::traits::{EdgeHandler, InputPin, OutputPin};
use crate::types::PinId;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct OutputState {
    writes: Vec<SignalLevel>,
    fail_writes: bool,
}

/// Mock output line.
///
/// # Examples
///
/// ```
/// use doorlock_core::SignalLevel;
/// use doorlock_hardware::mock::MockOutputPin;
/// use doorlock_hardware::traits::OutputPin;
/// use doorlock_hardware::types::PinId;
///
/// let (mut pin, handle) = MockOutputPin::new(PinId(0));
/// pin.set_level(SignalLevel::High).unwrap();
///
/// assert_eq!(handle.level(), Some(SignalLevel::High));
/// assert_eq!(handle.write_count(), 1);
/// ```
#[derive(Debug)]
pub struct MockOutputPin {
    pin: PinId,
    state: Arc<Mutex<OutputState>>,
}

impl MockOutputPin {
    /// Create a new mock output and the handle that observes it.
    pub fn new(pin: PinId) -> (Self, MockOutputHandle) {
        let state = Arc::new(Mutex::new(OutputState::default()));
        let handle = MockOutputHandle {
            pin,
            state: Arc::clone(&state),
        };
        (Self { pin, state }, handle)
    }
}

impl OutputPin for MockOutputPin {
    fn pin(&self) -> PinId {
        self.pin
    }

    fn set_level(&mut self, level: SignalLevel) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_writes {
            return Err(HardwareError::write_failed(self.pin.0, "injected failure"));
        }
        state.writes.push(level);
        Ok(())
    }
}

/// Handle for inspecting a mock output.
#[derive(Debug, Clone)]
pub struct MockOutputHandle {
    pin: PinId,
    state: Arc<Mutex<OutputState>>,
}

impl MockOutputHandle {
    #[must_use]
    pub fn pin(&self) -> PinId {
        self.pin
    }

    /// Last level written, or `None` if the line was never driven.
    #[must_use]
    pub fn level(&self) -> Option<SignalLevel> {
        lock(&self.state).writes.last().copied()
    }

    /// Every level written, oldest first.
    #[must_use]
    pub fn writes(&self) -> Vec<SignalLevel> {
        lock(&self.state).writes.clone()
    }

    #[must_use]
    pub fn write_count(&self) -> usize {
        lock(&self.state).writes.len()
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }
}

struct InputState {
    level: SignalLevel,
    fail_reads: bool,
    handler: Option<Arc<dyn Fn(PinId) + Send + Sync>>,
}

/// Mock input line with edge interrupts.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use doorlock_core::SignalLevel;
/// use doorlock_hardware::mock::MockInputPin;
/// use doorlock_hardware::traits::InputPin;
/// use doorlock_hardware::types::PinId;
///
/// let (pin, handle) = MockInputPin::new(PinId(1), SignalLevel::Low);
/// let edges = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&edges);
/// pin.on_edge(Box::new(move |_| {
///     counter.fetch_add(1, Ordering::Relaxed);
/// })).unwrap();
///
/// handle.bounce(&[SignalLevel::High, SignalLevel::Low, SignalLevel::High]);
/// assert_eq!(edges.load(Ordering::Relaxed), 3);
/// assert_eq!(pin.level().unwrap(), SignalLevel::High);
/// ```
pub struct MockInputPin {
    pin: PinId,
    state: Arc<Mutex<InputState>>,
}

impl MockInputPin {
    /// Create a new mock input at `initial` and the handle that drives it.
    pub fn new(pin: PinId, initial: SignalLevel) -> (Self, MockInputHandle) {
        let state = Arc::new(Mutex::new(InputState {
            level: initial,
            fail_reads: false,
            handler: None,
        }));
        let handle = MockInputHandle {
            pin,
            state: Arc::clone(&state),
        };
        (Self { pin, state }, handle)
    }
}

impl std::fmt::Debug for MockInputPin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockInputPin")
            .field("pin", &self.pin)
            .field("level", &lock(&self.state).level)
            .finish()
    }
}

impl InputPin for MockInputPin {
    fn pin(&self) -> PinId {
        self.pin
    }

    fn level(&self) -> Result<SignalLevel> {
        let state = lock(&self.state);
        if state.fail_reads {
            return Err(HardwareError::read_failed(self.pin.0, "injected failure"));
        }
        Ok(state.level)
    }

    fn on_edge(&self, handler: EdgeHandler) -> Result<()> {
        lock(&self.state).handler = Some(Arc::from(handler));
        Ok(())
    }
}

/// Handle for driving a mock input.
#[derive(Clone)]
pub struct MockInputHandle {
    pin: PinId,
    state: Arc<Mutex<InputState>>,
}

impl MockInputHandle {
    #[must_use]
    pub fn pin(&self) -> PinId {
        self.pin
    }

    /// Set the line level, raising an edge if it changed.
    pub fn set_level(&self, level: SignalLevel) {
        let handler = {
            let mut state = lock(&self.state);
            if state.level == level {
                return;
            }
            state.level = level;
            state.handler.clone()
        };
        if let Some(handler) = handler {
            handler(self.pin);
        }
    }

    /// Set the line level without raising an edge, as when an interrupt is
    /// lost.
    pub fn set_level_silently(&self, level: SignalLevel) {
        lock(&self.state).level = level;
    }

    /// Walk the line through `levels`, one edge per change.
    pub fn bounce(&self, levels: &[SignalLevel]) {
        for &level in levels {
            self.set_level(level);
        }
    }

    /// Raise an edge without changing the level (electrical noise).
    pub fn glitch(&self) {
        let handler = lock(&self.state).handler.clone();
        if let Some(handler) = handler {
            handler(self.pin);
        }
    }

    /// Make subsequent reads fail (or succeed again).
    pub fn fail_reads(&self, fail: bool) {
        lock(&self.state).fail_reads = fail;
    }
}

impl std::fmt::Debug for MockInputHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockInputHandle").field("pin", &self.pin).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_output_records_writes() {
        let (mut pin, handle) = MockOutputPin::new(PinId(0));
        assert_eq!(handle.level(), None);

        pin.set_level(SignalLevel::High).unwrap();
        pin.set_level(SignalLevel::High).unwrap();

        assert_eq!(handle.writes(), vec![SignalLevel::High, SignalLevel::High]);
    }

    #[test]
    fn test_output_injected_failure() {
        let (mut pin, handle) = MockOutputPin::new(PinId(0));
        handle.fail_writes(true);
        assert!(matches!(
            pin.set_level(SignalLevel::Low),
            Err(HardwareError::WriteFailed { pin: 0, .. })
        ));

        handle.fail_writes(false);
        pin.set_level(SignalLevel::Low).unwrap();
        assert_eq!(handle.write_count(), 1);
    }

    #[test]
    fn test_input_edges_only_on_change() {
        let (pin, handle) = MockInputPin::new(PinId(1), SignalLevel::Low);
        let edges = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&edges);
        pin.on_edge(Box::new(move |id| {
            assert_eq!(id, PinId(1));
            counter.fetch_add(1, Ordering::Relaxed);
        }))
        .unwrap();

        handle.set_level(SignalLevel::Low);
        assert_eq!(edges.load(Ordering::Relaxed), 0);

        handle.set_level(SignalLevel::High);
        handle.glitch();
        assert_eq!(edges.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_input_without_handler() {
        let (pin, handle) = MockInputPin::new(PinId(1), SignalLevel::Low);
        handle.bounce(&[SignalLevel::High, SignalLevel::Low]);
        assert_eq!(pin.level().unwrap(), SignalLevel::Low);
    }

    #[test]
    fn test_input_injected_read_failure() {
        let (pin, handle) = MockInputPin::new(PinId(1), SignalLevel::Low);
        handle.fail_reads(true);
        assert!(pin.level().is_err());
    }
}
