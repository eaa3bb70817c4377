//! Hardware trait definitions.
//!
//! These traits are the only place the core touches hardware: one digital
//! output driving the bolt, one digital input with edge interrupts for the
//! door-position sensor, and a key-matrix scanner.
//!
//! Unlike network or storage devices, GPIO access completes in a handful of
//! register writes, so the traits are synchronous and object-safe. The
//! controller stores them as trait objects (`Box<dyn OutputPin>`,
//! `Arc<dyn InputPin>`).

use doorlock_core::SignalLevel;

use crate::error::Result;
use crate::types::{KeyCoord, MatrixSize, PinId};

/// Handler invoked from interrupt context on every edge of an input line.
///
/// Implementations must not block, allocate, log or take locks.
pub type EdgeHandler = Box<dyn Fn(PinId) + Send + Sync>;

/// A digital output line.
pub trait OutputPin: Send {
    /// Line identifier.
    fn pin(&self) -> PinId;

    /// Drive the line to `level`.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver rejects the write.
    fn set_level(&mut self, level: SignalLevel) -> Result<()>;
}

/// A digital input line with edge interrupts.
pub trait InputPin: Send + Sync {
    /// Line identifier.
    fn pin(&self) -> PinId;

    /// Sample the current level.
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be read.
    fn level(&self) -> Result<SignalLevel>;

    /// Install the handler called on any edge, replacing a previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the line does not support interrupts.
    fn on_edge(&self, handler: EdgeHandler) -> Result<()>;
}

/// A key matrix that can be sampled.
///
/// Scanning drives each output line in turn and reads the input lines; the
/// result is the set of keys currently closed. Press/release detection and
/// debouncing are layered on top by the keypad crate.
///
/// # Examples
///
/// ```
/// use doorlock_hardware::mock::MockKeyMatrix;
/// use doorlock_hardware::traits::MatrixScanner;
/// use doorlock_hardware::types::KeyCoord;
///
/// let (mut matrix, handle) = MockKeyMatrix::new(4, 3);
/// handle.press(KeyCoord::new(0, 1));
///
/// assert_eq!(matrix.scan().unwrap(), vec![KeyCoord::new(0, 1)]);
/// ```
pub trait MatrixScanner: Send {
    /// Number of input (row) and output (column) lines.
    fn size(&self) -> MatrixSize;

    /// Keys currently held down.
    ///
    /// Scanners may report coordinates outside [`size`](Self::size) on
    /// wiring faults; consumers must check.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix cannot be scanned.
    fn scan(&mut self) -> Result<Vec<KeyCoord>>;
}
