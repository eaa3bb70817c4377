//! Mock key matrix.
//!
//! The mock holds a set of closed switches that tests add and remove through
//! a [`MockKeyMatrixHandle`]. Coordinates outside the matrix are accepted on
//! purpose so wiring faults can be simulated.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{HardwareError, Result};
use crate::traits::MatrixScanner;
use crate::types::{KeyCoord, MatrixSize};

#[derive(Debug, Default)]
struct MatrixState {
    held: BTreeSet<KeyCoord>,
    disconnected: bool,
}

fn lock(state: &Mutex<MatrixState>) -> MutexGuard<'_, MatrixState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock key matrix.
///
/// # Examples
///
/// ```
/// use doorlock_hardware::mock::MockKeyMatrix;
/// use doorlock_hardware::traits::MatrixScanner;
/// use doorlock_hardware::types::KeyCoord;
///
/// let (mut matrix, handle) = MockKeyMatrix::new(4, 3);
///
/// handle.press(KeyCoord::new(3, 2));
/// assert_eq!(matrix.scan().unwrap(), vec![KeyCoord::new(3, 2)]);
///
/// handle.release(KeyCoord::new(3, 2));
/// assert!(matrix.scan().unwrap().is_empty());
/// ```
#[derive(Debug)]
pub struct MockKeyMatrix {
    size: MatrixSize,
    state: Arc<Mutex<MatrixState>>,
}

impl MockKeyMatrix {
    /// Create a `rows` x `cols` matrix with no keys held.
    pub fn new(rows: u8, cols: u8) -> (Self, MockKeyMatrixHandle) {
        let state = Arc::new(Mutex::new(MatrixState::default()));
        let handle = MockKeyMatrixHandle {
            state: Arc::clone(&state),
        };
        (
            Self {
                size: MatrixSize::new(rows, cols),
                state,
            },
            handle,
        )
    }
}

impl MatrixScanner for MockKeyMatrix {
    fn size(&self) -> MatrixSize {
        self.size
    }

    fn scan(&mut self) -> Result<Vec<KeyCoord>> {
        let state = lock(&self.state);
        if state.disconnected {
            return Err(HardwareError::disconnected("Mock key matrix"));
        }
        Ok(state.held.iter().copied().collect())
    }
}

/// Handle for pressing keys on a mock matrix. Cloneable and shareable.
#[derive(Debug, Clone)]
pub struct MockKeyMatrixHandle {
    state: Arc<Mutex<MatrixState>>,
}

impl MockKeyMatrixHandle {
    /// Close the switch at `coord`.
    pub fn press(&self, coord: KeyCoord) {
        lock(&self.state).held.insert(coord);
    }

    /// Open the switch at `coord`.
    pub fn release(&self, coord: KeyCoord) {
        lock(&self.state).held.remove(&coord);
    }

    /// Open every switch.
    pub fn release_all(&self) {
        lock(&self.state).held.clear();
    }

    /// Make scans fail (or succeed again).
    pub fn set_disconnected(&self, disconnected: bool) {
        lock(&self.state).disconnected = disconnected;
    }

    #[must_use]
    pub fn held(&self) -> Vec<KeyCoord> {
        lock(&self.state).held.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_reports_held_keys_in_order() {
        let (mut matrix, handle) = MockKeyMatrix::new(4, 3);
        handle.press(KeyCoord::new(2, 1));
        handle.press(KeyCoord::new(0, 0));

        assert_eq!(
            matrix.scan().unwrap(),
            vec![KeyCoord::new(0, 0), KeyCoord::new(2, 1)]
        );

        handle.release_all();
        assert!(matrix.scan().unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range_coordinates_are_reported() {
        let (mut matrix, handle) = MockKeyMatrix::new(4, 3);
        handle.press(KeyCoord::new(9, 9));

        assert_eq!(matrix.scan().unwrap(), vec![KeyCoord::new(9, 9)]);
        assert!(!matrix.size().contains(KeyCoord::new(9, 9)));
    }

    #[test]
    fn test_disconnected_scan_fails() {
        let (mut matrix, handle) = MockKeyMatrix::new(4, 3);
        handle.set_disconnected(true);
        assert!(matches!(
            matrix.scan(),
            Err(HardwareError::Disconnected { .. })
        ));
    }
}
