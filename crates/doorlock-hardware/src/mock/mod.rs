//! Mock device implementations for testing and development.
//!
//! This module provides simulated pins and key matrices that can be
//! controlled programmatically without requiring physical hardware. Each
//! mock comes with a cloneable handle used to drive or inspect it.

pub mod matrix;
pub mod pin;

// Re-export commonly used types
pub use matrix::{MockKeyMatrix, MockKeyMatrixHandle};
pub use pin::{MockInputHandle, MockInputPin, MockOutputHandle, MockOutputPin};
