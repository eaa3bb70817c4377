//! Error types for the keypad decoder.

use doorlock_hardware::HardwareError;

/// Result type alias for keypad operations.
pub type Result<T> = std::result::Result<T, KeypadError>;

#[derive(Debug, thiserror::Error)]
pub enum KeypadError {
    /// The keymap does not match the configured matrix.
    #[error("Keypad configuration error: {0}")]
    Config(String),

    /// The matrix scanner failed.
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),
}

impl KeypadError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = KeypadError::config("keymap is 4x3, matrix is 4x4");
        assert_eq!(
            error.to_string(),
            "Keypad configuration error: keymap is 4x3, matrix is 4x4"
        );
    }

    #[test]
    fn test_from_hardware_error() {
        let error: KeypadError = HardwareError::disconnected("key matrix").into();
        assert!(matches!(error, KeypadError::Hardware(_)));
    }
}
