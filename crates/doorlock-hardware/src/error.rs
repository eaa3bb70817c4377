//! Failures reported by the pin and key-matrix drivers.

pub type Result<T> = std::result::Result<T, HardwareError>;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The line or matrix stopped answering.
    #[error("{device} not responding")]
    Disconnected { device: String },

    #[error("Write to pin {pin} failed: {message}")]
    WriteFailed { pin: u8, message: String },

    #[error("Read from pin {pin} failed: {message}")]
    ReadFailed { pin: u8, message: String },

    /// A keymap character that is neither a digit nor `*`/`#`.
    #[error("Unknown key character {0:?}")]
    UnknownKey(char),

    /// Empty, oversized or ragged keymap.
    #[error("Invalid keymap: {0}")]
    InvalidKeymap(String),
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn write_failed(pin: u8, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            pin,
            message: message.into(),
        }
    }

    pub fn read_failed(pin: u8, message: impl Into<String>) -> Self {
        Self::ReadFailed {
            pin,
            message: message.into(),
        }
    }

    pub fn invalid_keymap(message: impl Into<String>) -> Self {
        Self::InvalidKeymap(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(HardwareError::disconnected("Key matrix"), "Key matrix not responding")]
    #[case(
        HardwareError::write_failed(17, "driver rejected level"),
        "Write to pin 17 failed: driver rejected level"
    )]
    #[case(HardwareError::read_failed(27, "line floating"), "Read from pin 27 failed: line floating")]
    #[case(HardwareError::UnknownKey('A'), "Unknown key character 'A'")]
    #[case(HardwareError::invalid_keymap("keymap must not be empty"), "Invalid keymap: keymap must not be empty")]
    fn test_display(#[case] error: HardwareError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }
}
