use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Wire payload errors
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid lock state code: {code}")]
    InvalidLockState { code: u8 },

    #[error("Invalid door position code: {code}")]
    InvalidDoorPosition { code: u8 },

    // Keypad errors
    #[error("Invalid PIN: {0}")]
    InvalidPin(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid payload error.
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
