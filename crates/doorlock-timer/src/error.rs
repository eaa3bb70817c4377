//! Error types for timer operations.

/// Result type alias for timer operations.
pub type Result<T> = std::result::Result<T, TimerError>;

/// Errors that can occur while arming a timer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    /// Arming requires a Tokio runtime to schedule on.
    #[error("Timer {timer} cannot be armed outside a Tokio runtime")]
    NoRuntime { timer: String },

    /// A periodic timer needs a non-zero period.
    #[error("Periodic timer {timer} requires a non-zero period")]
    ZeroPeriod { timer: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = TimerError::NoRuntime {
            timer: "relock_timer".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Timer relock_timer cannot be armed outside a Tokio runtime"
        );

        let error = TimerError::ZeroPeriod {
            timer: "door_poll".to_string(),
        };
        assert_eq!(error.to_string(), "Periodic timer door_poll requires a non-zero period");
    }
}
