//! Debounce and timer service for the door lock core.
//!
//! Every delayed action in the workspace (auto-relock, key long-press,
//! PIN-buffer inactivity, door-sensor polling) is an instance of the
//! [`Timer`] type defined here, created through a [`TimerService`]. Arming
//! an armed timer cancels the pending expiry first.

pub mod error;
pub mod timer;

pub use error::{Result, TimerError};
pub use timer::{Timer, TimerCallback, TimerMode, TimerService};
