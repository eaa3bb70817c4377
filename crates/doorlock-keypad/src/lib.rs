//! Matrix keypad support for the door lock.
//!
//! Scans a key matrix, debounces it, and decodes key activity into unlock
//! and lock commands:
//!
//! - [`MatrixPoller`] samples the scanner and reports debounced presses and
//!   releases.
//! - [`KeypadDecoder`] tracks per-key press duration and the entered digits.
//! - [`KeypadWorker`] owns the decoder and submits its commands to the
//!   command worker.
//!
//! # Examples
//!
//! ```
//! use doorlock_core::KeypadConfig;
//! use doorlock_hardware::{Key, Keymap};
//! use doorlock_keypad::KeypadDecoder;
//! use doorlock_timer::TimerService;
//!
//! let keymap = Keymap::default();
//! let five = keymap.find(Key::Digit(5)).unwrap();
//! let (mut decoder, _events) =
//!     KeypadDecoder::new(&KeypadConfig::default(), keymap, &TimerService::new()).unwrap();
//!
//! // Arming the key timers needs a runtime; without one the keypad degrades
//! // to short presses only.
//! decoder.key_down(five);
//! decoder.key_up(five);
//! assert_eq!(decoder.buffer().to_string(), "5");
//! ```

pub mod buffer;
pub mod decoder;
pub mod error;
pub mod poller;
pub mod verifier;
pub mod worker;

pub use buffer::PinBuffer;
pub use decoder::{KeypadDecoder, KeypadEvent};
pub use error::{KeypadError, Result};
pub use poller::MatrixPoller;
pub use verifier::{PinCheck, PinVerifier};
pub use worker::{KeypadHandle, KeypadWorker};
