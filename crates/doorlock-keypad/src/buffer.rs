//! Bounded digit buffer.

use std::collections::VecDeque;
use std::fmt;

/// Digits entered since the last clear, oldest first.
///
/// Holds at most `capacity` digits. Appending to a full buffer evicts the
/// oldest digit, so the buffer always contains the most recent entry.
///
/// # Examples
///
/// ```
/// use doorlock_keypad::PinBuffer;
///
/// let mut buffer = PinBuffer::new(6);
/// for digit in [1, 2, 3, 4, 5, 6, 7, 8] {
///     buffer.push(digit);
/// }
/// assert_eq!(buffer.to_string(), "345678");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinBuffer {
    digits: VecDeque<u8>,
    capacity: usize,
}

impl PinBuffer {
    /// Create an empty buffer. A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            digits: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a digit, returning the digit evicted to make room, if any.
    pub fn push(&mut self, digit: u8) -> Option<u8> {
        let evicted = if self.digits.len() == self.capacity {
            self.digits.pop_front()
        } else {
            None
        };
        self.digits.push_back(digit);
        evicted
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.digits.len() == self.capacity
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Buffered digits as ASCII bytes, oldest first.
    #[must_use]
    pub fn to_ascii(&self) -> Vec<u8> {
        self.digits.iter().map(|d| b'0' + d).collect()
    }
}

impl fmt::Display for PinBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for digit in &self.digits {
            write!(f, "{digit}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_push_until_full() {
        let mut buffer = PinBuffer::new(3);
        assert_eq!(buffer.push(1), None);
        assert_eq!(buffer.push(2), None);
        assert_eq!(buffer.push(3), None);
        assert!(buffer.is_full());

        assert_eq!(buffer.push(4), Some(1));
        assert_eq!(buffer.to_string(), "234");
    }

    #[test]
    fn test_clear() {
        let mut buffer = PinBuffer::new(6);
        buffer.push(9);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.to_string(), "");
    }

    #[test]
    fn test_zero_capacity_holds_one_digit() {
        let mut buffer = PinBuffer::new(0);
        buffer.push(1);
        buffer.push(2);
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.to_string(), "2");
    }

    #[test]
    fn test_to_ascii() {
        let mut buffer = PinBuffer::new(4);
        buffer.push(0);
        buffer.push(7);
        assert_eq!(buffer.to_ascii(), b"07".to_vec());
    }

    proptest! {
        /// The buffer never exceeds its capacity and always holds the most
        /// recent digits in entry order.
        #[test]
        fn prop_keeps_most_recent_digits(
            capacity in 1usize..10,
            digits in prop::collection::vec(0u8..10, 0..40),
        ) {
            let mut buffer = PinBuffer::new(capacity);
            for &digit in &digits {
                buffer.push(digit);
                prop_assert!(buffer.len() <= capacity);
            }

            let start = digits.len().saturating_sub(capacity);
            let expected: String = digits[start..].iter().map(u8::to_string).collect();
            prop_assert_eq!(buffer.to_string(), expected);
        }
    }
}
