//! PIN verification with failure lockout.
//!
//! The entered digits are compared against the configured PIN in constant
//! time via the `subtle` crate, so response timing does not reveal how many
//! leading digits matched.

use std::time::Duration;

use subtle::ConstantTimeEq;
use tokio::time::Instant;

use crate::buffer::PinBuffer;

/// Outcome of a PIN check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinCheck {
    Accepted,

    /// Wrong PIN; `failures` consecutive failures so far.
    Rejected { failures: u32 },

    /// Too many failures; submits are ignored for `remaining`.
    LockedOut { remaining: Duration },
}

/// Checks entered digits against a fixed PIN.
#[derive(Debug, Clone)]
pub struct PinVerifier {
    expected: Vec<u8>,
    max_failures: u32,
    lockout: Duration,
    failures: u32,
    locked_until: Option<Instant>,
}

impl PinVerifier {
    /// `pin` is the ASCII digit string. A `max_failures` of zero disables
    /// the lockout.
    pub fn new(pin: &str, max_failures: u32, lockout: Duration) -> Self {
        Self {
            expected: pin.as_bytes().to_vec(),
            max_failures,
            lockout,
            failures: 0,
            locked_until: None,
        }
    }

    pub fn verify(&mut self, entered: &PinBuffer, now: Instant) -> PinCheck {
        if let Some(until) = self.locked_until {
            if now < until {
                return PinCheck::LockedOut {
                    remaining: until - now,
                };
            }
            self.locked_until = None;
            self.failures = 0;
        }

        if bool::from(self.expected.as_slice().ct_eq(entered.to_ascii().as_slice())) {
            self.failures = 0;
            return PinCheck::Accepted;
        }

        self.failures = self.failures.saturating_add(1);
        if self.max_failures > 0 && self.failures >= self.max_failures {
            self.locked_until = Some(now + self.lockout);
        }
        PinCheck::Rejected {
            failures: self.failures,
        }
    }

    /// Consecutive failures since the last success or lockout expiry.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn is_locked_out(&self, now: Instant) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn entered(digits: &str) -> PinBuffer {
        let mut buffer = PinBuffer::new(6);
        for c in digits.chars() {
            buffer.push(c.to_digit(10).unwrap() as u8);
        }
        buffer
    }

    #[rstest]
    #[case("4321", PinCheck::Accepted)]
    #[case("4320", PinCheck::Rejected { failures: 1 })]
    #[case("432", PinCheck::Rejected { failures: 1 })]
    #[case("43210", PinCheck::Rejected { failures: 1 })]
    #[case("", PinCheck::Rejected { failures: 1 })]
    fn test_verify(#[case] digits: &str, #[case] expected: PinCheck) {
        let mut verifier = PinVerifier::new("4321", 3, Duration::from_secs(30));
        assert_eq!(verifier.verify(&entered(digits), Instant::now()), expected);
    }

    #[test]
    fn test_lockout_after_max_failures() {
        let mut verifier = PinVerifier::new("4321", 3, Duration::from_secs(30));
        let start = Instant::now();

        for n in 1..=3 {
            assert_eq!(
                verifier.verify(&entered("0000"), start),
                PinCheck::Rejected { failures: n }
            );
        }
        assert!(verifier.is_locked_out(start));

        // Even the right PIN is refused while locked out.
        assert_eq!(
            verifier.verify(&entered("4321"), start + Duration::from_secs(10)),
            PinCheck::LockedOut {
                remaining: Duration::from_secs(20)
            }
        );

        let later = start + Duration::from_secs(30);
        assert!(!verifier.is_locked_out(later));
        assert_eq!(verifier.verify(&entered("4321"), later), PinCheck::Accepted);
        assert_eq!(verifier.failures(), 0);
    }

    #[test]
    fn test_success_resets_failures() {
        let mut verifier = PinVerifier::new("12", 3, Duration::from_secs(30));
        let now = Instant::now();
        verifier.verify(&entered("99"), now);
        verifier.verify(&entered("99"), now);
        verifier.verify(&entered("12"), now);
        assert_eq!(verifier.failures(), 0);
        assert!(!verifier.is_locked_out(now));
    }

    #[test]
    fn test_zero_max_failures_never_locks() {
        let mut verifier = PinVerifier::new("12", 0, Duration::from_secs(30));
        let now = Instant::now();
        for _ in 0..10 {
            verifier.verify(&entered("99"), now);
        }
        assert!(!verifier.is_locked_out(now));
    }
}
