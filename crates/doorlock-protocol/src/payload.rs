//! Lock-state characteristic payload.
//!
//! # Wire Format
//!
//! ```text
//! Compact:   [bolt]
//! Extended:  [bolt][door]
//!
//! bolt: 0 = locked, 1 = unlocked
//! door: 0 = open or no reading, 1 = closed
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use doorlock_core::constants::{WIRE_DOOR_CLOSED, WIRE_DOOR_OPEN};
use doorlock_core::{DoorPosition, DoorStatus, Error, LockState, PayloadFormat, Result};

/// Decoded lock-state payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockStatePayload {
    pub lock: LockState,

    /// `None` for compact payloads.
    pub door: Option<DoorPosition>,
}

impl LockStatePayload {
    /// Encode `status` in the given format.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_core::{DoorPosition, DoorReading, DoorStatus, LockState, PayloadFormat};
    /// use doorlock_protocol::LockStatePayload;
    ///
    /// let status = DoorStatus::new(LockState::Unlocked, Some(DoorReading::now(DoorPosition::Closed)));
    /// assert_eq!(&LockStatePayload::encode(&status, PayloadFormat::Extended)[..], &[1, 1]);
    /// assert_eq!(&LockStatePayload::encode(&status, PayloadFormat::Compact)[..], &[1]);
    /// ```
    pub fn encode(status: &DoorStatus, format: PayloadFormat) -> Bytes {
        let mut buf = BytesMut::with_capacity(2);
        buf.put_u8(status.lock.to_u8());
        if format == PayloadFormat::Extended {
            let door = match status.door_position() {
                Some(DoorPosition::Closed) => WIRE_DOOR_CLOSED,
                Some(DoorPosition::Open) | None => WIRE_DOOR_OPEN,
            };
            buf.put_u8(door);
        }
        buf.freeze()
    }

    /// Decode a compact (1 byte) or extended (2 byte) payload.
    ///
    /// # Errors
    ///
    /// `InvalidPayload` for any other length, `InvalidLockState` or
    /// `InvalidDoorPosition` for unknown codes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        match *bytes {
            [bolt] => Ok(Self {
                lock: LockState::from_u8(bolt)?,
                door: None,
            }),
            [bolt, door] => Ok(Self {
                lock: LockState::from_u8(bolt)?,
                door: Some(DoorPosition::from_u8(door)?),
            }),
            _ => Err(Error::invalid_payload(format!(
                "expected 1 or 2 bytes, got {}",
                bytes.len()
            ))),
        }
    }
}

/// Uppercase hex rendering of a payload for logs.
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorlock_core::DoorReading;
    use rstest::rstest;

    fn status(lock: LockState, door: Option<DoorPosition>) -> DoorStatus {
        DoorStatus::new(lock, door.map(DoorReading::now))
    }

    #[rstest]
    #[case(LockState::Locked, None, &[0, 0])]
    #[case(LockState::Locked, Some(DoorPosition::Closed), &[0, 1])]
    #[case(LockState::Unlocked, Some(DoorPosition::Open), &[1, 0])]
    #[case(LockState::Unlocked, None, &[1, 0])]
    fn test_encode_extended(
        #[case] lock: LockState,
        #[case] door: Option<DoorPosition>,
        #[case] expected: &[u8],
    ) {
        let encoded = LockStatePayload::encode(&status(lock, door), PayloadFormat::Extended);
        assert_eq!(&encoded[..], expected);
    }

    #[test]
    fn test_encode_compact_ignores_door() {
        let encoded = LockStatePayload::encode(
            &status(LockState::Unlocked, Some(DoorPosition::Closed)),
            PayloadFormat::Compact,
        );
        assert_eq!(&encoded[..], &[1]);
    }

    #[test]
    fn test_decode() {
        assert_eq!(
            LockStatePayload::decode(&[1, 1]).unwrap(),
            LockStatePayload {
                lock: LockState::Unlocked,
                door: Some(DoorPosition::Closed),
            }
        );
        assert_eq!(
            LockStatePayload::decode(&[0]).unwrap(),
            LockStatePayload {
                lock: LockState::Locked,
                door: None,
            }
        );
    }

    #[rstest]
    #[case(&[])]
    #[case(&[0, 1, 0])]
    fn test_decode_rejects_length(#[case] bytes: &[u8]) {
        assert!(matches!(
            LockStatePayload::decode(bytes),
            Err(Error::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex(&[0x01, 0xAB, 0x00]), "01AB00");
        assert_eq!(hex(&[]), "");
    }

    #[test]
    fn test_decode_rejects_unknown_codes() {
        assert!(matches!(
            LockStatePayload::decode(&[2]),
            Err(Error::InvalidLockState { code: 2 })
        ));
        assert!(matches!(
            LockStatePayload::decode(&[0, 5]),
            Err(Error::InvalidDoorPosition { code: 5 })
        ));
    }
}
