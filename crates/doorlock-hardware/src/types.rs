//! Common types shared across hardware implementations.
//!
//! This module defines pin identifiers, key-matrix coordinates, the keymap
//! that turns coordinates into keys, and the per-scan press/release report.

use std::fmt;

use doorlock_core::constants::{DEFAULT_KEYMAP, KEY_CLEAR, KEY_SUBMIT};
use serde::{Deserialize, Serialize};

use crate::error::{HardwareError, Result};

/// Identifier of a GPIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinId(pub u8);

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

/// Position of a key in the matrix.
///
/// `row` is the input line index, `col` the output line index, matching the
/// way matrix scanners report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyCoord {
    pub row: u8,
    pub col: u8,
}

impl KeyCoord {
    #[must_use]
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for KeyCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A key on the keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Numeric digit (0-9).
    Digit(u8),

    /// Star key (*), clears the entry.
    Star,

    /// Hash/pound key (#), submits or locks.
    Hash,
}

impl Key {
    /// Convert a keymap character to a key.
    ///
    /// # Errors
    ///
    /// Returns an error for characters other than `0`-`9`, `*` and `#`.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_hardware::types::Key;
    ///
    /// assert_eq!(Key::from_char('7').unwrap(), Key::Digit(7));
    /// assert_eq!(Key::from_char('#').unwrap(), Key::Hash);
    /// assert!(Key::from_char('A').is_err());
    /// ```
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            KEY_CLEAR => Ok(Self::Star),
            KEY_SUBMIT => Ok(Self::Hash),
            _ => c
                .to_digit(10)
                .map(|d| Self::Digit(d as u8))
                .ok_or(HardwareError::UnknownKey(c)),
        }
    }

    /// Character printed on the key.
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::Digit(d) => char::from(b'0' + d),
            Self::Star => KEY_CLEAR,
            Self::Hash => KEY_SUBMIT,
        }
    }

    /// Check if this key is a digit.
    #[must_use]
    pub fn is_digit(self) -> bool {
        matches!(self, Self::Digit(_))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Dimensions of a key matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixSize {
    pub rows: u8,
    pub cols: u8,
}

impl MatrixSize {
    #[must_use]
    pub const fn new(rows: u8, cols: u8) -> Self {
        Self { rows, cols }
    }

    #[must_use]
    pub fn key_count(&self) -> usize {
        usize::from(self.rows) * usize::from(self.cols)
    }

    #[must_use]
    pub fn contains(&self, coord: KeyCoord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    /// Flat index of a coordinate, or `None` if it lies outside the matrix.
    #[must_use]
    pub fn index_of(&self, coord: KeyCoord) -> Option<usize> {
        self.contains(coord)
            .then(|| usize::from(coord.row) * usize::from(self.cols) + usize::from(coord.col))
    }

    /// Coordinate of a flat index.
    #[must_use]
    pub fn coord_of(&self, index: usize) -> Option<KeyCoord> {
        (index < self.key_count()).then(|| {
            let cols = usize::from(self.cols);
            KeyCoord::new((index / cols) as u8, (index % cols) as u8)
        })
    }
}

impl fmt::Display for MatrixSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Fixed mapping from matrix coordinates to keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    size: MatrixSize,
    keys: Vec<Key>,
}

impl Keymap {
    /// Build a keymap from rows of key characters.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows are empty, ragged, or contain a character
    /// that is not a key.
    pub fn from_rows<R: AsRef<[char]>>(rows: &[R]) -> Result<Self> {
        let row_count = rows.len();
        let col_count = rows.first().map_or(0, |r| r.as_ref().len());
        if row_count == 0 || col_count == 0 {
            return Err(HardwareError::invalid_keymap("keymap must not be empty"));
        }
        if row_count > usize::from(u8::MAX) || col_count > usize::from(u8::MAX) {
            return Err(HardwareError::invalid_keymap("keymap too large"));
        }

        let mut keys = Vec::with_capacity(row_count * col_count);
        for (index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != col_count {
                return Err(HardwareError::invalid_keymap(format!(
                    "keymap row {index} has {} keys, expected {col_count}",
                    row.len()
                )));
            }
            for &c in row {
                keys.push(Key::from_char(c)?);
            }
        }

        Ok(Self {
            size: MatrixSize::new(row_count as u8, col_count as u8),
            keys,
        })
    }

    #[must_use]
    pub fn size(&self) -> MatrixSize {
        self.size
    }

    /// Key at a coordinate, or `None` if it lies outside the matrix.
    #[must_use]
    pub fn key_at(&self, coord: KeyCoord) -> Option<Key> {
        self.size.index_of(coord).map(|index| self.keys[index])
    }

    /// Coordinate of the first occurrence of `key`.
    #[must_use]
    pub fn find(&self, key: Key) -> Option<KeyCoord> {
        self.keys
            .iter()
            .position(|&k| k == key)
            .and_then(|index| self.size.coord_of(index))
    }
}

impl Default for Keymap {
    /// The standard 4x3 telephone layout.
    fn default() -> Self {
        let keys = DEFAULT_KEYMAP
            .iter()
            .flatten()
            .map(|&c| match c {
                KEY_CLEAR => Key::Star,
                KEY_SUBMIT => Key::Hash,
                _ => Key::Digit(c as u8 - b'0'),
            })
            .collect();
        Self {
            size: MatrixSize::new(DEFAULT_KEYMAP.len() as u8, DEFAULT_KEYMAP[0].len() as u8),
            keys,
        }
    }
}

/// Keys that changed state during one matrix scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub pressed: Vec<KeyCoord>,
    pub released: Vec<KeyCoord>,
}

impl ScanReport {
    #[must_use]
    pub fn pressed(coord: KeyCoord) -> Self {
        Self {
            pressed: vec![coord],
            released: Vec::new(),
        }
    }

    #[must_use]
    pub fn released(coord: KeyCoord) -> Self {
        Self {
            pressed: Vec::new(),
            released: vec![coord],
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty() && self.released.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(KeyCoord::new(0, 0), Key::Digit(1))]
    #[case(KeyCoord::new(1, 1), Key::Digit(5))]
    #[case(KeyCoord::new(3, 0), Key::Star)]
    #[case(KeyCoord::new(3, 1), Key::Digit(0))]
    #[case(KeyCoord::new(3, 2), Key::Hash)]
    fn test_default_keymap_lookup(#[case] coord: KeyCoord, #[case] expected: Key) {
        assert_eq!(Keymap::default().key_at(coord), Some(expected));
    }

    #[rstest]
    #[case(KeyCoord::new(4, 0))]
    #[case(KeyCoord::new(0, 3))]
    #[case(KeyCoord::new(255, 255))]
    fn test_keymap_out_of_range_is_none(#[case] coord: KeyCoord) {
        assert_eq!(Keymap::default().key_at(coord), None);
    }

    #[test]
    fn test_keymap_from_rows_matches_default() {
        let keymap = Keymap::from_rows(&DEFAULT_KEYMAP).unwrap();
        assert_eq!(keymap, Keymap::default());
        assert_eq!(keymap.size(), MatrixSize::new(4, 3));
    }

    #[test]
    fn test_keymap_find() {
        let keymap = Keymap::default();
        assert_eq!(keymap.find(Key::Hash), Some(KeyCoord::new(3, 2)));
        assert_eq!(keymap.find(Key::Digit(9)), Some(KeyCoord::new(2, 2)));

        let digits_only = Keymap::from_rows(&[['1', '2']]).unwrap();
        assert_eq!(digits_only.find(Key::Star), None);
    }

    #[test]
    fn test_keymap_rejects_ragged_rows() {
        let rows: Vec<Vec<char>> = vec![vec!['1', '2'], vec!['3']];
        assert!(Keymap::from_rows(&rows).is_err());
    }

    #[test]
    fn test_keymap_rejects_unknown_character() {
        assert!(Keymap::from_rows(&[['1', 'A']]).is_err());
    }

    #[test]
    fn test_matrix_index_round_trip() {
        let size = MatrixSize::new(4, 3);
        assert_eq!(size.key_count(), 12);
        assert_eq!(size.index_of(KeyCoord::new(3, 2)), Some(11));
        assert_eq!(size.coord_of(11), Some(KeyCoord::new(3, 2)));
        assert_eq!(size.coord_of(12), None);
    }

    #[test]
    fn test_key_types_json() {
        assert_eq!(
            serde_json::to_string(&KeyCoord::new(3, 2)).unwrap(),
            r#"{"row":3,"col":2}"#
        );
        assert_eq!(serde_json::to_string(&PinId(17)).unwrap(), "17");

        let keys: Vec<Key> = serde_json::from_str(r#"[{"Digit":7},"Star","Hash"]"#).unwrap();
        assert_eq!(keys, vec![Key::Digit(7), Key::Star, Key::Hash]);
    }

    #[test]
    fn test_key_as_char() {
        assert_eq!(Key::Digit(0).as_char(), '0');
        assert_eq!(Key::Star.to_string(), "*");
        assert_eq!(Key::Hash.to_string(), "#");
    }
}
