//! Simulator console commands.

use std::str::FromStr;

use doorlock_core::DoorPosition;
use doorlock_hardware::Key;

pub const HELP: &str = "\
commands:
  unlock              write the lock-command characteristic
  lock                queue a lock command
  status              print the lock state
  door open|closed    move the door
  press <key>         tap a key (0-9, *, #)
  hold <key>          hold a key past the long-press threshold
  help                show this text
  quit                exit";

/// A line typed at the simulator prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimCommand {
    Unlock,
    Lock,
    Status,
    Door(DoorPosition),
    Press(Key),
    Hold(Key),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command {0:?}, try 'help'")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid key {0:?}, expected 0-9, * or #")]
    InvalidKey(String),
}

impl FromStr for SimCommand {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(ParseError::Empty)?;
        let arg = words.next();
        if words.next().is_some() {
            return Err(ParseError::Unknown(line.trim().to_string()));
        }

        match (verb.to_ascii_lowercase().as_str(), arg) {
            ("unlock", None) => Ok(Self::Unlock),
            ("lock", None) => Ok(Self::Lock),
            ("status", None) => Ok(Self::Status),
            ("help" | "?", None) => Ok(Self::Help),
            ("quit" | "exit", None) => Ok(Self::Quit),
            ("door", Some("open")) => Ok(Self::Door(DoorPosition::Open)),
            ("door", Some("closed" | "close")) => Ok(Self::Door(DoorPosition::Closed)),
            ("door", _) => Err(ParseError::Usage("door open|closed")),
            ("press", Some(key)) => parse_key(key).map(Self::Press),
            ("press", None) => Err(ParseError::Usage("press <key>")),
            ("hold", Some(key)) => parse_key(key).map(Self::Hold),
            ("hold", None) => Err(ParseError::Usage("hold <key>")),
            _ => Err(ParseError::Unknown(line.trim().to_string())),
        }
    }
}

fn parse_key(word: &str) -> Result<Key, ParseError> {
    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Key::from_char(c).map_err(|_| ParseError::InvalidKey(word.to_string())),
        _ => Err(ParseError::InvalidKey(word.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("unlock", SimCommand::Unlock)]
    #[case("  LOCK ", SimCommand::Lock)]
    #[case("status", SimCommand::Status)]
    #[case("door open", SimCommand::Door(DoorPosition::Open))]
    #[case("door closed", SimCommand::Door(DoorPosition::Closed))]
    #[case("press 7", SimCommand::Press(Key::Digit(7)))]
    #[case("press *", SimCommand::Press(Key::Star))]
    #[case("hold #", SimCommand::Hold(Key::Hash))]
    #[case("quit", SimCommand::Quit)]
    fn test_parse(#[case] line: &str, #[case] expected: SimCommand) {
        assert_eq!(line.parse::<SimCommand>().unwrap(), expected);
    }

    #[rstest]
    #[case("", ParseError::Empty)]
    #[case("open sesame", ParseError::Unknown("open sesame".to_string()))]
    #[case("door ajar", ParseError::Usage("door open|closed"))]
    #[case("press", ParseError::Usage("press <key>"))]
    #[case("press A", ParseError::InvalidKey("A".to_string()))]
    #[case("hold 12", ParseError::InvalidKey("12".to_string()))]
    #[case("unlock now", ParseError::Unknown("unlock now".to_string()))]
    fn test_parse_errors(#[case] line: &str, #[case] expected: ParseError) {
        assert_eq!(line.parse::<SimCommand>().unwrap_err(), expected);
    }
}
