//! Text grammar for rumble commands.
//!
//! Wire format (one command per connection, ASCII, whitespace separated):
//! ```text
//! <deviceIndex:i32> <lowIntensity:u16> <highIntensity:u16> <durationMs:u32>
//! ```
//! The daemon reads at most [`MAX_COMMAND_LEN`] bytes.  A command ends at EOF,
//! at the first NUL byte, or when the buffer is full.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Maximum number of bytes read from a connection for a single command.
pub const MAX_COMMAND_LEN: usize = 255;

/// TCP port the daemon listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 57920;

/// Number of whitespace-separated fields in a command.
pub const FIELD_COUNT: usize = 4;

/// Identifies one of the four positional fields of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandField {
    DeviceIndex,
    LowIntensity,
    HighIntensity,
    Duration,
}

impl CommandField {
    /// Human-readable field name used in error messages and logs.
    pub fn name(self) -> &'static str {
        match self {
            CommandField::DeviceIndex => "device index",
            CommandField::LowIntensity => "low intensity",
            CommandField::HighIntensity => "high intensity",
            CommandField::Duration => "duration",
        }
    }
}

impl fmt::Display for CommandField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What to do with tokens that follow a complete, valid command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingInput {
    /// Accept the command and ignore anything after the fourth field.
    #[default]
    Ignore,
    /// Fail with [`ParseError::TrailingInput`] if a fifth token exists.
    Reject,
}

/// Errors produced while parsing a command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Fewer than four tokens were present.
    #[error("expected 4 fields, found {found}")]
    MissingFields { found: usize },

    /// A token was not a number of the expected type, or was out of range.
    #[error("invalid {field}: {token:?}")]
    InvalidField { field: CommandField, token: String },

    /// Extra tokens followed the command and the policy is [`TrailingInput::Reject`].
    #[error("unexpected trailing input: {token:?}")]
    TrailingInput { token: String },
}

/// A parsed rumble command.
///
/// `device_index` is kept signed because the wire grammar allows a sign; the
/// bounds check happens later against the live device count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RumbleCommand {
    /// Zero-based index of the target device.
    pub device_index: i32,
    /// Strong (low-frequency) motor magnitude.
    pub low_intensity: u16,
    /// Weak (high-frequency) motor magnitude.
    pub high_intensity: u16,
    /// How long the rumble runs before the daemon stops it.
    pub duration_ms: u32,
}

impl RumbleCommand {
    /// Creates a command from its four fields.
    pub fn new(
        device_index: i32,
        low_intensity: u16,
        high_intensity: u16,
        duration_ms: u32,
    ) -> Self {
        Self {
            device_index,
            low_intensity,
            high_intensity,
            duration_ms,
        }
    }

    /// The rumble duration as a [`Duration`].
    pub fn duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.duration_ms))
    }
}

/// Renders the command in its wire form, e.g. `0 30000 30000 500`.
impl fmt::Display for RumbleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.device_index, self.low_intensity, self.high_intensity, self.duration_ms
        )
    }
}

impl FromStr for RumbleCommand {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_command(s.as_bytes())
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Parses a command, ignoring anything after the fourth field.
///
/// # Errors
///
/// Returns [`ParseError`] if fewer than four tokens are present or any of the
/// first four is not a valid number for its field.
///
/// # Examples
///
/// ```rust
/// use rumble_core::{parse_command, RumbleCommand};
///
/// let cmd = parse_command(b"0 30000 30000 500").unwrap();
/// assert_eq!(cmd, RumbleCommand::new(0, 30000, 30000, 500));
/// ```
pub fn parse_command(buf: &[u8]) -> Result<RumbleCommand, ParseError> {
    parse_command_with(buf, TrailingInput::Ignore)
}

/// Parses a command with an explicit policy for trailing tokens.
///
/// The buffer may be NUL-terminated; bytes after the first NUL are never
/// looked at.  Invalid UTF-8 is decoded lossily, so it can only invalidate
/// the token it appears in.
///
/// # Errors
///
/// Returns [`ParseError`] as for [`parse_command`], plus
/// [`ParseError::TrailingInput`] under [`TrailingInput::Reject`].
pub fn parse_command_with(
    buf: &[u8],
    trailing: TrailingInput,
) -> Result<RumbleCommand, ParseError> {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    let text = String::from_utf8_lossy(&buf[..end]);
    let mut tokens = text.split_ascii_whitespace();

    let mut fields = [""; FIELD_COUNT];
    for (found, slot) in fields.iter_mut().enumerate() {
        *slot = tokens.next().ok_or(ParseError::MissingFields { found })?;
    }

    let command = RumbleCommand {
        device_index: parse_field(fields[0], CommandField::DeviceIndex)?,
        low_intensity: parse_field(fields[1], CommandField::LowIntensity)?,
        high_intensity: parse_field(fields[2], CommandField::HighIntensity)?,
        duration_ms: parse_field(fields[3], CommandField::Duration)?,
    };

    if trailing == TrailingInput::Reject {
        if let Some(extra) = tokens.next() {
            return Err(ParseError::TrailingInput {
                token: extra.to_string(),
            });
        }
    }

    Ok(command)
}

fn parse_field<T: FromStr>(token: &str, field: CommandField) -> Result<T, ParseError> {
    token.parse().map_err(|_| ParseError::InvalidField {
        field,
        token: token.to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed_command() {
        // Arrange / Act
        let cmd = parse_command(b"0 30000 30000 500").unwrap();

        // Assert
        assert_eq!(cmd.device_index, 0);
        assert_eq!(cmd.low_intensity, 30000);
        assert_eq!(cmd.high_intensity, 30000);
        assert_eq!(cmd.duration_ms, 500);
    }

    #[test]
    fn test_parse_accepts_field_extremes() {
        let cmd = parse_command(b"2147483647 65535 0 4294967295").unwrap();
        assert_eq!(cmd, RumbleCommand::new(i32::MAX, u16::MAX, 0, u32::MAX));
    }

    #[test]
    fn test_parse_keeps_negative_index_for_later_validation() {
        let cmd = parse_command(b"-1 10 10 10").unwrap();
        assert_eq!(cmd.device_index, -1);
    }

    #[test]
    fn test_parse_tolerates_mixed_whitespace_and_line_endings() {
        let cmd = parse_command(b"  1\t200  300\r\n400\r\n").unwrap();
        assert_eq!(cmd, RumbleCommand::new(1, 200, 300, 400));
    }

    #[test]
    fn test_parse_stops_at_first_nul_byte() {
        // Arrange – a zero-initialised read buffer with a short command in it
        let mut buf = [0u8; MAX_COMMAND_LEN];
        buf[..10].copy_from_slice(b"1 2 3 4   ");
        buf[20..24].copy_from_slice(b"junk");

        // Act
        let cmd = parse_command(&buf).unwrap();

        // Assert
        assert_eq!(cmd, RumbleCommand::new(1, 2, 3, 4));
    }

    #[test]
    fn test_parse_ignores_trailing_tokens_by_default() {
        let cmd = parse_command(b"0 1 2 3 extra tokens here").unwrap();
        assert_eq!(cmd, RumbleCommand::new(0, 1, 2, 3));
    }

    #[test]
    fn test_parse_ignores_trailing_invalid_utf8() {
        let cmd = parse_command(b"0 1 2 3 \xff\xfe").unwrap();
        assert_eq!(cmd, RumbleCommand::new(0, 1, 2, 3));
    }

    #[test]
    fn test_parse_reject_policy_fails_on_trailing_token() {
        let result = parse_command_with(b"0 1 2 3 4", TrailingInput::Reject);
        assert_eq!(
            result,
            Err(ParseError::TrailingInput {
                token: "4".to_string()
            })
        );
    }

    #[test]
    fn test_parse_reject_policy_accepts_trailing_whitespace() {
        let cmd = parse_command_with(b"0 1 2 3 \n", TrailingInput::Reject).unwrap();
        assert_eq!(cmd, RumbleCommand::new(0, 1, 2, 3));
    }

    #[test]
    fn test_parse_empty_input_reports_zero_fields() {
        assert_eq!(parse_command(b""), Err(ParseError::MissingFields { found: 0 }));
        assert_eq!(parse_command(b"   \n"), Err(ParseError::MissingFields { found: 0 }));
    }

    #[test]
    fn test_parse_too_few_fields() {
        assert_eq!(
            parse_command(b"0 30000 30000"),
            Err(ParseError::MissingFields { found: 3 })
        );
    }

    #[test]
    fn test_parse_non_numeric_index() {
        let result = parse_command(b"abc 1 2 3");
        assert_eq!(
            result,
            Err(ParseError::InvalidField {
                field: CommandField::DeviceIndex,
                token: "abc".to_string()
            })
        );
    }

    #[test]
    fn test_parse_intensity_out_of_range() {
        let result = parse_command(b"0 65536 0 10");
        assert!(matches!(
            result,
            Err(ParseError::InvalidField {
                field: CommandField::LowIntensity,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_negative_intensity_is_invalid() {
        let result = parse_command(b"0 0 -5 10");
        assert!(matches!(
            result,
            Err(ParseError::InvalidField {
                field: CommandField::HighIntensity,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_duration_overflow_is_invalid() {
        let result = parse_command(b"0 0 0 4294967296");
        assert!(matches!(
            result,
            Err(ParseError::InvalidField {
                field: CommandField::Duration,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_rejects_number_glued_to_text() {
        let result = parse_command(b"0 1 2 3ms");
        assert!(matches!(
            result,
            Err(ParseError::InvalidField {
                field: CommandField::Duration,
                ..
            })
        ));
    }

    #[test]
    fn test_display_renders_wire_form() {
        let cmd = RumbleCommand::new(3, 100, 65535, 1200);
        assert_eq!(cmd.to_string(), "3 100 65535 1200");
    }

    #[test]
    fn test_from_str_uses_permissive_policy() {
        let cmd: RumbleCommand = "1 2 3 4 5".parse().unwrap();
        assert_eq!(cmd, RumbleCommand::new(1, 2, 3, 4));
    }

    #[test]
    fn test_duration_converts_milliseconds() {
        let cmd = RumbleCommand::new(0, 0, 0, 1500);
        assert_eq!(cmd.duration(), Duration::from_millis(1500));
    }

    #[test]
    fn test_parse_error_messages_name_the_field() {
        let err = parse_command(b"0 x 0 0").unwrap_err();
        assert_eq!(err.to_string(), "invalid low intensity: \"x\"");
    }
}
