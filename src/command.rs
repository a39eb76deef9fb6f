//! Host command protocol: parser and ingestion.
//!
//! The host sends ASCII lines of the form `@speed%<signed-decimal>`
//! terminated by `\r` or `\n`. Nothing is acknowledged and anything that
//! does not parse is dropped silently; the previous setpoint stays in force.
//!
//! # Framing
//!
//! - `@` anywhere (re)starts a command, so a corrupted line resynchronizes on
//!   the next start byte instead of poisoning the following one
//! - bytes outside a command are ignored
//! - a command longer than [`MAX_COMMAND_LEN`] bytes is abandoned before
//!   anything is written past the buffer
//!
//! # Example
//!
//! ```rust
//! use rs_twinmotor::{CommandIngest, ControlTarget};
//!
//! let target = ControlTarget::new();
//! let mut ingest = CommandIngest::new(&target);
//!
//! for byte in b"noise@speed%-120\r\n" {
//!     ingest.on_byte(*byte);
//! }
//! assert_eq!(target.target_speed(), -120);
//! ```

use core::num::IntErrorKind;

use heapless::Vec;

use crate::shared::ControlTarget;
use crate::traits::SerialRx;

/// Start-of-command byte.
pub const START_BYTE: u8 = b'@';

/// Prefix of the velocity setpoint command, including the start byte.
pub const SPEED_PREFIX: &[u8] = b"@speed%";

/// Longest command accepted, start byte included, terminator excluded.
pub const MAX_COMMAND_LEN: usize = 31;

/// A recognized host command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostCommand {
    /// `@speed%<n>`: new velocity setpoint.
    SetSpeed(i16),
}

/// Why a completed or abandoned line was not applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Line did not start with a known prefix.
    UnknownCommand,
    /// Prefix matched but nothing followed it.
    MissingValue,
    /// Value was not a decimal integer.
    InvalidValue,
    /// Value did not fit in a 16-bit signed integer.
    OutOfRange,
    /// Line grew past [`MAX_COMMAND_LEN`] before its terminator.
    Overflow,
}

/// Result of feeding a byte that ended a line or abandoned one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseEvent {
    /// A complete, valid command.
    Command(HostCommand),
    /// A line that was dropped.
    Ignored(IgnoreReason),
}

enum State {
    Idle,
    Receiving,
}

/// Byte-at-a-time command parser.
pub struct CommandParser {
    state: State,
    buffer: Vec<u8, MAX_COMMAND_LEN>,
}

impl CommandParser {
    /// Create an idle parser.
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            buffer: Vec::new(),
        }
    }

    /// Process one received byte. Returns an event when a line ends or is abandoned.
    pub fn push(&mut self, byte: u8) -> Option<ParseEvent> {
        if byte == START_BYTE {
            self.buffer.clear();
            // Cannot fail on an empty buffer.
            let _ = self.buffer.push(byte);
            self.state = State::Receiving;
            return None;
        }

        match self.state {
            State::Idle => None,
            State::Receiving => {
                if byte == b'\r' || byte == b'\n' {
                    let event = Self::evaluate(&self.buffer);
                    self.abandon();
                    Some(event)
                } else if self.buffer.push(byte).is_err() {
                    self.abandon();
                    Some(ParseEvent::Ignored(IgnoreReason::Overflow))
                } else {
                    None
                }
            }
        }
    }

    /// True while a command is being assembled.
    #[inline]
    pub fn is_receiving(&self) -> bool {
        matches!(self.state, State::Receiving)
    }

    /// Bytes buffered for the current command.
    #[inline]
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    fn abandon(&mut self) {
        self.buffer.clear();
        self.state = State::Idle;
    }

    fn evaluate(line: &[u8]) -> ParseEvent {
        let Some(value) = line.strip_prefix(SPEED_PREFIX) else {
            return ParseEvent::Ignored(IgnoreReason::UnknownCommand);
        };
        if value.is_empty() {
            return ParseEvent::Ignored(IgnoreReason::MissingValue);
        }

        let Ok(text) = core::str::from_utf8(value) else {
            return ParseEvent::Ignored(IgnoreReason::InvalidValue);
        };
        match text.parse::<i16>() {
            Ok(speed) => ParseEvent::Command(HostCommand::SetSpeed(speed)),
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                    ParseEvent::Ignored(IgnoreReason::OutOfRange)
                }
                _ => ParseEvent::Ignored(IgnoreReason::InvalidValue),
            },
        }
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Serial receive handler: parses bytes and publishes accepted setpoints.
///
/// Runs in the highest-priority context. It is the only writer of the
/// [`ControlTarget`]; publishing a setpoint also requests the velocity PID
/// reset (see [`crate::shared`]).
pub struct CommandIngest<'a> {
    parser: CommandParser,
    target: &'a ControlTarget,
}

impl<'a> CommandIngest<'a> {
    /// Create an ingestion handler writing to `target`.
    pub fn new(target: &'a ControlTarget) -> Self {
        Self {
            parser: CommandParser::new(),
            target,
        }
    }

    /// Handle one received byte.
    pub fn on_byte(&mut self, byte: u8) -> Option<ParseEvent> {
        let event = self.parser.push(byte)?;
        match event {
            ParseEvent::Command(HostCommand::SetSpeed(speed)) => {
                self.target.set_target_speed(speed);
                log::debug!("setpoint <- {}", speed);
            }
            ParseEvent::Ignored(reason) => {
                log::debug!("host line ignored: {:?}", reason);
            }
        }
        Some(event)
    }

    /// Feed every byte currently available from `rx`. Returns the number of
    /// commands applied.
    pub fn drain<R: SerialRx>(&mut self, rx: &mut R) -> usize {
        let mut applied = 0;
        while let Some(byte) = rx.try_read() {
            if let Some(ParseEvent::Command(_)) = self.on_byte(byte) {
                applied += 1;
            }
        }
        applied
    }

    /// The parser state, for inspection.
    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockSerialRx;

    fn feed(parser: &mut CommandParser, bytes: &[u8]) -> Option<ParseEvent> {
        let mut last = None;
        for &b in bytes {
            if let Some(event) = parser.push(b) {
                last = Some(event);
            }
        }
        last
    }

    #[test]
    fn parses_positive_and_negative() {
        let mut parser = CommandParser::new();
        assert_eq!(
            feed(&mut parser, b"@speed%250\r"),
            Some(ParseEvent::Command(HostCommand::SetSpeed(250)))
        );
        assert_eq!(
            feed(&mut parser, b"@speed%-42\n"),
            Some(ParseEvent::Command(HostCommand::SetSpeed(-42)))
        );
    }

    #[test]
    fn empty_value_is_ignored() {
        let mut parser = CommandParser::new();
        assert_eq!(
            feed(&mut parser, b"@speed%\r"),
            Some(ParseEvent::Ignored(IgnoreReason::MissingValue))
        );
    }

    #[test]
    fn non_numeric_value_is_ignored() {
        let mut parser = CommandParser::new();
        assert_eq!(
            feed(&mut parser, b"@speed%fast\n"),
            Some(ParseEvent::Ignored(IgnoreReason::InvalidValue))
        );
        assert_eq!(
            feed(&mut parser, b"@speed%12x\n"),
            Some(ParseEvent::Ignored(IgnoreReason::InvalidValue))
        );
    }

    #[test]
    fn out_of_range_value_is_ignored() {
        let mut parser = CommandParser::new();
        assert_eq!(
            feed(&mut parser, b"@speed%40000\n"),
            Some(ParseEvent::Ignored(IgnoreReason::OutOfRange))
        );
        assert_eq!(
            feed(&mut parser, b"@speed%-32769\n"),
            Some(ParseEvent::Ignored(IgnoreReason::OutOfRange))
        );
        assert_eq!(
            feed(&mut parser, b"@speed%-32768\n"),
            Some(ParseEvent::Command(HostCommand::SetSpeed(i16::MIN)))
        );
    }

    #[test]
    fn unknown_prefix_is_ignored() {
        let mut parser = CommandParser::new();
        assert_eq!(
            feed(&mut parser, b"@kp%2\n"),
            Some(ParseEvent::Ignored(IgnoreReason::UnknownCommand))
        );
        assert_eq!(
            feed(&mut parser, b"@SPEED%2\n"),
            Some(ParseEvent::Ignored(IgnoreReason::UnknownCommand))
        );
    }

    #[test]
    fn bytes_outside_a_command_are_ignored() {
        let mut parser = CommandParser::new();
        assert_eq!(feed(&mut parser, b"speed%10\r\n"), None);
        assert!(!parser.is_receiving());
    }

    #[test]
    fn start_byte_resynchronizes() {
        let mut parser = CommandParser::new();
        assert_eq!(
            feed(&mut parser, b"@spe@speed%77\n"),
            Some(ParseEvent::Command(HostCommand::SetSpeed(77)))
        );
    }

    #[test]
    fn terminator_returns_to_idle() {
        let mut parser = CommandParser::new();
        feed(&mut parser, b"@speed%5\r");
        assert!(!parser.is_receiving());
        // The \n of a \r\n pair is then just an idle byte
        assert_eq!(parser.push(b'\n'), None);
    }

    #[test]
    fn longest_command_fits() {
        let mut parser = CommandParser::new();
        // "@speed%" + 24 digits = 31 bytes; leading zeros are accepted
        let mut line = [b'0'; MAX_COMMAND_LEN + 1];
        line[..SPEED_PREFIX.len()].copy_from_slice(SPEED_PREFIX);
        line[MAX_COMMAND_LEN - 1] = b'7';
        line[MAX_COMMAND_LEN] = b'\n';
        assert_eq!(
            feed(&mut parser, &line),
            Some(ParseEvent::Command(HostCommand::SetSpeed(7)))
        );
    }

    #[test]
    fn overflow_abandons_command() {
        let mut parser = CommandParser::new();
        parser.push(b'@');
        for _ in 0..MAX_COMMAND_LEN - 1 {
            assert_eq!(parser.push(b'1'), None);
        }
        assert_eq!(parser.buffered().len(), MAX_COMMAND_LEN);
        assert_eq!(
            parser.push(b'1'),
            Some(ParseEvent::Ignored(IgnoreReason::Overflow))
        );
        assert!(!parser.is_receiving());
        assert!(parser.buffered().is_empty());

        // Remaining bytes of the long line and its terminator are dropped
        assert_eq!(feed(&mut parser, b"2345\r\n"), None);
    }

    #[test]
    fn ingest_updates_target_only_on_valid_command() {
        let target = ControlTarget::new();
        let mut ingest = CommandIngest::new(&target);

        for &b in b"@speed%300\n" {
            ingest.on_byte(b);
        }
        let applied = target.snapshot();
        assert_eq!(applied.target_speed, 300);

        for &b in b"@speed%\n@speed%abc\n@other\n" {
            ingest.on_byte(b);
        }
        assert_eq!(target.snapshot(), applied);
    }

    #[test]
    fn ingest_drains_serial() {
        let target = ControlTarget::new();
        let mut ingest = CommandIngest::new(&target);
        let mut rx = MockSerialRx::new();
        rx.queue(b"@speed%10\n@speed%20\n@speed%\n");

        assert_eq!(ingest.drain(&mut rx), 2);
        assert_eq!(target.target_speed(), 20);
        assert_eq!(ingest.drain(&mut rx), 0);
    }
}
