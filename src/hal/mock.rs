//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware traits, enabling
//! development and testing on desktop without physical hardware.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockMotor`] | [`MotorDriver`] | Tracks direction/duty writes |
//! | [`MockCounter`] | [`QuadratureCounter`] | Settable wrapping 16-bit counter |
//! | [`MockTelemetry`] | [`TelemetryPort`] | Captures lines, simulates a busy port |
//! | [`MockSerialRx`] | [`SerialRx`] | Queued received bytes |
//! | [`MockButton`] | [`Button`] | Queued debounced presses |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//! | [`MockDisplay`] | [`StatusDisplay`] | Tracks what was shown |
//!
//! # Example
//!
//! ```rust
//! use rs_twinmotor::hal::{MockCounter, MockMotor, MockTelemetry};
//! use rs_twinmotor::{Axis, AxisId, ControlConfig, ControlLink, ControlLoop, Direction};
//!
//! let link = ControlLink::new();
//! let config = ControlConfig::default();
//! let axis1 = Axis::new(MockCounter::new(), MockMotor::new(), config.encoder_scale);
//! let axis2 = Axis::new(MockCounter::new(), MockMotor::new(), config.encoder_scale);
//! let mut control = ControlLoop::new(axis1, axis2, MockTelemetry::new(), &link, &config);
//!
//! link.target.set_target_speed(300);
//! control.tick().unwrap();
//!
//! // Verify via the mock's public fields
//! let motor = control.axis(AxisId::Axis1).motor();
//! assert_eq!(motor.direction, Direction::Forward);
//! assert_eq!(motor.duty, 800);
//! ```
//!
//! [`MotorDriver`]: crate::traits::MotorDriver
//! [`QuadratureCounter`]: crate::traits::QuadratureCounter
//! [`TelemetryPort`]: crate::traits::TelemetryPort
//! [`SerialRx`]: crate::traits::SerialRx
//! [`Button`]: crate::traits::Button
//! [`Clock`]: crate::traits::Clock
//! [`StatusDisplay`]: crate::traits::StatusDisplay

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;

use crate::mode::SystemMode;
use crate::traits::{
    Button, Clock, Direction, MotorDriver, QuadratureCounter, SerialRx, StatusDisplay,
    TelemetryPort,
};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock motor driver for testing.
///
/// Records every write for verification. Use the public fields to inspect
/// state after test operations.
///
/// # Example
///
/// ```rust
/// use rs_twinmotor::hal::MockMotor;
/// use rs_twinmotor::traits::{MotorDriver, Direction};
///
/// let mut motor = MockMotor::new();
/// motor.drive(Direction::Reverse, 250).unwrap();
///
/// assert_eq!(motor.duty, 250);
/// assert_eq!(motor.lines(), (false, true));
/// assert_eq!(motor.call_count, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockMotor {
    /// Current direction.
    pub direction: Direction,
    /// Current PWM duty (0 to 1000).
    pub duty: u16,
    /// Number of times `drive` was called.
    pub call_count: usize,
    /// Every write, oldest first.
    pub history: Vec<(Direction, u16)>,
    /// When set, `drive` fails without changing state.
    pub fail: bool,
}

impl MockMotor {
    /// Creates a new stopped mock motor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock motor whose writes fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Levels of the direction-GPIO pair.
    pub fn lines(&self) -> (bool, bool) {
        self.direction.lines()
    }

    /// Signed view of the current output.
    pub fn signed(&self) -> i16 {
        match self.direction {
            Direction::Forward => self.duty as i16,
            Direction::Reverse => -(self.duty as i16),
            Direction::Stopped => 0,
        }
    }
}

impl MotorDriver for MockMotor {
    type Error = ();

    fn drive(&mut self, direction: Direction, duty: u16) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.direction = direction;
        self.duty = duty;
        self.call_count += 1;
        self.history.push((direction, duty));
        Ok(())
    }
}

/// Mock quadrature counter for testing.
///
/// Holds a raw 16-bit count that wraps like the hardware timer.
///
/// # Example
///
/// ```rust
/// use rs_twinmotor::hal::MockCounter;
/// use rs_twinmotor::traits::QuadratureCounter;
///
/// let mut counter = MockCounter::starting_at(32_700);
/// counter.advance(100);
/// assert_eq!(counter.raw_count(), -32_736);
/// ```
#[derive(Debug, Default)]
pub struct MockCounter {
    /// Raw counter value.
    pub raw: i16,
    /// Number of times the counter was read.
    pub reads: usize,
}

impl MockCounter {
    /// Creates a counter at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a counter at the given raw value.
    pub fn starting_at(raw: i16) -> Self {
        Self { raw, reads: 0 }
    }

    /// Sets the raw value.
    pub fn set(&mut self, raw: i16) {
        self.raw = raw;
    }

    /// Moves the counter by `delta` counts, wrapping at 16 bits.
    pub fn advance(&mut self, delta: i16) {
        self.raw = self.raw.wrapping_add(delta);
    }
}

impl QuadratureCounter for MockCounter {
    fn raw_count(&mut self) -> i16 {
        self.reads += 1;
        self.raw
    }
}

/// Mock telemetry port for testing.
///
/// # Example
///
/// ```rust
/// use rs_twinmotor::hal::MockTelemetry;
/// use rs_twinmotor::traits::TelemetryPort;
///
/// let mut port = MockTelemetry::new();
/// port.write_line("12,10\n").unwrap();
/// assert_eq!(port.lines, ["12,10\n"]);
///
/// port.busy = true;
/// assert!(port.is_busy());
/// ```
#[derive(Debug, Default)]
pub struct MockTelemetry {
    /// Reported by `is_busy`.
    pub busy: bool,
    /// When set, `write_line` fails.
    pub fail_writes: bool,
    /// Lines written, oldest first.
    pub lines: Vec<String>,
}

impl MockTelemetry {
    /// Creates an idle port.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TelemetryPort for MockTelemetry {
    type Error = ();

    fn is_busy(&self) -> bool {
        self.busy
    }

    fn write_line(&mut self, line: &str) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        self.lines.push(line.into());
        Ok(())
    }
}

/// Mock serial receiver for testing.
///
/// Bytes come out in the order they were queued.
#[derive(Debug, Default)]
pub struct MockSerialRx {
    pending: VecDeque<u8>,
}

impl MockSerialRx {
    /// Creates a receiver with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue received bytes.
    pub fn queue(&mut self, bytes: &[u8]) {
        self.pending.extend(bytes.iter().copied());
    }

    /// Bytes not yet read.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl SerialRx for MockSerialRx {
    fn try_read(&mut self) -> Option<u8> {
        self.pending.pop_front()
    }
}

/// Mock push button for testing.
///
/// Each queued press is reported by exactly one `pressed_edge` call.
#[derive(Debug, Default)]
pub struct MockButton {
    presses: usize,
}

impl MockButton {
    /// Creates a button with no pending presses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate one debounced press.
    pub fn press(&mut self) {
        self.presses += 1;
    }
}

impl Button for MockButton {
    fn pressed_edge(&mut self) -> bool {
        if self.presses == 0 {
            return false;
        }
        self.presses -= 1;
        true
    }
}

/// Mock clock for testing.
///
/// Provides a controllable time source for testing time-dependent behavior.
///
/// # Example
///
/// ```rust
/// use rs_twinmotor::hal::MockClock;
/// use rs_twinmotor::traits::Clock;
///
/// let mut clock = MockClock::new();
/// clock.set(1000);
/// clock.advance(10);
/// assert_eq!(clock.now_ms(), 1010);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}

/// Mock status display for testing.
#[derive(Debug, Default)]
pub struct MockDisplay {
    /// Whether `init` was called.
    pub initialized: bool,
    /// Mode last shown.
    pub mode: Option<SystemMode>,
    /// Last message shown (line1, line2).
    pub last_message: Option<(String, Option<String>)>,
    /// Number of `show_mode` calls.
    pub render_count: usize,
}

impl MockDisplay {
    /// Creates a blank, uninitialized display.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusDisplay for MockDisplay {
    type Error = ();

    fn init(&mut self) -> Result<(), ()> {
        self.initialized = true;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ()> {
        self.mode = None;
        self.last_message = None;
        Ok(())
    }

    fn show_mode(&mut self, mode: SystemMode) -> Result<(), ()> {
        self.mode = Some(mode);
        self.render_count += 1;
        Ok(())
    }

    fn show_message(&mut self, line1: &str, line2: Option<&str>) -> Result<(), ()> {
        self.last_message = Some((line1.into(), line2.map(Into::into)));
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // MockMotor Tests
    // =========================================================================

    #[test]
    fn mock_motor_default() {
        let motor = MockMotor::new();
        assert_eq!(motor.direction, Direction::Stopped);
        assert_eq!(motor.duty, 0);
        assert_eq!(motor.call_count, 0);
        assert!(motor.history.is_empty());
    }

    #[test]
    fn mock_motor_records_history() {
        let mut motor = MockMotor::new();
        motor.drive(Direction::Forward, 400).unwrap();
        motor.stop().unwrap();

        assert_eq!(motor.call_count, 2);
        assert_eq!(
            motor.history,
            [(Direction::Forward, 400), (Direction::Stopped, 0)]
        );
        assert_eq!(motor.signed(), 0);
    }

    #[test]
    fn mock_motor_failing() {
        let mut motor = MockMotor::failing();
        assert!(motor.drive(Direction::Forward, 100).is_err());
        assert_eq!(motor.call_count, 0);
        assert_eq!(motor.duty, 0);
    }

    // =========================================================================
    // MockCounter Tests
    // =========================================================================

    #[test]
    fn mock_counter_wraps() {
        let mut counter = MockCounter::starting_at(-32_760);
        counter.advance(-10);
        assert_eq!(counter.raw_count(), 32_766);
        assert_eq!(counter.reads, 1);
    }

    #[test]
    fn mock_counter_set() {
        let mut counter = MockCounter::new();
        counter.set(1234);
        assert_eq!(counter.raw_count(), 1234);
    }

    // =========================================================================
    // MockTelemetry / MockSerialRx / MockButton Tests
    // =========================================================================

    #[test]
    fn mock_telemetry_fail_writes() {
        let mut port = MockTelemetry::new();
        port.fail_writes = true;
        assert!(port.write_line("1,2\n").is_err());
        assert!(port.lines.is_empty());
    }

    #[test]
    fn mock_serial_fifo_order() {
        let mut rx = MockSerialRx::new();
        rx.queue(b"ab");
        rx.queue(b"c");
        assert_eq!(rx.pending(), 3);
        assert_eq!(rx.try_read(), Some(b'a'));
        assert_eq!(rx.try_read(), Some(b'b'));
        assert_eq!(rx.try_read(), Some(b'c'));
        assert_eq!(rx.try_read(), None);
    }

    #[test]
    fn mock_button_consumes_presses() {
        let mut button = MockButton::new();
        assert!(!button.pressed_edge());
        button.press();
        assert!(button.pressed_edge());
        assert!(!button.pressed_edge());
    }

    // =========================================================================
    // MockClock Tests
    // =========================================================================

    #[test]
    fn mock_clock_advance() {
        let mut clock = MockClock::new();
        clock.advance(500);
        assert_eq!(clock.now_ms(), 500);
        clock.advance(250);
        assert_eq!(clock.now_ms(), 750);
    }

    // =========================================================================
    // MockDisplay Tests
    // =========================================================================

    #[test]
    fn mock_display_show_mode() {
        let mut display = MockDisplay::new();
        display.init().unwrap();
        display.show_mode(SystemMode::PositionFollowing).unwrap();

        assert!(display.initialized);
        assert_eq!(display.mode, Some(SystemMode::PositionFollowing));
        assert_eq!(display.render_count, 1);
    }

    #[test]
    fn mock_display_show_message_and_clear() {
        let mut display = MockDisplay::new();
        display.show_message("Hello", Some("World")).unwrap();

        let (line1, line2) = display.last_message.as_ref().unwrap();
        assert_eq!(line1, "Hello");
        assert_eq!(line2.as_deref(), Some("World"));

        display.clear().unwrap();
        assert!(display.last_message.is_none());
        assert!(display.mode.is_none());
    }
}
