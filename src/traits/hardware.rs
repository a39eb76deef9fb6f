//! Hardware abstraction traits for motors, encoders, serial and button input.
//!
//! This module defines the core hardware interfaces that allow rs-twinmotor to
//! work across different platforms (ESP32, desktop mocks, etc.). Peripheral
//! setup happens in the implementations' constructors; the control core only
//! reads and writes through these traits and never reconfigures hardware.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`MotorDriver`] | Direction-pair + PWM duty DC motor output |
//! | [`QuadratureCounter`] | Free-running 16-bit encoder counter |
//! | [`TelemetryPort`] | Serial transmit with a non-blocking busy poll |
//! | [`SerialRx`] | Serial receive, one byte at a time |
//! | [`Button`] | Debounced push-button edge |
//! | [`Clock`] | Time source for `no_std` environments |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use rs_twinmotor::traits::{MotorDriver, Direction};
//! use rs_twinmotor::hal::MockMotor;
//!
//! let mut motor = MockMotor::new();
//! motor.drive(Direction::Forward, 400).unwrap();
//! assert_eq!(motor.duty, 400);
//!
//! motor.stop().unwrap();
//! assert_eq!(motor.direction, Direction::Stopped);
//! ```

/// Direction of motor rotation.
///
/// Selects which line of the motor's direction-GPIO pair is driven high.
///
/// # Default
///
/// Defaults to [`Stopped`](Self::Stopped) for safety.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Positive command: first line high, second low.
    Forward,
    /// Negative command: first line low, second high.
    Reverse,
    /// Zero command: both lines low.
    #[default]
    Stopped,
}

impl Direction {
    /// Levels of the direction-GPIO pair `(in1, in2)` for this direction.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_twinmotor::Direction;
    ///
    /// assert_eq!(Direction::Forward.lines(), (true, false));
    /// assert_eq!(Direction::Reverse.lines(), (false, true));
    /// assert_eq!(Direction::Stopped.lines(), (false, false));
    /// ```
    #[inline]
    pub const fn lines(&self) -> (bool, bool) {
        match self {
            Direction::Forward => (true, false),
            Direction::Reverse => (false, true),
            Direction::Stopped => (false, false),
        }
    }

    /// Direction implied by the sign of a command.
    #[inline]
    pub const fn from_command(command: i16) -> Self {
        if command > 0 {
            Direction::Forward
        } else if command < 0 {
            Direction::Reverse
        } else {
            Direction::Stopped
        }
    }
}

/// Motor driver trait - abstracts a DC motor behind a direction pair and PWM.
///
/// Implement this trait for your motor driver hardware. Commands arrive
/// already shaped by the [`ActuationGate`](crate::ActuationGate): `duty` is
/// an unsigned magnitude in `0..=1000` and `direction` is consistent with it
/// (`Stopped` always comes with duty 0).
///
/// # Example Implementation
///
/// ```rust,ignore
/// use rs_twinmotor::traits::{MotorDriver, Direction};
///
/// struct MyMotor { /* hardware handles */ }
///
/// impl MotorDriver for MyMotor {
///     type Error = ();
///
///     fn drive(&mut self, direction: Direction, duty: u16) -> Result<(), ()> {
///         let (in1, in2) = direction.lines();
///         // Set direction pins, then compare register...
///         Ok(())
///     }
/// }
/// ```
pub trait MotorDriver {
    /// Error type for motor operations.
    type Error;

    /// Apply a direction and a PWM duty in `0..=1000`.
    fn drive(&mut self, direction: Direction, duty: u16) -> Result<(), Self::Error>;

    /// Convenience method to stop the motor.
    ///
    /// Both direction lines low, duty 0.
    fn stop(&mut self) -> Result<(), Self::Error> {
        self.drive(Direction::Stopped, 0)
    }
}

/// Quadrature encoder counter trait.
///
/// Abstracts a timer peripheral in encoder mode: a free-running counter
/// that wraps at 16 bits. The value is reinterpreted as signed so the
/// tracker can do its difference in 16-bit arithmetic.
pub trait QuadratureCounter {
    /// Current raw counter value.
    fn raw_count(&mut self) -> i16;
}

/// Serial transmit channel used for telemetry.
///
/// # Implementation Notes
///
/// - `is_busy()` must be a bounded, non-blocking check (e.g. the
///   transmit-complete flag), never a wait
/// - `write_line()` may block for the duration of the line itself
pub trait TelemetryPort {
    /// Error type for transmit operations.
    type Error;

    /// Returns true while a previous transmission is still in flight.
    fn is_busy(&self) -> bool;

    /// Transmit one already formatted line, including its terminator.
    fn write_line(&mut self, line: &str) -> Result<(), Self::Error>;
}

/// Serial receive channel feeding command ingestion.
pub trait SerialRx {
    /// Returns the next received byte, if any. Never blocks.
    fn try_read(&mut self) -> Option<u8>;
}

/// Debounced push-button trait.
///
/// The implementation owns its debounce delay. Only the foreground loop
/// polls it.
pub trait Button {
    /// Returns true once per debounced press (released -> pressed edge).
    fn pressed_edge(&mut self) -> bool;
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds for debounce and loop pacing.
/// On desktop, this can wrap `std::time::Instant`. On embedded,
/// use a hardware timer.
///
/// # Example
///
/// ```rust
/// use rs_twinmotor::traits::Clock;
/// use rs_twinmotor::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}
