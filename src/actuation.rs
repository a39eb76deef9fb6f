//! Actuation gate: turns a signed command into a direction and PWM duty.
//!
//! Applied in order:
//!
//! 1. Global clamp to ±1000.
//! 2. In [`SystemMode::PositionFollowing`]: clamp to ±200, then zero any
//!    magnitude below 120.
//! 3. In [`SystemMode::VelocityControl`]: zero any magnitude below 30.
//! 4. Sign selects the direction pair, magnitude becomes the duty.
//!
//! # Example
//!
//! ```rust
//! use rs_twinmotor::{ActuationGate, Direction, SystemMode};
//!
//! let out = ActuationGate::shape(-450, SystemMode::VelocityControl);
//! assert_eq!(out.direction, Direction::Reverse);
//! assert_eq!(out.duty, 450);
//!
//! // Below the position-mode dead-zone
//! let out = ActuationGate::shape(119, SystemMode::PositionFollowing);
//! assert_eq!(out.direction, Direction::Stopped);
//! assert_eq!(out.duty, 0);
//! ```

use crate::traits::{Direction, MotorDriver};
use crate::SystemMode;

/// Global command limit, equal to the PWM period.
pub const COMMAND_LIMIT: i16 = 1000;

/// Secondary limit while following position.
pub const POSITION_MODE_LIMIT: i16 = 200;

/// Magnitudes below this are zeroed while following position.
pub const POSITION_MODE_DEAD_ZONE: i16 = 120;

/// Magnitudes below this are zeroed under velocity control.
pub const VELOCITY_MODE_DEAD_ZONE: i16 = 30;

/// A shaped motor command, ready for the driver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorOutput {
    /// Direction pair to drive.
    pub direction: Direction,
    /// PWM duty in `0..=1000`.
    pub duty: u16,
}

impl MotorOutput {
    /// Both lines low, zero duty.
    pub const STOPPED: Self = Self {
        direction: Direction::Stopped,
        duty: 0,
    };

    /// Signed equivalent of this output.
    #[inline]
    pub fn signed(&self) -> i16 {
        match self.direction {
            Direction::Forward => self.duty as i16,
            Direction::Reverse => -(self.duty as i16),
            Direction::Stopped => 0,
        }
    }
}

/// Command shaping for both motors.
pub struct ActuationGate;

impl ActuationGate {
    /// Shape a signed command for the given mode.
    pub fn shape(command: i16, mode: SystemMode) -> MotorOutput {
        let mut command = command.clamp(-COMMAND_LIMIT, COMMAND_LIMIT);

        let dead_zone = match mode {
            SystemMode::PositionFollowing => {
                command = command.clamp(-POSITION_MODE_LIMIT, POSITION_MODE_LIMIT);
                POSITION_MODE_DEAD_ZONE
            }
            SystemMode::VelocityControl => VELOCITY_MODE_DEAD_ZONE,
        };
        if command.abs() < dead_zone {
            command = 0;
        }

        MotorOutput {
            direction: Direction::from_command(command),
            duty: command.unsigned_abs(),
        }
    }

    /// Shape a command and write it to a motor.
    pub fn apply<M: MotorDriver>(
        motor: &mut M,
        command: i16,
        mode: SystemMode,
    ) -> Result<MotorOutput, M::Error> {
        let output = Self::shape(command, mode);
        motor.drive(output.direction, output.duty)?;
        Ok(output)
    }
}
