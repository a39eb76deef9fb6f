//! H-bridge motor driver using ESP32 LEDC PWM and two direction GPIOs.
//!
//! Each motor is wired to a dual H-bridge channel (TB6612/L298 style):
//! - PWM: speed, from an LEDC channel
//! - IN1/IN2: direction pair
//!
//! Control logic:
//! - Forward: IN1 high, IN2 low, PWM = duty
//! - Reverse: IN1 low, IN2 high, PWM = duty
//! - Stopped: both low, PWM = 0

use crate::traits::{Direction, MotorDriver};
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;

/// One H-bridge channel for ESP32.
///
/// Uses the LEDC peripheral for PWM generation at 20kHz with 10-bit
/// resolution. Commands arrive in `0..=1000` and are rescaled to the
/// channel's maximum duty.
///
/// # Example
///
/// ```ignore
/// use esp_idf_hal::gpio::OutputPin;
/// use rs_twinmotor::hal::esp32::Esp32Motor;
/// use rs_twinmotor::traits::{MotorDriver, Direction};
///
/// let peripherals = Peripherals::take()?;
/// let mut motor = Esp32Motor::new(
///     peripherals.pins.gpio2,
///     peripherals.pins.gpio4.downgrade_output(),
///     peripherals.pins.gpio5.downgrade_output(),
///     peripherals.ledc.timer0,
///     peripherals.ledc.channel0,
/// )?;
///
/// motor.drive(Direction::Forward, 500)?; // half duty
/// ```
pub struct Esp32Motor<'d> {
    pwm: LedcDriver<'d>,
    in1: PinDriver<'d, AnyOutputPin, Output>,
    in2: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> Esp32Motor<'d> {
    /// PWM frequency in Hz (20kHz is above audible range)
    const PWM_FREQ_HZ: u32 = 20_000;

    /// PWM resolution (10-bit = 1024 steps)
    const PWM_RESOLUTION: Resolution = Resolution::Bits10;

    /// Full-scale command from the actuation gate
    const COMMAND_FULL_SCALE: u32 = 1000;

    /// Creates a motor channel, initially stopped.
    ///
    /// # Arguments
    ///
    /// * `pwm_pin` - GPIO for the bridge's PWM input
    /// * `in1` - first direction line
    /// * `in2` - second direction line
    /// * `timer` - LEDC timer peripheral
    /// * `channel` - LEDC channel for the PWM
    ///
    /// # Errors
    ///
    /// Returns an error if PWM or GPIO initialization fails.
    pub fn new<T, TI, C, CI, P, PI>(
        pwm_pin: P,
        in1: AnyOutputPin,
        in2: AnyOutputPin,
        timer: T,
        channel: C,
    ) -> Result<Self, esp_idf_hal::sys::EspError>
    where
        TI: esp_idf_hal::ledc::LedcTimer + 'd,
        T: Peripheral<P = TI> + 'd,
        CI: esp_idf_hal::ledc::LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
        C: Peripheral<P = CI> + 'd,
        PI: esp_idf_hal::gpio::OutputPin + 'd,
        P: Peripheral<P = PI> + 'd,
    {
        let timer_config = TimerConfig::default()
            .frequency(Self::PWM_FREQ_HZ.Hz())
            .resolution(Self::PWM_RESOLUTION);
        let timer_driver = LedcTimerDriver::new(timer, &timer_config)?;
        let pwm = LedcDriver::new(channel, &timer_driver, pwm_pin)?;

        let mut motor = Self {
            pwm,
            in1: PinDriver::output(in1)?,
            in2: PinDriver::output(in2)?,
        };

        // Ensure motor starts stopped
        motor.stop()?;

        Ok(motor)
    }

    fn apply(
        &mut self,
        direction: Direction,
        duty: u16,
    ) -> Result<(), esp_idf_hal::sys::EspError> {
        let (in1, in2) = direction.lines();
        self.in1.set_level(in1.into())?;
        self.in2.set_level(in2.into())?;

        let max = self.pwm.get_max_duty();
        let duty = u32::from(duty).min(Self::COMMAND_FULL_SCALE) * max / Self::COMMAND_FULL_SCALE;
        self.pwm.set_duty(duty)
    }
}

impl MotorDriver for Esp32Motor<'_> {
    type Error = esp_idf_hal::sys::EspError;

    fn drive(&mut self, direction: Direction, duty: u16) -> Result<(), Self::Error> {
        let duty = if direction == Direction::Stopped { 0 } else { duty };
        self.apply(direction, duty)
    }
}
