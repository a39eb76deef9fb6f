//! Debounced mode button for ESP32.
//!
//! The button pulls the GPIO low when pressed (internal pull-up). A
//! released-to-pressed edge is confirmed by re-reading after the debounce
//! delay, so only the foreground loop may poll it.

use crate::traits::Button;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, Input, PinDriver, Pull};

/// Active-low push button.
///
/// # Example
///
/// ```ignore
/// use rs_twinmotor::hal::esp32::Esp32Button;
/// use rs_twinmotor::traits::Button;
///
/// let mut button = Esp32Button::new(peripherals.pins.gpio9.into(), 50)?;
/// if button.pressed_edge() {
///     // toggle mode
/// }
/// ```
pub struct Esp32Button<'d> {
    pin: PinDriver<'d, AnyIOPin, Input>,
    debounce_ms: u32,
    was_pressed: bool,
}

impl<'d> Esp32Button<'d> {
    /// Configures the pin as a pulled-up input.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO initialization fails.
    pub fn new(pin: AnyIOPin, debounce_ms: u32) -> Result<Self, esp_idf_hal::sys::EspError> {
        let mut pin = PinDriver::input(pin)?;
        pin.set_pull(Pull::Up)?;
        let was_pressed = pin.is_low();
        Ok(Self {
            pin,
            debounce_ms,
            was_pressed,
        })
    }
}

impl Button for Esp32Button<'_> {
    fn pressed_edge(&mut self) -> bool {
        let pressed = self.pin.is_low();
        if !pressed {
            self.was_pressed = false;
            return false;
        }
        if self.was_pressed {
            return false;
        }

        FreeRtos::delay_ms(self.debounce_ms);
        if self.pin.is_low() {
            self.was_pressed = true;
            true
        } else {
            false
        }
    }
}
