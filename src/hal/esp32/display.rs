//! SSD1306 OLED status display for ESP32.
//!
//! Shows the active control mode the way the bench unit always has:
//!
//! ```text
//! ┌────────────────────────────┐
//! │Mode:1                      │
//! │Speed Control               │
//! └────────────────────────────┘
//! ```
//!
//! # Wiring
//!
//! - SDA → GPIO8
//! - SCL → GPIO10
//! - VCC → 3.3V
//! - GND → GND

use core::fmt::Write as _;

use crate::traits::StatusDisplay;
use crate::SystemMode;
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::Text,
};
use esp_idf_hal::i2c::I2cDriver;
use ssd1306::{mode::BufferedGraphicsMode, prelude::*, I2CDisplayInterface, Ssd1306};

/// SSD1306 display type alias for cleaner code.
type DisplayDriver<'d> = Ssd1306<
    I2CInterface<I2cDriver<'d>>,
    DisplaySize128x64,
    BufferedGraphicsMode<DisplaySize128x64>,
>;

/// SSD1306 OLED display for ESP32.
pub struct Esp32Display<'d> {
    display: DisplayDriver<'d>,
}

impl<'d> Esp32Display<'d> {
    /// Creates a new display instance.
    ///
    /// # Arguments
    ///
    /// * `i2c` - I2C driver wired to the OLED
    pub fn new(i2c: I2cDriver<'d>) -> Self {
        let interface = I2CDisplayInterface::new(i2c);
        let display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();

        Self { display }
    }

    fn draw_lines(&mut self, line1: &str, line2: Option<&str>) -> Result<(), DisplayError> {
        self.display.clear(BinaryColor::Off)?;

        let text_style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        Text::new(line1, Point::new(0, 10), text_style).draw(&mut self.display)?;
        if let Some(l2) = line2 {
            Text::new(l2, Point::new(0, 26), text_style).draw(&mut self.display)?;
        }

        self.display.flush()?;
        Ok(())
    }
}

impl StatusDisplay for Esp32Display<'_> {
    type Error = DisplayError;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.display.init()?;
        self.clear()
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.display.clear(BinaryColor::Off)?;
        self.display.flush()?;
        Ok(())
    }

    fn show_mode(&mut self, mode: SystemMode) -> Result<(), Self::Error> {
        let mut header: heapless::String<8> = heapless::String::new();
        let _ = write!(header, "Mode:{}", mode.number());
        self.draw_lines(&header, Some(mode.label()))
    }

    fn show_message(&mut self, line1: &str, line2: Option<&str>) -> Result<(), Self::Error> {
        self.draw_lines(line1, line2)
    }
}

/// Display error type.
#[derive(Debug)]
pub struct DisplayError;

impl From<display_interface::DisplayError> for DisplayError {
    fn from(_: display_interface::DisplayError) -> Self {
        DisplayError
    }
}
