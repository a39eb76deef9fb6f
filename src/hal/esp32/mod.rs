//! ESP32-C3 hardware abstraction layer for the twin-motor controller.
//!
//! This module provides hardware implementations for an ESP32-C3 DevKitM-1
//! driving two encoder-equipped DC gear motors through a dual H-bridge.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-C3 (RISC-V 160MHz)
//! - **Motor Driver**: dual H-bridge (TB6612FNG), PWM + IN1/IN2 per channel
//! - **Encoders**: two-channel incremental encoders on the motor shafts
//! - **Host link**: UART0 through the on-board USB bridge
//! - **Button**: the BOOT button, reused as the mode button
//! - **Display**: SSD1306 128x64 OLED (I2C, optional)
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments.

mod button;
mod clock;
mod motor;
mod quadrature;
mod serial;

pub use button::Esp32Button;
pub use clock::Esp32Clock;
pub use motor::Esp32Motor;
pub use quadrature::{Esp32CounterHandle, Esp32Quadrature};
pub use serial::{split_uart, Esp32SerialRx, Esp32Telemetry};

#[cfg(feature = "display")]
mod display;
#[cfg(feature = "display")]
pub use display::{DisplayError, Esp32Display};

/// Pin assignments for the ESP32-C3 DevKitM-1.
///
/// GPIO20/21 stay on UART0 for the host link.
pub mod pins {
    // =========================================================================
    // Motor 1 (H-bridge channel A)
    // =========================================================================

    /// Motor 1 PWM (PWMA)
    pub const M1_PWM: i32 = 2;

    /// Motor 1 direction line 1 (AIN1)
    pub const M1_IN1: i32 = 3;

    /// Motor 1 direction line 2 (AIN2)
    pub const M1_IN2: i32 = 4;

    // =========================================================================
    // Motor 2 (H-bridge channel B)
    // =========================================================================

    /// Motor 2 PWM (PWMB)
    pub const M2_PWM: i32 = 5;

    /// Motor 2 direction line 1 (BIN1)
    pub const M2_IN1: i32 = 6;

    /// Motor 2 direction line 2 (BIN2)
    pub const M2_IN2: i32 = 7;

    // =========================================================================
    // Encoders
    // =========================================================================

    /// Encoder 1 channel A
    pub const ENC1_A: i32 = 0;

    /// Encoder 1 channel B
    pub const ENC1_B: i32 = 1;

    /// Encoder 2 channel A
    pub const ENC2_A: i32 = 18;

    /// Encoder 2 channel B
    pub const ENC2_B: i32 = 19;

    // =========================================================================
    // Operator I/O
    // =========================================================================

    /// Mode button (BOOT, active low)
    pub const MODE_BUTTON: i32 = 9;

    /// Host link transmit (UART0)
    pub const UART_TX: i32 = 21;

    /// Host link receive (UART0)
    pub const UART_RX: i32 = 20;

    /// I2C data line
    pub const I2C_SDA: i32 = 8;

    /// I2C clock line
    pub const I2C_SCL: i32 = 10;

    /// Default I2C address for SSD1306 OLED
    pub const OLED_I2C_ADDR: u8 = 0x3C;
}
