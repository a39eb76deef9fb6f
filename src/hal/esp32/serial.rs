//! UART host link for ESP32.
//!
//! One UART carries both directions: host commands in, telemetry out. The
//! driver is split so the receive half can live in the ingestion thread and
//! the transmit half in the control thread.

use crate::traits::{SerialRx, TelemetryPort};
use esp_idf_hal::delay::NON_BLOCK;
use esp_idf_hal::uart::{UartDriver, UartRxDriver, UartTxDriver};

/// Splits a configured UART into its telemetry and receive halves.
///
/// # Example
///
/// ```ignore
/// use esp_idf_hal::uart::{config::Config, UartDriver};
/// use esp_idf_hal::prelude::*;
/// use rs_twinmotor::hal::esp32::split_uart;
///
/// let uart = UartDriver::new(
///     peripherals.uart1,
///     peripherals.pins.gpio21,
///     peripherals.pins.gpio20,
///     Option::<AnyIOPin>::None,
///     Option::<AnyIOPin>::None,
///     &Config::default().baudrate(115_200.Hz()),
/// )?;
/// let (telemetry, rx) = split_uart(uart);
/// ```
pub fn split_uart(uart: UartDriver<'_>) -> (Esp32Telemetry<'_>, Esp32SerialRx<'_>) {
    let (tx, rx) = uart.into_split();
    (Esp32Telemetry { tx }, Esp32SerialRx { rx })
}

/// Transmit half, used for telemetry.
pub struct Esp32Telemetry<'d> {
    tx: UartTxDriver<'d>,
}

impl TelemetryPort for Esp32Telemetry<'_> {
    type Error = esp_idf_hal::sys::EspError;

    fn is_busy(&self) -> bool {
        // Zero timeout: a poll of the transmit-done state, never a wait
        self.tx.wait_done(NON_BLOCK).is_err()
    }

    fn write_line(&mut self, line: &str) -> Result<(), Self::Error> {
        let mut bytes = line.as_bytes();
        while !bytes.is_empty() {
            let written = self.tx.write(bytes)?;
            bytes = &bytes[written..];
        }
        Ok(())
    }
}

/// Receive half, feeding command ingestion.
pub struct Esp32SerialRx<'d> {
    rx: UartRxDriver<'d>,
}

impl SerialRx for Esp32SerialRx<'_> {
    fn try_read(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match self.rx.read(&mut byte, NON_BLOCK) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }
}

impl Esp32SerialRx<'_> {
    /// Blocks up to `timeout` ticks for one byte.
    pub fn read_timeout(&mut self, timeout: u32) -> Option<u8> {
        let mut byte = [0u8; 1];
        match self.rx.read(&mut byte, timeout) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }
}
