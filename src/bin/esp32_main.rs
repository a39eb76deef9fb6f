//! ESP32-C3 twin-motor controller.
//!
//! This is the main entry point for the physical hardware controller.
//! It runs three contexts, highest priority first in intent:
//! - Serial ingestion: parses `@speed%<n>` lines from the host
//! - Control: the 10ms [`ControlLoop`] tick (encoders, PID, pulse follower, telemetry)
//! - Foreground: the mode button and the OLED (if enabled)
//!
//! Both encoders are decoded in software from GPIO edge interrupts, since the
//! C3 has no pulse counter.
//!
//! # Build
//!
//! ```bash
//! cargo build --release --features esp32
//!
//! # With display
//! cargo build --release --features esp32,display
//! ```

use esp_idf_hal::gpio::{AnyIOPin, IOPin, OutputPin};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};
use rs_twinmotor::hal::esp32::{split_uart, Esp32Button, Esp32Clock, Esp32Motor, Esp32Quadrature};
use rs_twinmotor::{
    Axis, CommandIngest, Config, ControlLink, ControlLoop, ModeSwitch, SystemMode, TickPacer,
    TICK_PERIOD_MS,
};
use std::thread;
use std::time::Duration;

/// Everything the control tick reads from the other contexts.
static LINK: ControlLink = ControlLink::new();

/// Foreground loop interval in milliseconds
const FOREGROUND_INTERVAL_MS: u64 = 10;

/// Receive timeout per byte, in RTOS ticks
const RX_TIMEOUT_TICKS: u32 = 10;

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    let config = Config::default();

    println!();
    println!("================================");
    println!("  {} controller", config.device.name);
    println!("================================");
    println!();

    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    // =========================================================================
    // Motors (H-bridge channels A and B)
    // =========================================================================
    let motor1 = Esp32Motor::new(
        pins.gpio2,
        pins.gpio3.downgrade_output(),
        pins.gpio4.downgrade_output(),
        peripherals.ledc.timer0,
        peripherals.ledc.channel0,
    )?;
    let motor2 = Esp32Motor::new(
        pins.gpio5,
        pins.gpio6.downgrade_output(),
        pins.gpio7.downgrade_output(),
        peripherals.ledc.timer1,
        peripherals.ledc.channel1,
    )?;
    println!("[OK] Motors initialized (GPIO2-7)");

    // =========================================================================
    // Encoders (software quadrature, decoded in the GPIO interrupt)
    // =========================================================================
    // Decoding stops when these drop; they live as long as main
    let decoder1 = Esp32Quadrature::new(pins.gpio0.downgrade(), pins.gpio1.downgrade())?;
    let decoder2 = Esp32Quadrature::new(pins.gpio18.downgrade(), pins.gpio19.downgrade())?;
    let counter1 = decoder1.handle();
    let counter2 = decoder2.handle();
    println!("[OK] Encoders initialized (GPIO0/1, GPIO18/19)");

    // =========================================================================
    // Host link (UART0)
    // =========================================================================
    let uart = UartDriver::new(
        peripherals.uart0,
        pins.gpio21,
        pins.gpio20,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::default().baudrate(Hertz(config.serial.baud_rate)),
    )?;
    let (telemetry, mut rx) = split_uart(uart);
    println!("[OK] Host link on UART0 at {} baud", config.serial.baud_rate);

    // =========================================================================
    // Mode button (BOOT on GPIO9)
    // =========================================================================
    let button = Esp32Button::new(pins.gpio9.downgrade(), config.button.debounce_ms)?;
    let mut mode_switch = ModeSwitch::new(button);

    // =========================================================================
    // Display (SSD1306 on GPIO8/10) - Optional
    // =========================================================================
    #[cfg(feature = "display")]
    let mut display = {
        use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
        use rs_twinmotor::hal::esp32::Esp32Display;
        use rs_twinmotor::traits::StatusDisplay;

        let i2c = I2cDriver::new(
            peripherals.i2c0,
            pins.gpio8,  // SDA
            pins.gpio10, // SCL
            &I2cConfig::new().baudrate(400.kHz().into()),
        )?;

        let mut disp = Esp32Display::new(i2c);
        disp.init()
            .map_err(|e| anyhow::anyhow!("Display init failed: {:?}", e))?;
        let _ = disp.show_message(config.device.name.as_str(), Some("Starting..."));
        println!("[OK] Display initialized (GPIO8/10 I2C)");
        disp
    };

    // =========================================================================
    // Serial ingestion thread
    // =========================================================================
    thread::Builder::new()
        .name("ingest".into())
        .stack_size(4096)
        .spawn(move || {
            let mut ingest = CommandIngest::new(&LINK.target);
            loop {
                // Sleep until a byte arrives, then take whatever else is buffered
                if let Some(byte) = rx.read_timeout(RX_TIMEOUT_TICKS) {
                    ingest.on_byte(byte);
                    ingest.drain(&mut rx);
                }
            }
        })?;

    // =========================================================================
    // Control thread (10ms tick)
    // =========================================================================
    let control_config = config.control.clone();
    thread::Builder::new()
        .name("control".into())
        .stack_size(8192)
        .spawn(move || {
            let axis1 = Axis::new(counter1, motor1, control_config.encoder_scale);
            let axis2 = Axis::new(counter2, motor2, control_config.encoder_scale);
            let mut control = ControlLoop::new(axis1, axis2, telemetry, &LINK, &control_config);

            let clock = Esp32Clock::new();
            let mut pacer = TickPacer::new(&clock, u64::from(TICK_PERIOD_MS));
            loop {
                if let Err(e) = control.tick() {
                    log::warn!("motor write failed: {:?}", e);
                }

                let delay = pacer.delay_ms(&clock);
                if delay > 0 {
                    thread::sleep(Duration::from_millis(delay));
                }
            }
        })?;

    #[cfg(feature = "display")]
    {
        use rs_twinmotor::traits::StatusDisplay;
        let _ = display.show_mode(SystemMode::VelocityControl);
    }

    println!();
    println!("Controls:");
    println!("  Host:   @speed%<n> sets the motor 1 velocity target");
    println!(
        "  Button: toggle {} / {}",
        SystemMode::VelocityControl.label(),
        SystemMode::PositionFollowing.label()
    );
    println!();

    // =========================================================================
    // Foreground loop
    // =========================================================================
    loop {
        if let Some(mode) = mode_switch.poll(&LINK.mode) {
            println!("Mode:{} {}", mode.number(), mode.label());

            #[cfg(feature = "display")]
            {
                use rs_twinmotor::traits::StatusDisplay;
                let _ = display.show_mode(mode);
            }
        }

        thread::sleep(Duration::from_millis(FOREGROUND_INTERVAL_MS));
    }
}
