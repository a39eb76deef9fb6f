//! Shared configuration system for desktop and ESP32.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`. Nothing here is persisted; every
//! boot starts from these defaults.
//!
//! The control period is fixed at [`TICK_PERIOD_MS`](crate::TICK_PERIOD_MS)
//! and is deliberately not part of the configuration.
//!
//! # Example
//!
//! ```rust
//! use rs_twinmotor::config::{Config, ControlConfig, SerialConfig};
//! use rs_twinmotor::PidGains;
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.serial.baud_rate, 115_200);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_control(ControlConfig::default().with_velocity_gains(PidGains::new(4.0, 1.0, 0.2)))
//!     .with_serial(SerialConfig::default().with_baud_rate(57_600));
//! ```

use heapless::String as HString;

use crate::encoder::DEFAULT_VELOCITY_SCALE;
use crate::pid::PidGains;

/// Maximum length for short config strings (device names)
pub const MAX_SHORT_STRING: usize = 32;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let take = s.len().min(MAX_SHORT_STRING);
    // Find valid UTF-8 boundary
    let valid_end = s
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Control loop tuning
    pub control: ControlConfig,
    /// Serial link settings
    pub serial: SerialConfig,
    /// Mode button settings
    pub button: ButtonConfig,
    /// Device identification
    pub device: DeviceConfig,
}

impl Config {
    /// Set control configuration
    pub fn with_control(mut self, control: ControlConfig) -> Self {
        self.control = control;
        self
    }

    /// Set serial configuration
    pub fn with_serial(mut self, serial: SerialConfig) -> Self {
        self.serial = serial;
        self
    }

    /// Set button configuration
    pub fn with_button(mut self, button: ButtonConfig) -> Self {
        self.button = button;
        self
    }

    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }
}

// ============================================================================
// Control Config
// ============================================================================

/// Control loop configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlConfig {
    /// Velocity PID gains
    pub velocity_gains: PidGains,
    /// Position controller gains (only `kp` takes effect)
    pub position_gains: PidGains,
    /// Raw encoder delta to velocity unit scale
    pub encoder_scale: f32,
    /// Telemetry send opportunity every N ticks
    pub telemetry_interval_ticks: u8,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            velocity_gains: PidGains::new(5.0, 1.5, 0.5),
            position_gains: PidGains::new(0.15, 0.01, 0.03),
            encoder_scale: DEFAULT_VELOCITY_SCALE,
            telemetry_interval_ticks: 3,
        }
    }
}

impl ControlConfig {
    /// Set the velocity PID gains
    pub fn with_velocity_gains(mut self, gains: PidGains) -> Self {
        self.velocity_gains = gains;
        self
    }

    /// Set the position controller gains
    pub fn with_position_gains(mut self, gains: PidGains) -> Self {
        self.position_gains = gains;
        self
    }

    /// Set the encoder scale factor
    pub fn with_encoder_scale(mut self, scale: f32) -> Self {
        self.encoder_scale = scale;
        self
    }

    /// Set the telemetry interval (0 is treated as 1)
    pub fn with_telemetry_interval_ticks(mut self, ticks: u8) -> Self {
        self.telemetry_interval_ticks = ticks.max(1);
        self
    }
}

// ============================================================================
// Serial Config
// ============================================================================

/// Serial link configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SerialConfig {
    /// Baud rate, 8N1, no flow control
    pub baud_rate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self { baud_rate: 115_200 }
    }
}

impl SerialConfig {
    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

// ============================================================================
// Button Config
// ============================================================================

/// Mode button configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ButtonConfig {
    /// Time the button must stay pressed to count
    pub debounce_ms: u32,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self { debounce_ms: 50 }
    }
}

impl ButtonConfig {
    /// Set the debounce delay
    pub fn with_debounce_ms(mut self, ms: u32) -> Self {
        self.debounce_ms = ms;
        self
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// Human-readable device name, shown at startup
    pub name: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: short_string("rs-twinmotor"),
        }
    }
}

impl DeviceConfig {
    /// Set the device name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }
}
