//! # rs-twinmotor
//!
//! A two-axis DC motor controller: closed-loop velocity control of one motor,
//! or master/follower position synchronization of a pair, with the velocity
//! setpoint supplied over a serial line.
//!
//! ## Features
//!
//! - **Hardware abstraction**: Traits for motor drivers, quadrature counters, serial and buttons
//! - **Encoder tracking**: Wrap-corrected cumulative position and per-tick velocity
//! - **Incremental PID**: Velocity loop with a retained, clamped accumulator
//! - **Actuation gate**: Mode-dependent clamps and dead-zones before the PWM write
//! - **Lock-free setpoint link**: One atomic word carries the target and its reset request
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware abstractions
//! - `encoder` - Per-axis cumulative position and velocity
//! - `pid` - Velocity (incremental) and position (proportional) controllers
//! - `actuation` - Command shaping into direction + duty
//! - `shared` - State crossing interrupt priorities
//! - `command` - Serial command parser and ingestion
//! - `control` - The periodic control loop and its mode state machine
//! - `mode` - System modes and the foreground mode switch
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use rs_twinmotor::{
//!     hal::{MockCounter, MockMotor, MockTelemetry},
//!     Axis, CommandIngest, ControlConfig, ControlLink, ControlLoop,
//! };
//!
//! let link = ControlLink::new();
//! let config = ControlConfig::default();
//! let axis1 = Axis::new(MockCounter::new(), MockMotor::new(), config.encoder_scale);
//! let axis2 = Axis::new(MockCounter::new(), MockMotor::new(), config.encoder_scale);
//! let mut control = ControlLoop::new(axis1, axis2, MockTelemetry::new(), &link, &config);
//!
//! // Host sends a setpoint
//! let mut ingest = CommandIngest::new(&link.target);
//! for byte in b"@speed%120\n" {
//!     ingest.on_byte(*byte);
//! }
//! assert_eq!(link.target.target_speed(), 120);
//!
//! // Periodic interrupt, every 10ms
//! let report = control.tick().unwrap();
//! assert!(report.motor1.is_some());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Command shaping: clamps, dead-zones, direction and duty.
pub mod actuation;
/// Serial command protocol parser and ingestion.
pub mod command;
/// Periodic control loop and mode state machine.
pub mod control;
/// Encoder tracking: cumulative position and per-tick velocity.
pub mod encoder;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// System modes and the foreground mode switch.
pub mod mode;
/// Velocity and position controllers.
pub mod pid;
/// Lock-free state shared between interrupt contexts.
pub mod shared;
/// Core traits for hardware abstraction.
pub mod traits;

/// Shared configuration system for desktop and ESP32.
pub mod config;

// Re-exports for convenience
pub use actuation::{ActuationGate, MotorOutput};
pub use command::{CommandIngest, CommandParser, HostCommand, IgnoreReason, ParseEvent};
pub use control::{
    Axis, AxisId, ControlLoop, PulseCorrection, TelemetryStatus, TickPacer, TickReport,
    TICK_PERIOD_MS,
};
pub use encoder::{AxisSample, EncoderTracker};
pub use mode::{ModeSwitch, SystemMode};
pub use pid::{PidGains, PositionPid, VelocityPid};
pub use shared::{ControlLink, ControlTarget, ModeSelect, SetpointSnapshot};
pub use traits::{
    Button, Clock, Direction, MotorDriver, QuadratureCounter, SerialRx, StatusDisplay,
    TelemetryPort,
};

// Config re-exports
pub use config::{ButtonConfig, Config, ControlConfig, DeviceConfig, SerialConfig};
