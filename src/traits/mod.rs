//! Trait definitions for hardware abstraction.
//!
//! This module defines the core abstractions that allow rs-twinmotor to
//! run on different hardware (ESP32, desktop mock) without touching the
//! control core.
//!
//! # Submodules
//!
//! - `hardware`: Motor drivers, quadrature counters, serial, button, clock
//! - `display`: Status display trait
//!
//! # Hardware Abstraction
//!
//! The key hardware traits are:
//!
//! - [`MotorDriver`]: Direction-pair + PWM duty DC motor output
//! - [`QuadratureCounter`]: Free-running 16-bit encoder counter
//! - [`TelemetryPort`]: Best-effort serial transmit with a busy poll
//! - [`SerialRx`]: Non-blocking serial receive
//! - [`Button`]: Debounced push-button edge
//! - [`Clock`]: Time source for `no_std` environments

pub mod display;
pub mod hardware;

pub use display::*;
pub use hardware::*;
