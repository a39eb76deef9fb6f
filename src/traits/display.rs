//! Display abstraction for controller status.
//!
//! This module defines the [`StatusDisplay`] trait for showing the active
//! control mode on a small display (OLED, LCD, etc.).

use crate::SystemMode;

/// Display trait for rendering controller status.
///
/// Implementors provide hardware-specific rendering for displays like
/// SSD1306 OLED, character LCDs, or simulated displays for testing. It is
/// only ever driven from the foreground loop.
///
/// # Example
///
/// ```ignore
/// use rs_twinmotor::traits::StatusDisplay;
/// use rs_twinmotor::SystemMode;
///
/// struct MyDisplay { /* ... */ }
///
/// impl StatusDisplay for MyDisplay {
///     type Error = ();
///
///     fn init(&mut self) -> Result<(), ()> { Ok(()) }
///     fn clear(&mut self) -> Result<(), ()> { Ok(()) }
///     fn show_mode(&mut self, mode: SystemMode) -> Result<(), ()> {
///         // "Mode:1" / "Speed Control"
///         Ok(())
///     }
///     fn show_message(&mut self, line1: &str, line2: Option<&str>) -> Result<(), ()> {
///         Ok(())
///     }
/// }
/// ```
pub trait StatusDisplay {
    /// Error type for display operations.
    type Error;

    /// Initializes the display hardware.
    ///
    /// Called once at startup. Must be idempotent.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Clears the display.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Shows the active mode number and its label.
    fn show_mode(&mut self, mode: SystemMode) -> Result<(), Self::Error>;

    /// Shows a simple message (e.g., for startup).
    ///
    /// # Arguments
    ///
    /// * `line1` - First line of text
    /// * `line2` - Optional second line of text
    fn show_message(&mut self, line1: &str, line2: Option<&str>) -> Result<(), Self::Error>;
}
