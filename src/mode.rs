//! System modes and the foreground mode switch.
//!
//! The controller runs in one of two modes:
//!
//! - [`SystemMode::VelocityControl`]: motor 1 tracks the host's velocity setpoint
//! - [`SystemMode::PositionFollowing`]: motor 1 is unpowered and moved by hand;
//!   motor 2 is pulsed to follow its position
//!
//! Only the foreground loop changes mode, through [`ModeSwitch`]. The control
//! tick picks the change up at its next boundary and performs the resets.

use crate::shared::ModeSelect;
use crate::traits::Button;

/// Process-wide control mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SystemMode {
    /// Closed-loop velocity control of motor 1.
    #[default]
    VelocityControl,
    /// Motor 2 follows motor 1's position.
    PositionFollowing,
}

impl SystemMode {
    /// Mode number as shown on the display (1 or 2).
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_twinmotor::SystemMode;
    ///
    /// assert_eq!(SystemMode::VelocityControl.number(), 1);
    /// assert_eq!(SystemMode::from_number(2), Some(SystemMode::PositionFollowing));
    /// assert_eq!(SystemMode::from_number(3), None);
    /// ```
    #[inline]
    pub const fn number(&self) -> u8 {
        match self {
            SystemMode::VelocityControl => 1,
            SystemMode::PositionFollowing => 2,
        }
    }

    /// Inverse of [`number`](Self::number).
    #[inline]
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(SystemMode::VelocityControl),
            2 => Some(SystemMode::PositionFollowing),
            _ => None,
        }
    }

    /// Display label.
    #[inline]
    pub const fn label(&self) -> &'static str {
        match self {
            SystemMode::VelocityControl => "Speed Control",
            SystemMode::PositionFollowing => "Pos Following",
        }
    }

    /// The other mode.
    #[inline]
    pub const fn toggled(&self) -> Self {
        match self {
            SystemMode::VelocityControl => SystemMode::PositionFollowing,
            SystemMode::PositionFollowing => SystemMode::VelocityControl,
        }
    }
}

/// Toggles the mode on each debounced button press.
///
/// # Example
///
/// ```rust
/// use rs_twinmotor::{hal::MockButton, ControlLink, ModeSwitch, SystemMode};
///
/// let link = ControlLink::new();
/// let mut button = MockButton::new();
/// button.press();
///
/// let mut switch = ModeSwitch::new(button);
/// assert_eq!(switch.poll(&link.mode), Some(SystemMode::PositionFollowing));
/// assert_eq!(switch.poll(&link.mode), None);
/// assert_eq!(link.mode.get(), SystemMode::PositionFollowing);
/// ```
pub struct ModeSwitch<B: Button> {
    button: B,
}

impl<B: Button> ModeSwitch<B> {
    /// Wrap a debounced button.
    pub fn new(button: B) -> Self {
        Self { button }
    }

    /// Poll the button; on a press, select the other mode and return it.
    pub fn poll(&mut self, select: &ModeSelect) -> Option<SystemMode> {
        if !self.button.pressed_edge() {
            return None;
        }
        let next = select.get().toggled();
        select.set(next);
        log::info!("mode switch: {}", next.label());
        Some(next)
    }

    /// Access the underlying button.
    pub fn button_mut(&mut self) -> &mut B {
        &mut self.button
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockButton;

    #[test]
    fn default_is_velocity() {
        assert_eq!(SystemMode::default(), SystemMode::VelocityControl);
    }

    #[test]
    fn toggled_alternates() {
        let mode = SystemMode::VelocityControl;
        assert_eq!(mode.toggled(), SystemMode::PositionFollowing);
        assert_eq!(mode.toggled().toggled(), mode);
    }

    #[test]
    fn number_round_trip() {
        for mode in [SystemMode::VelocityControl, SystemMode::PositionFollowing] {
            assert_eq!(SystemMode::from_number(mode.number()), Some(mode));
        }
        assert_eq!(SystemMode::from_number(0), None);
    }

    #[test]
    fn labels_match_display() {
        assert_eq!(SystemMode::VelocityControl.label(), "Speed Control");
        assert_eq!(SystemMode::PositionFollowing.label(), "Pos Following");
    }

    #[test]
    fn switch_toggles_on_each_press() {
        let select = ModeSelect::new();
        let mut switch = ModeSwitch::new(MockButton::new());

        assert_eq!(switch.poll(&select), None);

        switch.button_mut().press();
        assert_eq!(switch.poll(&select), Some(SystemMode::PositionFollowing));

        switch.button_mut().press();
        assert_eq!(switch.poll(&select), Some(SystemMode::VelocityControl));
        assert_eq!(select.get(), SystemMode::VelocityControl);
    }

    #[test]
    fn queued_presses_are_consumed_one_per_poll() {
        let select = ModeSelect::new();
        let mut button = MockButton::new();
        button.press();
        button.press();
        let mut switch = ModeSwitch::new(button);

        assert!(switch.poll(&select).is_some());
        assert!(switch.poll(&select).is_some());
        assert!(switch.poll(&select).is_none());
        assert_eq!(select.get(), SystemMode::VelocityControl);
    }
}
