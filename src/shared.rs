//! State shared between execution contexts without locks.
//!
//! Three contexts touch the controller, in priority order: serial receive
//! (command ingestion), the periodic control tick, and the foreground loop.
//! Exactly two values cross those boundaries:
//!
//! - the velocity setpoint, written by ingestion and read by the tick
//! - the selected [`SystemMode`], written by the foreground and read by the tick
//!
//! Each lives in a single atomic word, so a reader can never observe a torn
//! value no matter where it is preempted.
//!
//! # Setpoint and reset request
//!
//! A new setpoint must also reset the velocity PID. Rather than a separate
//! flag that could race with the setpoint, [`ControlTarget`] packs a 16-bit
//! generation counter next to the 16-bit target. Every write bumps the
//! generation; the control tick resets its PID when the generation it loads
//! differs from the last one it saw. Setpoint and reset request are therefore
//! observed together in one load, and the reset lands on the first tick that
//! uses the new target.
//!
//! Both cells are single-writer: only one context may call the setters.
//! The writer does a plain load/store, so no compare-and-swap support is
//! needed from the target.
//!
//! # Example
//!
//! ```rust
//! use rs_twinmotor::{ControlLink, SystemMode};
//!
//! static LINK: ControlLink = ControlLink::new();
//!
//! let before = LINK.target.snapshot();
//! LINK.target.set_target_speed(-75);
//! let after = LINK.target.snapshot();
//!
//! assert_eq!(after.target_speed, -75);
//! assert_ne!(after.generation, before.generation);
//!
//! LINK.mode.set(SystemMode::PositionFollowing);
//! assert_eq!(LINK.mode.get(), SystemMode::PositionFollowing);
//! ```

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::SystemMode;

/// Setpoint plus the generation it was written with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetpointSnapshot {
    /// Velocity setpoint in encoder velocity units.
    pub target_speed: i16,
    /// Incremented on every write, wrapping.
    pub generation: u16,
}

impl SetpointSnapshot {
    #[inline]
    const fn pack(self) -> u32 {
        ((self.generation as u32) << 16) | (self.target_speed as u16 as u32)
    }

    #[inline]
    const fn unpack(word: u32) -> Self {
        Self {
            target_speed: word as u16 as i16,
            generation: (word >> 16) as u16,
        }
    }
}

/// The velocity setpoint, written asynchronously and read every tick.
#[derive(Debug)]
pub struct ControlTarget {
    word: AtomicU32,
}

impl ControlTarget {
    /// Target 0, generation 0.
    pub const fn new() -> Self {
        Self {
            word: AtomicU32::new(0),
        }
    }

    /// Store a new setpoint and request a velocity PID reset.
    ///
    /// Single writer only.
    pub fn set_target_speed(&self, target_speed: i16) {
        let current = SetpointSnapshot::unpack(self.word.load(Ordering::Relaxed));
        let next = SetpointSnapshot {
            target_speed,
            generation: current.generation.wrapping_add(1),
        };
        self.word.store(next.pack(), Ordering::Release);
    }

    /// Current setpoint and generation, read in one load.
    #[inline]
    pub fn snapshot(&self) -> SetpointSnapshot {
        SetpointSnapshot::unpack(self.word.load(Ordering::Acquire))
    }

    /// Current setpoint.
    #[inline]
    pub fn target_speed(&self) -> i16 {
        self.snapshot().target_speed
    }
}

impl Default for ControlTarget {
    fn default() -> Self {
        Self::new()
    }
}

/// The selected control mode, written by the foreground only.
#[derive(Debug)]
pub struct ModeSelect {
    mode: AtomicU8,
}

impl ModeSelect {
    /// Starts in [`SystemMode::VelocityControl`].
    pub const fn new() -> Self {
        Self {
            mode: AtomicU8::new(SystemMode::VelocityControl.number()),
        }
    }

    /// Select a mode. Single writer only.
    #[inline]
    pub fn set(&self, mode: SystemMode) {
        self.mode.store(mode.number(), Ordering::Release);
    }

    /// Currently selected mode.
    #[inline]
    pub fn get(&self) -> SystemMode {
        SystemMode::from_number(self.mode.load(Ordering::Acquire))
            .unwrap_or(SystemMode::VelocityControl)
    }
}

impl Default for ModeSelect {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the control tick reads from other contexts.
///
/// `const`-constructible so it can be a `static` shared with interrupt
/// handlers.
#[derive(Debug, Default)]
pub struct ControlLink {
    /// Written by command ingestion.
    pub target: ControlTarget,
    /// Written by the foreground mode switch.
    pub mode: ModeSelect,
}

impl ControlLink {
    /// Fresh link: target 0, velocity control.
    pub const fn new() -> Self {
        Self {
            target: ControlTarget::new(),
            mode: ModeSelect::new(),
        }
    }
}
