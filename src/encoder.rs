//! Per-axis encoder tracking.
//!
//! Turns samples of a wrapping 16-bit hardware counter into a signed 32-bit
//! cumulative position and a per-tick velocity in engineering units.
//!
//! The difference between two samples is taken in 16-bit arithmetic, which
//! corrects exactly one counter wrap between samples. This caps the
//! trackable speed at ±32767 raw counts per tick; anything faster aliases.
//!
//! # Example
//!
//! ```rust
//! use rs_twinmotor::EncoderTracker;
//!
//! let mut tracker = EncoderTracker::new(32_000, 1.85);
//!
//! // Counter wrapped from 32000 past 32767 to -32536 (moved +1000)
//! let sample = tracker.update(-32_536);
//! assert_eq!(sample.position, 1000);
//! assert_eq!(sample.velocity, 1850);
//! ```

/// Default pulse-to-velocity scale factor.
pub const DEFAULT_VELOCITY_SCALE: f32 = 1.85;

/// One tick's worth of encoder feedback for an axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisSample {
    /// Cumulative position in raw counts since the last clear.
    pub position: i32,
    /// Velocity this tick, scaled raw delta.
    pub velocity: i16,
}

/// Cumulative position and velocity tracker for one axis.
#[derive(Clone, Debug)]
pub struct EncoderTracker {
    cumulative_position: i32,
    last_raw_sample: i16,
    scale: f32,
}

impl EncoderTracker {
    /// Create a tracker seeded with the counter's current value.
    pub fn new(raw: i16, scale: f32) -> Self {
        Self {
            cumulative_position: 0,
            last_raw_sample: raw,
            scale,
        }
    }

    /// Advance by one tick given the counter's current value.
    pub fn update(&mut self, raw: i16) -> AxisSample {
        // One wrap of the 16-bit counter is folded back by the wrapping difference.
        let delta = raw.wrapping_sub(self.last_raw_sample);
        self.last_raw_sample = raw;
        self.cumulative_position = self.cumulative_position.wrapping_add(i32::from(delta));

        AxisSample {
            position: self.cumulative_position,
            velocity: self.scale_delta(delta),
        }
    }

    /// Zero the cumulative position and re-seed the last sample.
    pub fn clear(&mut self, raw: i16) {
        self.cumulative_position = 0;
        self.last_raw_sample = raw;
    }

    /// Cumulative position since the last clear.
    #[inline]
    pub fn position(&self) -> i32 {
        self.cumulative_position
    }

    /// Raw counter value seen on the last update or clear.
    #[inline]
    pub fn last_raw_sample(&self) -> i16 {
        self.last_raw_sample
    }

    /// Scale factor applied to raw deltas.
    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    // Truncates toward zero and saturates at the i16 range.
    fn scale_delta(&self, delta: i16) -> i16 {
        (f32::from(delta) * self.scale) as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_deltas_accumulate_exactly() {
        let mut tracker = EncoderTracker::new(0, DEFAULT_VELOCITY_SCALE);
        assert_eq!(tracker.update(100).position, 100);
        assert_eq!(tracker.update(40).position, 40);
        assert_eq!(tracker.update(-200).position, -200);
    }

    #[test]
    fn largest_forward_delta_is_not_corrected() {
        let mut tracker = EncoderTracker::new(0, 1.0);
        let sample = tracker.update(i16::MAX);
        assert_eq!(sample.position, 32_767);
        assert_eq!(sample.velocity, 32_767);
    }

    #[test]
    fn largest_reverse_delta_is_not_corrected() {
        let mut tracker = EncoderTracker::new(0, 1.0);
        let sample = tracker.update(-32_767);
        assert_eq!(sample.position, -32_767);
    }

    #[test]
    fn forward_wrap_is_folded() {
        let mut tracker = EncoderTracker::new(32_700, 1.0);
        // 32700 -> 32767 -> -32768 -> -32700 is +136 counts
        assert_eq!(tracker.update(-32_700).position, 136);
    }

    #[test]
    fn reverse_wrap_is_folded() {
        let mut tracker = EncoderTracker::new(-32_700, 1.0);
        assert_eq!(tracker.update(32_700).position, -136);
    }

    #[test]
    fn delta_beyond_half_range_aliases_by_one_wrap() {
        // A true movement of +40000 counts is indistinguishable from -25536.
        let mut tracker = EncoderTracker::new(0, 1.0);
        let raw = (40_000i32 as u16) as i16;
        assert_eq!(tracker.update(raw).position, 40_000 - 65_536);
    }

    #[test]
    fn velocity_uses_scale_and_truncates() {
        let mut tracker = EncoderTracker::new(0, DEFAULT_VELOCITY_SCALE);
        // 10 * 1.85 = 18.5 -> 18
        assert_eq!(tracker.update(10).velocity, 18);
        // -10 * 1.85 = -18.5 -> -18
        assert_eq!(tracker.update(0).velocity, -18);
        assert_eq!(tracker.update(0).velocity, 0);
    }

    #[test]
    fn velocity_saturates_at_i16_range() {
        let mut tracker = EncoderTracker::new(0, DEFAULT_VELOCITY_SCALE);
        assert_eq!(tracker.update(30_000).velocity, i16::MAX);
        assert_eq!(tracker.update(0).velocity, i16::MIN);
    }

    #[test]
    fn clear_zeroes_position_and_reseeds() {
        let mut tracker = EncoderTracker::new(0, 1.0);
        tracker.update(500);
        tracker.clear(1234);
        assert_eq!(tracker.position(), 0);
        assert_eq!(tracker.last_raw_sample(), 1234);

        // Next delta is measured from the re-seeded sample
        assert_eq!(tracker.update(1244).position, 10);
    }

    #[test]
    fn position_survives_many_wraps() {
        let mut tracker = EncoderTracker::new(0, 1.0);
        let mut raw: i16 = 0;
        for _ in 0..10 {
            raw = raw.wrapping_add(30_000);
            tracker.update(raw);
        }
        assert_eq!(tracker.position(), 300_000);
    }
}
