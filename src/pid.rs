//! Velocity and position controllers.
//!
//! Both controllers are plain structs with no hardware access and no
//! allocation, so they can run in interrupt context.
//!
//! - [`VelocityPid`]: incremental form. Each call adds an increment to a
//!   retained accumulator instead of recomputing the output from zero.
//! - [`PositionPid`]: proportional only, memoryless, hard-limited to ±50.

/// Output limit of the velocity controller's accumulator.
pub const VELOCITY_OUTPUT_LIMIT: f32 = 800.0;

/// Output limit of the position controller, independent of gain.
pub const POSITION_OUTPUT_LIMIT: f32 = 50.0;

/// Proportional, integral and derivative gains.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f32,
    /// Integral gain.
    pub ki: f32,
    /// Derivative gain.
    pub kd: f32,
}

impl PidGains {
    /// Create a gain set.
    pub const fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self { kp, ki, kd }
    }
}

/// Incremental-form velocity PID.
///
/// `Δu = kp*(e0-e1) + ki*e0 + kd*(e0 - 2*e1 + e2)` is added to the running
/// output, which is clamped to ±800 after every update.
///
/// # Example
///
/// ```rust
/// use rs_twinmotor::{PidGains, VelocityPid};
///
/// let mut pid = VelocityPid::new(PidGains::new(1.0, 0.5, 0.0));
///
/// // e0 = 10: Δu = 1.0*10 + 0.5*10 = 15
/// assert_eq!(pid.compute(10, 0), 15);
/// // e0 = 10, e1 = 10: Δu = 0 + 5 = 5, accumulated 20
/// assert_eq!(pid.compute(10, 0), 20);
///
/// pid.reset();
/// assert_eq!(pid.compute(10, 0), 15);
/// ```
#[derive(Clone, Debug)]
pub struct VelocityPid {
    gains: PidGains,
    /// Most recent first.
    errors: [f32; 3],
    output: f32,
}

impl VelocityPid {
    /// Create a controller with zeroed history.
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            errors: [0.0; 3],
            output: 0.0,
        }
    }

    /// Run one update and return the clamped accumulator, truncated.
    pub fn compute(&mut self, target: i16, actual: i16) -> i16 {
        self.errors[2] = self.errors[1];
        self.errors[1] = self.errors[0];
        self.errors[0] = (i32::from(target) - i32::from(actual)) as f32;

        let [e0, e1, e2] = self.errors;
        let PidGains { kp, ki, kd } = self.gains;
        self.output += kp * (e0 - e1) + ki * e0 + kd * (e0 - 2.0 * e1 + e2);
        self.output = self
            .output
            .clamp(-VELOCITY_OUTPUT_LIMIT, VELOCITY_OUTPUT_LIMIT);

        self.output as i16
    }

    /// Zero the error history and the accumulator.
    pub fn reset(&mut self) {
        self.errors = [0.0; 3];
        self.output = 0.0;
    }

    /// Replace the gains. Takes effect on the next [`compute`](Self::compute).
    pub fn set_params(&mut self, kp: f32, ki: f32, kd: f32) {
        self.gains = PidGains { kp, ki, kd };
    }

    /// Current gains.
    #[inline]
    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Error history, most recent first.
    #[inline]
    pub fn errors(&self) -> [f32; 3] {
        self.errors
    }

    /// Accumulated output before truncation.
    #[inline]
    pub fn output(&self) -> f32 {
        self.output
    }
}

/// Proportional position controller.
///
/// Only `kp` is used. [`set_params`](Self::set_params) accepts integral and
/// derivative gains for interface compatibility and discards them: position
/// control must not integrate.
///
/// # Example
///
/// ```rust
/// use rs_twinmotor::PositionPid;
///
/// let mut pid = PositionPid::new(0.15);
/// assert_eq!(pid.compute(100, 0), 15);
///
/// // ki/kd are inert
/// pid.set_params(0.15, 10.0, 10.0);
/// assert_eq!(pid.compute(100, 0), 15);
///
/// // Hard ceiling regardless of gain
/// assert_eq!(pid.compute(1_000_000, 0), 50);
/// ```
#[derive(Clone, Debug)]
pub struct PositionPid {
    kp: f32,
}

impl PositionPid {
    /// Create a controller with the given proportional gain.
    pub fn new(kp: f32) -> Self {
        Self { kp }
    }

    /// `kp * (target - actual)`, clamped to ±50 and truncated.
    pub fn compute(&self, target: i32, actual: i32) -> i16 {
        let error = i64::from(target) - i64::from(actual);
        let output = (self.kp * error as f32).clamp(-POSITION_OUTPUT_LIMIT, POSITION_OUTPUT_LIMIT);
        output as i16
    }

    /// Store `kp`; `_ki` and `_kd` are ignored.
    pub fn set_params(&mut self, kp: f32, _ki: f32, _kd: f32) {
        self.kp = kp;
    }

    /// Current proportional gain.
    #[inline]
    pub fn kp(&self) -> f32 {
        self.kp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // VelocityPid
    // =========================================================================

    #[test]
    fn velocity_increment_form() {
        let mut pid = VelocityPid::new(PidGains::new(2.0, 0.5, 0.1));

        // e = [10, 0, 0]: 2*10 + 0.5*10 + 0.1*10 = 26
        assert_eq!(pid.compute(10, 0), 26);
        // e = [4, 10, 0]: 2*(-6) + 0.5*4 + 0.1*(4 - 20) = -11.6 -> 14.4
        assert_eq!(pid.compute(10, 6), 14);
        assert!((pid.output() - 14.4).abs() < 1e-4);
        assert_eq!(pid.errors(), [4.0, 10.0, 0.0]);
    }

    #[test]
    fn velocity_zero_error_holds_output() {
        let mut pid = VelocityPid::new(PidGains::new(1.0, 1.0, 0.0));
        let first = pid.compute(50, 0);
        // Error stays at 50: only the integral term keeps adding
        assert_eq!(pid.compute(50, 0), first + 50);

        let mut pid = VelocityPid::new(PidGains::new(1.0, 0.0, 0.0));
        let held = pid.compute(50, 0);
        assert_eq!(pid.compute(50, 0), held);
        assert_eq!(pid.compute(50, 0), held);
    }

    #[test]
    fn velocity_clamps_high_and_low() {
        let mut pid = VelocityPid::new(PidGains::new(5.0, 1.5, 0.5));
        for _ in 0..100 {
            assert!(pid.compute(i16::MAX, i16::MIN) <= 800);
        }
        assert_eq!(pid.compute(i16::MAX, i16::MIN), 800);

        for _ in 0..100 {
            assert!(pid.compute(i16::MIN, i16::MAX) >= -800);
        }
        assert_eq!(pid.compute(i16::MIN, i16::MAX), -800);
    }

    #[test]
    fn velocity_accumulator_unwinds_from_clamp() {
        let mut pid = VelocityPid::new(PidGains::new(0.0, 1.0, 0.0));
        for _ in 0..20 {
            pid.compute(100, 0);
        }
        assert_eq!(pid.output(), 800.0);
        // Clamped accumulator, not an unbounded integral: one negative step moves it
        assert_eq!(pid.compute(-100, 0), 700);
    }

    #[test]
    fn velocity_reset_behaves_like_fresh() {
        let gains = PidGains::new(5.0, 1.5, 0.5);
        let mut used = VelocityPid::new(gains);
        for i in 0..10 {
            used.compute(300, i * 7);
        }
        used.reset();
        assert_eq!(used.errors(), [0.0; 3]);
        assert_eq!(used.output(), 0.0);

        let mut fresh = VelocityPid::new(gains);
        assert_eq!(used.compute(120, 40), fresh.compute(120, 40));
        assert_eq!(used.compute(120, 90), fresh.compute(120, 90));
    }

    #[test]
    fn velocity_set_params_applies_next_compute() {
        let mut pid = VelocityPid::new(PidGains::new(1.0, 0.0, 0.0));
        assert_eq!(pid.compute(10, 0), 10);
        pid.set_params(0.0, 2.0, 0.0);
        assert_eq!(pid.gains(), PidGains::new(0.0, 2.0, 0.0));
        assert_eq!(pid.compute(10, 0), 30);
    }

    #[test]
    fn velocity_truncates_toward_zero() {
        let mut pid = VelocityPid::new(PidGains::new(0.5, 0.0, 0.0));
        assert_eq!(pid.compute(3, 0), 1);
        pid.reset();
        assert_eq!(pid.compute(-3, 0), -1);
    }

    // =========================================================================
    // PositionPid
    // =========================================================================

    #[test]
    fn position_is_proportional() {
        let pid = PositionPid::new(0.1);
        assert_eq!(pid.compute(200, 0), 20);
        assert_eq!(pid.compute(0, 200), -20);
        assert_eq!(pid.compute(5, 5), 0);
    }

    #[test]
    fn position_doubling_gain_doubles_output() {
        let single = PositionPid::new(0.1);
        let double = PositionPid::new(0.2);
        assert_eq!(single.compute(100, 0), 10);
        assert_eq!(double.compute(100, 0), 20);
    }

    #[test]
    fn position_hard_limit() {
        let pid = PositionPid::new(1000.0);
        assert_eq!(pid.compute(1, 0), 50);
        assert_eq!(pid.compute(0, 1), -50);
        assert_eq!(pid.compute(i32::MAX, i32::MIN), 50);
        assert_eq!(pid.compute(i32::MIN, i32::MAX), -50);
    }

    #[test]
    fn position_ignores_integral_and_derivative() {
        let mut pid = PositionPid::new(0.15);
        pid.set_params(0.3, 0.01, 0.03);
        assert_eq!(pid.kp(), 0.3);
        // Repeated calls with the same error never accumulate
        for _ in 0..10 {
            assert_eq!(pid.compute(100, 0), 30);
        }
    }
}
