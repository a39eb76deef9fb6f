//! The periodic control loop.
//!
//! [`ControlLoop::tick`] is the body of the fixed-period control interrupt.
//! Every tick it:
//!
//! 1. Applies a pending mode change (stop both motors, then the entry resets)
//! 2. Loads the setpoint and resets the velocity PID if it was rewritten
//! 3. Samples both axes
//! 4. Runs the active mode's control law through the [`ActuationGate`]
//! 5. Offers a telemetry line on every Nth tick
//!
//! # Modes
//!
//! In [`SystemMode::VelocityControl`] motor 1 tracks the host setpoint through
//! the incremental [`VelocityPid`], with a small static-friction bias added
//! outside a ±5 dead band. Motor 2 is not driven.
//!
//! In [`SystemMode::PositionFollowing`] motor 1 is held unpowered so axis 1
//! can be moved by hand, and motor 2 is nudged towards axis 1's position by
//! fixed-length corrective pulses (see [`PulseCorrection`]).
//!
//! # Example
//!
//! ```rust
//! use rs_twinmotor::{
//!     hal::{MockCounter, MockMotor, MockTelemetry},
//!     Axis, AxisId, ControlConfig, ControlLink, ControlLoop, PulseCorrection, SystemMode,
//! };
//!
//! let link = ControlLink::new();
//! let config = ControlConfig::default();
//! let axis1 = Axis::new(MockCounter::new(), MockMotor::new(), config.encoder_scale);
//! let axis2 = Axis::new(MockCounter::new(), MockMotor::new(), config.encoder_scale);
//! let mut control = ControlLoop::new(axis1, axis2, MockTelemetry::new(), &link, &config);
//!
//! link.mode.set(SystemMode::PositionFollowing);
//! control.tick().unwrap();
//!
//! // Leader moved 150 counts ahead of the follower
//! control.axis_mut(AxisId::Axis1).counter_mut().advance(150);
//! let report = control.tick().unwrap();
//!
//! assert_eq!(report.motor2.map(|m| m.signed()), Some(120));
//! assert_eq!(control.pulse(), PulseCorrection::Pulsing { elapsed: 0 });
//! ```

use core::fmt::Write as _;

use heapless::String;

use crate::actuation::{ActuationGate, MotorOutput};
use crate::config::ControlConfig;
use crate::encoder::{AxisSample, EncoderTracker};
use crate::mode::SystemMode;
use crate::pid::{PositionPid, VelocityPid};
use crate::shared::ControlLink;
use crate::traits::{Clock, MotorDriver, QuadratureCounter, TelemetryPort};

/// Control period in milliseconds.
pub const TICK_PERIOD_MS: u32 = 10;

/// Targets with a magnitude above this get the friction bias.
pub const FRICTION_DEAD_BAND: i16 = 5;

/// Static-friction bias added to the velocity target.
pub const FRICTION_COMPENSATION: i16 = 2;

/// Position error (counts) that starts a corrective pulse.
pub const PULSE_TRIGGER_ERROR: u64 = 100;

/// Command applied to motor 2 during a corrective pulse.
pub const PULSE_COMMAND: i16 = 120;

/// A pulse ends once its elapsed tick count exceeds this.
pub const PULSE_HOLD_TICKS: u8 = 3;

/// Longest telemetry line: `-32768,-32768\n`.
const TELEMETRY_LINE_LEN: usize = 16;

/// Fixed-rate deadline for the control thread.
///
/// After each tick, [`TickPacer::delay_ms`] says how long to sleep until the
/// next deadline. Small overruns are absorbed by the following sleep; an
/// overrun of a whole period or more restarts the cadence from now instead of
/// firing a burst of late ticks.
///
/// # Example
///
/// ```rust
/// use rs_twinmotor::{hal::MockClock, TickPacer};
///
/// let mut clock = MockClock::new();
/// let mut pacer = TickPacer::new(&clock, 10);
///
/// clock.advance(3); // tick took 3ms
/// assert_eq!(pacer.delay_ms(&clock), 7);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickPacer {
    period_ms: u64,
    next_ms: u64,
}

impl TickPacer {
    /// First deadline one period from now.
    pub fn new<C: Clock>(clock: &C, period_ms: u64) -> Self {
        let period_ms = period_ms.max(1);
        Self {
            period_ms,
            next_ms: clock.now_ms() + period_ms,
        }
    }

    /// Time left until the current deadline, then advance to the next one.
    pub fn delay_ms<C: Clock>(&mut self, clock: &C) -> u64 {
        let now = clock.now_ms();
        let delay = self.next_ms.saturating_sub(now);
        if now >= self.next_ms + self.period_ms {
            log::trace!("control tick overran by {} ms", now - self.next_ms);
            self.next_ms = now + self.period_ms;
        } else {
            self.next_ms += self.period_ms;
        }
        delay
    }

    /// The upcoming deadline in clock milliseconds.
    pub fn next_deadline_ms(&self) -> u64 {
        self.next_ms
    }
}

/// Identifies one of the two axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AxisId {
    /// Velocity-controlled motor; the leader when following.
    Axis1,
    /// The follower.
    Axis2,
}

/// A motor with its encoder counter and tracker.
pub struct Axis<Q: QuadratureCounter, M: MotorDriver> {
    counter: Q,
    motor: M,
    tracker: EncoderTracker,
}

impl<Q: QuadratureCounter, M: MotorDriver> Axis<Q, M> {
    /// Bundle a counter and a motor. The tracker is seeded from the counter.
    pub fn new(mut counter: Q, motor: M, scale: f32) -> Self {
        let tracker = EncoderTracker::new(counter.raw_count(), scale);
        Self {
            counter,
            motor,
            tracker,
        }
    }

    /// Read the counter and advance the tracker by one tick.
    pub fn sample(&mut self) -> AxisSample {
        let raw = self.counter.raw_count();
        self.tracker.update(raw)
    }

    /// Zero the cumulative position and re-seed from the counter.
    pub fn clear(&mut self) {
        let raw = self.counter.raw_count();
        self.tracker.clear(raw);
    }

    /// Shape `command` for `mode` and write it to the motor.
    pub fn drive(&mut self, command: i16, mode: SystemMode) -> Result<MotorOutput, M::Error> {
        ActuationGate::apply(&mut self.motor, command, mode)
    }

    /// Stop the motor.
    pub fn stop(&mut self) -> Result<(), M::Error> {
        self.motor.stop()
    }

    /// Encoder tracker state.
    pub fn tracker(&self) -> &EncoderTracker {
        &self.tracker
    }

    /// The counter.
    pub fn counter(&self) -> &Q {
        &self.counter
    }

    /// The counter, mutably.
    pub fn counter_mut(&mut self) -> &mut Q {
        &mut self.counter
    }

    /// The motor.
    pub fn motor(&self) -> &M {
        &self.motor
    }

    /// The motor, mutably.
    pub fn motor_mut(&mut self) -> &mut M {
        &mut self.motor
    }
}

/// Corrective pulse state for the follower in position mode.
///
/// When idle and the follower lags or leads by more than
/// [`PULSE_TRIGGER_ERROR`] counts, motor 2 gets a fixed ±[`PULSE_COMMAND`]
/// and the pulse runs for a fixed number of ticks regardless of how the
/// error evolves. It is not retriggered until it has finished.
///
/// # Example
///
/// ```rust
/// use rs_twinmotor::PulseCorrection;
///
/// let (state, cmd) = PulseCorrection::Idle.step(150);
/// assert_eq!(cmd, Some(120));
///
/// // Error flipped sign, but the running pulse is not retriggered
/// let (state, cmd) = state.step(-150);
/// assert_eq!(cmd, None);
/// assert_eq!(state, PulseCorrection::Pulsing { elapsed: 1 });
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PulseCorrection {
    /// No pulse running; motor 2 held at 0 inside the dead band.
    #[default]
    Idle,
    /// A pulse is running.
    Pulsing {
        /// Ticks since the pulse started.
        elapsed: u8,
    },
}

impl PulseCorrection {
    /// Advance one tick given the leader-minus-follower error.
    ///
    /// Returns the next state and the command for motor 2, or `None` when
    /// the motor keeps its current output.
    pub fn step(self, position_error: i64) -> (Self, Option<i16>) {
        match self {
            PulseCorrection::Idle if position_error.unsigned_abs() > PULSE_TRIGGER_ERROR => {
                let command = if position_error > 0 {
                    PULSE_COMMAND
                } else {
                    -PULSE_COMMAND
                };
                (PulseCorrection::Pulsing { elapsed: 0 }, Some(command))
            }
            PulseCorrection::Pulsing { elapsed } => {
                let elapsed = elapsed.saturating_add(1);
                if elapsed > PULSE_HOLD_TICKS {
                    (PulseCorrection::Idle, Some(0))
                } else {
                    (PulseCorrection::Pulsing { elapsed }, None)
                }
            }
            PulseCorrection::Idle => (PulseCorrection::Idle, Some(0)),
        }
    }

    /// True while a pulse is running.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, PulseCorrection::Pulsing { .. })
    }
}

/// What happened to this tick's telemetry opportunity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TelemetryStatus {
    /// Not a send tick.
    NotDue,
    /// A line was written.
    Sent,
    /// Send tick, but the port was still busy. Not retried.
    DroppedBusy,
    /// The port rejected the write. Not retried.
    Failed,
}

/// Outcome of one control tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickReport {
    /// Mode the tick ran in.
    pub mode: SystemMode,
    /// Setpoint in force this tick.
    pub target_speed: i16,
    /// Axis 1 feedback.
    pub axis1: AxisSample,
    /// Axis 2 feedback.
    pub axis2: AxisSample,
    /// Last output written to motor 1 this tick; `None` if untouched.
    pub motor1: Option<MotorOutput>,
    /// Last output written to motor 2 this tick; `None` if untouched.
    pub motor2: Option<MotorOutput>,
    /// Telemetry outcome.
    pub telemetry: TelemetryStatus,
}

/// Owns both axes, the controllers and the mode state machine.
///
/// Reads its inputs from a shared [`ControlLink`]; nothing else in the
/// system touches the state held here.
pub struct ControlLoop<'a, Q, M, T>
where
    Q: QuadratureCounter,
    M: MotorDriver,
    T: TelemetryPort,
{
    axis1: Axis<Q, M>,
    axis2: Axis<Q, M>,
    telemetry: T,
    link: &'a ControlLink,
    velocity_pid: VelocityPid,
    position_pid: PositionPid,
    mode: SystemMode,
    seen_generation: u16,
    pulse: PulseCorrection,
    leader_reference: i32,
    telemetry_counter: u8,
    telemetry_interval: u8,
}

impl<'a, Q, M, T> ControlLoop<'a, Q, M, T>
where
    Q: QuadratureCounter,
    M: MotorDriver,
    T: TelemetryPort,
{
    /// Create the loop in velocity control with zeroed controller state.
    ///
    /// A mode already selected on `link` is applied, with its resets, on
    /// the first tick.
    pub fn new(
        axis1: Axis<Q, M>,
        axis2: Axis<Q, M>,
        telemetry: T,
        link: &'a ControlLink,
        config: &ControlConfig,
    ) -> Self {
        Self {
            axis1,
            axis2,
            telemetry,
            link,
            velocity_pid: VelocityPid::new(config.velocity_gains),
            position_pid: PositionPid::new(config.position_gains.kp),
            mode: SystemMode::VelocityControl,
            seen_generation: link.target.snapshot().generation,
            pulse: PulseCorrection::Idle,
            leader_reference: 0,
            telemetry_counter: 0,
            telemetry_interval: config.telemetry_interval_ticks.max(1),
        }
    }

    /// Run one control period.
    ///
    /// Only motor driver errors are returned. A failed mode transition is
    /// retried on the next tick. A failed drive still lets the other motor
    /// and the telemetry cadence run before the error is returned, and a
    /// pulse step whose command was rejected is not committed.
    pub fn tick(&mut self) -> Result<TickReport, M::Error> {
        let mut motor1 = None;
        let mut motor2 = None;

        let selected = self.link.mode.get();
        if selected != self.mode {
            self.enter_mode(selected)?;
            motor1 = Some(MotorOutput::STOPPED);
            motor2 = Some(MotorOutput::STOPPED);
        }

        let setpoint = self.link.target.snapshot();
        if setpoint.generation != self.seen_generation {
            self.seen_generation = setpoint.generation;
            self.velocity_pid.reset();
        }

        let axis1 = self.axis1.sample();
        let axis2 = self.axis2.sample();

        let driven = match self.mode {
            SystemMode::VelocityControl => {
                let target = Self::friction_compensated(setpoint.target_speed);
                let command = self.velocity_pid.compute(target, axis1.velocity);
                self.axis1
                    .drive(command, self.mode)
                    .map(|out| motor1 = Some(out))
            }
            SystemMode::PositionFollowing => {
                let error = i64::from(axis1.position) - i64::from(axis2.position);
                let (pulse, command) = self.pulse.step(error);
                let follower = match command {
                    Some(command) => self
                        .axis2
                        .drive(command, self.mode)
                        .map(|out| motor2 = Some(out)),
                    None => Ok(()),
                };

                // A command that never reached motor 2 is reissued next tick
                if follower.is_ok() {
                    if !self.pulse.is_active() && pulse.is_active() {
                        log::debug!("follower pulse, error {}", error);
                    }
                    self.pulse = pulse;
                }

                self.leader_reference = axis1.position;
                let leader = self.axis1.drive(0, self.mode).map(|out| motor1 = Some(out));
                follower.and(leader)
            }
        };

        let telemetry = self.offer_telemetry(axis1.velocity, setpoint.target_speed);
        driven?;

        Ok(TickReport {
            mode: self.mode,
            target_speed: setpoint.target_speed,
            axis1,
            axis2,
            motor1,
            motor2,
            telemetry,
        })
    }

    /// Target with the static-friction bias applied outside the dead band.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_twinmotor::{hal::{MockCounter, MockMotor, MockTelemetry}, ControlLoop};
    ///
    /// type Loop<'a> = ControlLoop<'a, MockCounter, MockMotor, MockTelemetry>;
    ///
    /// assert_eq!(Loop::friction_compensated(5), 5);
    /// assert_eq!(Loop::friction_compensated(6), 8);
    /// assert_eq!(Loop::friction_compensated(-6), -8);
    /// ```
    pub fn friction_compensated(target: i16) -> i16 {
        if target.unsigned_abs() > FRICTION_DEAD_BAND as u16 {
            if target > 0 {
                target.saturating_add(FRICTION_COMPENSATION)
            } else {
                target.saturating_sub(FRICTION_COMPENSATION)
            }
        } else {
            target
        }
    }

    fn enter_mode(&mut self, mode: SystemMode) -> Result<(), M::Error> {
        self.axis1.stop()?;
        self.axis2.stop()?;

        match mode {
            SystemMode::PositionFollowing => {
                self.axis1.clear();
                self.axis2.clear();
                self.pulse = PulseCorrection::Idle;
                self.leader_reference = self.axis1.tracker().position();
            }
            SystemMode::VelocityControl => self.velocity_pid.reset(),
        }

        self.mode = mode;
        log::info!("control mode {}: {}", mode.number(), mode.label());
        Ok(())
    }

    fn offer_telemetry(&mut self, velocity: i16, target_speed: i16) -> TelemetryStatus {
        self.telemetry_counter = self.telemetry_counter.saturating_add(1);
        if self.telemetry_counter < self.telemetry_interval {
            return TelemetryStatus::NotDue;
        }
        self.telemetry_counter = 0;

        if self.telemetry.is_busy() {
            log::trace!("telemetry dropped, port busy");
            return TelemetryStatus::DroppedBusy;
        }

        let mut line: String<TELEMETRY_LINE_LEN> = String::new();
        // Two i16 values always fit
        let _ = writeln!(line, "{},{}", velocity, target_speed);
        match self.telemetry.write_line(&line) {
            Ok(()) => TelemetryStatus::Sent,
            Err(_) => {
                log::trace!("telemetry write failed");
                TelemetryStatus::Failed
            }
        }
    }

    /// Mode the loop is currently running in.
    #[inline]
    pub fn mode(&self) -> SystemMode {
        self.mode
    }

    /// Follower pulse state.
    #[inline]
    pub fn pulse(&self) -> PulseCorrection {
        self.pulse
    }

    /// Axis 1 position recorded on the last position-mode tick.
    #[inline]
    pub fn leader_reference(&self) -> i32 {
        self.leader_reference
    }

    /// One of the axes.
    pub fn axis(&self, id: AxisId) -> &Axis<Q, M> {
        match id {
            AxisId::Axis1 => &self.axis1,
            AxisId::Axis2 => &self.axis2,
        }
    }

    /// One of the axes, mutably.
    pub fn axis_mut(&mut self, id: AxisId) -> &mut Axis<Q, M> {
        match id {
            AxisId::Axis1 => &mut self.axis1,
            AxisId::Axis2 => &mut self.axis2,
        }
    }

    /// The telemetry port.
    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    /// The telemetry port, mutably.
    pub fn telemetry_mut(&mut self) -> &mut T {
        &mut self.telemetry
    }

    /// The velocity controller.
    pub fn velocity_pid(&self) -> &VelocityPid {
        &self.velocity_pid
    }

    /// The velocity controller, for tuning.
    pub fn velocity_pid_mut(&mut self) -> &mut VelocityPid {
        &mut self.velocity_pid
    }

    /// The position controller.
    pub fn position_pid(&self) -> &PositionPid {
        &self.position_pid
    }

    /// The position controller, for tuning.
    pub fn position_pid_mut(&mut self) -> &mut PositionPid {
        &mut self.position_pid
    }

    /// The shared link this loop reads from.
    pub fn link(&self) -> &'a ControlLink {
        self.link
    }
}
