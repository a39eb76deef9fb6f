//! Desktop simulation of the twin-motor controller.
//!
//! Runs the real [`ControlLoop`] against mock hardware with a crude motor
//! model closing the loop, so the controller can be watched without a board:
//!
//! 1. Velocity control: the host sends a few `@speed%` setpoints and motor 1
//!    settles on each one
//! 2. Position following: the mode button is pressed, axis 1 is turned "by
//!    hand" and motor 2 catches up in short pulses
//!
//! Telemetry lines are printed exactly as the host would receive them.
//!
//! # Usage
//!
//! ```sh
//! cargo run --example desktop_sim
//! ```

use rs_twinmotor::hal::{MockButton, MockCounter, MockMotor, MockSerialRx, MockTelemetry};
use rs_twinmotor::{
    Axis, AxisId, CommandIngest, Config, ControlLink, ControlLoop, ModeSwitch, SystemMode,
};

type SimLoop<'a> = ControlLoop<'a, MockCounter, MockMotor, MockTelemetry>;

/// First-order motor: encoder counts per tick lag behind the applied duty.
struct MotorModel {
    /// Counts per tick, unrounded.
    speed: f32,
}

impl MotorModel {
    /// Counts per tick at full duty.
    const GAIN: f32 = 0.05;
    /// Fraction of the gap closed each tick.
    const RESPONSE: f32 = 0.2;

    fn new() -> Self {
        Self { speed: 0.0 }
    }

    fn step(&mut self, duty: i16) -> i16 {
        let steady = f32::from(duty) * Self::GAIN;
        self.speed += (steady - self.speed) * Self::RESPONSE;
        self.speed.round() as i16
    }
}

fn run_ticks(
    control: &mut SimLoop<'_>,
    models: &mut [MotorModel; 2],
    ticks: usize,
    mut hand: impl FnMut(usize) -> i16,
) -> anyhow::Result<()> {
    for tick in 0..ticks {
        control
            .tick()
            .map_err(|_| anyhow::anyhow!("mock motor rejected a write"))?;

        for line in control.telemetry_mut().lines.drain(..) {
            print!("  telemetry {}", line);
        }

        // Motor 1 is moved by hand while following
        let m1 = match control.mode() {
            SystemMode::VelocityControl => {
                models[0].step(control.axis(AxisId::Axis1).motor().signed())
            }
            SystemMode::PositionFollowing => hand(tick),
        };
        let m2 = models[1].step(control.axis(AxisId::Axis2).motor().signed());
        control.axis_mut(AxisId::Axis1).counter_mut().advance(m1);
        control.axis_mut(AxisId::Axis2).counter_mut().advance(m2);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    println!("=================================");
    println!("  rs-twinmotor Desktop Simulation");
    println!("=================================");
    println!();

    let config = Config::default();
    let link = ControlLink::new();

    let axis1 = Axis::new(MockCounter::new(), MockMotor::new(), config.control.encoder_scale);
    let axis2 = Axis::new(MockCounter::new(), MockMotor::new(), config.control.encoder_scale);
    let mut control = ControlLoop::new(axis1, axis2, MockTelemetry::new(), &link, &config.control);
    let mut models = [MotorModel::new(), MotorModel::new()];

    let mut ingest = CommandIngest::new(&link.target);
    let mut rx = MockSerialRx::new();
    let mut mode_switch = ModeSwitch::new(MockButton::new());

    // =========================================================================
    // Velocity control
    // =========================================================================
    for setpoint in [60, -40, 0] {
        let line = format!("@speed%{}\r\n", setpoint);
        rx.queue(line.as_bytes());
        ingest.drain(&mut rx);
        println!("host -> {}", line.trim_end());

        run_ticks(&mut control, &mut models, 60, |_| 0)?;
        let pos = control.axis(AxisId::Axis1).tracker().position();
        println!("  axis 1 position {}", pos);
        println!();
    }

    // A malformed line leaves the setpoint alone
    rx.queue(b"@speed%fast\r\n");
    ingest.drain(&mut rx);
    println!("host -> @speed%fast (ignored, target {})", link.target.target_speed());
    println!();

    // =========================================================================
    // Position following
    // =========================================================================
    mode_switch.button_mut().press();
    if let Some(mode) = mode_switch.poll(&link.mode) {
        println!("button -> Mode:{} {}", mode.number(), mode.label());
    }

    // Axis 1 turned by hand at 15 counts per tick for 40 ticks
    run_ticks(&mut control, &mut models, 120, |tick| if tick < 40 { 15 } else { 0 })?;

    let leader = control.axis(AxisId::Axis1).tracker().position();
    let follower = control.axis(AxisId::Axis2).tracker().position();
    println!();
    println!("  leader {} follower {} gap {}", leader, follower, leader - follower);

    Ok(())
}
