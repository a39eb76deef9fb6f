//! Edge case and boundary condition tests for the twin-motor controller

use rs_twinmotor::{
    hal::{MockCounter, MockMotor, MockSerialRx, MockTelemetry},
    ActuationGate, Axis, AxisId, CommandIngest, CommandParser, ControlConfig, ControlLink,
    ControlLoop, EncoderTracker, IgnoreReason, ParseEvent, PidGains, PositionPid, SystemMode,
    VelocityPid,
};

// ============================================================================
// Encoder Wrap
// ============================================================================

#[test]
fn every_in_range_delta_accumulates_exactly() {
    for start in [i16::MIN, -1, 0, 1, 20_000, i16::MAX] {
        for delta in [-32_767i32, -20_000, -1, 0, 1, 20_000, 32_767] {
            let mut tracker = EncoderTracker::new(start, 1.0);
            let raw = (i32::from(start) + delta) as i16;
            assert_eq!(tracker.update(raw).position, delta, "start {} delta {}", start, delta);
        }
    }
}

#[test]
fn delta_one_wrap_outside_range_aliases() {
    // A true move of +32769 counts is indistinguishable from -32767
    let mut tracker = EncoderTracker::new(0, 1.0);
    let raw = 32_769i32 as i16;
    assert_eq!(tracker.update(raw).position, 32_769 - 65_536);
}

#[test]
fn axis_tracks_through_counter_wrap() {
    let mut axis = Axis::new(MockCounter::starting_at(32_000), MockMotor::new(), 1.85);
    let mut total = 0;
    for _ in 0..100 {
        axis.counter_mut().advance(1_500);
        total += 1_500;
        let sample = axis.sample();
        assert_eq!(sample.position, total);
        assert_eq!(sample.velocity, 2_775);
    }
}

#[test]
fn velocity_saturates_at_i16() {
    let mut tracker = EncoderTracker::new(0, 1.85);
    assert_eq!(tracker.update(30_000).velocity, i16::MAX);
    assert_eq!(tracker.update(0).velocity, i16::MIN);
}

// ============================================================================
// Controller Bounds
// ============================================================================

#[test]
fn velocity_pid_bounded_for_extreme_inputs() {
    let mut pid = VelocityPid::new(PidGains::new(5.0, 1.5, 0.5));
    let inputs = [
        (i16::MAX, i16::MIN),
        (i16::MIN, i16::MAX),
        (0, 0),
        (i16::MAX, i16::MAX),
        (-1, 1),
        (i16::MIN, i16::MIN),
    ];
    for _ in 0..50 {
        for (target, actual) in inputs {
            let out = pid.compute(target, actual);
            assert!((-800..=800).contains(&out), "out {}", out);
            assert!(pid.output().abs() <= 800.0);
        }
    }
}

#[test]
fn velocity_pid_reset_matches_fresh_controller() {
    let gains = PidGains::new(5.0, 1.5, 0.5);
    let mut used = VelocityPid::new(gains);
    for i in 0..20 {
        used.compute(i * 10, -i);
    }
    used.reset();

    let mut fresh = VelocityPid::new(gains);
    for (target, actual) in [(40, 0), (40, 10), (40, 35)] {
        assert_eq!(used.compute(target, actual), fresh.compute(target, actual));
    }
}

#[test]
fn position_pid_bounded_and_linear() {
    let pid = PositionPid::new(0.15);
    assert_eq!(pid.compute(i32::MAX, i32::MIN), 50);
    assert_eq!(pid.compute(i32::MIN, i32::MAX), -50);

    let doubled = PositionPid::new(2.0 * 0.15);
    for error in [20, 40, 100, -60] {
        assert_eq!(doubled.compute(error, 0), 2 * pid.compute(error, 0));
    }
}

// ============================================================================
// Actuation Gate Boundaries
// ============================================================================

#[test]
fn gate_thresholds_are_strict() {
    assert_eq!(ActuationGate::shape(29, SystemMode::VelocityControl).duty, 0);
    assert_eq!(ActuationGate::shape(30, SystemMode::VelocityControl).duty, 30);
    assert_eq!(ActuationGate::shape(119, SystemMode::PositionFollowing).duty, 0);
    assert_eq!(ActuationGate::shape(120, SystemMode::PositionFollowing).duty, 120);
}

#[test]
fn gate_never_exceeds_limits() {
    for command in (i16::MIN..=i16::MAX).step_by(97) {
        let vel = ActuationGate::shape(command, SystemMode::VelocityControl);
        let pos = ActuationGate::shape(command, SystemMode::PositionFollowing);
        assert!(vel.duty <= 1000);
        assert!(pos.duty <= 200);
        assert_eq!(vel.duty == 0, vel.direction.lines() == (false, false));
        assert_eq!(pos.duty == 0, pos.direction.lines() == (false, false));
    }
}

// ============================================================================
// Command Input
// ============================================================================

#[test]
fn binary_noise_never_changes_target() {
    let link = ControlLink::new();
    let mut ingest = CommandIngest::new(&link.target);
    let mut rx = MockSerialRx::new();

    // Every byte except the start byte, twice over
    let noise: Vec<u8> = (0u8..=255).filter(|b| *b != b'@').collect();
    rx.queue(&noise);
    rx.queue(&noise);
    assert_eq!(ingest.drain(&mut rx), 0);
    assert_eq!(link.target.snapshot().generation, 0);
}

#[test]
fn garbage_inside_command_is_rejected() {
    let mut parser = CommandParser::new();
    let mut last = None;
    for &b in b"@speed%1 2\n" {
        if let Some(event) = parser.push(b) {
            last = Some(event);
        }
    }
    assert_eq!(last, Some(ParseEvent::Ignored(IgnoreReason::InvalidValue)));
}

#[test]
fn plus_sign_is_accepted() {
    let link = ControlLink::new();
    let mut ingest = CommandIngest::new(&link.target);
    for &b in b"@speed%+90\r\n" {
        ingest.on_byte(b);
    }
    assert_eq!(link.target.target_speed(), 90);
}

// ============================================================================
// Control Loop Boundaries
// ============================================================================

#[test]
fn extreme_target_stays_within_limits() {
    let link = ControlLink::new();
    let config = ControlConfig::default();
    let axis1 = Axis::new(MockCounter::new(), MockMotor::new(), config.encoder_scale);
    let axis2 = Axis::new(MockCounter::new(), MockMotor::new(), config.encoder_scale);
    let mut control = ControlLoop::new(axis1, axis2, MockTelemetry::new(), &link, &config);

    link.target.set_target_speed(i16::MIN);
    for _ in 0..20 {
        let report = control.tick().unwrap();
        assert_eq!(report.motor1.map(|m| m.signed()), Some(-800));
    }
    assert!(control
        .telemetry()
        .lines
        .iter()
        .all(|l| l == "0,-32768\n"));
}

#[test]
fn large_position_error_does_not_overflow() {
    let link = ControlLink::new();
    let config = ControlConfig::default();
    let axis1 = Axis::new(MockCounter::new(), MockMotor::new(), config.encoder_scale);
    let axis2 = Axis::new(MockCounter::new(), MockMotor::new(), config.encoder_scale);
    let mut control = ControlLoop::new(axis1, axis2, MockTelemetry::new(), &link, &config);
    link.mode.set(SystemMode::PositionFollowing);
    control.tick().unwrap();

    // Drive the two cumulative positions far apart, in opposite directions
    for _ in 0..2_000 {
        control.axis_mut(AxisId::Axis1).counter_mut().advance(30_000);
        control.axis_mut(AxisId::Axis2).counter_mut().advance(-30_000);
        control.tick().unwrap();
    }
    assert!(control.axis(AxisId::Axis1).tracker().position() > 50_000_000);
    assert!(control.axis(AxisId::Axis2).tracker().position() < -50_000_000);
}
