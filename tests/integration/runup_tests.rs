//! Spool-up, run-up and command-state behaviour through the full tick.

use heli_rsc::config::RscConfig;
use heli_rsc::{RotorControlMode, RotorControlState};

use crate::mock_hw::Bench;

const TICK_100MS: u64 = 100_000;

fn passthrough(ramp_time: u8, runup_time: u8, idle: f32) -> RscConfig {
    RscConfig {
        control_mode: RotorControlMode::SpeedPassthrough,
        ramp_time,
        runup_time,
        idle_output: idle,
        desired_speed: 1.0,
        ..Default::default()
    }
}

#[test]
fn two_second_spool_up_completes_on_tick_twenty() {
    let mut bench = Bench::new(passthrough(2, 2, 0.1), TICK_100MS);
    bench.prime();

    bench.run(RotorControlState::Active, 19);
    assert!(bench.rsc.get_rotor_ramp_output() < 1.0);
    assert!(!bench.rsc.is_runup_complete());

    bench.step(RotorControlState::Active);
    assert_eq!(bench.rsc.get_rotor_ramp_output(), 1.0);
    assert_eq!(bench.rsc.get_rotor_runup_output(), 1.0);
    assert!(bench.rsc.is_runup_complete());
    assert!((bench.rsc.get_control_output() - 1.0).abs() < 1e-6);
}

#[test]
fn ramp_is_linear_in_elapsed_time() {
    let mut bench = Bench::new(passthrough(4, 4, 0.0), TICK_100MS);
    bench.prime();

    for n in 1..=50 {
        bench.step(RotorControlState::Active);
        let expected = (n as f32 * 0.1 / 4.0).min(1.0);
        assert!(
            (bench.rsc.get_rotor_ramp_output() - expected).abs() < 1e-5,
            "tick {n}: ramp {} expected {expected}",
            bench.rsc.get_rotor_ramp_output()
        );
    }
}

#[test]
fn output_follows_ramp_from_idle_to_desired() {
    let mut bench = Bench::new(passthrough(2, 10, 0.2), TICK_100MS);
    bench.rsc.set_desired_speed(0.8);
    bench.prime();

    bench.run(RotorControlState::Active, 10);
    // ramp 0.5 -> 0.2 + 0.5 * 0.6
    assert!((bench.rsc.get_control_output() - 0.5).abs() < 1e-5);
}

#[test]
fn runup_lags_ramp_when_slower() {
    let mut bench = Bench::new(passthrough(1, 5, 0.0), TICK_100MS);
    bench.prime();

    bench.run(RotorControlState::Active, 10);
    assert_eq!(bench.rsc.get_rotor_ramp_output(), 1.0);
    assert!((bench.rsc.get_rotor_runup_output() - 0.2).abs() < 1e-5);
    assert!(!bench.rsc.is_runup_complete());

    bench.run(RotorControlState::Active, 45);
    assert!(bench.rsc.is_runup_complete());
}

#[test]
fn idle_applies_idle_output_instantly() {
    let mut bench = Bench::new(passthrough(2, 2, 0.15), TICK_100MS);
    bench.prime();
    bench.run(RotorControlState::Active, 30);

    bench.step(RotorControlState::Idle);
    assert_eq!(bench.rsc.get_control_output(), 0.15);
    assert_eq!(bench.rsc.get_rotor_ramp_output(), 0.0);
}

#[test]
fn stop_cuts_output_in_one_tick() {
    let mut bench = Bench::new(passthrough(2, 2, 0.15), TICK_100MS);
    bench.prime();
    bench.run(RotorControlState::Active, 30);
    assert!(bench.rsc.get_control_output() > 0.9);

    bench.step(RotorControlState::Stop);
    assert_eq!(bench.rsc.get_control_output(), 0.0);
    assert_eq!(bench.out.last_pwm(), Some(1000));
}

#[test]
fn completion_holds_above_critical_and_clears_at_critical() {
    let mut cfg = passthrough(1, 2, 0.0);
    cfg.critical_speed = 0.5;
    let mut bench = Bench::new(cfg, TICK_100MS);
    bench.prime();
    bench.run(RotorControlState::Active, 25);
    assert!(bench.rsc.is_runup_complete());

    // ramp target drops to 0, run-up coasts down 0.05 per tick
    bench.run(RotorControlState::Idle, 5);
    assert!(bench.rsc.get_rotor_speed() > 0.5);
    assert!(bench.rsc.is_runup_complete());

    bench.run(RotorControlState::Idle, 6);
    assert!(bench.rsc.get_rotor_speed() <= 0.5);
    assert!(!bench.rsc.is_runup_complete());
}

#[test]
fn rotor_running_still_tracks_runup_while_stopped() {
    let mut bench = Bench::new(passthrough(1, 2, 0.0), TICK_100MS);
    bench.prime();
    bench.run(RotorControlState::Active, 25);

    bench.run(RotorControlState::Stop, 4);
    assert!((bench.rsc.get_rotor_runup_output() - 0.8).abs() < 1e-5);
}

#[test]
fn reengaging_spinning_rotor_resumes_from_estimate() {
    let mut bench = Bench::new(passthrough(1, 2, 0.0), TICK_100MS);
    bench.prime();
    bench.run(RotorControlState::Active, 25);
    bench.run(RotorControlState::Idle, 4);
    let coasting = bench.rsc.get_rotor_runup_output();
    assert!((coasting - 0.8).abs() < 1e-5);

    bench.step(RotorControlState::Active);
    // snapped to the estimate, then one ramp increment
    assert!((bench.rsc.get_rotor_ramp_output() - (coasting + 0.1)).abs() < 1e-5);
}

#[test]
fn missed_ticks_scale_with_elapsed_time() {
    let mut bench = Bench::new(passthrough(2, 2, 0.0), TICK_100MS);
    bench.prime();

    bench.clock.advance(500_000);
    bench
        .rsc
        .output(RotorControlState::Active, &bench.clock, &mut bench.out);
    assert!((bench.rsc.get_rotor_ramp_output() - 0.25).abs() < 1e-5);
}
