//! Governor and open-loop power modes through the full tick.

use heli_rsc::channels::AuxFunction;
use heli_rsc::config::{GovernorConfig, PowerOutputConfig, RscConfig};
use heli_rsc::control::pid::PidController;
use heli_rsc::{RotorControlMode, RotorControlState, RotorSpeedController};

use crate::mock_hw::Bench;

const TICK_100MS: u64 = 100_000;

fn governor(deadband: i16) -> RscConfig {
    RscConfig {
        control_mode: RotorControlMode::Governor,
        ramp_time: 1,
        runup_time: 1,
        idle_output: 0.0,
        governor: GovernorConfig {
            enabled: true,
            rpm_setpoint: 1500,
            rpm_deadband: deadband,
        },
        ..Default::default()
    }
}

fn p_only(kp: f32) -> PidController {
    PidController::new(kp, 0.0, 0.0, 1.0, 0.0, 0.1)
}

#[test]
fn pid_drives_output_once_ramp_is_full() {
    let rsc = RotorSpeedController::with_governor_pid(governor(30), AuxFunction::HeliRsc, p_only(1.0));
    let mut bench = Bench::from_controller(rsc, TICK_100MS);
    bench.rsc.set_rpm_feedback(1450.0);
    bench.prime();

    bench.run(RotorControlState::Active, 10);
    assert_eq!(bench.rsc.get_rotor_ramp_output(), 1.0);
    // (1500 - 1450) / 100
    assert!((bench.rsc.get_control_output() - 0.5).abs() < 1e-5);

    let pid = bench.rsc.governor_pid().unwrap();
    assert!((pid.get_p() - 0.5).abs() < 1e-5);
}

#[test]
fn pid_output_is_clamped_while_target_is_below_feedback() {
    let rsc = RotorSpeedController::with_governor_pid(governor(30), AuxFunction::HeliRsc, p_only(1.0));
    let mut bench = Bench::from_controller(rsc, TICK_100MS);
    bench.rsc.set_rpm_feedback(1450.0);
    bench.prime();

    // ramped target 150..750 rpm, error negative
    bench.run(RotorControlState::Active, 5);
    assert_eq!(bench.rsc.get_control_output(), 0.0);
}

#[test]
fn deadband_holds_previous_output_exactly() {
    let mut bench = Bench::new(governor(30), TICK_100MS);
    bench.prime();

    // no pid: open-loop 0.5 ramp * power.low 0.2
    bench.run(RotorControlState::Active, 5);
    let held = bench.rsc.get_control_output();
    assert!((held - 0.1).abs() < 1e-5);

    bench.rsc.set_rpm_feedback(1490.0);
    for _ in 0..3 {
        bench.step(RotorControlState::Active);
        assert_eq!(bench.rsc.get_control_output(), held);
    }

    bench.rsc.set_rpm_feedback(1400.0);
    bench.step(RotorControlState::Active);
    // ramp now 0.9
    assert!((bench.rsc.get_control_output() - 0.18).abs() < 1e-5);
}

#[test]
fn deadband_compares_against_full_setpoint_during_spool_up() {
    let rsc = RotorSpeedController::with_governor_pid(governor(30), AuxFunction::HeliRsc, p_only(1.0));
    let mut bench = Bench::from_controller(rsc, TICK_100MS);
    bench.rsc.set_rpm_feedback(1500.0);
    bench.prime();

    bench.run(RotorControlState::Active, 10);
    assert_eq!(bench.rsc.get_rotor_ramp_output(), 1.0);
    assert_eq!(bench.rsc.get_control_output(), 0.0);
}

#[test]
fn disabled_governor_passes_desired_speed_through() {
    let mut cfg = governor(30);
    cfg.governor.enabled = false;
    cfg.idle_output = 0.1;
    cfg.desired_speed = 0.9;
    let rsc = RotorSpeedController::with_governor_pid(cfg, AuxFunction::HeliRsc, p_only(1.0));
    let mut bench = Bench::from_controller(rsc, TICK_100MS);
    bench.prime();

    bench.run(RotorControlState::Active, 10);
    assert!((bench.rsc.get_control_output() - 0.9).abs() < 1e-5);
}

#[test]
fn missing_pid_falls_back_to_power_curve() {
    let mut bench = Bench::new(governor(0), TICK_100MS);
    bench.rsc.set_load_feedforward(1.0);
    bench.prime();

    bench.run(RotorControlState::Active, 10);
    // power.high at full load
    assert!((bench.rsc.get_control_output() - 0.4).abs() < 1e-5);
    assert_eq!(
        bench.rsc.get_control_output(),
        bench.rsc.calc_open_loop_power_control_output()
    );
}

#[test]
fn governor_respects_slew_limit() {
    let mut cfg = governor(30);
    // 50 %/s -> 0.05 per 100 ms tick
    cfg.power.slewrate = 50;
    let rsc = RotorSpeedController::with_governor_pid(cfg, AuxFunction::HeliRsc, p_only(1.0));
    let mut bench = Bench::from_controller(rsc, TICK_100MS);
    bench.prime();

    let mut last = bench.rsc.get_control_output();
    for _ in 0..5 {
        bench.step(RotorControlState::Active);
        let now = bench.rsc.get_control_output();
        assert!(now - last <= 0.05 + 1e-6, "step {last} -> {now}");
        last = now;
    }
    assert!((last - 0.25).abs() < 1e-5);
}

#[test]
fn open_loop_power_curve_is_symmetric_for_equal_sides() {
    let cfg = RscConfig {
        control_mode: RotorControlMode::OpenLoopPowerOutput,
        ramp_time: 1,
        runup_time: 1,
        idle_output: 0.1,
        power: PowerOutputConfig {
            low: 0.3,
            high: 0.7,
            negc: 0.7,
            slewrate: 0,
        },
        ..Default::default()
    };

    let mut up = Bench::new(cfg, TICK_100MS);
    let mut down = Bench::new(cfg, TICK_100MS);
    up.rsc.set_load_feedforward(0.5);
    down.rsc.set_load_feedforward(-0.5);
    up.prime();
    down.prime();

    up.run(RotorControlState::Active, 10);
    down.run(RotorControlState::Active, 10);
    assert!((up.rsc.get_control_output() - 0.5).abs() < 1e-5);
    assert!((down.rsc.get_control_output() - 0.5).abs() < 1e-5);
    assert_eq!(up.out.last_pwm(), down.out.last_pwm());
}

#[test]
fn open_loop_negative_side_follows_negc() {
    let cfg = RscConfig {
        control_mode: RotorControlMode::OpenLoopPowerOutput,
        ramp_time: 1,
        runup_time: 1,
        idle_output: 0.0,
        power: PowerOutputConfig {
            low: 0.3,
            high: 0.7,
            negc: 0.5,
            slewrate: 0,
        },
        ..Default::default()
    };
    let mut bench = Bench::new(cfg, TICK_100MS);
    bench.rsc.set_load_feedforward(-1.0);
    bench.prime();

    bench.run(RotorControlState::Active, 10);
    assert!((bench.rsc.get_control_output() - 0.5).abs() < 1e-5);
}
