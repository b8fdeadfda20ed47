//! rsc-bench: host bench run of the rotor speed controller.
//!
//! Loads a configuration (JSON file given as the first argument, or the
//! defaults), then steps the controller through Stop → Idle → Active on a
//! simulated 50 Hz clock and logs the servo pulse once per second.
//!
//! ```text
//!   RSC_LOG=debug rsc-bench rsc.json
//! ```

use core::cell::Cell;

use anyhow::{Context, Result, anyhow};
use log::info;

use heli_rsc::adapters::param_store::MemoryParamStore;
use heli_rsc::adapters::time::MonotonicClock;
use heli_rsc::app::ports::{ConfigPort, TimeSource};
use heli_rsc::channels::{AuxFunction, ServoChannels};
use heli_rsc::config::RscConfig;
use heli_rsc::control::pid::PidController;
use heli_rsc::sensors::rpm::ExternalRpm;
use heli_rsc::{RotorControlState, RotorSpeedController};

/// 50 Hz control loop.
const TICK_US: u64 = 20_000;
const TICKS_PER_SEC: u32 = 50;

/// Environment variable selecting the log filter (`error` … `trace`).
const LOG_LEVEL_ENV: &str = "RSC_LOG";

const STOP_SECS: u32 = 1;
const IDLE_SECS: u32 = 2;
const MAX_ACTIVE_SECS: u32 = 60;

/// Clock advanced by hand, one tick at a time.
struct SimClock {
    now: Cell<u64>,
}

impl SimClock {
    fn new() -> Self {
        Self { now: Cell::new(1) }
    }

    fn advance(&self, us: u64) {
        self.now.set(self.now.get() + us);
    }
}

impl TimeSource for SimClock {
    fn micros64(&self) -> u64 {
        self.now.get()
    }
}

/// Console logger filtered by `var`, `info` when unset.
fn logger_builder(var: &str) -> env_logger::Builder {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or(var, "info"))
}

fn load_config(path: Option<&str>) -> Result<RscConfig> {
    let Some(path) = path else {
        info!("no config file given, using defaults");
        return Ok(RscConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let cfg: RscConfig =
        serde_json::from_str(&text).map_err(|e| anyhow!("parsing {path}: {e}"))?;
    Ok(cfg)
}

fn main() -> Result<()> {
    logger_builder(LOG_LEVEL_ENV)
        .try_init()
        .map_err(|e| anyhow!("logger init: {e}"))?;
    info!("rsc-bench v{}", env!("CARGO_PKG_VERSION"));
    let wall = MonotonicClock::new();

    let arg = std::env::args().nth(1);
    let mut params = MemoryParamStore::new();
    params.save(&load_config(arg.as_deref())?)?;
    let config = params.load()?;
    info!("mode {:?}, ramp {} s, run-up {} s", config.control_mode, config.ramp_time, config.runup_time);

    let dt = TICK_US as f32 * 1.0e-6;
    let pid = PidController::new(0.8, 0.4, 0.0, 0.6, 10.0, dt);
    let mut rsc = RotorSpeedController::with_governor_pid(config, AuxFunction::HeliRsc, pid);

    let mut channels = ServoChannels::new();
    rsc.init_servo(&mut channels);

    let clock = SimClock::new();
    let mut rpm = ExternalRpm::new();
    let setpoint = f32::from(config.governor.rpm_setpoint);

    let schedule = [
        (RotorControlState::Stop, STOP_SECS),
        (RotorControlState::Idle, IDLE_SECS),
        (RotorControlState::Active, MAX_ACTIVE_SECS),
    ];

    let mut elapsed_ticks: u32 = 0;
    for (state, secs) in schedule {
        info!("command {state:?}");
        for tick in 0..secs * TICKS_PER_SEC {
            // echo the speed estimate back as measured rpm
            rpm.set_rpm(rsc.get_rotor_speed() * setpoint, clock.micros64());
            rpm.update(clock.micros64());
            rsc.update_rpm_feedback(&rpm);

            rsc.output(state, &clock, &mut channels);
            clock.advance(TICK_US);
            elapsed_ticks += 1;

            if tick % TICKS_PER_SEC == 0 {
                info!(
                    "t={:>3}s out={:.3} ramp={:.3} runup={:.3} complete={} pwm={:?}",
                    elapsed_ticks / TICKS_PER_SEC,
                    rsc.get_control_output(),
                    rsc.get_rotor_ramp_output(),
                    rsc.get_rotor_runup_output(),
                    rsc.is_runup_complete(),
                    channels.function_pwm(AuxFunction::HeliRsc),
                );
            }

            if state == RotorControlState::Active && rsc.is_runup_complete() {
                info!(
                    "run-up complete after {:.2} s active ({} us wall)",
                    tick as f32 / TICKS_PER_SEC as f32,
                    wall.micros64()
                );
                return Ok(());
            }
        }
    }

    info!("run-up not complete after {MAX_ACTIVE_SECS} s");
    Ok(())
}
