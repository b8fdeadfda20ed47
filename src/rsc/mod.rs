//! Rotor speed controller (RSC).
//!
//! One [`RotorSpeedController`] per rotor.  The flight stack calls
//! [`output`](RotorSpeedController::output) once per control tick with the
//! rotor command for that tick:
//!
//! ```text
//!  output(state)
//!    │
//!    ├─ dt from TimeSource (1 ms on the first call)
//!    ├─ Stop   → ramp 0, output 0
//!    ├─ Idle   → ramp 0, output idle
//!    ├─ Active → ramp 1, output by control mode
//!    │            ├─ passthrough / setpoint: idle → desired along the ramp
//!    │            ├─ open-loop power:        feed-forward power curve
//!    │            └─ governor:               deadband hold or PID
//!    ├─ run-up estimate (always)
//!    ├─ slew limit (if configured)
//!    └─ PWM → OutputPort (skipped when disabled)
//! ```
//!
//! The tick never fails, blocks or allocates.  Bad ramp/run-up times are
//! coerced, and a missing governor PID degrades to open-loop.

pub mod power;
pub mod pwm;
pub mod ramp;

use log::info;
use serde::{Deserialize, Serialize};

use crate::app::ports::{GovernorPid, OutputPort, RpmSource, TimeSource};
use crate::channels::AuxFunction;
use crate::config::{PwmOutputConfig, RscConfig};
use crate::control::pid::PidController;

use ramp::RotorRamp;

/// `dt` used on the very first tick, before a previous timestamp exists.
pub const BOOTSTRAP_DT: f32 = 0.001;

/// Converts `power.slewrate` (percent per second) to a fraction per second.
pub const SLEWRATE_SCALE: f32 = 0.01;

// ---------------------------------------------------------------------------
// Command and mode
// ---------------------------------------------------------------------------

/// Rotor command for one tick.  Decided upstream, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RotorControlState {
    Stop = 0,
    Idle = 1,
    Active = 2,
}

/// How the active output is computed.  Discriminants are the stored
/// parameter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RotorControlMode {
    Disabled = 0,
    SpeedPassthrough = 1,
    SpeedSetpoint = 2,
    OpenLoopPowerOutput = 3,
    Governor = 4,
}

impl RotorControlMode {
    /// Total number of modes.
    pub const COUNT: usize = 5;

    /// Convert a stored parameter value back to a mode.
    pub fn from_index(idx: u8) -> Option<Self> {
        match idx {
            0 => Some(Self::Disabled),
            1 => Some(Self::SpeedPassthrough),
            2 => Some(Self::SpeedSetpoint),
            3 => Some(Self::OpenLoopPowerOutput),
            4 => Some(Self::Governor),
            _ => None,
        }
    }
}

impl TryFrom<u8> for RotorControlMode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(value).ok_or(value)
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Rotor speed controller for one rotor.
///
/// `P` is the governor PID.  It is optional: without one, governor mode
/// runs the open-loop power curve instead.  Pass `&mut pid` to borrow a
/// PID owned elsewhere.
pub struct RotorSpeedController<P = PidController> {
    config: RscConfig,
    function: AuxFunction,
    pid: Option<P>,

    // -- Running state --
    /// Last command sent to the actuator (0.0–1.0).
    control_output: f32,
    ramp: RotorRamp,
    /// Timestamp of the previous tick (µs); 0 until the first tick.
    last_update_us: u64,
    /// The PID drove the previous closed-loop tick without interruption.
    governor_engaged: bool,

    // -- Inputs pushed by the flight stack --
    /// Signed collective load estimate; sign picks the power curve side.
    load_feedforward: f32,
    rpm_feedback: f32,
}

impl RotorSpeedController<PidController> {
    /// Controller without a governor PID.
    pub fn new(config: RscConfig, function: AuxFunction) -> Self {
        Self::build(config, function, None)
    }
}

impl<P: GovernorPid> RotorSpeedController<P> {
    /// Controller with a governor PID attached.
    pub fn with_governor_pid(config: RscConfig, function: AuxFunction, pid: P) -> Self {
        Self::build(config, function, Some(pid))
    }

    fn build(config: RscConfig, function: AuxFunction, pid: Option<P>) -> Self {
        Self {
            config,
            function,
            pid,
            control_output: 0.0,
            ramp: RotorRamp::new(),
            last_update_us: 0,
            governor_engaged: false,
            load_feedforward: 0.0,
            rpm_feedback: 0.0,
        }
    }

    /// Register the default output channel for this controller's function.
    pub fn init_servo(&self, out: &mut impl OutputPort) {
        out.set_aux_channel_default(self.function, self.config.default_channel);
    }

    // ── Per-tick update ───────────────────────────────────────

    /// Run one control tick and write the resulting pulse width.
    pub fn output(
        &mut self,
        state: RotorControlState,
        clock: &impl TimeSource,
        out: &mut impl OutputPort,
    ) {
        let now = clock.micros64();
        let dt = if self.last_update_us == 0 {
            BOOTSTRAP_DT
        } else {
            1.0e-6 * now.saturating_sub(self.last_update_us) as f32
        };
        self.last_update_us = now;

        let last_control_output = self.control_output;

        match state {
            RotorControlState::Stop => {
                self.governor_engaged = false;
                // ramp drops to zero instantly inside update_rotor_ramp
                self.update_rotor_ramp(0.0, dt);
                self.control_output = 0.0;
            }
            RotorControlState::Idle => {
                self.governor_engaged = false;
                self.update_rotor_ramp(0.0, dt);
                // idle is applied instantly, no ramping
                self.control_output = self.config.idle_output;
            }
            RotorControlState::Active => {
                self.update_rotor_ramp(1.0, dt);
                if let Some(output) = self.active_output(last_control_output, dt) {
                    self.control_output = output;
                }
            }
        }

        self.update_rotor_runup(dt);

        if !self.control_output.is_finite() {
            self.control_output = last_control_output;
        }

        if self.config.power.slewrate > 0 {
            let max_delta = dt * f32::from(self.config.power.slewrate) * SLEWRATE_SCALE;
            self.control_output = self.control_output.clamp(
                last_control_output - max_delta,
                last_control_output + max_delta,
            );
        }

        // out-of-range idle/power parameters can push the strategies outside [0, 1]
        self.control_output = self.control_output.clamp(0.0, 1.0);

        self.write_rsc(self.control_output, out);
    }

    /// Output for an Active tick, or `None` to leave it untouched.
    fn active_output(&mut self, last_control_output: f32, dt: f32) -> Option<f32> {
        match self.config.control_mode {
            RotorControlMode::SpeedPassthrough | RotorControlMode::SpeedSetpoint => {
                self.governor_engaged = false;
                Some(self.passthrough_output())
            }
            RotorControlMode::OpenLoopPowerOutput => {
                self.governor_engaged = false;
                Some(self.calc_open_loop_power_control_output())
            }
            RotorControlMode::Governor => {
                let gov = &self.config.governor;
                if !gov.enabled {
                    self.governor_engaged = false;
                    Some(self.passthrough_output())
                } else if (f32::from(gov.rpm_setpoint) - self.rpm_feedback).abs()
                    < f32::from(gov.rpm_deadband)
                {
                    // inside the deadband: hold, no control action
                    Some(last_control_output)
                } else {
                    if let Some(pid) = self.pid.as_mut() {
                        // stale filter history from a previous engagement
                        if !self.governor_engaged {
                            pid.reset_filter();
                        }
                        pid.set_dt(dt);
                    }
                    self.governor_engaged = true;
                    Some(self.calc_closed_loop_power_control_output())
                }
            }
            RotorControlMode::Disabled => {
                self.governor_engaged = false;
                None
            }
        }
    }

    fn passthrough_output(&self) -> f32 {
        let idle = self.config.idle_output;
        idle + self.ramp.ramp_output() * (self.config.desired_speed - idle)
    }

    /// Open-loop power output; also the governor fallback.
    pub fn calc_open_loop_power_control_output(&self) -> f32 {
        power::open_loop_output(
            self.ramp.ramp_output(),
            self.config.idle_output,
            &self.config.power,
            self.load_feedforward,
        )
    }

    /// Closed-loop governor output from the PID, clamped to [0, 1].
    pub fn calc_closed_loop_power_control_output(&mut self) -> f32 {
        let ramp_output = self.ramp.ramp_output();
        let idle_output = self.config.idle_output;
        let power = self.config.power;
        let load_feedforward = self.load_feedforward;

        power::closed_loop_output(
            self.pid.as_mut(),
            ramp_output,
            &self.config.governor,
            self.rpm_feedback,
            || power::open_loop_output(ramp_output, idle_output, &power, load_feedforward),
        )
    }

    /// Slew the command ramp toward `target`.
    pub fn update_rotor_ramp(&mut self, target: f32, dt: f32) {
        ramp::coerce_ramp_time(&mut self.config.ramp_time);
        self.ramp.update_ramp(target, dt, self.config.ramp_time);
    }

    /// Slew the rotor speed estimate and update run-up complete.
    pub fn update_rotor_runup(&mut self, dt: f32) {
        ramp::coerce_runup_time(&mut self.config.runup_time, self.config.ramp_time);
        self.ramp.update_runup(
            dt,
            self.config.runup_time,
            self.config.control_mode,
            self.config.critical_speed,
        );
    }

    /// Map `command` to a pulse width and send it, unless disabled.
    ///
    /// Disabled mode writes nothing so another user of the channel is not
    /// fought over.
    pub fn write_rsc(&self, command: f32, out: &mut impl OutputPort) {
        if self.config.control_mode == RotorControlMode::Disabled {
            return;
        }
        let pwm_us = pwm::command_to_pwm(command, &self.config.pwm);
        out.set_output_pwm(self.function, pwm_us);
    }

    // ── Setters ───────────────────────────────────────────────

    /// Governor enable, RPM setpoint, RPM deadband and latest RPM.
    pub fn set_gov_enable(&mut self, enabled: bool, rpm: i16, deadband: i16, rpm_feedback: f32) {
        if enabled != self.config.governor.enabled {
            info!("governor {}", if enabled { "enabled" } else { "disabled" });
        }
        self.config.governor.enabled = enabled;
        self.config.governor.rpm_setpoint = rpm;
        self.config.governor.rpm_deadband = deadband;
        self.rpm_feedback = rpm_feedback;
    }

    /// Open-loop power curve and output slew limit.
    pub fn set_power_output_range(&mut self, low: f32, high: f32, negc: f32, slewrate: u16) {
        self.config.power.low = low;
        self.config.power.high = high;
        self.config.power.negc = negc;
        self.config.power.slewrate = slewrate;
    }

    pub fn set_control_mode(&mut self, mode: RotorControlMode) {
        if mode != self.config.control_mode {
            info!("RSC mode {:?} -> {:?}", self.config.control_mode, mode);
            self.config.control_mode = mode;
        }
    }

    pub fn set_desired_speed(&mut self, speed: f32) {
        self.config.desired_speed = speed;
    }

    pub fn set_idle_output(&mut self, idle: f32) {
        self.config.idle_output = idle;
    }

    pub fn set_critical_speed(&mut self, speed: f32) {
        self.config.critical_speed = speed;
    }

    pub fn set_ramp_time(&mut self, secs: u8) {
        self.config.ramp_time = secs;
    }

    pub fn set_runup_time(&mut self, secs: u8) {
        self.config.runup_time = secs;
    }

    pub fn set_pwm_range(&mut self, pwm: PwmOutputConfig) {
        self.config.pwm = pwm;
    }

    pub fn set_load_feedforward(&mut self, load: f32) {
        self.load_feedforward = load;
    }

    pub fn set_rpm_feedback(&mut self, rpm: f32) {
        self.rpm_feedback = rpm;
    }

    /// Copy a healthy reading from `source` into the RPM feedback.
    /// An unhealthy sensor leaves the previous feedback in place.
    pub fn update_rpm_feedback(&mut self, source: &impl RpmSource) {
        if let Some(rpm) = source.rpm() {
            self.rpm_feedback = rpm;
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn get_control_output(&self) -> f32 {
        self.control_output
    }

    /// Estimated rotor speed (0.0–1.0).
    pub fn get_rotor_speed(&self) -> f32 {
        self.ramp.rotor_speed()
    }

    pub fn get_rotor_ramp_output(&self) -> f32 {
        self.ramp.ramp_output()
    }

    pub fn get_rotor_runup_output(&self) -> f32 {
        self.ramp.runup_output()
    }

    pub fn is_runup_complete(&self) -> bool {
        self.ramp.runup_complete()
    }

    pub fn get_desired_speed(&self) -> f32 {
        self.config.desired_speed
    }

    pub fn get_idle_output(&self) -> f32 {
        self.config.idle_output
    }

    pub fn get_control_mode(&self) -> RotorControlMode {
        self.config.control_mode
    }

    pub fn get_rpm_feedback(&self) -> f32 {
        self.rpm_feedback
    }

    pub fn output_function(&self) -> AuxFunction {
        self.function
    }

    pub fn config(&self) -> &RscConfig {
        &self.config
    }

    pub fn governor_pid(&self) -> Option<&P> {
        self.pid.as_ref()
    }
}
