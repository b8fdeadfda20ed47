//! Ramp and run-up estimators.
//!
//! Two coupled first-order slews:
//!
//! - the **ramp** is the command target (0 → 1 over `ramp_time`), which
//!   drops instantly when the rotor is commanded down;
//! - the **run-up** estimates actual rotor speed and lags the ramp with
//!   its own `runup_time` in both directions.
//!
//! When the ramp has to climb it first catches up to the run-up estimate,
//! so re-engaging a rotor that is still spinning does not restart the
//! spool-up from zero.

use log::{info, warn};

use super::RotorControlMode;

/// Ramp, run-up and the latched run-up complete flag.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotorRamp {
    ramp_output: f32,
    runup_output: f32,
    runup_complete: bool,
}

impl RotorRamp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Command target trajectory (0.0–1.0).
    pub fn ramp_output(&self) -> f32 {
        self.ramp_output
    }

    /// Estimated rotor speed (0.0–1.0).
    pub fn runup_output(&self) -> f32 {
        self.runup_output
    }

    pub fn runup_complete(&self) -> bool {
        self.runup_complete
    }

    /// Slew the ramp toward `target`.  `ramp_time` must already be >= 1.
    pub fn update_ramp(&mut self, target: f32, dt: f32, ramp_time: u8) {
        if self.ramp_output < target {
            // jump to the estimated speed rather than re-ramping from below it
            if self.ramp_output < self.runup_output {
                self.ramp_output = self.runup_output;
            }
            self.ramp_output += dt / f32::from(ramp_time);
            if self.ramp_output > target {
                self.ramp_output = target;
            }
        } else {
            // ramping down happens instantly
            self.ramp_output = target;
        }
    }

    /// Slew the speed estimate toward the ramp and update run-up complete.
    /// `runup_time` must already be >= 1.
    pub fn update_runup(
        &mut self,
        dt: f32,
        runup_time: u8,
        mode: RotorControlMode,
        critical_speed: f32,
    ) {
        let increment = dt / f32::from(runup_time);
        if self.runup_output < self.ramp_output {
            self.runup_output += increment;
            if self.runup_output > self.ramp_output {
                self.runup_output = self.ramp_output;
            }
        } else {
            self.runup_output -= increment;
            if self.runup_output < self.ramp_output {
                self.runup_output = self.ramp_output;
            }
        }

        // rotor speed is meaningless without speed control
        if mode == RotorControlMode::Disabled {
            self.runup_complete = true;
            return;
        }

        if !self.runup_complete && self.ramp_output >= 1.0 && self.runup_output >= 1.0 {
            info!("rotor run-up complete");
            self.runup_complete = true;
        }

        // revoke below critical speed, covers a target speed under critical too
        if self.runup_complete && self.rotor_speed() <= critical_speed {
            info!(
                "rotor run-up revoked, speed {:.2} <= critical {:.2}",
                self.rotor_speed(),
                critical_speed
            );
            self.runup_complete = false;
        }
    }

    /// Rotor speed estimate.  No measured speed is used; the run-up
    /// output stands in for it.
    pub fn rotor_speed(&self) -> f32 {
        self.runup_output
    }
}

/// Force `ramp_time` to at least one second.
pub fn coerce_ramp_time(ramp_time: &mut u8) {
    if *ramp_time == 0 {
        warn!("ramp_time 0 s, using 1 s");
        *ramp_time = 1;
    }
}

/// Force `runup_time` to at least `ramp_time` and at least one second.
pub fn coerce_runup_time(runup_time: &mut u8, ramp_time: u8) {
    if *runup_time < ramp_time {
        warn!("runup_time {runup_time} s below ramp_time {ramp_time} s, using ramp_time");
        *runup_time = ramp_time;
    }
    if *runup_time == 0 {
        warn!("runup_time 0 s, using 1 s");
        *runup_time = 1;
    }
}
