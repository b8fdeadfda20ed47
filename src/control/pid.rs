//! PID controller for the rotor RPM governor
//!
//! Filtered-error proportional-integral-derivative controller.  The
//! governor feeds it a pre-scaled RPM error through
//! [`set_input_filter_all`](PidController::set_input_filter_all) and
//! reads back the combined output with [`get_pid`](PidController::get_pid).

use core::f32::consts::PI;

use crate::app::ports::GovernorPid;

/// PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f32,
    ki: f32,
    kd: f32,
    /// Integrator magnitude limit.
    imax: f32,
    /// Input low-pass cutoff (Hz).  0 disables filtering.
    filt_hz: f32,
    /// Integration step (seconds).
    dt: f32,

    input: f32,
    derivative: f32,
    integrator: f32,
    reset_filter: bool,
}

impl PidController {
    pub fn new(kp: f32, ki: f32, kd: f32, imax: f32, filt_hz: f32, dt: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            imax: imax.abs(),
            filt_hz: filt_hz.max(0.0),
            dt,
            input: 0.0,
            derivative: 0.0,
            integrator: 0.0,
            reset_filter: true,
        }
    }

    /// Update gains
    pub fn set_gains(&mut self, kp: f32, ki: f32, kd: f32) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    /// Low-pass the new input and update the derivative.
    ///
    /// The first sample after a reset is taken unfiltered and produces no
    /// derivative kick.
    pub fn set_input_filter_all(&mut self, input: f32) {
        if !input.is_finite() {
            return;
        }

        if self.reset_filter {
            self.reset_filter = false;
            self.input = input;
            self.derivative = 0.0;
            return;
        }

        let delta = (input - self.input) * self.filter_alpha();
        self.input += delta;

        if self.dt > 0.0 {
            self.derivative = delta / self.dt;
        }
    }

    pub fn get_p(&self) -> f32 {
        self.input * self.kp
    }

    /// Integrate the current input and return the I contribution.
    pub fn get_i(&mut self) -> f32 {
        if self.ki != 0.0 && self.dt > 0.0 {
            self.integrator += self.input * self.ki * self.dt;
            self.integrator = self.integrator.clamp(-self.imax, self.imax);
            self.integrator
        } else {
            0.0
        }
    }

    pub fn get_d(&self) -> f32 {
        self.kd * self.derivative
    }

    pub fn get_pid(&mut self) -> f32 {
        self.get_p() + self.get_i() + self.get_d()
    }

    pub fn integrator(&self) -> f32 {
        self.integrator
    }

    pub fn set_dt(&mut self, dt: f32) {
        self.dt = dt;
    }

    pub fn reset_i(&mut self) {
        self.integrator = 0.0;
    }

    pub fn reset_filter(&mut self) {
        self.reset_filter = true;
    }

    /// Reset controller state
    pub fn reset(&mut self) {
        self.reset_i();
        self.reset_filter();
        self.input = 0.0;
        self.derivative = 0.0;
    }

    fn filter_alpha(&self) -> f32 {
        if self.filt_hz <= 0.0 || self.dt <= 0.0 {
            return 1.0;
        }
        let rc = 1.0 / (2.0 * PI * self.filt_hz);
        self.dt / (self.dt + rc)
    }
}

impl GovernorPid for PidController {
    fn set_input_filter_all(&mut self, input: f32) {
        PidController::set_input_filter_all(self, input);
    }

    fn get_pid(&mut self) -> f32 {
        PidController::get_pid(self)
    }

    fn set_dt(&mut self, dt: f32) {
        PidController::set_dt(self, dt);
    }

    fn reset_filter(&mut self) {
        PidController::reset_filter(self);
    }
}
