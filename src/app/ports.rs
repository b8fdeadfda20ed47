//! Port traits: the boundary between the rotor speed controller and the
//! rest of the flight stack.
//!
//! ```text
//!   TimeSource ──▶ ┌──────────────────────┐ ──▶ OutputPort
//!   RpmSource  ──▶ │  RotorSpeedController │
//!   GovernorPid ◀─▶│                      │
//!                  └──────────────────────┘
//! ```
//!
//! Adapters (clocks, servo outputs, PID implementations, parameter
//! storage) implement these traits.  The controller consumes them via
//! generics, so the core never touches hardware directly.

use crate::channels::AuxFunction;
use crate::config::RscConfig;
use crate::error::ConfigError;

// ───────────────────────────────────────────────────────────────
// Time
// ───────────────────────────────────────────────────────────────

/// Monotonic time source.
pub trait TimeSource {
    /// Microseconds since boot.  Must never go backwards.
    fn micros64(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Output port (domain → servo/ESC hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: maps a logical output function to a physical channel.
pub trait OutputPort {
    /// Assign `function` to `channel` unless something already claimed it.
    fn set_aux_channel_default(&mut self, function: AuxFunction, channel: u8);

    /// Emit a pulse width (µs) on whatever channel carries `function`.
    fn set_output_pwm(&mut self, function: AuxFunction, pwm_us: u16);
}

impl<T: OutputPort + ?Sized> OutputPort for &mut T {
    fn set_aux_channel_default(&mut self, function: AuxFunction, channel: u8) {
        (**self).set_aux_channel_default(function, channel);
    }

    fn set_output_pwm(&mut self, function: AuxFunction, pwm_us: u16) {
        (**self).set_output_pwm(function, pwm_us);
    }
}

// ───────────────────────────────────────────────────────────────
// Governor PID
// ───────────────────────────────────────────────────────────────

/// Closed-loop controller used by the RPM governor.
///
/// The governor feeds a pre-scaled error and reads back the combined
/// P+I+D contribution; the controller clamps it to [0, 1] itself.
pub trait GovernorPid {
    /// Feed a new error sample through the input filter.
    fn set_input_filter_all(&mut self, input: f32);

    /// Combined PID output for the last filtered input.
    fn get_pid(&mut self) -> f32;

    /// Update the integration step.  Implementations that run at a fixed
    /// configured rate may ignore this.
    fn set_dt(&mut self, _dt: f32) {}

    /// Drop filter history so the next input is taken as-is.  Called
    /// whenever the governor re-engages.
    fn reset_filter(&mut self) {}
}

impl<P: GovernorPid + ?Sized> GovernorPid for &mut P {
    fn set_input_filter_all(&mut self, input: f32) {
        (**self).set_input_filter_all(input);
    }

    fn get_pid(&mut self) -> f32 {
        (**self).get_pid()
    }

    fn set_dt(&mut self, dt: f32) {
        (**self).set_dt(dt);
    }

    fn reset_filter(&mut self) {
        (**self).reset_filter();
    }
}

// ───────────────────────────────────────────────────────────────
// RPM source
// ───────────────────────────────────────────────────────────────

/// Rotor RPM measurement.
pub trait RpmSource {
    /// Latest RPM, or `None` when the sensor is unhealthy.
    fn rpm(&self) -> Option<f32>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (domain ↔ persistent parameters)
// ───────────────────────────────────────────────────────────────

/// Loads and persists RSC configuration.
///
/// Implementations MUST call [`RscConfig::validate`] before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`RscConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<RscConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &RscConfig) -> Result<(), ConfigError>;
}
