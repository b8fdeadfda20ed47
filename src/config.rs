//! Rotor speed controller configuration parameters
//!
//! All tunable parameters for one RSC instance.  Values can be
//! overridden from persistent storage (see [`ConfigPort`]) or at runtime
//! through the controller setters.
//!
//! [`ConfigPort`]: crate::app::ports::ConfigPort

use serde::{Deserialize, Serialize};

use crate::channels::MAX_CHANNELS;
use crate::error::ConfigError;
use crate::rsc::RotorControlMode;

/// Power output curve used by the open-loop strategy.
///
/// All levels are normalized actuator commands (0.0–1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerOutputConfig {
    /// Output at zero collective load.
    pub low: f32,
    /// Output at full positive collective load.
    pub high: f32,
    /// Output at full negative collective load.
    pub negc: f32,
    /// Output slew limit in percent of full range per second (0 = off).
    pub slewrate: u16,
}

/// Pulse-width mapping for the RSC servo/ESC channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PwmOutputConfig {
    /// Pulse width (µs) at command 0.0.
    pub min: u16,
    /// Pulse width (µs) at command 1.0.
    pub max: u16,
    /// Polarity: negative reverses the channel.
    pub rev: i8,
}

/// Closed-loop RPM governor parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorConfig {
    pub enabled: bool,
    /// Target rotor RPM.
    pub rpm_setpoint: i16,
    /// No control action while `|setpoint - feedback|` is below this.
    pub rpm_deadband: i16,
}

/// Complete RSC configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RscConfig {
    // --- Mode ---
    pub control_mode: RotorControlMode,
    /// Commanded rotor speed for the passthrough/setpoint modes (0.0–1.0).
    pub desired_speed: f32,

    // --- Shaping ---
    /// Output while idling, and the base of every spool-up (0.0–1.0).
    pub idle_output: f32,
    /// Estimated rotor speed at or below which run-up is revoked (0.0–1.0).
    pub critical_speed: f32,
    /// Seconds for the command ramp to go 0 → 1.
    pub ramp_time: u8,
    /// Seconds for the rotor to physically reach full speed.
    pub runup_time: u8,

    pub power: PowerOutputConfig,
    pub pwm: PwmOutputConfig,
    pub governor: GovernorConfig,

    /// Output channel used when nothing else has claimed the RSC function.
    pub default_channel: u8,
}

impl Default for RscConfig {
    fn default() -> Self {
        Self {
            control_mode: RotorControlMode::SpeedPassthrough,
            desired_speed: 0.7,

            idle_output: 0.0,
            critical_speed: 0.5,
            ramp_time: 1,
            runup_time: 10,

            power: PowerOutputConfig {
                low: 0.2,
                high: 0.4,
                negc: 0.4,
                slewrate: 0,
            },
            pwm: PwmOutputConfig {
                min: 1000,
                max: 2000,
                rev: 1,
            },
            governor: GovernorConfig {
                enabled: false,
                rpm_setpoint: 1500,
                rpm_deadband: 30,
            },

            default_channel: 8,
        }
    }
}

impl RscConfig {
    /// Range-check every field.
    ///
    /// Called by [`ConfigPort`](crate::app::ports::ConfigPort) adapters
    /// before persisting.  The tick path never calls this; it coerces.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = 0.0..=1.0;

        if !unit.contains(&self.desired_speed) {
            return Err(ConfigError::ValidationFailed("desired_speed must be 0.0–1.0"));
        }
        if !unit.contains(&self.idle_output) {
            return Err(ConfigError::ValidationFailed("idle_output must be 0.0–1.0"));
        }
        if !unit.contains(&self.critical_speed) {
            return Err(ConfigError::ValidationFailed(
                "critical_speed must be 0.0–1.0",
            ));
        }
        if self.ramp_time == 0 {
            return Err(ConfigError::ValidationFailed("ramp_time must be >= 1 s"));
        }
        if self.runup_time < self.ramp_time {
            return Err(ConfigError::ValidationFailed(
                "runup_time must be >= ramp_time",
            ));
        }
        if !unit.contains(&self.power.low)
            || !unit.contains(&self.power.high)
            || !unit.contains(&self.power.negc)
        {
            return Err(ConfigError::ValidationFailed(
                "power output levels must be 0.0–1.0",
            ));
        }
        if self.pwm.min >= self.pwm.max {
            return Err(ConfigError::ValidationFailed("pwm.min must be < pwm.max"));
        }
        if self.governor.rpm_deadband < 0 {
            return Err(ConfigError::ValidationFailed(
                "governor.rpm_deadband must be >= 0",
            ));
        }
        if self.default_channel == 0 || self.default_channel > MAX_CHANNELS {
            return Err(ConfigError::ValidationFailed(
                "default_channel must be 1–16",
            ));
        }
        Ok(())
    }
}
