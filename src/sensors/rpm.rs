//! Externally fed rotor RPM.
//!
//! This backend does no measuring of its own: whoever owns the real
//! sensor (an ESC telemetry stream, a companion computer) pushes values
//! in with [`ExternalRpm::set_rpm`].  [`ExternalRpm::update`] only ages
//! the last value out once nothing has been pushed for a while.

use log::warn;

use crate::app::ports::RpmSource;

/// A reading older than this is treated as unhealthy.
pub const RPM_TIMEOUT_US: u64 = 500_000;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalRpm {
    rpm: f32,
    last_push_us: u64,
    healthy: bool,
}

impl ExternalRpm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a new reading taken at `now_us`.  Negative or non-finite
    /// values are dropped.
    pub fn set_rpm(&mut self, rpm: f32, now_us: u64) {
        if !rpm.is_finite() || rpm < 0.0 {
            warn!("rejecting rpm reading {rpm}");
            return;
        }
        self.rpm = rpm;
        self.last_push_us = now_us;
        self.healthy = true;
    }

    /// Mark the reading stale if nothing arrived within [`RPM_TIMEOUT_US`].
    pub fn update(&mut self, now_us: u64) {
        if self.healthy && now_us.saturating_sub(self.last_push_us) > RPM_TIMEOUT_US {
            warn!("external rpm stale, last reading {:.0}", self.rpm);
            self.healthy = false;
        }
    }

    pub fn healthy(&self) -> bool {
        self.healthy
    }
}

impl RpmSource for ExternalRpm {
    fn rpm(&self) -> Option<f32> {
        self.healthy.then_some(self.rpm)
    }
}
