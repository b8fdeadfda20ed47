//! Normalized command → servo pulse width.

use crate::config::PwmOutputConfig;

/// Map a [0, 1] command onto `[pwm.min, pwm.max]` µs.
///
/// Negative `rev` flips the channel so 0.0 lands on `max`.  The command is
/// clamped first, so the result never leaves the configured range.
pub fn command_to_pwm(command: f32, pwm: &PwmOutputConfig) -> u16 {
    let span = pwm.max.saturating_sub(pwm.min);
    let offset = (command.clamp(0.0, 1.0) * f32::from(span)) as u16;
    if pwm.rev >= 0 {
        pwm.min + offset
    } else {
        pwm.max - offset
    }
}
