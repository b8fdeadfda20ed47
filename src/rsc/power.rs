//! Power output strategies for the open-loop and governor modes.

use crate::app::ports::GovernorPid;
use crate::config::{GovernorConfig, PowerOutputConfig};

/// RPM error per unit of PID input.
pub const GOVERNOR_RPM_SCALE: f32 = 100.0;

/// Feed-forward output from the estimated collective load.
///
/// The power curve is a V around zero load: positive load (positive
/// collective) follows `low → high`, negative load follows `low → negc`.
/// The whole curve is scaled by the ramp, so spool-up starts at idle.
pub fn open_loop_output(
    ramp_output: f32,
    idle_output: f32,
    power: &PowerOutputConfig,
    load_feedforward: f32,
) -> f32 {
    let base = power.low - idle_output;
    if load_feedforward >= 0.0 {
        let range = power.high - power.low;
        idle_output + ramp_output * (base + range * load_feedforward)
    } else {
        let range = power.negc - power.low;
        idle_output + ramp_output * (base - range * load_feedforward)
    }
}

/// Governor output from the PID alone, clamped to [0, 1].
///
/// Without a PID the open-loop `fallback` is returned instead.  With the
/// governor disabled the PID is fed zero error and the output is zero.
pub fn closed_loop_output<P: GovernorPid>(
    pid: Option<&mut P>,
    ramp_output: f32,
    governor: &GovernorConfig,
    rpm_feedback: f32,
    fallback: impl FnOnce() -> f32,
) -> f32 {
    let Some(pid) = pid else {
        return fallback();
    };

    let target_rpm = ramp_output * f32::from(governor.rpm_setpoint);
    let pid_input = (target_rpm - rpm_feedback) / GOVERNOR_RPM_SCALE;

    let pid_output = if governor.enabled {
        pid.set_input_filter_all(pid_input);
        pid.get_pid()
    } else {
        pid.set_input_filter_all(0.0);
        0.0
    };

    pid_output.clamp(0.0, 1.0)
}
