//! Servo output channels.
//!
//! The controller never addresses a physical pin.  It emits pulse widths
//! for a logical [`AuxFunction`]; an [`OutputPort`] decides which channel
//! carries that function.
//!
//! - [`ServoChannels`]: fixed-capacity function → channel table that
//!   remembers the last pulse written to each channel.
//! - [`HalServoOutput`]: drives a single 50 Hz PWM pin through
//!   `embedded-hal`'s [`SetDutyCycle`].

use embedded_hal::pwm::SetDutyCycle;
use heapless::Vec;
use log::{info, trace, warn};

use crate::app::ports::OutputPort;
use crate::error::OutputError;

/// Highest servo channel number (channels are 1-based).
pub const MAX_CHANNELS: u8 = 16;

const SLOTS: usize = MAX_CHANNELS as usize;

/// Servo frame period for 50 Hz output.
pub const PERIOD_US: u16 = 20_000;

/// Logical output roles.  Discriminants are the stored parameter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AuxFunction {
    /// Main rotor speed controller (throttle servo or ESC).
    HeliRsc = 31,
    /// Tail rotor speed controller.
    HeliTailRsc = 32,
}

#[derive(Debug, Clone, Copy)]
struct Assignment {
    function: AuxFunction,
    channel: u8,
}

/// Function → channel table plus the last pulse per channel.
#[derive(Debug)]
pub struct ServoChannels {
    assignments: Vec<Assignment, SLOTS>,
    pwm: [Option<u16>; SLOTS],
}

impl Default for ServoChannels {
    fn default() -> Self {
        Self::new()
    }
}

impl ServoChannels {
    pub fn new() -> Self {
        Self {
            assignments: Vec::new(),
            pwm: [None; SLOTS],
        }
    }

    /// Explicitly route `function` to `channel`, replacing any previous
    /// route for either of them.
    pub fn assign(&mut self, function: AuxFunction, channel: u8) -> Result<(), OutputError> {
        check_channel(channel)?;
        self.assignments
            .retain(|a| a.function != function && a.channel != channel);
        self.assignments
            .push(Assignment { function, channel })
            .map_err(|_| OutputError::RegistryFull)
    }

    /// Channel currently carrying `function`.
    pub fn channel_for(&self, function: AuxFunction) -> Option<u8> {
        self.assignments
            .iter()
            .find(|a| a.function == function)
            .map(|a| a.channel)
    }

    /// Function currently routed to `channel`.
    pub fn function_on(&self, channel: u8) -> Option<AuxFunction> {
        self.assignments
            .iter()
            .find(|a| a.channel == channel)
            .map(|a| a.function)
    }

    /// Last pulse width written to `channel`.
    pub fn output_pwm(&self, channel: u8) -> Option<u16> {
        check_channel(channel).ok()?;
        self.pwm[usize::from(channel - 1)]
    }

    /// Last pulse width written for `function`.
    pub fn function_pwm(&self, function: AuxFunction) -> Option<u16> {
        self.channel_for(function).and_then(|ch| self.output_pwm(ch))
    }
}

impl OutputPort for ServoChannels {
    fn set_aux_channel_default(&mut self, function: AuxFunction, channel: u8) {
        if self.channel_for(function).is_some() {
            // user already routed it somewhere
            return;
        }
        if let Some(other) = self.function_on(channel) {
            warn!("channel {channel} already assigned to {other:?}, {function:?} left unrouted");
            return;
        }
        match self.assign(function, channel) {
            Ok(()) => info!("{function:?} defaulted to channel {channel}"),
            Err(e) => warn!("cannot default {function:?} to channel {channel}: {e}"),
        }
    }

    fn set_output_pwm(&mut self, function: AuxFunction, pwm_us: u16) {
        match self.channel_for(function) {
            Some(ch) => self.pwm[usize::from(ch - 1)] = Some(pwm_us),
            None => trace!("{function:?} has no channel, dropping {pwm_us}us"),
        }
    }
}

fn check_channel(channel: u8) -> Result<(), OutputError> {
    if channel == 0 || channel > MAX_CHANNELS {
        Err(OutputError::InvalidChannel(channel))
    } else {
        Ok(())
    }
}

/// Convert a pulse width to duty counts for a 50 Hz timer whose full
/// period is `max_duty` counts.  Pulses longer than a frame saturate.
///
/// With `max_duty == 20_000` one count is one microsecond.
pub fn pulse_to_duty(pulse_us: u16, max_duty: u16) -> u16 {
    let pulse_us = u32::from(pulse_us.min(PERIOD_US));
    (pulse_us * u32::from(max_duty) / u32::from(PERIOD_US)) as u16
}

// ---------------------------------------------------------------------------
// embedded-hal backend
// ---------------------------------------------------------------------------

/// One physical PWM pin dedicated to a single output function.
pub struct HalServoOutput<P> {
    pin: P,
    function: AuxFunction,
    channel: Option<u8>,
    last_pwm: Option<u16>,
}

impl<P: SetDutyCycle> HalServoOutput<P> {
    pub fn new(pin: P, function: AuxFunction) -> Self {
        Self {
            pin,
            function,
            channel: None,
            last_pwm: None,
        }
    }

    /// Drive the pin with `pulse_us` (clamped to one frame).
    pub fn write_pulse(&mut self, pulse_us: u16) -> Result<(), OutputError> {
        let pulse_us = pulse_us.min(PERIOD_US);
        let duty = pulse_to_duty(pulse_us, self.pin.max_duty_cycle());
        self.pin
            .set_duty_cycle(duty)
            .map_err(|_| OutputError::PwmWriteFailed)?;
        self.last_pwm = Some(pulse_us);
        Ok(())
    }

    /// Channel number this pin was registered as.
    pub fn channel(&self) -> Option<u8> {
        self.channel
    }

    pub fn last_pwm(&self) -> Option<u16> {
        self.last_pwm
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: SetDutyCycle> OutputPort for HalServoOutput<P> {
    fn set_aux_channel_default(&mut self, function: AuxFunction, channel: u8) {
        if function == self.function && self.channel.is_none() {
            self.channel = Some(channel);
        }
    }

    fn set_output_pwm(&mut self, function: AuxFunction, pwm_us: u16) {
        if function != self.function {
            return;
        }
        if let Err(e) = self.write_pulse(pwm_us) {
            warn!("{function:?}: {e}");
        }
    }
}
