//! Mock adapters for integration tests.
//!
//! Records every output call so tests can assert on the full write
//! history, and provides a clock that only moves when told to.

use std::cell::Cell;

use heli_rsc::app::ports::{OutputPort, TimeSource};
use heli_rsc::channels::AuxFunction;
use heli_rsc::config::RscConfig;
use heli_rsc::{RotorControlMode, RotorControlState, RotorSpeedController};

// ── Output call record ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum OutputCall {
    Default { function: AuxFunction, channel: u8 },
    Pwm { function: AuxFunction, pwm_us: u16 },
}

// ── MockOutput ────────────────────────────────────────────────

pub struct MockOutput {
    pub calls: Vec<OutputCall>,
}

#[allow(dead_code)]
impl MockOutput {
    pub fn new() -> Self {
        Self { calls: Vec::new() }
    }

    pub fn pwm_writes(&self) -> Vec<u16> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                OutputCall::Pwm { pwm_us, .. } => Some(*pwm_us),
                OutputCall::Default { .. } => None,
            })
            .collect()
    }

    pub fn last_pwm(&self) -> Option<u16> {
        self.pwm_writes().last().copied()
    }
}

impl Default for MockOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputPort for MockOutput {
    fn set_aux_channel_default(&mut self, function: AuxFunction, channel: u8) {
        self.calls.push(OutputCall::Default { function, channel });
    }

    fn set_output_pwm(&mut self, function: AuxFunction, pwm_us: u16) {
        self.calls.push(OutputCall::Pwm { function, pwm_us });
    }
}

// ── ManualClock ───────────────────────────────────────────────

pub struct ManualClock {
    now: Cell<u64>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn starting_at(us: u64) -> Self {
        Self { now: Cell::new(us) }
    }

    pub fn advance(&self, us: u64) {
        self.now.set(self.now.get() + us);
    }
}

impl TimeSource for ManualClock {
    fn micros64(&self) -> u64 {
        self.now.get()
    }
}

// ── Bench ─────────────────────────────────────────────────────

/// Controller plus mock clock and output, stepped at a fixed `dt`.
pub struct Bench<P = heli_rsc::control::pid::PidController> {
    pub rsc: RotorSpeedController<P>,
    pub clock: ManualClock,
    pub out: MockOutput,
    pub tick_us: u64,
}

#[allow(dead_code)]
impl Bench {
    pub fn new(config: RscConfig, tick_us: u64) -> Self {
        Self::from_controller(RotorSpeedController::new(config, AuxFunction::HeliRsc), tick_us)
    }

    pub fn with_mode(mode: RotorControlMode, tick_us: u64) -> Self {
        Self::new(
            RscConfig {
                control_mode: mode,
                ..Default::default()
            },
            tick_us,
        )
    }
}

#[allow(dead_code)]
impl<P: heli_rsc::app::ports::GovernorPid> Bench<P> {
    pub fn from_controller(rsc: RotorSpeedController<P>, tick_us: u64) -> Self {
        Self {
            rsc,
            clock: ManualClock::starting_at(1_000_000),
            out: MockOutput::new(),
            tick_us,
        }
    }

    /// Bootstrap tick so every following tick sees exactly `tick_us`.
    pub fn prime(&mut self) {
        self.rsc
            .output(RotorControlState::Stop, &self.clock, &mut self.out);
    }

    pub fn step(&mut self, state: RotorControlState) {
        self.clock.advance(self.tick_us);
        self.rsc.output(state, &self.clock, &mut self.out);
    }

    pub fn run(&mut self, state: RotorControlState, ticks: usize) {
        for _ in 0..ticks {
            self.step(state);
        }
    }
}
