//! Helicopter rotor speed controller library.
//!
//! Turns a per-tick rotor command (stop / idle / active) and a control
//! mode (passthrough, open-loop power, RPM governor) into one servo pulse
//! width, with ramp, run-up and slew shaping.  Hardware, clocks, PID and
//! parameter storage are reached only through the traits in
//! [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod channels;
pub mod config;
pub mod control;
pub mod error;
pub mod rsc;
pub mod sensors;
pub mod shared;

pub use error::{Error, Result};
pub use rsc::{RotorControlMode, RotorControlState, RotorSpeedController};
