//! Port traits for everything the rotor speed controller talks to.
//!
//! All interaction with clocks, servo outputs, PID implementations and
//! parameter storage happens through the traits in [`ports`], keeping the
//! controller fully testable without real peripherals.

pub mod ports;
