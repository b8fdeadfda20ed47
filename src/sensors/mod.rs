//! Sensor backends feeding the controller.

pub mod rpm;
