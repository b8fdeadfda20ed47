//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter       | Implements  | Connects to               |
//! |---------------|-------------|---------------------------|
//! | `time`        | TimeSource  | `std::time::Instant`      |
//! | `param_store` | ConfigPort  | postcard blob in memory   |
//!
//! Output adapters live in [`crate::channels`].

pub mod param_store;
pub mod time;
