//! Peripheral-side state machine.
//!
//! Mirrors the controller's codec and catalog to validate inbound writes,
//! mutate simulated device state, and schedule outgoing telemetry and
//! configuration frames. Used to develop and test controller software
//! without touching real batteries.

pub mod emulator;
pub mod loopback;
pub mod state;

pub use emulator::{Emulator, Outbound};
pub use loopback::Loopback;
pub use state::DeviceState;
