//! Permission gate adapters

mod fixed;
mod probe;

pub use fixed::FixedGate;
pub use probe::ProbeGate;
