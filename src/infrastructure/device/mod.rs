//! Device session adapters

mod cpal_session;

pub use cpal_session::CpalDeviceSession;
