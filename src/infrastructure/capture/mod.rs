//! Capture infrastructure module
//!
//! Microphone capture runs through cpal; finalized samples are
//! resampled to the speech profile and encoded to FLAC.

mod cpal_capture;
mod flac;

pub use cpal_capture::CpalCapture;
pub use flac::{encode_flac, EncodingError};
