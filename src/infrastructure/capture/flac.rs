//! FLAC encoding for the recording slot
//!
//! Lossless compression keeps the slot small at the speech profile
//! rate while staying decodable by any stock player.

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config;
use flacenc::error::Verify;
use flacenc::source::MemSource;

use crate::domain::audio::EncodingProfile;

/// Encode mono PCM samples to FLAC at the given profile.
///
/// Input: i16 samples already at the profile's sample rate.
pub fn encode_flac(
    pcm_samples: &[i16],
    profile: &EncodingProfile,
) -> Result<Vec<u8>, EncodingError> {
    // flacenc works on i32 samples internally
    let samples_i32: Vec<i32> = pcm_samples.iter().map(|&s| s as i32).collect();

    let config = config::Encoder::default()
        .into_verified()
        .map_err(|(_, e)| EncodingError::Config(format!("{:?}", e)))?;

    let source = MemSource::from_samples(
        &samples_i32,
        profile.channels as usize,
        profile.bits_per_sample as usize,
        profile.sample_rate as usize,
    );

    let flac_stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|e| EncodingError::Encode(format!("{:?}", e)))?;

    let mut sink = ByteSink::new();
    flac_stream
        .write(&mut sink)
        .map_err(|e| EncodingError::Write(e.to_string()))?;

    Ok(sink.into_inner())
}

/// FLAC encoding errors
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("FLAC config error: {0}")]
    Config(String),

    #[error("FLAC encoding failed: {0}")]
    Encode(String),

    #[error("FLAC write failed: {0}")]
    Write(String),
}
