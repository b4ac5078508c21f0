//! Microphone capture using cpal
//!
//! Captures mono samples at the device rate on a dedicated thread, then
//! resamples to the speech profile and encodes FLAC into the fixed
//! target file on finalize.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use rubato::{FftFixedIn, Resampler};
use tokio::time::Duration as TokioDuration;
use tracing::warn;

use super::flac::encode_flac;
use crate::application::ports::{CaptureOutcome, CaptureTransport, RecordingError};
use crate::domain::audio::EncodingProfile;

/// Capture transport over the default cpal input device.
///
/// The stream is managed on its own thread: cpal::Stream is not Send,
/// so the struct only holds the shared buffer and flags the thread
/// reads.
pub struct CpalCapture {
    profile: EncodingProfile,
    /// Captured mono samples at the device sample rate
    buffer: Arc<StdMutex<Vec<i16>>>,
    /// Device sample rate (may differ from the profile rate)
    device_sample_rate: Arc<AtomicU32>,
    /// Capture state
    active: Arc<AtomicBool>,
    /// Capture start time (millis since epoch, for atomic access)
    start_time_ms: Arc<AtomicU64>,
    /// Elapsed capture time in milliseconds
    elapsed_ms: Arc<AtomicU64>,
    /// Open handle of the slot being captured into
    sink: StdMutex<Option<(PathBuf, File)>>,
}

impl CpalCapture {
    /// Create a capture transport encoding at `profile`
    pub fn new(profile: EncodingProfile) -> Self {
        Self {
            profile,
            buffer: Arc::new(StdMutex::new(Vec::new())),
            device_sample_rate: Arc::new(AtomicU32::new(0)),
            active: Arc::new(AtomicBool::new(false)),
            start_time_ms: Arc::new(AtomicU64::new(0)),
            elapsed_ms: Arc::new(AtomicU64::new(0)),
            sink: StdMutex::new(None),
        }
    }

    /// Get the default input device
    fn get_input_device() -> Result<cpal::Device, RecordingError> {
        let host = cpal::default_host();
        host.default_input_device()
            .ok_or(RecordingError::NoInputDevice)
    }

    /// Get a suitable input configuration
    fn get_input_config(
        device: &cpal::Device,
        target_rate: u32,
    ) -> Result<(StreamConfig, SampleFormat), RecordingError> {
        let supported_configs = device
            .supported_input_configs()
            .map_err(|e| RecordingError::StartFailed(format!("Failed to get configs: {}", e)))?;

        // Prefer mono and configs that include the target rate; accept
        // stereo (mixed down) and higher rates (resampled) otherwise.
        let mut best_config: Option<cpal::SupportedStreamConfigRange> = None;

        for config in supported_configs {
            if config.sample_format() != SampleFormat::I16
                && config.sample_format() != SampleFormat::F32
            {
                continue;
            }

            let includes_target = config.min_sample_rate().0 <= target_rate
                && config.max_sample_rate().0 >= target_rate;

            let is_better = match &best_config {
                None => true,
                Some(current) => {
                    let fewer_channels = config.channels() < current.channels();
                    let better_rate =
                        includes_target && current.min_sample_rate().0 > target_rate;
                    fewer_channels || better_rate
                }
            };
            if is_better {
                best_config = Some(config);
            }
        }

        let config_range = best_config.ok_or(RecordingError::StartFailed(
            "No suitable config found".into(),
        ))?;

        // Use the target sample rate if supported, otherwise the minimum
        let sample_rate = if config_range.min_sample_rate().0 <= target_rate
            && config_range.max_sample_rate().0 >= target_rate
        {
            SampleRate(target_rate)
        } else {
            config_range.min_sample_rate()
        };

        let sample_format = config_range.sample_format();
        let config = StreamConfig {
            channels: config_range.channels(),
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        Ok((config, sample_format))
    }

    /// Mix interleaved channels down to mono
    fn downmix(samples: &[i16], channels: u16) -> Vec<i16> {
        if channels == 1 {
            return samples.to_vec();
        }

        samples
            .chunks(channels as usize)
            .map(|chunk| {
                let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    }

    /// Resample mono audio from the device rate to the target rate
    fn resample(
        samples: &[i16],
        source_rate: u32,
        target_rate: u32,
    ) -> Result<Vec<i16>, RecordingError> {
        if source_rate == target_rate {
            return Ok(samples.to_vec());
        }

        let samples_f32: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();

        let ratio = target_rate as f64 / source_rate as f64;
        let output_len = (samples_f32.len() as f64 * ratio).ceil() as usize;

        let mut resampler = FftFixedIn::<f32>::new(
            source_rate as usize,
            target_rate as usize,
            1024, // Chunk size
            2,    // Sub-chunks
            1,    // Mono
        )
        .map_err(|e| RecordingError::FinalizeFailed(format!("Resampler init failed: {}", e)))?;

        let mut output = Vec::with_capacity(output_len);
        let mut input_pos = 0;

        while input_pos < samples_f32.len() {
            let frames_needed = resampler.input_frames_next();
            let end_pos = (input_pos + frames_needed).min(samples_f32.len());
            let chunk: Vec<Vec<f32>> = vec![samples_f32[input_pos..end_pos].to_vec()];

            // Pad the tail chunk up to the frame count
            let chunk = if chunk[0].len() < frames_needed {
                let mut padded = chunk[0].clone();
                padded.resize(frames_needed, 0.0);
                vec![padded]
            } else {
                chunk
            };

            let resampled = resampler.process(&chunk, None).map_err(|e| {
                RecordingError::FinalizeFailed(format!("Resampling failed: {}", e))
            })?;

            output.extend(resampled[0].iter().map(|&s| (s * 32767.0) as i16));
            input_pos = end_pos;
        }

        output.truncate(output_len);

        Ok(output)
    }

    fn now_ms() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    /// Run the input stream until `active` clears.
    /// Clears `active` itself when the stream cannot be brought up.
    fn run_input_stream(
        target_rate: u32,
        buffer: Arc<StdMutex<Vec<i16>>>,
        device_sample_rate: Arc<AtomicU32>,
        active: Arc<AtomicBool>,
        start_time_ms: Arc<AtomicU64>,
        elapsed_ms: Arc<AtomicU64>,
    ) {
        let device = match Self::get_input_device() {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, "no input device for capture");
                active.store(false, Ordering::SeqCst);
                return;
            }
        };

        let (config, sample_format) = match Self::get_input_config(&device, target_rate) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "no usable input config");
                active.store(false, Ordering::SeqCst);
                return;
            }
        };

        let sample_rate = config.sample_rate.0;
        let channels = config.channels;
        device_sample_rate.store(sample_rate, Ordering::SeqCst);

        let buffer_clone = Arc::clone(&buffer);
        let active_clone = Arc::clone(&active);

        let stream_result = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if active_clone.load(Ordering::SeqCst) {
                        let mono = CpalCapture::downmix(data, channels);
                        if let Ok(mut buffer) = buffer_clone.lock() {
                            buffer.extend_from_slice(&mono);
                        }
                    }
                },
                |err| warn!(error = %err, "input stream error"),
                None,
            ),

            SampleFormat::F32 => {
                let buffer_clone = Arc::clone(&buffer);
                let active_clone = Arc::clone(&active);

                device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if active_clone.load(Ordering::SeqCst) {
                            let i16_data: Vec<i16> =
                                data.iter().map(|&s| (s * 32767.0) as i16).collect();
                            let mono = CpalCapture::downmix(&i16_data, channels);
                            if let Ok(mut buffer) = buffer_clone.lock() {
                                buffer.extend_from_slice(&mono);
                            }
                        }
                    },
                    |err| warn!(error = %err, "input stream error"),
                    None,
                )
            }

            _ => {
                warn!("unsupported input sample format");
                active.store(false, Ordering::SeqCst);
                return;
            }
        };

        let stream = match stream_result {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "failed to build input stream");
                active.store(false, Ordering::SeqCst);
                return;
            }
        };

        if let Err(e) = stream.play() {
            warn!(error = %e, "failed to start input stream");
            active.store(false, Ordering::SeqCst);
            return;
        }

        // Keep capturing until stopped
        while active.load(Ordering::SeqCst) {
            let now = Self::now_ms();
            let start = start_time_ms.load(Ordering::SeqCst);
            elapsed_ms.store(now.saturating_sub(start), Ordering::SeqCst);

            std::thread::sleep(std::time::Duration::from_millis(100));
        }

        drop(stream);
    }
}

#[async_trait]
impl CaptureTransport for CpalCapture {
    async fn begin(&self, target: &Path) -> Result<(), RecordingError> {
        if self.active.load(Ordering::SeqCst) {
            return Err(RecordingError::AlreadyActive);
        }

        // Opening the slot up front both truncates the previous
        // recording and surfaces an unwritable target before any
        // hardware is touched.
        let file = File::create(target).map_err(|e| RecordingError::TargetUnwritable {
            path: target.to_path_buf(),
            reason: e.to_string(),
        })?;
        *self.sink.lock().unwrap() = Some((target.to_path_buf(), file));

        {
            let mut buffer = self.buffer.lock().unwrap();
            buffer.clear();
        }

        self.active.store(true, Ordering::SeqCst);
        self.start_time_ms.store(Self::now_ms(), Ordering::SeqCst);
        self.elapsed_ms.store(0, Ordering::SeqCst);

        let target_rate = self.profile.sample_rate;
        let buffer = Arc::clone(&self.buffer);
        let device_sample_rate = Arc::clone(&self.device_sample_rate);
        let active = Arc::clone(&self.active);
        let start_time_ms = Arc::clone(&self.start_time_ms);
        let elapsed_ms = Arc::clone(&self.elapsed_ms);

        std::thread::spawn(move || {
            Self::run_input_stream(
                target_rate,
                buffer,
                device_sample_rate,
                active,
                start_time_ms,
                elapsed_ms,
            );
        });

        // Give the thread a moment to bring the stream up
        tokio::time::sleep(TokioDuration::from_millis(50)).await;

        if !self.active.load(Ordering::SeqCst) {
            *self.sink.lock().unwrap() = None;
            return Err(RecordingError::StartFailed(
                "input stream did not start".into(),
            ));
        }

        Ok(())
    }

    async fn finish(&self) -> Result<CaptureOutcome, RecordingError> {
        if !self.active.swap(false, Ordering::SeqCst) {
            return Err(RecordingError::NotActive);
        }

        // Give the stream thread a moment to wind down
        tokio::time::sleep(TokioDuration::from_millis(100)).await;

        let (path, mut file) = self
            .sink
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| RecordingError::FinalizeFailed("no open target".into()))?;

        let sample_rate = self.device_sample_rate.load(Ordering::SeqCst);
        if sample_rate == 0 {
            return Err(RecordingError::FinalizeFailed("sample rate not set".into()));
        }

        let samples = {
            let mut buffer = self.buffer.lock().unwrap();
            std::mem::take(&mut *buffer)
        };

        if samples.is_empty() {
            return Err(RecordingError::FinalizeFailed("no audio captured".into()));
        }

        let duration_ms = samples.len() as u64 * 1000 / sample_rate as u64;
        let profile = self.profile;

        // Resample + encode are CPU-bound
        let encoded = tokio::task::spawn_blocking(move || {
            let resampled = Self::resample(&samples, sample_rate, profile.sample_rate)?;
            encode_flac(&resampled, &profile)
                .map_err(|e| RecordingError::FinalizeFailed(e.to_string()))
        })
        .await
        .map_err(|e| RecordingError::FinalizeFailed(format!("encode task: {}", e)))??;

        file.write_all(&encoded)
            .map_err(|e| RecordingError::FinalizeFailed(e.to_string()))?;
        file.flush()
            .map_err(|e| RecordingError::FinalizeFailed(e.to_string()))?;

        Ok(CaptureOutcome {
            path,
            bytes: encoded.len() as u64,
            duration_ms,
        })
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms.load(Ordering::SeqCst)
    }
}
