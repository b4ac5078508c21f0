//! Rodio-based playback transport
//!
//! Decodes the recording slot and plays it on a dedicated thread:
//! rodio's OutputStream is not Send, so the thread owns the stream
//! while the caller keeps a stop flag and a completion receiver.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, Sink};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::application::ports::{PlaybackDone, PlaybackEnd, PlaybackError, PlaybackTransport};

/// Poll interval of the sink drain loop
const DRAIN_POLL: Duration = Duration::from_millis(25);

/// Playback transport over the default rodio output
pub struct RodioPlayback {
    active: Arc<AtomicBool>,
    /// Stop flag of the current session thread, if any
    stop_flag: StdMutex<Option<Arc<AtomicBool>>>,
}

impl RodioPlayback {
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(false)),
            stop_flag: StdMutex::new(None),
        }
    }

    /// Validate and decode the source before any thread is spawned, so
    /// unreadable files fail the `play` call itself.
    fn open_source(source: &Path) -> Result<Decoder<BufReader<File>>, PlaybackError> {
        let len = std::fs::metadata(source).map(|m| m.len()).unwrap_or(0);
        if len == 0 {
            return Err(PlaybackError::EmptySource {
                path: source.to_path_buf(),
            });
        }

        let file = File::open(source).map_err(|e| PlaybackError::DecodeFailed {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;

        Decoder::new(BufReader::new(file)).map_err(|e| PlaybackError::DecodeFailed {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl Default for RodioPlayback {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaybackTransport for RodioPlayback {
    async fn play(&self, source: &Path) -> Result<PlaybackDone, PlaybackError> {
        let decoder = Self::open_source(source)?;

        // Replace any session still draining
        self.stop().await;

        let stop = Arc::new(AtomicBool::new(false));
        *self.stop_flag.lock().unwrap() = Some(Arc::clone(&stop));

        let (ready_tx, ready_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        let active = Arc::clone(&self.active);
        active.store(true, Ordering::SeqCst);

        std::thread::spawn(move || {
            let end = run_session(decoder, &stop, ready_tx);
            active.store(false, Ordering::SeqCst);
            if let Some(end) = end {
                let _ = done_tx.send(end);
            }
        });

        match ready_rx.await {
            Ok(Ok(())) => {
                debug!(source = %source.display(), "playback session started");
                Ok(done_rx)
            }
            Ok(Err(e)) => {
                *self.stop_flag.lock().unwrap() = None;
                Err(e)
            }
            Err(_) => {
                *self.stop_flag.lock().unwrap() = None;
                Err(PlaybackError::StartFailed(
                    "playback thread exited before start".into(),
                ))
            }
        }
    }

    async fn stop(&self) {
        let flag = self.stop_flag.lock().unwrap().take();
        if let Some(flag) = flag {
            flag.store(true, Ordering::SeqCst);
            // Wait briefly for the session thread to release the device
            for _ in 0..40 {
                if !self.active.load(Ordering::SeqCst) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            warn!("playback session did not stop in time");
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Drive one playback session to its end on the calling thread.
/// Returns None when setup fails (the failure travels via `ready_tx`).
fn run_session(
    decoder: Decoder<BufReader<File>>,
    stop: &AtomicBool,
    ready_tx: oneshot::Sender<Result<(), PlaybackError>>,
) -> Option<PlaybackEnd> {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = ready_tx.send(Err(PlaybackError::DeviceNotAvailable(e.to_string())));
            return None;
        }
    };

    let sink = match Sink::try_new(&handle) {
        Ok(sink) => sink,
        Err(e) => {
            let _ = ready_tx.send(Err(PlaybackError::StartFailed(e.to_string())));
            return None;
        }
    };

    sink.append(decoder);
    let _ = ready_tx.send(Ok(()));

    loop {
        if stop.load(Ordering::SeqCst) {
            sink.stop();
            return Some(PlaybackEnd::Stopped);
        }
        if sink.empty() {
            return Some(PlaybackEnd::Finished);
        }
        std::thread::sleep(DRAIN_POLL);
    }
}
