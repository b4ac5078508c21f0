//! Recording/playback session controller

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::domain::permission::PermissionState;
use crate::domain::session::{
    ControllerSnapshot, ErrorKind, InvalidStateTransition, TransportSession, TransportState,
};

use super::ports::{
    AudioSessionError, CaptureTransport, DeviceSession, PermissionGate, PlaybackDone,
    PlaybackEnd, PlaybackError, PlaybackTransport, RecordingError,
};

/// Errors from controller commands
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("microphone permission is {0}")]
    Permission(PermissionState),

    #[error("audio session activation failed: {0}")]
    Session(#[from] AudioSessionError),

    #[error("recording failed: {0}")]
    Recording(#[from] RecordingError),

    #[error("playback failed: {0}")]
    Playback(#[from] PlaybackError),

    #[error(transparent)]
    State(#[from] InvalidStateTransition),
}

impl ControllerError {
    /// Category surfaced in the published snapshot
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Permission(PermissionState::Denied) => ErrorKind::PermissionDenied,
            Self::Permission(_) => ErrorKind::PermissionUndetermined,
            Self::Session(_) => ErrorKind::SessionActivation,
            Self::Recording(RecordingError::AlreadyActive) => ErrorKind::RecordingBusy,
            Self::Recording(RecordingError::FinalizeFailed(_)) => ErrorKind::RecordingFinalize,
            Self::Recording(_) => ErrorKind::RecordingStart,
            Self::Playback(PlaybackError::NoRecording) => ErrorKind::NoRecording,
            Self::Playback(_) => ErrorKind::PlaybackStart,
            Self::State(_) => ErrorKind::TransportBusy,
        }
    }
}

/// Mutable controller state, guarded by the command lock
struct ControllerState {
    session: TransportSession,
    last_recording: Option<PathBuf>,
    last_error: Option<ErrorKind>,
    /// Bumped for every new or stopped playback so stale completion
    /// watchers cannot mutate a later session's state
    playback_generation: u64,
}

impl ControllerState {
    fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            is_recording: self.session.is_recording(),
            is_playing: self.session.is_playing(),
            last_recording: self.last_recording.clone(),
            last_error: self.last_error,
        }
    }
}

/// State shared with the playback completion watcher tasks
struct Shared {
    state: Mutex<ControllerState>,
    snapshots: watch::Sender<ControllerSnapshot>,
}

impl Shared {
    fn publish(&self, state: &ControllerState) {
        self.snapshots.send_replace(state.snapshot());
    }
}

/// Session controller over one recording slot.
///
/// Owns the permission gate, the shared device session, and both
/// transport engines; record and play are mutually exclusive. Every
/// command serializes on an internal lock and publishes a
/// [`ControllerSnapshot`] when it changes state, so observers never see
/// a flag that disagrees with the live transports.
pub struct SessionController<G, D, C, P>
where
    G: PermissionGate,
    D: DeviceSession + 'static,
    C: CaptureTransport,
    P: PlaybackTransport,
{
    gate: G,
    device: Arc<D>,
    capture: C,
    playback: P,
    target: PathBuf,
    shared: Arc<Shared>,
}

impl<G, D, C, P> SessionController<G, D, C, P>
where
    G: PermissionGate,
    D: DeviceSession + 'static,
    C: CaptureTransport,
    P: PlaybackTransport,
{
    /// Create a controller recording into `target`.
    ///
    /// The file on disk is the only persisted state: a non-empty file
    /// already at `target` is the last recording of a previous run and
    /// seeds `last_recording`.
    pub fn new(gate: G, device: D, capture: C, playback: P, target: PathBuf) -> Self {
        let last_recording = match std::fs::metadata(&target) {
            Ok(meta) if meta.len() > 0 => Some(target.clone()),
            _ => None,
        };
        let state = ControllerState {
            session: TransportSession::new(),
            last_recording,
            last_error: None,
            playback_generation: 0,
        };
        let (snapshots, _) = watch::channel(state.snapshot());
        Self {
            gate,
            device: Arc::new(device),
            capture,
            playback,
            target,
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                snapshots,
            }),
        }
    }

    /// Path of the fixed recording slot
    pub fn recording_path(&self) -> &Path {
        &self.target
    }

    /// Current published snapshot
    pub fn snapshot(&self) -> ControllerSnapshot {
        self.shared.snapshots.borrow().clone()
    }

    /// Subscribe to snapshots published after state-changing commands
    pub fn subscribe(&self) -> watch::Receiver<ControllerSnapshot> {
        self.shared.snapshots.subscribe()
    }

    /// Read the permission gate without side effects
    pub fn permission(&self) -> PermissionState {
        self.gate.query()
    }

    /// Resolve the permission gate if still undetermined
    pub async fn request_permission(&self) -> PermissionState {
        self.gate.request_if_undetermined().await
    }

    /// Whether a capture is currently active
    pub fn is_recording(&self) -> bool {
        self.shared.snapshots.borrow().is_recording
    }

    /// Whether a playback is currently active
    pub fn is_playing(&self) -> bool {
        self.shared.snapshots.borrow().is_playing
    }

    /// Path of the last finalized recording, if any
    pub fn last_recording(&self) -> Option<PathBuf> {
        self.shared.snapshots.borrow().last_recording.clone()
    }

    /// Elapsed capture time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.capture.elapsed_ms()
    }

    /// Start capturing into the recording slot.
    ///
    /// Refused while permission is denied or undetermined, while a
    /// capture is already running, or while playback is active. On any
    /// failure the published state keeps `is_recording == false`.
    pub async fn start_recording(&self) -> Result<(), ControllerError> {
        let mut state = self.shared.state.lock().await;
        let result = self.try_start_recording(&mut state).await;
        if let Err(ref e) = result {
            warn!(error = %e, "start_recording rejected");
            state.last_error = Some(e.kind());
        }
        self.shared.publish(&state);
        result
    }

    async fn try_start_recording(
        &self,
        state: &mut ControllerState,
    ) -> Result<(), ControllerError> {
        let permission = self.gate.query();
        if !permission.allows_capture() {
            return Err(ControllerError::Permission(permission));
        }
        match state.session.state() {
            TransportState::Recording => return Err(RecordingError::AlreadyActive.into()),
            TransportState::Playing => {
                return Err(InvalidStateTransition {
                    current_state: TransportState::Playing,
                    action: "begin recording",
                }
                .into())
            }
            TransportState::Idle => {}
        }
        self.device.activate()?;
        self.capture.begin(&self.target).await?;
        state.session.begin_recording()?;
        // The slot is being rewritten; the previous path is stale until
        // the new capture is finalized.
        state.last_recording = None;
        state.last_error = None;
        info!(target = %self.target.display(), "recording started");
        Ok(())
    }

    /// Stop the active capture and publish the finalized slot path.
    ///
    /// Lenient by contract: when no capture is active, the current
    /// `last_recording` is returned unchanged. Never errors; a failed
    /// finalize is logged and surfaced as
    /// [`ErrorKind::RecordingFinalize`] with no path published.
    pub async fn stop_recording(&self) -> Option<PathBuf> {
        let mut state = self.shared.state.lock().await;
        if !state.session.is_recording() {
            debug!("stop_recording while not recording is a no-op");
            return state.last_recording.clone();
        }
        match self.capture.finish().await {
            Ok(outcome) => {
                info!(
                    path = %outcome.path.display(),
                    bytes = outcome.bytes,
                    duration_ms = outcome.duration_ms,
                    "recording finalized"
                );
                state.last_recording = Some(outcome.path);
                state.last_error = None;
            }
            Err(e) => {
                // The capture is torn down either way; a failed finalize
                // leaves the slot unusable, so no path is published.
                error!(error = %e, "failed to finalize recording");
                state.last_error = Some(ErrorKind::RecordingFinalize);
            }
        }
        state.session.finish_recording();
        if state.session.is_idle() {
            self.device.deactivate();
        }
        self.shared.publish(&state);
        state.last_recording.clone()
    }

    /// Play the last recording.
    ///
    /// Refused while recording. An active playback is stopped and
    /// replaced. `is_playing` resets on its own when the source plays
    /// through to the end.
    pub async fn start_playback(&self) -> Result<(), ControllerError> {
        let mut state = self.shared.state.lock().await;
        let result = self.try_start_playback(&mut state).await;
        if let Err(ref e) = result {
            warn!(error = %e, "start_playback rejected");
            state.last_error = Some(e.kind());
        }
        self.shared.publish(&state);
        result
    }

    async fn try_start_playback(
        &self,
        state: &mut ControllerState,
    ) -> Result<(), ControllerError> {
        if state.session.is_recording() {
            return Err(InvalidStateTransition {
                current_state: TransportState::Recording,
                action: "begin playback",
            }
            .into());
        }
        let source = state
            .last_recording
            .clone()
            .ok_or(PlaybackError::NoRecording)?;
        if state.session.is_playing() {
            // Single engine handle: replacing the session stops the old
            // one first.
            self.playback.stop().await;
            state.session.finish_playback();
        }
        self.device.activate()?;
        let done = self.playback.play(&source).await?;
        state.session.begin_playback()?;
        state.playback_generation += 1;
        state.last_error = None;
        self.spawn_completion_watcher(state.playback_generation, done);
        info!(source = %source.display(), "playback started");
        Ok(())
    }

    /// Stop the active playback. No-op when idle.
    pub async fn stop_playback(&self) {
        let mut state = self.shared.state.lock().await;
        if !state.session.is_playing() {
            debug!("stop_playback while not playing is a no-op");
            return;
        }
        // Invalidate the completion watcher of the session being stopped
        state.playback_generation += 1;
        self.playback.stop().await;
        state.session.finish_playback();
        if state.session.is_idle() {
            self.device.deactivate();
        }
        self.shared.publish(&state);
    }

    /// Drain the completion signal of one playback session and return
    /// the transport to idle, unless a newer session took over.
    fn spawn_completion_watcher(&self, generation: u64, done: PlaybackDone) {
        let shared = Arc::clone(&self.shared);
        let device = Arc::clone(&self.device);
        tokio::spawn(async move {
            let end = done.await.unwrap_or(PlaybackEnd::Stopped);
            let mut state = shared.state.lock().await;
            if state.playback_generation != generation || !state.session.is_playing() {
                return;
            }
            debug!(?end, "playback session completed");
            state.session.finish_playback();
            if state.session.is_idle() {
                device.deactivate();
            }
            shared.publish(&state);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::CaptureOutcome;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio::sync::oneshot;

    struct MockGate(PermissionState);

    #[async_trait]
    impl PermissionGate for MockGate {
        fn query(&self) -> PermissionState {
            self.0
        }

        async fn request_if_undetermined(&self) -> PermissionState {
            self.0
        }
    }

    #[derive(Default)]
    struct DeviceStats {
        active: AtomicBool,
        fail: AtomicBool,
        activations: AtomicUsize,
        deactivations: AtomicUsize,
    }

    #[derive(Clone, Default)]
    struct MockDevice {
        stats: Arc<DeviceStats>,
    }

    impl MockDevice {
        fn failing() -> Self {
            let device = Self::default();
            device.stats.fail.store(true, Ordering::SeqCst);
            device
        }
    }

    impl DeviceSession for MockDevice {
        fn activate(&self) -> Result<(), AudioSessionError> {
            if self.stats.fail.load(Ordering::SeqCst) {
                return Err(AudioSessionError::NoOutputDevice);
            }
            self.stats.activations.fetch_add(1, Ordering::SeqCst);
            self.stats.active.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn deactivate(&self) {
            self.stats.deactivations.fetch_add(1, Ordering::SeqCst);
            self.stats.active.store(false, Ordering::SeqCst);
        }

        fn is_active(&self) -> bool {
            self.stats.active.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct CaptureStats {
        active: AtomicBool,
        fail_begin: AtomicBool,
        fail_finish: AtomicBool,
        target: StdMutex<Option<PathBuf>>,
    }

    #[derive(Clone, Default)]
    struct MockCapture {
        stats: Arc<CaptureStats>,
    }

    impl MockCapture {
        fn failing_begin() -> Self {
            let capture = Self::default();
            capture.stats.fail_begin.store(true, Ordering::SeqCst);
            capture
        }

        fn failing_finish() -> Self {
            let capture = Self::default();
            capture.stats.fail_finish.store(true, Ordering::SeqCst);
            capture
        }
    }

    #[async_trait]
    impl CaptureTransport for MockCapture {
        async fn begin(&self, target: &Path) -> Result<(), RecordingError> {
            if self.stats.fail_begin.load(Ordering::SeqCst) {
                return Err(RecordingError::StartFailed("mock".to_string()));
            }
            if self.stats.active.swap(true, Ordering::SeqCst) {
                return Err(RecordingError::AlreadyActive);
            }
            *self.stats.target.lock().unwrap() = Some(target.to_path_buf());
            Ok(())
        }

        async fn finish(&self) -> Result<CaptureOutcome, RecordingError> {
            if !self.stats.active.swap(false, Ordering::SeqCst) {
                return Err(RecordingError::NotActive);
            }
            if self.stats.fail_finish.load(Ordering::SeqCst) {
                return Err(RecordingError::FinalizeFailed("mock".to_string()));
            }
            let path = self
                .stats
                .target
                .lock()
                .unwrap()
                .clone()
                .ok_or(RecordingError::NotActive)?;
            Ok(CaptureOutcome {
                path,
                bytes: 42,
                duration_ms: 1000,
            })
        }

        fn is_active(&self) -> bool {
            self.stats.active.load(Ordering::SeqCst)
        }

        fn elapsed_ms(&self) -> u64 {
            0
        }
    }

    #[derive(Default)]
    struct PlaybackStats {
        active: AtomicBool,
        fail: AtomicBool,
        stops: AtomicUsize,
        done_tx: StdMutex<Option<oneshot::Sender<PlaybackEnd>>>,
    }

    #[derive(Clone, Default)]
    struct MockPlayback {
        stats: Arc<PlaybackStats>,
    }

    impl MockPlayback {
        fn failing() -> Self {
            let playback = Self::default();
            playback.stats.fail.store(true, Ordering::SeqCst);
            playback
        }

        /// Simulate the source draining to its natural end
        fn finish_naturally(&self) {
            self.stats.active.store(false, Ordering::SeqCst);
            if let Some(tx) = self.stats.done_tx.lock().unwrap().take() {
                let _ = tx.send(PlaybackEnd::Finished);
            }
        }

        fn stops(&self) -> usize {
            self.stats.stops.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PlaybackTransport for MockPlayback {
        async fn play(&self, source: &Path) -> Result<PlaybackDone, PlaybackError> {
            if self.stats.fail.load(Ordering::SeqCst) {
                return Err(PlaybackError::DecodeFailed {
                    path: source.to_path_buf(),
                    reason: "mock".to_string(),
                });
            }
            self.stats.active.store(true, Ordering::SeqCst);
            let (tx, rx) = oneshot::channel();
            *self.stats.done_tx.lock().unwrap() = Some(tx);
            Ok(rx)
        }

        async fn stop(&self) {
            self.stats.stops.fetch_add(1, Ordering::SeqCst);
            self.stats.active.store(false, Ordering::SeqCst);
            if let Some(tx) = self.stats.done_tx.lock().unwrap().take() {
                let _ = tx.send(PlaybackEnd::Stopped);
            }
        }

        fn is_active(&self) -> bool {
            self.stats.active.load(Ordering::SeqCst)
        }
    }

    type MockController = SessionController<MockGate, MockDevice, MockCapture, MockPlayback>;

    fn controller_with(
        permission: PermissionState,
        device: MockDevice,
        capture: MockCapture,
        playback: MockPlayback,
    ) -> MockController {
        SessionController::new(
            MockGate(permission),
            device,
            capture,
            playback,
            PathBuf::from("/tmp/voicenote-test/recording.flac"),
        )
    }

    fn granted_controller() -> MockController {
        controller_with(
            PermissionState::Granted,
            MockDevice::default(),
            MockCapture::default(),
            MockPlayback::default(),
        )
    }

    /// Wait until the subscription reports is_playing == false
    async fn wait_until_not_playing(rx: &mut watch::Receiver<ControllerSnapshot>) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while rx.borrow_and_update().is_playing {
                rx.changed().await.unwrap();
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn start_recording_from_idle() {
        let device = MockDevice::default();
        let controller = controller_with(
            PermissionState::Granted,
            device.clone(),
            MockCapture::default(),
            MockPlayback::default(),
        );

        controller.start_recording().await.unwrap();

        let snapshot = controller.snapshot();
        assert!(snapshot.is_recording);
        assert!(snapshot.last_recording.is_none());
        assert!(snapshot.last_error.is_none());
        assert!(device.is_active());
    }

    #[tokio::test]
    async fn start_recording_denied_permission_fails() {
        let capture = MockCapture::default();
        let controller = controller_with(
            PermissionState::Denied,
            MockDevice::default(),
            capture.clone(),
            MockPlayback::default(),
        );

        let err = controller.start_recording().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        let snapshot = controller.snapshot();
        assert!(!snapshot.is_recording);
        assert_eq!(snapshot.last_error, Some(ErrorKind::PermissionDenied));
        assert!(!capture.is_active());
    }

    #[tokio::test]
    async fn start_recording_undetermined_permission_fails() {
        let controller = controller_with(
            PermissionState::Undetermined,
            MockDevice::default(),
            MockCapture::default(),
            MockPlayback::default(),
        );

        let err = controller.start_recording().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionUndetermined);
        assert!(!controller.snapshot().is_recording);
    }

    #[tokio::test]
    async fn start_recording_twice_fails() {
        let controller = granted_controller();

        controller.start_recording().await.unwrap();
        let err = controller.start_recording().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RecordingBusy);

        // The first capture stays live
        assert!(controller.snapshot().is_recording);
    }

    #[tokio::test]
    async fn start_recording_with_failing_device_session() {
        let controller = controller_with(
            PermissionState::Granted,
            MockDevice::failing(),
            MockCapture::default(),
            MockPlayback::default(),
        );

        let err = controller.start_recording().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionActivation);

        let snapshot = controller.snapshot();
        assert!(!snapshot.is_recording);
        assert_eq!(snapshot.last_error, Some(ErrorKind::SessionActivation));
    }

    #[tokio::test]
    async fn start_recording_with_failing_capture() {
        let controller = controller_with(
            PermissionState::Granted,
            MockDevice::default(),
            MockCapture::failing_begin(),
            MockPlayback::default(),
        );

        let err = controller.start_recording().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RecordingStart);
        assert!(!controller.snapshot().is_recording);
    }

    #[tokio::test]
    async fn stop_recording_publishes_path_and_releases_device() {
        let device = MockDevice::default();
        let controller = controller_with(
            PermissionState::Granted,
            device.clone(),
            MockCapture::default(),
            MockPlayback::default(),
        );

        controller.start_recording().await.unwrap();
        let path = controller.stop_recording().await;

        assert_eq!(path, Some(controller.recording_path().to_path_buf()));
        let snapshot = controller.snapshot();
        assert!(!snapshot.is_recording);
        assert_eq!(snapshot.last_recording, path);
        assert!(!device.is_active());
    }

    #[tokio::test]
    async fn stop_recording_is_idempotent() {
        let controller = granted_controller();

        controller.start_recording().await.unwrap();
        let first = controller.stop_recording().await;
        let second = controller.stop_recording().await;

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(controller.snapshot().last_recording, first);
    }

    #[tokio::test]
    async fn stop_recording_without_recording_returns_none() {
        let controller = granted_controller();
        assert_eq!(controller.stop_recording().await, None);
    }

    #[tokio::test]
    async fn failed_finalize_is_surfaced_without_a_path() {
        let controller = controller_with(
            PermissionState::Granted,
            MockDevice::default(),
            MockCapture::failing_finish(),
            MockPlayback::default(),
        );

        controller.start_recording().await.unwrap();
        let path = controller.stop_recording().await;

        assert_eq!(path, None);
        let snapshot = controller.snapshot();
        assert!(!snapshot.is_recording);
        assert_eq!(snapshot.last_error, Some(ErrorKind::RecordingFinalize));
        assert!(snapshot.last_recording.is_none());
    }

    #[tokio::test]
    async fn start_playback_without_recording_fails() {
        let controller = granted_controller();

        let err = controller.start_playback().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoRecording);

        let snapshot = controller.snapshot();
        assert!(!snapshot.is_playing);
        assert_eq!(snapshot.last_error, Some(ErrorKind::NoRecording));
    }

    #[tokio::test]
    async fn start_playback_while_recording_fails() {
        let controller = granted_controller();

        controller.start_recording().await.unwrap();
        let err = controller.start_playback().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportBusy);

        let snapshot = controller.snapshot();
        assert!(snapshot.is_recording);
        assert!(!snapshot.is_playing);
    }

    #[tokio::test]
    async fn record_stop_play_cycle() {
        let controller = granted_controller();

        controller.start_recording().await.unwrap();
        let path = controller.stop_recording().await;
        assert!(path.is_some());

        controller.start_playback().await.unwrap();
        let snapshot = controller.snapshot();
        assert!(snapshot.is_playing);
        assert_eq!(snapshot.last_recording, path);
    }

    #[tokio::test]
    async fn start_recording_while_playing_fails() {
        let controller = granted_controller();

        controller.start_recording().await.unwrap();
        controller.stop_recording().await;
        controller.start_playback().await.unwrap();

        let err = controller.start_recording().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportBusy);
        assert!(controller.snapshot().is_playing);
    }

    #[tokio::test]
    async fn stop_playback_returns_to_idle() {
        let device = MockDevice::default();
        let playback = MockPlayback::default();
        let controller = controller_with(
            PermissionState::Granted,
            device.clone(),
            MockCapture::default(),
            playback.clone(),
        );

        controller.start_recording().await.unwrap();
        controller.stop_recording().await;
        controller.start_playback().await.unwrap();
        controller.stop_playback().await;

        assert!(!controller.snapshot().is_playing);
        assert_eq!(playback.stops(), 1);
        assert!(!device.is_active());
    }

    #[tokio::test]
    async fn stop_playback_while_idle_is_noop() {
        let playback = MockPlayback::default();
        let controller = controller_with(
            PermissionState::Granted,
            MockDevice::default(),
            MockCapture::default(),
            playback.clone(),
        );

        controller.stop_playback().await;
        assert_eq!(playback.stops(), 0);
    }

    #[tokio::test]
    async fn natural_completion_resets_is_playing() {
        let device = MockDevice::default();
        let playback = MockPlayback::default();
        let controller = controller_with(
            PermissionState::Granted,
            device.clone(),
            MockCapture::default(),
            playback.clone(),
        );

        controller.start_recording().await.unwrap();
        controller.stop_recording().await;
        controller.start_playback().await.unwrap();

        let mut rx = controller.subscribe();
        playback.finish_naturally();
        wait_until_not_playing(&mut rx).await;

        assert!(!controller.snapshot().is_playing);
        assert!(!device.is_active());
    }

    #[tokio::test]
    async fn replacing_playback_stops_the_old_session() {
        let playback = MockPlayback::default();
        let controller = controller_with(
            PermissionState::Granted,
            MockDevice::default(),
            MockCapture::default(),
            playback.clone(),
        );

        controller.start_recording().await.unwrap();
        controller.stop_recording().await;
        controller.start_playback().await.unwrap();
        controller.start_playback().await.unwrap();

        assert_eq!(playback.stops(), 1);
        assert!(controller.snapshot().is_playing);
    }

    #[tokio::test]
    async fn stale_completion_does_not_affect_a_newer_session() {
        let playback = MockPlayback::default();
        let controller = controller_with(
            PermissionState::Granted,
            MockDevice::default(),
            MockCapture::default(),
            playback.clone(),
        );

        controller.start_recording().await.unwrap();
        controller.stop_recording().await;

        // First session is stopped (its completion resolves as Stopped),
        // then a second session starts.
        controller.start_playback().await.unwrap();
        controller.stop_playback().await;
        controller.start_playback().await.unwrap();

        // Let the stale watcher run; the second session must survive it.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(controller.snapshot().is_playing);
    }

    #[tokio::test]
    async fn snapshot_subscription_sees_recording_transitions() {
        let controller = granted_controller();
        let mut rx = controller.subscribe();

        controller.start_recording().await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_recording);

        controller.stop_recording().await;
        rx.changed().await.unwrap();
        let snapshot = rx.borrow().clone();
        assert!(!snapshot.is_recording);
        assert!(snapshot.last_recording.is_some());
    }

    #[tokio::test]
    async fn existing_slot_file_seeds_last_recording() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("recording.flac");
        std::fs::write(&target, b"flac bytes from a previous run").unwrap();

        let controller = SessionController::new(
            MockGate(PermissionState::Granted),
            MockDevice::default(),
            MockCapture::default(),
            MockPlayback::default(),
            target.clone(),
        );

        assert_eq!(controller.last_recording(), Some(target));
        // The seeded path is immediately playable
        controller.start_playback().await.unwrap();
        assert!(controller.is_playing());
    }

    #[tokio::test]
    async fn empty_slot_file_does_not_seed() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("recording.flac");
        std::fs::write(&target, b"").unwrap();

        let controller = SessionController::new(
            MockGate(PermissionState::Granted),
            MockDevice::default(),
            MockCapture::default(),
            MockPlayback::default(),
            target,
        );

        assert_eq!(controller.last_recording(), None);
    }

    #[tokio::test]
    async fn new_recording_clears_the_published_path() {
        let controller = granted_controller();

        controller.start_recording().await.unwrap();
        controller.stop_recording().await;
        assert!(controller.snapshot().last_recording.is_some());

        controller.start_recording().await.unwrap();
        assert!(controller.snapshot().last_recording.is_none());

        let path = controller.stop_recording().await;
        assert!(path.is_some());
    }
}
