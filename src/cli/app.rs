//! Main command runners

use std::process::ExitCode;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::application::ports::PermissionGate;
use crate::application::SessionController;
use crate::domain::audio::{EncodingProfile, RECORDING_FILE_NAME};
use crate::domain::config::{AppConfig, PermissionMode};
use crate::domain::permission::PermissionState;
use crate::infrastructure::{
    default_storage_dir, CpalCapture, CpalDeviceSession, FixedGate, ProbeGate, RodioPlayback,
    XdgConfigStore,
};

use super::args::RunOptions;
use super::presenter::Presenter;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;

/// Load and merge configuration: defaults < file < CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    use crate::application::ports::ConfigStore;

    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|_| AppConfig::empty());

    AppConfig::defaults().merge(file_config).merge(cli_config)
}

/// Resolve runtime options from a merged config
pub fn resolve_options(config: &AppConfig) -> RunOptions {
    RunOptions {
        storage_dir: config.storage_dir().unwrap_or_else(default_storage_dir),
        permission: config.permission_or_default(),
    }
}

fn build_controller<G: PermissionGate>(
    gate: G,
    options: &RunOptions,
) -> SessionController<G, CpalDeviceSession, CpalCapture, RodioPlayback> {
    let target = options.storage_dir.join(RECORDING_FILE_NAME);
    SessionController::new(
        gate,
        CpalDeviceSession::new(),
        CpalCapture::new(EncodingProfile::speech()),
        RodioPlayback::new(),
        target,
    )
}

/// Run the record command
pub async fn run_record(options: RunOptions) -> ExitCode {
    match options.permission {
        PermissionMode::Probe => record_with_gate(ProbeGate::new(), options).await,
        PermissionMode::Granted => record_with_gate(FixedGate::granted(), options).await,
        PermissionMode::Denied => record_with_gate(FixedGate::denied(), options).await,
    }
}

async fn record_with_gate<G: PermissionGate>(gate: G, options: RunOptions) -> ExitCode {
    let mut presenter = Presenter::new();

    if let Err(e) = tokio::fs::create_dir_all(&options.storage_dir).await {
        presenter.error(&format!(
            "Cannot create storage directory {}: {}",
            options.storage_dir.display(),
            e
        ));
        return ExitCode::from(EXIT_ERROR);
    }

    let controller = build_controller(gate, &options);

    let permission = controller.request_permission().await;
    if !permission.allows_capture() {
        presenter.error(&format!("Microphone permission is {}", permission));
        return ExitCode::from(EXIT_ERROR);
    }

    if let Err(e) = controller.start_recording().await {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    presenter.start_spinner("Recording... (Enter or Ctrl-C to stop)");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(200));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = stdin.next_line() => break,
            _ = ticker.tick() => {
                presenter.update_spinner(&format!(
                    "Recording... {} (Enter or Ctrl-C to stop)",
                    Presenter::format_elapsed(controller.elapsed_ms())
                ));
            }
        }
    }

    match controller.stop_recording().await {
        Some(path) => {
            let bytes = tokio::fs::metadata(&path).await.map(|m| m.len()).unwrap_or(0);
            presenter.spinner_success(&format!(
                "Saved {} ({})",
                path.display(),
                Presenter::format_size(bytes)
            ));
            ExitCode::from(EXIT_SUCCESS)
        }
        None => {
            presenter.spinner_fail("Recording could not be finalized");
            if let Some(kind) = controller.snapshot().last_error {
                presenter.error(&kind.to_string());
            }
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the play command
pub async fn run_play(options: RunOptions) -> ExitCode {
    let mut presenter = Presenter::new();

    // Playback needs no microphone authorization
    let controller = build_controller(FixedGate::granted(), &options);

    if let Err(e) = controller.start_playback().await {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    let source = controller
        .last_recording()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "recording".to_string());
    presenter.start_spinner(&format!("Playing {} (Enter or Ctrl-C to stop)", source));

    let mut snapshots = controller.subscribe();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let finished = loop {
        // A short note can drain before the first changed() resolves
        if !snapshots.borrow_and_update().is_playing {
            break true;
        }
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break false,
            _ = stdin.next_line() => break false,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break true;
                }
            }
        }
    };

    if finished {
        presenter.spinner_success("Playback finished");
    } else {
        controller.stop_playback().await;
        presenter.spinner_success("Playback stopped");
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Run the status command
pub async fn run_status(options: RunOptions) -> ExitCode {
    let presenter = Presenter::new();

    let permission = match options.permission {
        PermissionMode::Probe => ProbeGate::new().request_if_undetermined().await,
        PermissionMode::Granted => PermissionState::Granted,
        PermissionMode::Denied => PermissionState::Denied,
    };

    // The controller seeds its snapshot from the slot on disk
    let controller = build_controller(FixedGate::new(permission), &options);

    presenter.key_value("permission", permission.as_str());
    presenter.key_value("storage_dir", &options.storage_dir.display().to_string());
    match controller.last_recording() {
        Some(path) => {
            let bytes = tokio::fs::metadata(&path).await.map(|m| m.len()).unwrap_or(0);
            presenter.key_value("recording", &path.display().to_string());
            presenter.key_value("size", &Presenter::format_size(bytes));
        }
        None => presenter.key_value("recording", "(none)"),
    }

    ExitCode::from(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn resolve_options_uses_configured_storage_dir() {
        let config = AppConfig {
            storage_dir: Some("/notes".to_string()),
            permission: Some("denied".to_string()),
        };
        let options = resolve_options(&config);
        assert_eq!(options.storage_dir, PathBuf::from("/notes"));
        assert_eq!(options.permission, PermissionMode::Denied);
    }

    #[test]
    fn resolve_options_falls_back_to_platform_dir() {
        let options = resolve_options(&AppConfig::empty());
        assert_eq!(options.storage_dir, default_storage_dir());
        assert_eq!(options.permission, PermissionMode::Probe);
    }
}
