//! Voicenote CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use voicenote::cli::{
    app::{load_merged_config, resolve_options, run_play, run_record, run_status, EXIT_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use voicenote::domain::config::{AppConfig, PermissionMode};
use voicenote::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let presenter = Presenter::new();

    // Handle the config subcommand before any audio wiring
    if let Commands::Config { action } = &cli.command {
        let store = XdgConfigStore::new();
        if let Err(e) = handle_config_command(action.clone(), &store, &presenter).await {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
        return ExitCode::SUCCESS;
    }

    // Build CLI config from args
    let cli_config = AppConfig {
        storage_dir: cli.storage_dir.clone(),
        permission: cli
            .permission
            .map(|p| PermissionMode::from(p).as_str().to_string()),
    };

    // Merge: defaults < file < cli
    let config = load_merged_config(cli_config).await;
    let options = resolve_options(&config);

    match cli.command {
        Commands::Record => run_record(options).await,
        Commands::Play => run_play(options).await,
        Commands::Status => run_status(options).await,
        Commands::Config { .. } => ExitCode::SUCCESS, // handled above
    }
}
