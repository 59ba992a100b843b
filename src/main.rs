use anyhow::Result;
use clap::Parser;
use obsctl::{
    api::ApiClient,
    cli::{self, Cli},
    config::{ClientSettings, Config},
};
use std::path::PathBuf;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first to get verbose flag
    let cli = Cli::parse();

    // Set config directory override before anything resolves paths
    if let Some(ref config_dir) = cli.config {
        obsctl::util::paths::set_config_dir_override(Some(config_dir.clone()));
    }

    // Get logs directory (creates if needed)
    let logs_dir = obsctl::util::paths::get_logs_dir().unwrap_or_else(|_| PathBuf::from("."));
    std::fs::create_dir_all(&logs_dir).ok();

    // Daily rotating JSON log file
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "obsctl.jsonl");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_level = if cli.verbose {
        tracing::Level::TRACE
    } else {
        tracing::Level::INFO
    };
    // curl commands are logged at INFO, so --curl has to raise the terminal level
    let stderr_level = if cli.verbose || cli.curl {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(tracing_subscriber::filter::LevelFilter::from_level(
                    file_level,
                )),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(tracing_subscriber::filter::LevelFilter::from_level(
                    stderr_level,
                )),
        )
        .init();

    tracing::trace!("CLI arguments: {:?}", cli);

    let mut config = Config::load()?;
    let profile_name = cli
        .profile
        .clone()
        .unwrap_or_else(|| config.current_profile.clone());
    let resolved = match &cli.profile {
        Some(name) => config.profile(name),
        None => config.active_profile(),
    };
    let profile = match resolved {
        Ok(profile) => profile.clone(),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(cli::error::INVALID_INPUT);
        }
    };

    // a profile URL that does not parse means the installation is broken
    if let Err(e) = profile.base_url() {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(cli::error::ERROR);
    }

    let token_before = profile.token.clone();
    let shared = profile.into_shared();
    let client = ApiClient::builder(shared.clone())
        .settings(ClientSettings {
            curlify: cli.curl,
            ..ClientSettings::default()
        })
        .build()?;

    let exit_code = cli::handler::handle_command(cli.command, &client, cli.quiet).await;

    // keep a token obtained by login for the next invocation
    let profile = shared.read().await.clone();
    if profile.token != token_before {
        config.upsert_profile(&profile_name, profile);
        if let Err(e) = config.save() {
            tracing::warn!("Failed to persist refreshed token: {}", e);
        }
    }

    drop(guard);
    std::process::exit(exit_code);
}
