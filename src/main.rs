//! lasthook - Main entry point
//!
//! Polls Last.fm until interrupted and notifies the configured hooks about
//! every track change.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use lasthook::{
    Config, HookDispatcher, LastFmClient, Overrides, Poller, Result, Settings, StopHandle,
    APP_NAME, VERSION,
};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lasthook")]
#[command(author, version, about = "Poll Last.fm for the current track and notify hooks")]
struct Cli {
    /// Milliseconds between polls
    #[arg(long, env = "REQUEST_INTERVAL_MS", value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,

    /// Also report tracks that are not playing right now
    #[arg(
        long = "allow-inactive-tracks",
        env = "SHOW_INACTIVE_TRACKS",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    show_inactive_tracks: bool,

    /// Last.fm API base URL
    #[arg(long, env = "LASTFM_API_URL")]
    api_url: Option<String>,

    /// Last.fm API key
    #[arg(long, env = "LASTFM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Last.fm user to watch (repeatable or comma separated, first match wins)
    #[arg(long = "user", env = "LASTFM_USERNAME", value_delimiter = ',')]
    users: Vec<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            interval_ms: self.interval,
            show_inactive_tracks: self.show_inactive_tracks,
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            users: self
                .users
                .iter()
                .map(|user| user.trim().to_string())
                .filter(|user| !user.is_empty())
                .collect(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version also end up here
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Load configuration
    let config = cli
        .config
        .as_deref()
        .map_or_else(Config::load, Config::load_from);

    init_logging(
        cli.verbose,
        config
            .as_ref()
            .map_or("info", |config| config.general.log_level.as_str()),
    );

    let settings = match config.and_then(|config| Settings::resolve(config, cli.overrides())) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    info!("{APP_NAME} {VERSION} starting...");
    if let Err(e) = run(settings).await {
        error!(error = %e, "Failed to start");
        return ExitCode::FAILURE;
    }

    info!("Exiting...");
    ExitCode::SUCCESS
}

fn init_logging(verbose: bool, log_level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(settings: Settings) -> Result<()> {
    let client = LastFmClient::new(settings.api_url.clone(), settings.api_key.clone())?;
    let dispatcher = HookDispatcher::from_settings(&settings)?;

    info!(
        users = ?settings.users.iter().map(ToString::to_string).collect::<Vec<_>>(),
        interval = %settings.interval,
        hooks = dispatcher.len(),
        "Watching Last.fm"
    );

    let poller = Poller::new(client, dispatcher, &settings);
    handle_signals(&poller.stop_handle());

    poller.run().await;
    Ok(())
}

/// Stop the poller on Ctrl+C and, on unix, SIGTERM.
fn handle_signals(stop: &StopHandle) {
    let on_ctrl_c = stop.clone();
    tokio::spawn(async move {
        while signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, stopping...");
            on_ctrl_c.stop();
        }
    });

    #[cfg(unix)]
    {
        let on_sigterm = stop.clone();
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::spawn(async move {
                    while sigterm.recv().await.is_some() {
                        info!("Received SIGTERM, stopping...");
                        on_sigterm.stop();
                    }
                });
            }
            Err(e) => {
                warn!("Failed to register SIGTERM handler: {}. Use Ctrl+C to stop.", e);
            }
        }
    }
}
