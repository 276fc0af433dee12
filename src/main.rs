// agora - terminal client for a civic engagement platform
//
// The client owns the state-synchronization layer between the platform's
// REST/WebSocket backend and a ratatui dashboard:
//
// - Stores (TUI side): timeline paging state machine, freshness-gated
//   entity caches, optimistic blog reactions, persisted session identity
// - Sync dispatcher: executes fetch commands against the REST API
// - Feed managers: one socket per live feed with heartbeat, backoff
//   reconnection, and inactivity teardown
// - Event system: mpsc channels connect all components
//
// The stores are only ever touched from the TUI task; background work
// reports back through typed events.

mod api;
mod cli;
mod config;
mod demo;
mod events;
mod feed;
mod logging;
mod startup;
mod store;
mod sync;
mod tui;
mod util;

use anyhow::Result;
use api::ApiClient;
use cli::CliAction;
use config::{Config, LogRotation};
use feed::{protocol::FeedKind, transport::WsTransport, FeedManager};
use logging::{LogBuffer, TuiLogLayer};
use store::SessionStore;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Handle CLI subcommands first (config --show, --reset, --edit, --path)
    let demo_flag = match cli::handle_cli() {
        CliAction::Exit => return Ok(()),
        CliAction::Run { demo } => demo,
    };

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    // Load configuration first to determine TUI vs headless mode
    let mut config = Config::from_env();
    if demo_flag {
        config.demo_mode = true;
    }

    // Create log buffer for TUI mode
    let log_buffer = LogBuffer::new();

    // Initialize tracing/logging with conditional output
    // In TUI mode: capture logs to buffer (prevents garbling the display)
    // In headless mode: output logs to stdout
    // File logging: optionally write to rotating log files (in addition to above)
    //
    // Precedence: RUST_LOG env var > config file > default "info"
    let default_filter = format!("agora={}", config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    // The guard must be kept alive for the duration of the program so file
    // logs flush
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard> = if config
        .logging
        .file_enabled
    {
        if let Err(e) = std::fs::create_dir_all(&config.logging.file_dir) {
            eprintln!(
                "Warning: Could not create log directory {:?}: {}",
                config.logging.file_dir, e
            );
            init_without_file(&config, filter, &log_buffer);
            None
        } else {
            let file_appender = match config.logging.file_rotation {
                LogRotation::Hourly => tracing_appender::rolling::hourly(
                    &config.logging.file_dir,
                    &config.logging.file_prefix,
                ),
                LogRotation::Daily => tracing_appender::rolling::daily(
                    &config.logging.file_dir,
                    &config.logging.file_prefix,
                ),
                LogRotation::Never => tracing_appender::rolling::never(
                    &config.logging.file_dir,
                    &config.logging.file_prefix,
                ),
            };

            // Writes happen on a background thread; JSON format for
            // structured parsing
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            if config.enable_tui {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(TuiLogLayer::new(log_buffer.clone()))
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(non_blocking)
                            .with_ansi(false),
                    )
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer())
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(non_blocking)
                            .with_ansi(false),
                    )
                    .init();
            }
            Some(guard)
        }
    } else {
        init_without_file(&config, filter, &log_buffer);
        None
    };

    // Load the persisted session identity. A missing identity is not
    // fatal; the views degrade to a "please log in" notice.
    let mut session = SessionStore::load(config.session_file.clone());
    if config.demo_mode && !session.identity.is_logged_in() {
        // Demo mode needs a subject for the timeline; never persisted.
        session.identity.user_id = Some(7);
        session.identity.name = Some("Demo Citizen".to_string());
    }
    if !session.identity.is_logged_in() {
        tracing::warn!("no session identity found; running logged out");
    }

    // Event channels: bounded, with backpressure on overflow.
    // Commands flow TUI -> dispatcher; sync events flow back.
    let (command_tx, command_rx) = mpsc::channel(1000);
    let (sync_tx, sync_rx) = mpsc::channel(1000);

    // Spawn the background work: either the real dispatcher + feeds, or
    // the demo stream.
    let mut feed_handle = None;
    let mut verification_handle = None;

    if config.demo_mode {
        tracing::info!("Running in DEMO MODE - generating synthetic events");
        // The demo task plays the backend: it answers fetch commands with
        // generated data and drifts the live counters.
        tokio::spawn(demo::run_demo(sync_tx.clone(), command_rx));
    } else {
        let api = ApiClient::new(config.api_url.clone(), std::env::var("AGORA_API_TOKEN").ok())?;
        tokio::spawn(sync::run(api, command_rx, sync_tx.clone()));

        if config.features.activity_feed {
            let (manager, handle, ctrl_rx) = FeedManager::new(
                WsTransport,
                feed::activity_url(&config.ws_url),
                FeedKind::Activity,
                sync_tx.clone(),
            );
            tokio::spawn(manager.run(ctrl_rx));
            feed_handle = Some(handle);
        }

        // The waiting-page watcher only matters while verification is
        // pending; it runs for the whole session and closes itself when
        // the server acks.
        if config.features.verification && session.identity.no_initiator_status == Some(true) {
            if let Some(email) = session.identity.user_email.clone() {
                let (manager, handle, ctrl_rx) = FeedManager::new(
                    WsTransport,
                    feed::waiting_page_url(&config.ws_url, &email),
                    FeedKind::WaitingPage,
                    sync_tx.clone(),
                );
                tokio::spawn(manager.run(ctrl_rx));
                handle.open();
                verification_handle = Some(handle);
            }
        }
    }

    // Print startup banner and repeat it into the logs panel
    startup::print_startup(&config);
    startup::log_startup(&config);

    // Run the TUI in the main task; this blocks until the user quits
    if config.enable_tui {
        tracing::info!("Starting TUI");
        let app = tui::app::App::new(
            config.clone(),
            log_buffer,
            command_tx,
            feed_handle.clone(),
            session,
        );
        if let Err(e) = tui::run_tui(app, sync_rx).await {
            tracing::error!("TUI error: {:?}", e);
        }
    } else {
        tracing::info!("TUI disabled, running in headless mode");
        // Headless: keep the sync layer alive and log its events until
        // Ctrl+C
        if let Some(feed) = &feed_handle {
            feed.open();
        }
        tokio::spawn(log_sync_events(sync_rx));
        tokio::signal::ctrl_c().await?;
    }

    tracing::info!("Shutting down...");

    // Tear the feeds down intentionally so no reconnect fires during exit
    if let Some(feed) = feed_handle {
        feed.dispose();
    }
    if let Some(feed) = verification_handle {
        feed.dispose();
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Logging setup without a file layer
fn init_without_file(config: &Config, filter: EnvFilter, log_buffer: &LogBuffer) {
    if config.enable_tui {
        tracing_subscriber::registry()
            .with(filter)
            .with(TuiLogLayer::new(log_buffer.clone()))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Headless mode: surface sync events in the logs
async fn log_sync_events(mut sync_rx: mpsc::Receiver<events::SyncEvent>) {
    while let Some(event) = sync_rx.recv().await {
        match &event {
            events::SyncEvent::Counter { kind, value } => {
                tracing::info!("{}: {value}", kind.label());
            }
            events::SyncEvent::Feed(status) => {
                tracing::info!("feed status: {status:?}");
            }
            other => tracing::debug!("sync event: {other:?}"),
        }
    }
}
