//! `breaktooth-injector` entry point.
//!
//! Connects to the running emulator, waits for a local keyboard and forwards
//! every key press and release as a full key state until Ctrl-C.
//!
//! ```text
//! main()
//!  └─ require_root(), load_config()
//!  └─ IpcClient::connect()        -- emulator socket
//!  └─ discover()                  -- first keyboard, fixed retry
//!  └─ KeyCaptureClient::run()     -- evdev transitions -> SendKeys frames
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use breaktooth_core::config::{load_config, DEFAULT_CONFIG_PATH};
use breaktooth_core::privilege::require_root;
use breaktooth_injector::application::capture_keys::{discover, CaptureError, KeyCaptureClient};
use breaktooth_injector::infrastructure::input_capture::{key_transitions, EvdevLocator};
use breaktooth_injector::infrastructure::ipc::IpcClient;

/// Forward a local keyboard to the Breaktooth emulator.
#[derive(Debug, Parser)]
#[command(name = "breaktooth-injector", version, about)]
struct Cli {
    /// Configuration file.
    #[arg(short, long, env = "BREAKTOOTH_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the emulator socket path from the configuration.
    #[arg(long)]
    socket: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    require_root()?;

    let config = load_config(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log.level)),
        )
        .init();

    info!("Breaktooth injector starting");

    let running = Arc::new(AtomicBool::new(true));

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    let socket = cli.socket.unwrap_or(config.ipc.socket_path);
    let sink = IpcClient::connect(&socket).await?;

    // ── Keyboard discovery ────────────────────────────────────────────────────
    let device = match discover(&EvdevLocator, config.injector.discovery_retry(), &running).await {
        Ok(device) => device,
        Err(CaptureError::Cancelled) => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    let events = key_transitions(device).context("opening keyboard event stream")?;

    // ── Capture loop ──────────────────────────────────────────────────────────
    let mut client = KeyCaptureClient::new(sink, config.injector.modifier_mode);
    let handled = client.run(events, &running).await?;

    info!(handled, "Breaktooth injector stopped");
    Ok(())
}
