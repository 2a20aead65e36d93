//! Alarm Panel - MQTT Alarm Control Panel
//!
//! Binary entry point: wires the message bus, the controller and the
//! renderer bridge together. Display commands leave on stdout as JSON
//! lines; user actions arrive on stdin the same way. Logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use alarmpanel::audit::AuditLog;
use alarmpanel::bus;
use alarmpanel::config::{self, Config};
use alarmpanel::controller::Controller;
use alarmpanel::dispatch::{DialogCategory, DialogPayload, Dispatcher, DisplayCommand};
use alarmpanel::events::{ControllerEvent, UserAction};
use alarmpanel::history::MessageStore;
use alarmpanel::state::StateStore;
use alarmpanel::timer::Timer;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging; stdout belongs to the display protocol
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🚨 Alarm Panel v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_file = args.config.unwrap_or_else(config::config_path);
    let first_start = !config_file.exists();
    let config = Config::load_from(&config_file)?;
    if first_start {
        config.save_to(&config_file)?;
        info!("Wrote default configuration to {}", config_file.display());
    }

    // Hand-edited configs may omit the db path
    let db_path = if config.message_db_path.is_empty() {
        dirs::data_dir()
            .unwrap_or_default()
            .join("alarmpanel/messages.db")
    } else {
        PathBuf::from(&config.message_db_path)
    };
    let history = MessageStore::open(db_path)?;
    let audit = AuditLog::new(config_file.with_file_name("audit.log"));

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (display_tx, display_rx) = mpsc::unbounded_channel();

    let store = StateStore::new(config.clone(), config_file.clone());
    let dispatcher = Dispatcher::new(display_tx, config.alarm_mode);

    let (bus, bus_handle) = bus::start(&config, events_tx.clone());
    info!(
        "📡 Bus client started for {}:{}",
        config.mqtt_host, config.mqtt_port
    );

    let renderer_handle = tokio::spawn(render_commands(display_rx, events_tx.clone()));
    let actions_handle = tokio::spawn(read_actions(events_tx.clone()));

    let controller = Controller::new(
        store,
        dispatcher,
        history,
        audit,
        Arc::new(bus),
        events_tx.clone(),
    );
    let mut controller_handle = tokio::spawn(controller.run(events_rx));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
            let _ = events_tx.send(ControllerEvent::Shutdown);
            let _ = (&mut controller_handle).await;
        }
        _ = &mut controller_handle => {}
    }

    // The dispatcher is gone with the controller, so the renderer drains
    // its queue and exits on its own
    let _ = renderer_handle.await;
    bus_handle.abort();
    actions_handle.abort();

    info!("👋 Alarm panel stopped");
    Ok(())
}

/// Bridge to the UI renderer: every display command is written to stdout as
/// one JSON line. The disable dialog's countdown runs here, so its expiry
/// re-enters the controller queue like any other renderer event.
async fn render_commands(
    mut commands: mpsc::UnboundedReceiver<DisplayCommand>,
    events: mpsc::UnboundedSender<ControllerEvent>,
) {
    let mut countdown = Timer::new(
        events,
        ControllerEvent::User(UserAction::CountdownExpired),
    );

    while let Some(command) = commands.recv().await {
        match &command {
            DisplayCommand::ShowDialog {
                category: DialogCategory::DisableCountdown,
                payload: Some(DialogPayload::Disable { seconds, .. }),
            } => {
                countdown.start(Duration::from_secs(u64::from(*seconds)));
            }
            DisplayCommand::HideDialog {
                category: DialogCategory::DisableCountdown,
            }
            | DisplayCommand::HideAll => {
                countdown.cancel();
            }
            _ => {}
        }

        match serde_json::to_string(&command) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("⚠️ Failed to encode display command: {}", e),
        }
    }
}

/// Renderer-reported user actions arrive as JSON lines on stdin. Closing
/// stdin ends the session.
async fn read_actions(events: mpsc::UnboundedSender<ControllerEvent>) {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<UserAction>(line) {
                    Ok(action) => {
                        let _ = events.send(ControllerEvent::User(action));
                    }
                    Err(e) => warn!("⚠️ Unparseable action '{}': {}", line, e),
                }
            }
            Ok(None) => {
                info!("Renderer closed stdin, shutting down");
                let _ = events.send(ControllerEvent::Shutdown);
                break;
            }
            Err(e) => {
                warn!("⚠️ Failed to read stdin: {}", e);
                let _ = events.send(ControllerEvent::Shutdown);
                break;
            }
        }
    }
}
