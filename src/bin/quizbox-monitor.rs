//! Quiz buzzer monitor.
//!
//! Opens a base station on a serial port, logs every decoded event, and
//! keeps box connection status fresh until Ctrl-C.

use std::time::{Duration, Instant};

use quizbox::control::{ControllerConfig, QuizController};
use quizbox::core::QuizError;
use quizbox::link::{ChannelListener, ConnectionSession, SessionConfig, available_ports};
use quizbox::protocol::Firmware;
use quizbox::registry::{AddressRegistry, RosterEntry};
use quizbox::scoring::{ScoreEngine, ScoringConfig};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
quizbox-monitor - watch a quiz buzzer base station

USAGE:
  quizbox-monitor --port <path> [OPTIONS]

OPTIONS:
  -h, --help                Prints help information
  --list                    List serial ports and exit
  --port <path>             Serial port of the base station
  --baud <rate>             Baud rate (default: 9600)
  --legacy                  Use uppercase status/version/link commands
  --timeout <ms>            Box connection timeout (default: 5000)
  --team <box:address:name> Register a team box (repeatable)
";

const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
struct AppArgs {
    list: bool,
    port: Option<String>,
    baud: u32,
    legacy: bool,
    timeout: Option<u64>,
    teams: Vec<String>,
}

fn parse_args() -> Result<AppArgs, pico_args::Error> {
    let mut pargs = pico_args::Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{}", HELP);
        std::process::exit(0);
    }

    let args = AppArgs {
        list: pargs.contains("--list"),
        port: pargs.opt_value_from_str("--port")?,
        baud: pargs.opt_value_from_str("--baud")?.unwrap_or(9600),
        legacy: pargs.contains("--legacy"),
        timeout: pargs.opt_value_from_str("--timeout")?,
        teams: pargs.values_from_str("--team")?,
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        eprintln!("Warning: unused arguments left: {:?}.", remaining);
    }

    Ok(args)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn build_controller(args: &AppArgs) -> Result<QuizController, QuizError> {
    let mut roster = Vec::with_capacity(args.teams.len());
    for value in &args.teams {
        let entry = RosterEntry::parse_triple(value)
            .ok_or_else(|| QuizError::Config(format!("bad --team value {value:?}")))?;
        roster.push(entry);
    }
    let mut registry = AddressRegistry::new();
    let teams = registry.load_roster(&roster)?;
    tracing::info!(teams, "roster loaded");

    let mut config = ControllerConfig::builder();
    if let Some(ms) = args.timeout {
        config = config.connection_timeout(Duration::from_millis(ms));
    }
    let engine = ScoreEngine::new(ScoringConfig::default());
    Ok(QuizController::new(config.build()?, registry, engine))
}

async fn run(args: AppArgs) -> Result<(), QuizError> {
    let Some(port) = args.port.as_deref() else {
        return Err(QuizError::Config("--port is required".to_string()));
    };
    let mut controller = build_controller(&args)?;

    let firmware = if args.legacy {
        Firmware::Legacy
    } else {
        Firmware::Current
    };
    let mut session = ConnectionSession::new(SessionConfig::builder().firmware(firmware).build()?);
    let (listener, mut events) = ChannelListener::new();
    session.add_listener(std::sync::Arc::new(listener));
    session.open_serial(port, args.baud).await?;
    tracing::info!("{}", session.connection_message());
    controller.attach(session.request_sender()?);

    let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
    let mut last_labels = Vec::new();
    loop {
        tokio::select! {
            Some(message) = events.recv() => {
                if let Some(address) = controller.handle_message(&message, Instant::now()) {
                    let registry = controller.registry();
                    tracing::info!(
                        address = %address,
                        button = registry.button_label(&address),
                        lq = registry.link_quality(&address),
                        "{:?}",
                        message.kind()
                    );
                }
            }
            _ = ticker.tick() => {
                controller.refresh(Instant::now());
                let labels: Vec<String> = controller
                    .registry()
                    .boxes()
                    .iter()
                    .map(|b| format!("{}{}", b.box_number(), b.status_label()))
                    .collect();
                if labels != last_labels {
                    tracing::info!(status = %labels.join(" "), "boxes");
                    last_labels = labels;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    controller.detach();
    session.close().await;
    Ok(())
}

#[tokio::main]
async fn main() {
    init_logging();

    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("Error: {err}.");
            std::process::exit(2);
        }
    };

    if args.list {
        match available_ports() {
            Ok(ports) => ports.iter().for_each(|p| println!("{p}")),
            Err(err) => {
                eprintln!("Error: {err}.");
                std::process::exit(1);
            }
        }
        return;
    }

    if let Err(err) = run(args).await {
        tracing::error!(error = %err, "monitor failed");
        std::process::exit(1);
    }
}
