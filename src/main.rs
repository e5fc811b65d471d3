use std::io;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crashcast::config::ListenerConfig;
use crashcast::protocol::Listener;
use crashcast::publisher::Publisher;
use crashcast::sinks::{ChatSink, EnvCredentials, NoopSink};

/// Environment variable supervisord exports to its event-listener children.
/// Its absence means we were started by hand, not by a supervisor.
const SUPERVISOR_ENV_MARKER: &str = "SUPERVISOR_SERVER_URL";

#[derive(Parser)]
#[command(name = "crashcast")]
#[command(about = "Supervisord event listener that fans crash notifications out to chat", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Event name to subscribe to (repeatable; overrides the config file)
    #[arg(short, long = "event")]
    events: Vec<String>,

    /// Chat room to notify (repeatable; overrides the config file)
    #[arg(short, long = "room")]
    rooms: Vec<String>,

    /// Message color for chat notifications
    #[arg(long)]
    color: Option<String>,

    /// Do not register the chat sink
    #[arg(long)]
    no_chat: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to stderr only: stdout carries protocol tokens and
    // anything else on it desynchronizes the supervisor.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    if std::env::var_os(SUPERVISOR_ENV_MARKER).is_none() {
        bail!("crashcast must be run as a supervisord event listener ({SUPERVISOR_ENV_MARKER} is not set)");
    }

    let config = load_config(&cli)?;

    let listener = Listener::new(io::stdin().lock(), io::stdout().lock());
    let mut publisher = Publisher::new(listener, config.subscription_set());

    if config.enable_chat {
        let credentials = EnvCredentials::new(config.chat.token_env.clone());
        match ChatSink::new(&config.chat, &credentials) {
            Ok(sink) => publisher.register(Box::new(sink)),
            // A sink without its secret is dropped; the listener keeps
            // running with whatever sinks remain.
            Err(err) => error!(error = %err, "chat sink disabled"),
        }
    }
    if config.enable_mail {
        publisher.register(Box::new(NoopSink::new("mail")));
    }

    if publisher.sink_count() == 0 {
        warn!("no sinks registered; events will be filtered and acknowledged only");
    }

    info!(
        events = ?config.events,
        sinks = publisher.sink_count(),
        "listener starting"
    );

    publisher.run_forever()?;
    info!("input stream closed, shutting down");
    Ok(())
}

fn load_config(cli: &Cli) -> Result<ListenerConfig> {
    let mut config = match &cli.config {
        Some(path) => ListenerConfig::from_file(path)?,
        None => ListenerConfig::default(),
    };

    if !cli.events.is_empty() {
        config.events = cli.events.clone();
    }
    if !cli.rooms.is_empty() {
        config.chat.rooms = cli.rooms.clone();
    }
    if let Some(color) = &cli.color {
        config.chat.color = color.clone();
    }
    if cli.no_chat {
        config.enable_chat = false;
    }

    Ok(config)
}
