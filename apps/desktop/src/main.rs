use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{connector_for, ChannelEvent, CommandChannel, GestureClassifier, Session, SessionState};
use shared::{
    domain::{TouchPoint, Zone},
    protocol::Command,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod console;

use config::Settings;
use console::ConsoleInput;

#[derive(Parser, Debug)]
#[command(name = "hexapod-remote", version, about = "Remote control for a hexapod robot")]
struct Cli {
    #[arg(long, global = true, default_value = "hexapod.toml")]
    config: PathBuf,
    #[command(flatten)]
    connection: ConnectionArgs,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Args, Debug, Default)]
struct ConnectionArgs {
    /// `tcp` or `bluetooth`.
    #[arg(long, global = true)]
    interface: Option<String>,
    #[arg(long, global = true)]
    ip: Option<String>,
    #[arg(long, global = true)]
    port: Option<String>,
    /// Robot address, e.g. 98:D3:31:F5:1A:2B.
    #[arg(long, global = true)]
    mac: Option<String>,
    /// RFCOMM serial node bound to the robot.
    #[arg(long, global = true)]
    device: Option<PathBuf>,
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
    /// Serial line speed for the bluetooth tty.
    #[arg(long, global = true)]
    baud_rate: Option<u32>,
}

impl ConnectionArgs {
    fn apply(self, settings: &mut Settings) {
        if let Some(v) = self.interface {
            settings.interface = v;
        }
        if let Some(v) = self.ip {
            settings.ip = v;
        }
        if let Some(v) = self.port {
            settings.port = v;
        }
        if let Some(v) = self.mac {
            settings.mac = Some(v);
        }
        if let Some(v) = self.device {
            settings.device = v;
        }
        if let Some(v) = self.timeout_ms {
            settings.timeout_ms = v;
        }
        if let Some(v) = self.baud_rate {
            settings.baud_rate = v;
        }
    }
}

#[derive(Subcommand, Debug, PartialEq)]
enum Mode {
    /// Read keys, command tokens and touch events from stdin.
    Console,
    /// Send each command in order, then return to standby.
    Send {
        #[arg(required = true)]
        commands: Vec<Command>,
    },
    /// Classify a touch without connecting and print the token.
    #[command(allow_negative_numbers = true)]
    Classify { zone: Zone, x: f64, y: f64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = config::load_settings(&cli.config)?;
    cli.connection.apply(&mut settings);

    match cli.mode.unwrap_or(Mode::Console) {
        Mode::Classify { zone, x, y } => {
            let point = TouchPoint::new(x, y, settings.surface(zone));
            match GestureClassifier::new().classify(zone, &point) {
                Some(command) => println!("{command}"),
                None => println!("none"),
            }
            Ok(())
        }
        Mode::Send { commands } => send_all(&settings, &commands).await,
        Mode::Console => run_console(&settings).await,
    }
}

fn open_session(settings: &Settings) -> Result<Session> {
    let target = settings
        .connection_target()
        .context("invalid connection settings")?;
    info!(target = %target, "remote: using target");
    let connector = connector_for(&target, &settings.transport_options());
    Ok(Session::new(CommandChannel::new(connector, settings.channel_options())))
}

async fn send_all(settings: &Settings, commands: &[Command]) -> Result<()> {
    let mut session = open_session(settings)?;
    session.connect().await.context("failed to connect")?;

    for command in commands {
        if session.dispatch(*command).is_none() {
            debug!(command = %command, "remote: command not sent");
        }
    }
    session.release();
    session.disconnect().await;

    if session.state() == SessionState::Failed {
        bail!("connection lost before all commands were written");
    }
    Ok(())
}

async fn run_console(settings: &Settings) -> Result<()> {
    let mut session = open_session(settings)?;
    let mut events = session.subscribe_events();
    session.connect().await.context("failed to connect")?;
    println!(
        "connected: keys w e d c x z a q s, arrows, command tokens, \
         `touch <zone> <phase> <x> <y>`, `release`, `quit`"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match console::parse_line(&line) {
                    Ok(Some(ConsoleInput::Quit)) => break,
                    Ok(Some(input)) => apply_input(&mut session, settings, input),
                    Ok(None) => {}
                    Err(err) => eprintln!("{err:#}"),
                }
            }
            event = events.recv() => {
                if let Ok(ChannelEvent::Disconnected(reason)) = event {
                    warn!("remote: connection lost: {reason}");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.release();
    session.disconnect().await;
    Ok(())
}

fn apply_input(session: &mut Session, settings: &Settings, input: ConsoleInput) {
    let sent = match input {
        ConsoleInput::Command(command) => session.dispatch(command),
        ConsoleInput::Touch { zone, phase, x, y } => {
            let point = TouchPoint::new(x, y, settings.surface(zone));
            session.on_touch(zone, &point, phase)
        }
        ConsoleInput::Release => Some(session.release()),
        ConsoleInput::Quit => None,
    };
    if let Some(command) = sent {
        println!("> {command}");
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
