use shared::{
    domain::{TouchPhase, TouchPoint, Zone},
    protocol::Command,
};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::{
    channel::{ChannelEvent, CommandChannel, SessionState},
    classifier::GestureClassifier,
    error::ConnectError,
};

/// One remote-control session: turns touch and key input into commands and
/// forwards each change of command to the robot exactly once.
pub struct Session {
    classifier: GestureClassifier,
    channel: CommandChannel,
    current_command: Option<Command>,
    active_zone: Option<Zone>,
}

impl Session {
    pub fn new(channel: CommandChannel) -> Self {
        Self {
            classifier: GestureClassifier::new(),
            channel,
            current_command: None,
            active_zone: None,
        }
    }

    pub async fn connect(&mut self) -> Result<(), ConnectError> {
        self.current_command = None;
        self.active_zone = None;
        self.channel.connect().await?;
        info!(target = %self.channel.target(), "session: active");
        Ok(())
    }

    pub async fn disconnect(&mut self) {
        self.channel.disconnect().await;
        self.active_zone = None;
    }

    pub fn state(&self) -> SessionState {
        self.channel.state()
    }

    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.channel.watch_state()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ChannelEvent> {
        self.channel.subscribe_events()
    }

    pub fn current_command(&self) -> Option<Command> {
        self.current_command
    }

    pub fn active_zone(&self) -> Option<Zone> {
        self.active_zone
    }

    pub fn on_touch(&mut self, zone: Zone, point: &TouchPoint, phase: TouchPhase) -> Option<Command> {
        match phase {
            TouchPhase::Down => {
                self.active_zone = Some(zone);
                self.classify_and_dispatch(zone, point)
            }
            TouchPhase::Move => match self.active_zone {
                Some(active) if active != zone => {
                    debug!(?zone, ?active, "session: ignoring move outside the active zone");
                    None
                }
                Some(_) => self.classify_and_dispatch(zone, point),
                None => {
                    self.active_zone = Some(zone);
                    self.classify_and_dispatch(zone, point)
                }
            },
            TouchPhase::Up => Some(self.release()),
        }
    }

    /// Direct command input; sent only when it differs from the current command.
    /// A command the channel rejects does not become current, so the next
    /// identical input retries it.
    pub fn dispatch(&mut self, command: Command) -> Option<Command> {
        if self.current_command == Some(command) {
            return None;
        }
        if !self.transmit(command) {
            return None;
        }
        self.current_command = Some(command);
        Some(command)
    }

    /// Returns the robot to `Standby`. Always transmits, even when standby is
    /// already current, so a lost release can be repeated.
    pub fn release(&mut self) -> Command {
        self.active_zone = None;
        self.transmit(Command::Standby);
        self.current_command = Some(Command::Standby);
        Command::Standby
    }

    fn classify_and_dispatch(&mut self, zone: Zone, point: &TouchPoint) -> Option<Command> {
        let command = self.classifier.classify(zone, point)?;
        self.dispatch(command)
    }

    /// Hands `command` to the channel. Errors are logged, not propagated.
    fn transmit(&self, command: Command) -> bool {
        match self.channel.send(command) {
            Ok(()) => true,
            Err(err) => {
                warn!(command = %command, "session: dropping command: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
