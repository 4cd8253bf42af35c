//! Single-connection command channel.
//!
//! Each channel makes at most one connection attempt. Once connected, one
//! writer task owns the transport and drains a bounded FIFO queue, so commands
//! reach the robot in the order they were sent. `send` never waits.

use std::{sync::Arc, time::Duration};

use shared::protocol::Command;
use tokio::{
    sync::{broadcast, mpsc, oneshot, watch},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    error::{ConnectError, DisconnectReason, SendError},
    transport::{TokenSink, TransportConnector, TransportLink},
};

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;
/// How long `disconnect` waits for the writer to flush before aborting it.
const DISCONNECT_GRACE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    /// Terminal: the connection attempt failed or the link was lost.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Connected,
    ConnectFailed(String),
    Disconnected(DisconnectReason),
}

#[derive(Debug, Clone)]
pub struct ChannelOptions {
    pub queue_capacity: usize,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

struct ActiveLink {
    outbound: mpsc::Sender<Command>,
    cancel: oneshot::Sender<()>,
    writer: JoinHandle<()>,
}

pub struct CommandChannel {
    connector: Arc<dyn TransportConnector>,
    options: ChannelOptions,
    state: Arc<watch::Sender<SessionState>>,
    events: broadcast::Sender<ChannelEvent>,
    attempted: bool,
    active: Option<ActiveLink>,
}

impl CommandChannel {
    pub fn new(connector: Arc<dyn TransportConnector>, options: ChannelOptions) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected);
        let (events, _) = broadcast::channel(16);
        Self {
            connector,
            options,
            state: Arc::new(state),
            events,
            attempted: false,
            active: None,
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ChannelEvent> {
        self.events.subscribe()
    }

    pub fn target(&self) -> String {
        self.connector.describe()
    }

    pub async fn connect(&mut self) -> Result<(), ConnectError> {
        if self.attempted {
            return Err(ConnectError::AlreadyUsed);
        }
        self.attempted = true;
        self.state.send_replace(SessionState::Connecting);

        let target = self.connector.describe();
        info!(target = %target, "channel: connecting");
        let link = match self.connector.connect().await {
            Ok(link) => link,
            Err(err) => {
                error!(target = %target, "channel: connect failed: {err}");
                self.state.send_replace(SessionState::Failed);
                let _ = self.events.send(ChannelEvent::ConnectFailed(err.to_string()));
                return Err(err);
            }
        };

        let (outbound, queue) = mpsc::channel(self.options.queue_capacity.max(1));
        let (cancel, cancelled) = oneshot::channel();
        self.state.send_replace(SessionState::Connected);
        let _ = self.events.send(ChannelEvent::Connected);
        info!(target = %target, "channel: connected");

        let writer = tokio::spawn(run_writer(
            link,
            queue,
            cancelled,
            Arc::clone(&self.state),
            self.events.clone(),
        ));
        self.active = Some(ActiveLink {
            outbound,
            cancel,
            writer,
        });
        Ok(())
    }

    /// Queues `command` for the writer. Commands sent while not connected are
    /// dropped and reported as success.
    pub fn send(&self, command: Command) -> Result<(), SendError> {
        if self.state() != SessionState::Connected {
            debug!(command = %command, state = ?self.state(), "channel: not connected, dropping");
            return Ok(());
        }
        let Some(active) = &self.active else {
            return Ok(());
        };
        active.outbound.try_send(command).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => SendError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SendError::NotOpen,
        })
    }

    pub async fn disconnect(&mut self) {
        if let Some(active) = self.active.take() {
            let _ = active.cancel.send(());
            let mut writer = active.writer;
            match tokio::time::timeout(DISCONNECT_GRACE, &mut writer).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!("channel: writer task ended abnormally: {err}"),
                Err(_) => {
                    warn!("channel: writer did not stop in time, aborting");
                    writer.abort();
                }
            }
            info!(target = %self.connector.describe(), "channel: disconnected");
        }

        self.state.send_if_modified(|state| {
            if *state == SessionState::Failed || *state == SessionState::Disconnected {
                false
            } else {
                *state = SessionState::Disconnected;
                true
            }
        });
    }
}

enum WriterExit {
    Cancelled,
    Lost(DisconnectReason),
}

async fn run_writer(
    link: TransportLink,
    mut queue: mpsc::Receiver<Command>,
    mut cancelled: oneshot::Receiver<()>,
    state: Arc<watch::Sender<SessionState>>,
    events: broadcast::Sender<ChannelEvent>,
) {
    let TransportLink {
        mut sink,
        mut hangup,
    } = link;

    let exit = loop {
        tokio::select! {
            biased;
            // Resolves on an explicit cancel and when the channel is dropped.
            _ = &mut cancelled => {
                flush_queued(sink.as_mut(), &mut queue).await;
                break WriterExit::Cancelled;
            }
            reason = &mut hangup => break WriterExit::Lost(reason),
            next = queue.recv() => match next {
                Some(command) => {
                    if let Err(err) = write_command(sink.as_mut(), command).await {
                        break WriterExit::Lost(DisconnectReason::WriteFailed(err.to_string()));
                    }
                }
                None => break WriterExit::Cancelled,
            },
        }
    };

    sink.shutdown().await;
    match exit {
        WriterExit::Cancelled => debug!("channel: writer stopped"),
        WriterExit::Lost(reason) => {
            warn!("channel: transport lost: {reason}");
            state.send_replace(SessionState::Failed);
            let _ = events.send(ChannelEvent::Disconnected(reason));
        }
    }
}

async fn write_command(sink: &mut dyn TokenSink, command: Command) -> std::io::Result<()> {
    sink.write_token(command.wire_token().as_bytes()).await?;
    debug!(command = %command, "channel: command written");
    Ok(())
}

/// Writes whatever was queued before cancellation; a failed write ends the
/// flush without retrying.
async fn flush_queued(sink: &mut dyn TokenSink, queue: &mut mpsc::Receiver<Command>) {
    queue.close();
    while let Ok(command) = queue.try_recv() {
        if let Err(err) = write_command(sink, command).await {
            debug!(command = %command, "channel: dropped queued command on close: {err}");
            return;
        }
    }
}

#[cfg(test)]
#[path = "tests/channel_tests.rs"]
mod tests;
