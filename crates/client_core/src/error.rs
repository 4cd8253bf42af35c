use std::{io, time::Duration};

use thiserror::Error;

/// Fatal to a session; reported once, never retried.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("connection to {target} timed out after {}ms", timeout.as_millis())]
    Timeout { target: String, timeout: Duration },
    #[error("connection to {target} refused")]
    Refused { target: String },
    #[error("{target} is unreachable: {source}")]
    Unreachable { target: String, source: io::Error },
    #[error("device {target} unavailable: {reason}")]
    DeviceUnavailable { target: String, reason: String },
    #[error("channel already attempted a connection; create a new session to retry")]
    AlreadyUsed,
    #[error("i/o error connecting to {target}: {source}")]
    Io { target: String, source: io::Error },
}

impl ConnectError {
    pub(crate) fn from_io(target: impl Into<String>, timeout: Duration, err: io::Error) -> Self {
        let target = target.into();
        match err.kind() {
            io::ErrorKind::ConnectionRefused => ConnectError::Refused { target },
            io::ErrorKind::TimedOut => ConnectError::Timeout { target, timeout },
            io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::NetworkUnreachable
            | io::ErrorKind::HostUnreachable => ConnectError::Unreachable { target, source: err },
            _ => ConnectError::Io { target, source: err },
        }
    }
}

/// Returned by `send`; callers log and drop the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("transport is not open")]
    NotOpen,
    #[error("outbound command queue is full")]
    QueueFull,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisconnectReason {
    #[error("peer closed the connection")]
    PeerClosed,
    #[error("write failed: {0}")]
    WriteFailed(String),
    #[error("read failed: {0}")]
    ReadFailed(String),
}
