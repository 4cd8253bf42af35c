//! Byte transports that carry command tokens to the robot.
//!
//! A connector produces a [`TransportLink`]: a sink for outbound tokens plus a
//! future that resolves once the peer goes away. Inbound bytes are never
//! interpreted; the protocol is one-way.

use std::{
    io::{self, Write},
    net::SocketAddr,
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use futures::future::{self, BoxFuture, FutureExt};
use shared::domain::{BluetoothAddress, ConnectionTarget, DEFAULT_RFCOMM_CHANNEL};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
};
use tracing::{debug, info, trace};

use crate::error::{ConnectError, DisconnectReason};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(3000);
pub const DEFAULT_SERIAL_BAUD_RATE: u32 = 9600;
const SERIAL_WRITE_TIMEOUT: Duration = Duration::from_millis(3000);
const INBOUND_BUFFER_LEN: usize = 256;

#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub connect_timeout: Duration,
    pub serial_baud_rate: u32,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            serial_baud_rate: DEFAULT_SERIAL_BAUD_RATE,
        }
    }
}

#[async_trait]
pub trait TokenSink: Send {
    /// Writes the token bytes verbatim and flushes them.
    async fn write_token(&mut self, token: &[u8]) -> io::Result<()>;
    async fn shutdown(&mut self);
}

pub struct TransportLink {
    pub sink: Box<dyn TokenSink>,
    /// Resolves when the peer closes the link or reading from it fails.
    pub hangup: BoxFuture<'static, DisconnectReason>,
}

#[async_trait]
pub trait TransportConnector: Send + Sync {
    async fn connect(&self) -> Result<TransportLink, ConnectError>;
    fn describe(&self) -> String;
}

pub fn connector_for(
    target: &ConnectionTarget,
    options: &TransportOptions,
) -> Arc<dyn TransportConnector> {
    match target {
        ConnectionTarget::Tcp { ip, port } => Arc::new(TcpConnector::new(
            SocketAddr::new(*ip, *port),
            options.connect_timeout,
        )),
        ConnectionTarget::Bluetooth { mac, device } => Arc::new(SerialConnector::new(
            *mac,
            device.clone(),
            options.serial_baud_rate,
        )),
    }
}

pub struct TcpConnector {
    addr: SocketAddr,
    connect_timeout: Duration,
}

impl TcpConnector {
    pub fn new(addr: SocketAddr, connect_timeout: Duration) -> Self {
        Self {
            addr,
            connect_timeout,
        }
    }
}

#[async_trait]
impl TransportConnector for TcpConnector {
    async fn connect(&self) -> Result<TransportLink, ConnectError> {
        let target = self.describe();
        let stream =
            match tokio::time::timeout(self.connect_timeout, TcpStream::connect(self.addr)).await {
                Ok(Ok(stream)) => stream,
                Ok(Err(err)) => {
                    return Err(ConnectError::from_io(target, self.connect_timeout, err));
                }
                Err(_) => {
                    return Err(ConnectError::Timeout {
                        target,
                        timeout: self.connect_timeout,
                    });
                }
            };
        stream
            .set_nodelay(true)
            .map_err(|err| ConnectError::from_io(target.clone(), self.connect_timeout, err))?;
        info!(peer = %self.addr, "transport: tcp connected");

        let (reader, writer) = stream.into_split();
        Ok(TransportLink {
            sink: Box::new(TcpSink { writer }),
            hangup: watch_tcp_hangup(reader).boxed(),
        })
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.addr)
    }
}

struct TcpSink {
    writer: OwnedWriteHalf,
}

#[async_trait]
impl TokenSink for TcpSink {
    async fn write_token(&mut self, token: &[u8]) -> io::Result<()> {
        self.writer.write_all(token).await?;
        self.writer.flush().await
    }

    async fn shutdown(&mut self) {
        if let Err(err) = self.writer.shutdown().await {
            debug!("transport: tcp shutdown failed: {err}");
        }
    }
}

async fn watch_tcp_hangup(mut reader: OwnedReadHalf) -> DisconnectReason {
    let mut buf = [0u8; INBOUND_BUFFER_LEN];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => return DisconnectReason::PeerClosed,
            Ok(n) => trace!(
                bytes = n,
                inbound = %String::from_utf8_lossy(&buf[..n]),
                "transport: ignoring inbound bytes"
            ),
            Err(err) => return DisconnectReason::ReadFailed(err.to_string()),
        }
    }
}

/// Serial Port Profile link over an RFCOMM tty.
///
/// The tty must already be bound to the robot outside this program, e.g.
/// `rfcomm bind /dev/rfcomm0 <mac> 10`. The connector opens `device` as given
/// and does not check which address it is bound to; `mac` only names the
/// target in logs and errors.
pub struct SerialConnector {
    mac: BluetoothAddress,
    device: PathBuf,
    baud_rate: u32,
}

impl SerialConnector {
    pub fn new(mac: BluetoothAddress, device: PathBuf, baud_rate: u32) -> Self {
        Self {
            mac,
            device,
            baud_rate,
        }
    }

    fn bind_hint(&self) -> String {
        format!(
            "rfcomm bind {} {} {}",
            self.device.display(),
            self.mac,
            DEFAULT_RFCOMM_CHANNEL
        )
    }
}

#[async_trait]
impl TransportConnector for SerialConnector {
    async fn connect(&self) -> Result<TransportLink, ConnectError> {
        let target = self.describe();
        info!(
            mac = %self.mac,
            device = %self.device.display(),
            "transport: opening rfcomm serial link"
        );

        let path = self.device.to_string_lossy().into_owned();
        let baud_rate = self.baud_rate;
        let opened = tokio::task::spawn_blocking(move || {
            serialport::new(path, baud_rate)
                .timeout(SERIAL_WRITE_TIMEOUT)
                .open()
        })
        .await
        .map_err(|err| ConnectError::DeviceUnavailable {
            target: target.clone(),
            reason: err.to_string(),
        })?;
        let port = opened.map_err(|err| ConnectError::DeviceUnavailable {
            target: target.clone(),
            reason: format!("{err} (is it bound? try: {})", self.bind_hint()),
        })?;

        Ok(TransportLink {
            sink: Box::new(SerialSink { port: Some(port) }),
            // A tty bound to RFCOMM gives no hang-up notification; a failed
            // write is how a lost link shows up.
            hangup: future::pending().boxed(),
        })
    }

    fn describe(&self) -> String {
        format!("rfcomm://{} via {}", self.mac, self.device.display())
    }
}

struct SerialSink {
    port: Option<Box<dyn serialport::SerialPort>>,
}

#[async_trait]
impl TokenSink for SerialSink {
    async fn write_token(&mut self, token: &[u8]) -> io::Result<()> {
        let mut port = self
            .port
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "serial port closed"))?;
        let token = token.to_vec();
        let (port, result) = tokio::task::spawn_blocking(move || {
            let result = port.write_all(&token).and_then(|()| port.flush());
            (port, result)
        })
        .await
        .map_err(io::Error::other)?;
        self.port = Some(port);
        result
    }

    async fn shutdown(&mut self) {
        self.port.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connector_for_picks_transport_by_interface() {
        let options = TransportOptions::default();
        let tcp = connector_for(
            &ConnectionTarget::tcp("192.168.1.127", "1234").expect("target"),
            &options,
        );
        assert_eq!(tcp.describe(), "tcp://192.168.1.127:1234");

        let serial = connector_for(
            &ConnectionTarget::bluetooth(Some("98:d3:31:f5:1a:2b"), "/dev/rfcomm3")
                .expect("target"),
            &options,
        );
        assert_eq!(serial.describe(), "rfcomm://98:D3:31:F5:1A:2B via /dev/rfcomm3");
    }

    #[tokio::test]
    async fn missing_serial_device_is_reported_as_unavailable() {
        let connector = SerialConnector::new(
            "98:d3:31:f5:1a:2b".parse().expect("mac"),
            PathBuf::from("/dev/does-not-exist-rfcomm"),
            DEFAULT_SERIAL_BAUD_RATE,
        );
        let err = match connector.connect().await {
            Ok(_) => panic!("missing device must not connect"),
            Err(err) => err,
        };
        assert!(matches!(err, ConnectError::DeviceUnavailable { .. }), "{err}");
        assert!(
            err.to_string()
                .contains("rfcomm bind /dev/does-not-exist-rfcomm 98:D3:31:F5:1A:2B 10"),
            "{err}"
        );
    }
}
