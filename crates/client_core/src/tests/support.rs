//! In-memory transport used by the channel and session tests.

use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use futures::future::{self, FutureExt};
use tokio::sync::{mpsc, oneshot, Semaphore};

use crate::{
    error::{ConnectError, DisconnectReason},
    transport::{TokenSink, TransportConnector, TransportLink},
};

const TOKEN_WAIT: Duration = Duration::from_secs(1);

struct Pieces {
    tokens: mpsc::UnboundedSender<String>,
    hangup: oneshot::Receiver<DisconnectReason>,
}

pub(crate) struct RecordingConnector {
    pieces: Mutex<Option<Pieces>>,
    refuse: bool,
    fail_writes: Arc<AtomicBool>,
    shut_down: Arc<AtomicBool>,
    gate: Option<Arc<Semaphore>>,
}

pub(crate) struct RecordingProbe {
    tokens: mpsc::UnboundedReceiver<String>,
    hangup: Option<oneshot::Sender<DisconnectReason>>,
    fail_writes: Arc<AtomicBool>,
    shut_down: Arc<AtomicBool>,
    gate: Option<Arc<Semaphore>>,
}

fn build(refuse: bool, gated: bool) -> (Arc<RecordingConnector>, RecordingProbe) {
    let (tokens_tx, tokens_rx) = mpsc::unbounded_channel();
    let (hangup_tx, hangup_rx) = oneshot::channel();
    let fail_writes = Arc::new(AtomicBool::new(false));
    let shut_down = Arc::new(AtomicBool::new(false));
    let gate = gated.then(|| Arc::new(Semaphore::new(0)));

    let connector = RecordingConnector {
        pieces: Mutex::new(Some(Pieces {
            tokens: tokens_tx,
            hangup: hangup_rx,
        })),
        refuse,
        fail_writes: Arc::clone(&fail_writes),
        shut_down: Arc::clone(&shut_down),
        gate: gate.clone(),
    };
    let probe = RecordingProbe {
        tokens: tokens_rx,
        hangup: Some(hangup_tx),
        fail_writes,
        shut_down,
        gate,
    };
    (Arc::new(connector), probe)
}

/// Connector that accepts one connection and records every written token.
pub(crate) fn recording() -> (Arc<RecordingConnector>, RecordingProbe) {
    build(false, false)
}

/// Like [`recording`], but each write waits for a permit from [`RecordingProbe::open_gate`].
pub(crate) fn gated() -> (Arc<RecordingConnector>, RecordingProbe) {
    build(false, true)
}

pub(crate) fn refusing() -> Arc<RecordingConnector> {
    build(true, false).0
}

#[async_trait]
impl TransportConnector for RecordingConnector {
    async fn connect(&self) -> Result<TransportLink, ConnectError> {
        if self.refuse {
            return Err(ConnectError::Refused {
                target: self.describe(),
            });
        }
        let pieces = self
            .pieces
            .lock()
            .expect("pieces lock")
            .take()
            .expect("recording connector connects once");

        let hangup = pieces.hangup;
        Ok(TransportLink {
            sink: Box::new(RecordingSink {
                tokens: pieces.tokens,
                fail_writes: Arc::clone(&self.fail_writes),
                shut_down: Arc::clone(&self.shut_down),
                gate: self.gate.clone(),
            }),
            hangup: async move {
                match hangup.await {
                    Ok(reason) => reason,
                    Err(_) => future::pending::<DisconnectReason>().await,
                }
            }
            .boxed(),
        })
    }

    fn describe(&self) -> String {
        "memory://recorder".to_string()
    }
}

struct RecordingSink {
    tokens: mpsc::UnboundedSender<String>,
    fail_writes: Arc<AtomicBool>,
    shut_down: Arc<AtomicBool>,
    gate: Option<Arc<Semaphore>>,
}

#[async_trait]
impl TokenSink for RecordingSink {
    async fn write_token(&mut self, token: &[u8]) -> io::Result<()> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.map_err(io::Error::other)?.forget();
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "link dropped"));
        }
        let _ = self.tokens.send(String::from_utf8_lossy(token).into_owned());
        Ok(())
    }

    async fn shutdown(&mut self) {
        self.shut_down.store(true, Ordering::SeqCst);
    }
}

impl RecordingProbe {
    pub(crate) async fn next_token(&mut self) -> Option<String> {
        tokio::time::timeout(TOKEN_WAIT, self.tokens.recv())
            .await
            .ok()
            .flatten()
    }

    pub(crate) fn drain_now(&mut self) -> Vec<String> {
        let mut tokens = Vec::new();
        while let Ok(token) = self.tokens.try_recv() {
            tokens.push(token);
        }
        tokens
    }

    pub(crate) fn hang_up(&mut self, reason: DisconnectReason) {
        if let Some(hangup) = self.hangup.take() {
            let _ = hangup.send(reason);
        }
    }

    pub(crate) fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub(crate) fn open_gate(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub(crate) fn was_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}
