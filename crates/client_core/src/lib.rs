//! Client runtime for the hexapod remote: gesture classification, the
//! outbound command channel and the session tying them together.

pub mod channel;
pub mod classifier;
pub mod error;
pub mod keymap;
pub mod session;
pub mod transport;

pub use channel::{ChannelEvent, ChannelOptions, CommandChannel, SessionState};
pub use classifier::GestureClassifier;
pub use error::{ConnectError, DisconnectReason, SendError};
pub use keymap::command_for_key;
pub use session::Session;
pub use transport::{connector_for, TransportConnector, TransportOptions};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
