use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown command token: {0:?}")]
pub struct ParseCommandError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("bluetooth address '{input}' has {found} octets, expected 6")]
    OctetCount { input: String, found: usize },
    #[error("invalid bluetooth address octet '{0}'")]
    InvalidOctet(String),
}

/// Raised when user-supplied connection parameters cannot form a target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("unknown interface '{0}', expected 'tcp' or 'bluetooth'")]
    UnknownInterface(String),
    #[error("'{0}' is not a numeric IP address")]
    InvalidIp(String),
    #[error("'{0}' is not a valid port (0-65535)")]
    InvalidPort(String),
    #[error("bluetooth interface requires a MAC address")]
    MissingMac,
    #[error(transparent)]
    InvalidMac(#[from] AddressParseError),
}
