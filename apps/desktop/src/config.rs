use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use client_core::{
    channel::{ChannelOptions, DEFAULT_QUEUE_CAPACITY},
    transport::{TransportOptions, DEFAULT_CONNECT_TIMEOUT, DEFAULT_SERIAL_BAUD_RATE},
};
use serde::Deserialize;
use shared::{
    domain::{ConnectionTarget, SurfaceSize, Zone, DEFAULT_RFCOMM_DEVICE},
    error::TargetError,
};
use tracing::warn;

const ENV_PREFIX: &str = "HEXAPOD__";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub interface: String,
    pub ip: String,
    /// Raw input; validated when the connection target is built.
    pub port: String,
    pub mac: Option<String>,
    pub device: PathBuf,
    pub timeout_ms: u64,
    pub baud_rate: u32,
    pub queue_capacity: usize,
    pub dial: SurfaceSize,
    pub pad: SurfaceSize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interface: "tcp".into(),
            ip: "127.0.0.1".into(),
            port: "1234".into(),
            mac: None,
            device: PathBuf::from(DEFAULT_RFCOMM_DEVICE),
            timeout_ms: DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
            baud_rate: DEFAULT_SERIAL_BAUD_RATE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            dial: SurfaceSize::new(600.0, 600.0),
            pad: SurfaceSize::new(400.0, 600.0),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    interface: Option<String>,
    ip: Option<String>,
    port: Option<u16>,
    mac: Option<String>,
    device: Option<PathBuf>,
    timeout_ms: Option<u64>,
    baud_rate: Option<u32>,
    queue_capacity: Option<usize>,
    dial: Option<SurfaceSize>,
    pad: Option<SurfaceSize>,
}

/// Defaults, then the TOML file at `path` if it exists, then `HEXAPOD__*`
/// environment variables.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => settings
            .apply_file(&raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()));
        }
    }

    settings.apply_env(std::env::vars());
    Ok(settings)
}

impl Settings {
    pub fn apply_file(&mut self, raw: &str) -> anyhow::Result<()> {
        let file: FileSettings = toml::from_str(raw)?;
        if let Some(v) = file.interface {
            self.interface = v;
        }
        if let Some(v) = file.ip {
            self.ip = v;
        }
        if let Some(v) = file.port {
            self.port = v.to_string();
        }
        if let Some(v) = file.mac {
            self.mac = Some(v);
        }
        if let Some(v) = file.device {
            self.device = v;
        }
        if let Some(v) = file.timeout_ms {
            self.timeout_ms = v;
        }
        if let Some(v) = file.baud_rate {
            self.baud_rate = v;
        }
        if let Some(v) = file.queue_capacity {
            self.queue_capacity = v;
        }
        if let Some(v) = file.dial {
            self.dial = v;
        }
        if let Some(v) = file.pad {
            self.pad = v;
        }
        Ok(())
    }

    /// Applies `HEXAPOD__*` overrides from `vars`. Unparseable numbers are
    /// logged and skipped.
    pub fn apply_env(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "INTERFACE" => self.interface = value,
                "IP" => self.ip = value,
                "PORT" => self.port = value,
                "MAC" => self.mac = Some(value),
                "DEVICE" => self.device = PathBuf::from(value),
                "TIMEOUT_MS" => match value.parse() {
                    Ok(parsed) => self.timeout_ms = parsed,
                    Err(_) => warn!(key = %key, value = %value, "config: ignoring invalid timeout"),
                },
                "BAUD_RATE" => match value.parse() {
                    Ok(parsed) => self.baud_rate = parsed,
                    Err(_) => warn!(key = %key, value = %value, "config: ignoring invalid baud rate"),
                },
                "QUEUE_CAPACITY" => match value.parse() {
                    Ok(parsed) => self.queue_capacity = parsed,
                    Err(_) => warn!(key = %key, value = %value, "config: ignoring invalid capacity"),
                },
                _ => {}
            }
        }
    }

    pub fn connection_target(&self) -> Result<ConnectionTarget, TargetError> {
        match self.interface.trim().to_ascii_lowercase().as_str() {
            "tcp" | "wifi" => ConnectionTarget::tcp(&self.ip, &self.port),
            "bluetooth" | "bt" => ConnectionTarget::bluetooth(self.mac.as_deref(), &self.device),
            _ => Err(TargetError::UnknownInterface(self.interface.clone())),
        }
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            connect_timeout: Duration::from_millis(self.timeout_ms),
            serial_baud_rate: self.baud_rate,
        }
    }

    pub fn channel_options(&self) -> ChannelOptions {
        ChannelOptions {
            queue_capacity: self.queue_capacity,
        }
    }

    pub fn surface(&self, zone: Zone) -> SurfaceSize {
        match zone {
            Zone::Primary => self.dial,
            Zone::Secondary => self.pad,
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
