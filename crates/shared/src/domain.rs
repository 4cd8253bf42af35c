use std::{fmt, net::IpAddr, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{AddressParseError, TargetError};

/// RFCOMM channel the robot's Serial Port Profile service listens on.
pub const DEFAULT_RFCOMM_CHANNEL: u8 = 10;
pub const DEFAULT_RFCOMM_DEVICE: &str = "/dev/rfcomm0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// Circular directional dial.
    Primary,
    /// Rectangular axis pad.
    Secondary,
}

impl FromStr for Zone {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "primary" | "dial" => Ok(Zone::Primary),
            "secondary" | "pad" => Ok(Zone::Secondary),
            other => Err(format!("unknown zone '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchPhase {
    Down,
    Move,
    Up,
}

impl FromStr for TouchPhase {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "down" => Ok(TouchPhase::Down),
            "move" => Ok(TouchPhase::Move),
            "up" => Ok(TouchPhase::Up),
            other => Err(format!("unknown touch phase '{other}'")),
        }
    }
}

/// Pixel size of a control surface as measured by the host layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
}

impl SurfaceSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Radius of the largest circle centered on the surface.
    pub fn radius(&self) -> f64 {
        self.width.min(self.height) / 2.0
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub x: f64,
    pub y: f64,
    pub surface: SurfaceSize,
}

impl TouchPoint {
    pub fn new(x: f64, y: f64, surface: SurfaceSize) -> Self {
        Self { x, y, surface }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BluetoothAddress(pub [u8; 6]);

impl FromStr for BluetoothAddress {
    type Err = AddressParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let parts: Vec<&str> = value.split([':', '-']).collect();
        if parts.len() != 6 {
            return Err(AddressParseError::OctetCount {
                input: value.to_string(),
                found: parts.len(),
            });
        }

        let mut octets = [0u8; 6];
        for (slot, part) in octets.iter_mut().zip(&parts) {
            if part.len() != 2 {
                return Err(AddressParseError::InvalidOctet(part.to_string()));
            }
            *slot = u8::from_str_radix(part, 16)
                .map_err(|_| AddressParseError::InvalidOctet(part.to_string()))?;
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for BluetoothAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl Serialize for BluetoothAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BluetoothAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Where a session should connect, as chosen by the device/connection picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "interface", rename_all = "snake_case")]
pub enum ConnectionTarget {
    Tcp {
        ip: IpAddr,
        port: u16,
    },
    Bluetooth {
        mac: BluetoothAddress,
        /// RFCOMM serial node bound to `mac`.
        device: PathBuf,
    },
}

impl ConnectionTarget {
    /// Builds a TCP target from raw user input. Host names are rejected; the
    /// robot is addressed by a numeric IP.
    pub fn tcp(ip: &str, port: &str) -> Result<Self, TargetError> {
        let ip = ip
            .trim()
            .parse::<IpAddr>()
            .map_err(|_| TargetError::InvalidIp(ip.to_string()))?;
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| TargetError::InvalidPort(port.to_string()))?;
        Ok(ConnectionTarget::Tcp { ip, port })
    }

    pub fn bluetooth(mac: Option<&str>, device: impl Into<PathBuf>) -> Result<Self, TargetError> {
        let mac = mac
            .map(str::trim)
            .filter(|mac| !mac.is_empty())
            .ok_or(TargetError::MissingMac)?
            .parse::<BluetoothAddress>()?;
        Ok(ConnectionTarget::Bluetooth {
            mac,
            device: device.into(),
        })
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionTarget::Tcp { ip, port } => write!(f, "tcp://{ip}:{port}"),
            ConnectionTarget::Bluetooth { mac, device } => {
                write!(f, "rfcomm://{mac} via {}", device.display())
            }
        }
    }
}
