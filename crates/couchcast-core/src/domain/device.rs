//! Address of the target device.

use std::fmt;

use thiserror::Error;

/// Port the device's debug bridge listens on for network (TCP/IP) mode.
pub const DEFAULT_DEVICE_PORT: u16 = 5555;

/// Error returned for an unusable device host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("device host is empty")]
    EmptyHost,
    #[error("device host {0:?} contains whitespace or a port separator")]
    InvalidHost(String),
}

/// Host and port of the one device couchcast controls.
///
/// Supplied once at startup and never changed afterwards.  The daemon knows
/// network devices by their serial, which is `host:port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceAddress {
    host: String,
    port: u16,
}

impl DeviceAddress {
    /// Creates an address after checking the host is non-empty and contains
    /// no whitespace or `:`.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] when the host is blank or malformed.
    pub fn new(host: &str, port: u16) -> Result<Self, AddressError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(AddressError::EmptyHost);
        }
        if host.chars().any(|c| c.is_whitespace() || c == ':') {
            return Err(AddressError::InvalidHost(host.to_string()));
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The serial the daemon lists this device under (`host:port`).
    pub fn serial(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
