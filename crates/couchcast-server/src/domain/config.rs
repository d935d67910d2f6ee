//! Server configuration types.
//!
//! [`ServerConfig`] is the single source of truth for all runtime settings.
//! `main.rs` builds it from CLI arguments and environment variables; tests
//! build it from [`ServerConfig::for_device`].

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use couchcast_core::DeviceAddress;

/// Default seconds between accepted play requests.
pub const DEFAULT_COOLDOWN_SECS: u64 = 2;

/// Default bound on each daemon call and on each command send.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 10;

/// All runtime configuration for the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// The streaming device to control.
    pub device: DeviceAddress,

    /// Minimum time between accepted play requests.  Zero disables the
    /// throttle.
    pub play_cooldown: Duration,

    /// Upper bound for each daemon round trip and each command send, so a
    /// hung device resolves to an error instead of blocking the request.
    pub command_timeout: Duration,

    /// Path of the JSON catalog (`movies.json`).
    pub catalog_path: PathBuf,

    /// TMDB API key used to look up missing posters.
    pub tmdb_api_key: String,

    /// Explicit adb executable.  `None` searches `PATH` and the SDK install
    /// locations.
    pub adb_path: Option<PathBuf>,
}

impl ServerConfig {
    /// Returns a configuration with the documented defaults for everything
    /// except the device address and TMDB key.
    ///
    /// | Field           | Default         |
    /// |-----------------|-----------------|
    /// | bind_addr       | `0.0.0.0:5000`  |
    /// | play_cooldown   | 2 seconds       |
    /// | command_timeout | 10 seconds      |
    /// | catalog_path    | `movies.json`   |
    /// | adb_path        | searched        |
    pub fn for_device(device: DeviceAddress, tmdb_api_key: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            device,
            play_cooldown: Duration::from_secs(DEFAULT_COOLDOWN_SECS),
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            catalog_path: PathBuf::from("movies.json"),
            tmdb_api_key: tmdb_api_key.into(),
            adb_path: None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ServerConfig {
        ServerConfig::for_device(DeviceAddress::new("192.168.1.50", 5555).unwrap(), "key")
    }

    #[test]
    fn test_default_bind_port_is_5000() {
        assert_eq!(cfg().bind_addr.port(), 5000);
    }

    #[test]
    fn test_default_cooldown_is_two_seconds() {
        assert_eq!(cfg().play_cooldown, Duration::from_secs(2));
    }

    #[test]
    fn test_default_catalog_path() {
        assert_eq!(cfg().catalog_path, PathBuf::from("movies.json"));
    }

    #[test]
    fn test_device_is_kept() {
        assert_eq!(cfg().device.serial(), "192.168.1.50:5555");
    }

    #[test]
    fn test_adb_path_is_searched_by_default() {
        assert!(cfg().adb_path.is_none());
    }
}
