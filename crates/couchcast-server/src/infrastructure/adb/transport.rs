//! `BridgeTransport` backed by the local adb daemon.
//!
//! # Layers
//!
//! ```text
//! AdbTransport ── connect() ──► AdbClient ── device(addr) ──► AdbDevice ── shell(cmd)
//!   (locator +                   (memoized,                     (one daemon
//!    daemon start)                devices /                      session per
//!                                 connect_device)                command)
//! ```
//!
//! The wire protocol is handled by `adb_client`, whose calls block.  Each call
//! runs on the blocking pool under `tokio::time::timeout`; a call that
//! overruns is abandoned and reported as [`AdbError::Timeout`].
//!
//! The client is created once and reused.  If the daemon later disappears
//! (e.g. after `adb kill-server`), the next device lookup starts it again.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use adb_client::{ADBDeviceExt, ADBServer, RustADBError};
use async_trait::async_trait;
use couchcast_core::{ControlError, DeviceAddress};
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tokio::task::{spawn_blocking, JoinError};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::locator::BinaryLocator;
use crate::application::{BridgeClient, BridgeTransport, DeviceHandle, SendError};

/// Port of the local adb daemon.
pub const DEFAULT_DAEMON_PORT: u16 = 5037;

/// Reported when no adb executable can be found.
pub const ADB_NOT_FOUND: &str =
    "ADB not found. Install Android Platform Tools and add adb to PATH (or set ANDROID_HOME).";

/// Upper bound on `adb start-server`.
const START_SERVER_TIMEOUT: Duration = Duration::from_secs(15);

/// Failure of one daemon call.
#[derive(Debug, Error)]
pub enum AdbError {
    #[error(transparent)]
    Adb(#[from] RustADBError),

    #[error("no answer from the adb daemon within {0:?}")]
    Timeout(Duration),

    #[error("adb daemon call did not complete: {0}")]
    Aborted(#[from] JoinError),
}

impl AdbError {
    /// True when the daemon could not be talked to at all, as opposed to
    /// answering with a refusal.
    fn is_connection_lost(&self) -> bool {
        matches!(
            self,
            AdbError::Adb(RustADBError::IOError(_)) | AdbError::Timeout(_)
        )
    }
}

/// Production transport: finds adb, makes sure its daemon runs, and hands out
/// a shared [`BridgeClient`].
pub struct AdbTransport {
    locator: Arc<BinaryLocator>,
    daemon_addr: SocketAddrV4,
    io_timeout: Duration,
    client: OnceCell<Arc<AdbClient>>,
}

impl AdbTransport {
    /// `io_timeout` bounds each individual daemon call.
    pub fn new(locator: BinaryLocator, daemon_addr: SocketAddrV4, io_timeout: Duration) -> Self {
        Self {
            locator: Arc::new(locator),
            daemon_addr,
            io_timeout,
            client: OnceCell::new(),
        }
    }

    /// The adb path.  The first search touches the file system, so it runs on
    /// the blocking pool.
    async fn adb_path(&self) -> Result<Option<PathBuf>, ControlError> {
        if self.locator.is_resolved() {
            return Ok(self.locator.locate().map(Path::to_path_buf));
        }
        let locator = Arc::clone(&self.locator);
        spawn_blocking(move || locator.locate().map(Path::to_path_buf))
            .await
            .map_err(|e| ControlError::TransportUnavailable(format!("adb lookup failed: {e}")))
    }
}

#[async_trait]
impl BridgeTransport for AdbTransport {
    async fn connect(&self) -> Result<Arc<dyn BridgeClient>, ControlError> {
        let Some(adb_path) = self.adb_path().await? else {
            return Err(ControlError::TransportUnavailable(ADB_NOT_FOUND.to_string()));
        };

        let client = self
            .client
            .get_or_try_init(|| async {
                let daemon = Daemon {
                    adb_path,
                    addr: self.daemon_addr,
                    io_timeout: self.io_timeout,
                };
                daemon.ensure_running().await?;
                Ok::<_, ControlError>(Arc::new(AdbClient { daemon }))
            })
            .await?;

        Ok(Arc::clone(client) as Arc<dyn BridgeClient>)
    }
}

/// How to reach (and if needed start) the adb daemon.
#[derive(Debug, Clone)]
struct Daemon {
    adb_path: PathBuf,
    addr: SocketAddrV4,
    io_timeout: Duration,
}

impl Daemon {
    /// Runs `call` against a fresh daemon session on the blocking pool.
    async fn call<T, F>(&self, call: F) -> Result<T, AdbError>
    where
        T: Send + 'static,
        F: FnOnce(&mut ADBServer) -> Result<T, RustADBError> + Send + 'static,
    {
        let addr = self.addr;
        let task = spawn_blocking(move || call(&mut ADBServer::new(addr)));
        match timeout(self.io_timeout, task).await {
            Ok(joined) => Ok(joined??),
            Err(_) => Err(AdbError::Timeout(self.io_timeout)),
        }
    }

    async fn handshake(&self) -> Result<(), AdbError> {
        self.call(|server| server.version().map(|_| ())).await
    }

    /// Verifies the daemon answers, starting it once if it does not.
    async fn ensure_running(&self) -> Result<(), ControlError> {
        match self.handshake().await {
            Ok(()) => {
                debug!("adb daemon at {} answered", self.addr);
                return Ok(());
            }
            Err(e) => debug!("adb daemon at {} not answering ({e}); starting it", self.addr),
        }

        start_server(&self.adb_path).await;

        self.handshake().await.map_err(|e| self.unavailable(e))?;
        info!("adb daemon at {} is up", self.addr);
        Ok(())
    }

    fn unavailable(&self, e: AdbError) -> ControlError {
        ControlError::TransportUnavailable(format!(
            "adb daemon at {} is not reachable: {e}",
            self.addr
        ))
    }
}

/// Best-effort `adb start-server`.  Failures are logged and otherwise
/// ignored; the caller's handshake decides whether the daemon is usable.
async fn start_server(adb_path: &Path) {
    let mut command = Command::new(adb_path);
    command
        .arg("start-server")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    match timeout(START_SERVER_TIMEOUT, command.status()).await {
        Ok(Ok(status)) => debug!("{} start-server exited with {status}", adb_path.display()),
        Ok(Err(e)) => debug!("could not run {} start-server: {e}", adb_path.display()),
        Err(_) => debug!(
            "{} start-server did not finish within {START_SERVER_TIMEOUT:?}",
            adb_path.display()
        ),
    }
}

/// The IPv4 socket the daemon should `adb connect` to.  Host names are
/// resolved; `None` if nothing IPv4 comes back.
async fn device_socket(address: &DeviceAddress) -> Option<SocketAddrV4> {
    if let Ok(ip) = address.host().parse::<Ipv4Addr>() {
        return Some(SocketAddrV4::new(ip, address.port()));
    }
    match tokio::net::lookup_host((address.host(), address.port())).await {
        Ok(mut addrs) => addrs.find_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(v4),
            SocketAddr::V6(_) => None,
        }),
        Err(e) => {
            warn!("could not resolve {}: {e}", address.host());
            None
        }
    }
}

/// A verified connection to the adb daemon.
struct AdbClient {
    daemon: Daemon,
}

impl AdbClient {
    /// Lists attached serials, restarting the daemon once if it stopped
    /// answering.
    async fn attached_serials(&self) -> Result<Vec<String>, ControlError> {
        let devices = match self.daemon.call(|server| server.devices()).await {
            Ok(devices) => devices,
            Err(e) if e.is_connection_lost() => {
                warn!("adb daemon stopped answering ({e}); restarting it");
                self.daemon.ensure_running().await?;
                self.daemon
                    .call(|server| server.devices())
                    .await
                    .map_err(|e| self.daemon.unavailable(e))?
            }
            Err(e) => {
                return Err(ControlError::TransportUnavailable(format!(
                    "adb daemon refused to list devices: {e}"
                )))
            }
        };

        Ok(devices
            .into_iter()
            .map(|device| {
                debug!("adb lists {} ({:?})", device.identifier, device.state);
                device.identifier
            })
            .collect())
    }

    fn handle_for(&self, serial: String) -> Arc<dyn DeviceHandle> {
        Arc::new(AdbDevice {
            daemon: self.daemon.clone(),
            serial,
        })
    }
}

#[async_trait]
impl BridgeClient for AdbClient {
    async fn device(&self, address: &DeviceAddress) -> Result<Arc<dyn DeviceHandle>, ControlError> {
        let serial = address.serial();

        if self.attached_serials().await?.contains(&serial) {
            return Ok(self.handle_for(serial));
        }

        info!("connecting adb to {serial}");
        let target = device_socket(address).await;
        match target {
            // "already connected" counts as success; the device list below
            // is authoritative either way.
            Some(target) => match self.daemon.call(move |server| server.connect_device(target)).await {
                Ok(()) => debug!("adb connect {target} accepted"),
                Err(e) => warn!("adb connect {target} failed: {e}"),
            },
            None => warn!("no IPv4 address for {serial}; not connecting"),
        }

        // A host name is listed under the address it resolved to.
        let resolved = target.map(|t| t.to_string());
        self.attached_serials()
            .await?
            .into_iter()
            .find(|listed| *listed == serial || Some(listed) == resolved.as_ref())
            .map(|listed| self.handle_for(listed))
            .ok_or(ControlError::DeviceUnavailable { serial })
    }
}

/// One device reachable through the daemon.
struct AdbDevice {
    daemon: Daemon,
    serial: String,
}

#[async_trait]
impl DeviceHandle for AdbDevice {
    async fn shell(&self, command: &str) -> Result<String, SendError> {
        let serial = self.serial.clone();
        let command = command.to_string();

        // A refusal here carries the device state, e.g. "device unauthorized".
        self.daemon
            .call(move |server| {
                let mut device = server.get_device_by_name(&serial)?;
                let mut output = Vec::new();
                device.shell_command(&[command.as_str()], &mut output)?;
                Ok(String::from_utf8_lossy(&output).into_owned())
            })
            .await
            .map_err(|e| SendError::new(e.to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
