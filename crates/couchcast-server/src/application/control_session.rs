//! ControlSession: the cached device connection and the send/retry policy.
//!
//! # State machine
//!
//! ```text
//!            acquire ok
//! Disconnected ─────────► Connected(handle)
//!      ▲                        │
//!      └────────────────────────┘
//!        send fails / acquire fails
//! ```
//!
//! A cached handle is presumed valid until a send through it fails; the
//! device can reboot or drop off Wi-Fi without any local signal.  On a failed
//! send the session forces a fresh handle and resends once.  A second failure
//! is surfaced instead of retried again, so a persistently broken link is not
//! hidden behind a retry loop.
//!
//! # Locking
//!
//! One `tokio::sync::Mutex` covers "read or replace the handle, then send,
//! then optionally reconnect and resend".  Concurrent dispatches therefore
//! run one at a time and a forced reconnect can never be overwritten half-way
//! by another request.  Play requests are already rate-limited by the
//! throttle, so the coarse lock costs nothing in practice.
//!
//! # Testability
//!
//! The session depends only on the [`BridgeTransport`] trait.  Production
//! wires in `infrastructure::adb::AdbTransport`; tests use
//! [`super::mock_bridge::MockBridge`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use couchcast_core::{is_authorization_denied, ControlCommand, ControlError, DeviceAddress};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// A failed send through a device handle, carrying the transport's message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SendError {
    pub message: String,
}

impl SendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// An established logical connection to one device through the daemon.
#[async_trait]
pub trait DeviceHandle: Send + Sync {
    /// Runs `command` in the device's shell and returns its output.
    async fn shell(&self, command: &str) -> Result<String, SendError>;
}

/// A live control channel to the local debug-bridge daemon.
#[async_trait]
pub trait BridgeClient: Send + Sync {
    /// Returns a handle for the device at `address`, connecting the daemon to
    /// it first if it is not attached yet.
    ///
    /// # Errors
    ///
    /// [`ControlError::DeviceUnavailable`] if the device is still absent after
    /// the connect attempt.
    async fn device(&self, address: &DeviceAddress) -> Result<Arc<dyn DeviceHandle>, ControlError>;
}

/// Produces [`BridgeClient`]s.
#[async_trait]
pub trait BridgeTransport: Send + Sync {
    /// Returns a client for the local daemon, starting the daemon if needed.
    ///
    /// # Errors
    ///
    /// [`ControlError::TransportUnavailable`] if the adb executable is missing
    /// or the daemon cannot be reached.
    async fn connect(&self) -> Result<Arc<dyn BridgeClient>, ControlError>;
}

enum SessionState {
    Disconnected,
    Connected(Arc<dyn DeviceHandle>),
}

/// Owns the cached device handle for one [`DeviceAddress`].
pub struct ControlSession {
    transport: Arc<dyn BridgeTransport>,
    address: DeviceAddress,
    send_timeout: Duration,
    state: Mutex<SessionState>,
}

impl ControlSession {
    /// Creates a session in the `Disconnected` state.  No network activity
    /// happens until the first [`dispatch`](Self::dispatch).
    pub fn new(
        transport: Arc<dyn BridgeTransport>,
        address: DeviceAddress,
        send_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            address,
            send_timeout,
            state: Mutex::new(SessionState::Disconnected),
        }
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    /// Returns `true` while a handle is cached.
    pub async fn is_connected(&self) -> bool {
        matches!(*self.state.lock().await, SessionState::Connected(_))
    }

    /// Returns the cached handle, or obtains a new one.
    ///
    /// With `force_reconnect == false` and a cached handle this is the fast
    /// path: the transport is not touched.
    ///
    /// # Errors
    ///
    /// Propagates [`ControlError::TransportUnavailable`] or
    /// [`ControlError::DeviceUnavailable`]; the session is left
    /// `Disconnected`.
    pub async fn acquire(&self, force_reconnect: bool) -> Result<Arc<dyn DeviceHandle>, ControlError> {
        let mut state = self.state.lock().await;
        self.acquire_locked(&mut state, force_reconnect).await
    }

    /// Sends `command` to the device, reconnecting and resending once if the
    /// first send fails.
    ///
    /// Returns the shell output of the successful send.
    ///
    /// # Errors
    ///
    /// - Acquisition errors from the first [`acquire`](Self::acquire) are
    ///   returned as-is, without retry.
    /// - A send failure mentioning authorization is returned as
    ///   [`ControlError::Unauthorized`] and never retried.
    /// - Otherwise, if the reconnect or the resend fails, the *first* send
    ///   failure is returned as [`ControlError::CommandFailed`].
    pub async fn dispatch(&self, command: &ControlCommand) -> Result<String, ControlError> {
        let mut state = self.state.lock().await;

        let handle = self.acquire_locked(&mut state, false).await?;
        let first_failure = match self.send(handle.as_ref(), command).await {
            Ok(output) => return Ok(output),
            Err(e) => e,
        };

        // The handle is stale the moment a send through it fails.
        *state = SessionState::Disconnected;

        if is_authorization_denied(&first_failure.message) {
            warn!(
                "device {} refused the command: {first_failure}",
                self.address
            );
            return Err(ControlError::Unauthorized {
                detail: first_failure.message,
            });
        }

        warn!(
            "send to {} failed ({first_failure}); reconnecting and retrying once",
            self.address
        );

        let handle = match self.acquire_locked(&mut state, true).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!("reconnect to {} failed: {e}", self.address);
                return Err(ControlError::CommandFailed(first_failure.message));
            }
        };

        match self.send(handle.as_ref(), command).await {
            Ok(output) => {
                info!("retry to {} succeeded after reconnect", self.address);
                Ok(output)
            }
            Err(retry_failure) => {
                *state = SessionState::Disconnected;
                warn!("retry to {} failed: {retry_failure}", self.address);
                if is_authorization_denied(&retry_failure.message) {
                    Err(ControlError::Unauthorized {
                        detail: retry_failure.message,
                    })
                } else {
                    Err(ControlError::CommandFailed(first_failure.message))
                }
            }
        }
    }

    async fn acquire_locked(
        &self,
        state: &mut SessionState,
        force_reconnect: bool,
    ) -> Result<Arc<dyn DeviceHandle>, ControlError> {
        if !force_reconnect {
            if let SessionState::Connected(handle) = state {
                debug!("reusing cached handle for {}", self.address);
                return Ok(Arc::clone(handle));
            }
        }

        *state = SessionState::Disconnected;

        let client = self.transport.connect().await?;
        let handle = client.device(&self.address).await?;

        info!("connected to device {}", self.address);
        *state = SessionState::Connected(Arc::clone(&handle));
        Ok(handle)
    }

    /// One bounded send; a timeout counts as a send failure.
    async fn send(&self, handle: &dyn DeviceHandle, command: &ControlCommand) -> Result<String, SendError> {
        match timeout(self.send_timeout, handle.shell(command.as_str())).await {
            Ok(result) => result,
            Err(_) => Err(SendError::new(format!(
                "no response from {} within {:?}",
                self.address, self.send_timeout
            ))),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::mock_bridge::MockBridge;
    use couchcast_core::ContentId;

    fn address() -> DeviceAddress {
        DeviceAddress::new("192.168.1.50", 5555).unwrap()
    }

    fn session(bridge: &MockBridge) -> ControlSession {
        ControlSession::new(Arc::new(bridge.clone()), address(), Duration::from_secs(2))
    }

    fn command() -> ControlCommand {
        ControlCommand::launch(&ContentId::parse("abc-123_XYZ").unwrap())
    }

    #[tokio::test]
    async fn test_new_session_starts_disconnected() {
        let bridge = MockBridge::new();
        let session = session(&bridge);
        assert!(!session.is_connected().await);
        assert_eq!(bridge.connect_calls(), 0);
    }

    #[tokio::test]
    async fn test_acquire_caches_handle_and_skips_transport_on_fast_path() {
        // Arrange
        let bridge = MockBridge::new();
        let session = session(&bridge);

        // Act
        session.acquire(false).await.unwrap();
        session.acquire(false).await.unwrap();

        // Assert: only the first acquire touched the transport
        assert_eq!(bridge.connect_calls(), 1);
        assert_eq!(bridge.device_calls(), 1);
        assert!(session.is_connected().await);
    }

    #[tokio::test]
    async fn test_forced_acquire_reconnects() {
        let bridge = MockBridge::new();
        let session = session(&bridge);

        session.acquire(false).await.unwrap();
        session.acquire(true).await.unwrap();

        assert_eq!(bridge.connect_calls(), 2);
        assert_eq!(bridge.device_calls(), 2);
    }

    #[tokio::test]
    async fn test_acquire_failure_leaves_session_disconnected() {
        // Arrange: connected once, then the forced reconnect fails
        let bridge = MockBridge::new();
        let session = session(&bridge);
        session.acquire(false).await.unwrap();
        bridge.fail_next_device(ControlError::DeviceUnavailable {
            serial: "192.168.1.50:5555".into(),
        });

        // Act
        let result = session.acquire(true).await;

        // Assert
        assert!(matches!(result, Err(ControlError::DeviceUnavailable { .. })));
        assert!(!session.is_connected().await);
    }

    #[tokio::test]
    async fn test_dispatch_sends_command_text() {
        let bridge = MockBridge::new();
        let session = session(&bridge);

        session.dispatch(&command()).await.unwrap();

        assert_eq!(bridge.sent_commands(), vec![command().as_str().to_string()]);
    }

    #[tokio::test]
    async fn test_second_dispatch_reuses_handle() {
        let bridge = MockBridge::new();
        let session = session(&bridge);

        session.dispatch(&command()).await.unwrap();
        session.dispatch(&command()).await.unwrap();

        assert_eq!(bridge.connect_calls(), 1);
        assert_eq!(bridge.send_calls(), 2);
    }

    #[tokio::test]
    async fn test_transport_unavailable_is_not_retried() {
        // Arrange
        let bridge = MockBridge::new();
        bridge.fail_next_connect(ControlError::TransportUnavailable("adb not found".into()));
        let session = session(&bridge);

        // Act
        let result = session.dispatch(&command()).await;

        // Assert
        assert_eq!(
            result,
            Err(ControlError::TransportUnavailable("adb not found".into()))
        );
        assert_eq!(bridge.connect_calls(), 1);
        assert_eq!(bridge.send_calls(), 0);
    }

    #[tokio::test]
    async fn test_device_unavailable_is_not_retried() {
        let bridge = MockBridge::new();
        bridge.fail_next_device(ControlError::DeviceUnavailable {
            serial: "192.168.1.50:5555".into(),
        });
        let session = session(&bridge);

        let result = session.dispatch(&command()).await;

        assert!(matches!(result, Err(ControlError::DeviceUnavailable { .. })));
        assert_eq!(bridge.device_calls(), 1);
        assert_eq!(bridge.send_calls(), 0);
    }

    #[tokio::test]
    async fn test_send_failure_then_success_after_reconnect_reports_success() {
        // Arrange: cached handle goes stale
        let bridge = MockBridge::new();
        let session = session(&bridge);
        session.acquire(false).await.unwrap();
        bridge.fail_next_send("closed");

        // Act
        let result = session.dispatch(&command()).await;

        // Assert
        assert!(result.is_ok());
        assert_eq!(bridge.send_calls(), 2);
        assert_eq!(bridge.connect_calls(), 2, "retry must use a fresh handle");
        assert!(session.is_connected().await);
    }

    #[tokio::test]
    async fn test_send_failing_twice_reports_first_failure_once() {
        // Arrange
        let bridge = MockBridge::new();
        let session = session(&bridge);
        bridge.fail_next_send("closed");
        bridge.fail_next_send("connection reset");

        // Act
        let result = session.dispatch(&command()).await;

        // Assert: exactly one retry, original message surfaced
        assert_eq!(result, Err(ControlError::CommandFailed("closed".into())));
        assert_eq!(bridge.send_calls(), 2);
        assert!(!session.is_connected().await);
    }

    #[tokio::test]
    async fn test_reconnect_failure_surfaces_original_send_failure() {
        // Arrange
        let bridge = MockBridge::new();
        let session = session(&bridge);
        session.acquire(false).await.unwrap();
        bridge.fail_next_send("device offline");
        bridge.fail_next_connect(ControlError::TransportUnavailable("daemon gone".into()));

        // Act
        let result = session.dispatch(&command()).await;

        // Assert
        assert_eq!(
            result,
            Err(ControlError::CommandFailed("device offline".into()))
        );
        assert_eq!(bridge.send_calls(), 1);
        assert!(!session.is_connected().await);
    }

    #[tokio::test]
    async fn test_unauthorized_send_is_never_retried() {
        // Arrange
        let bridge = MockBridge::new();
        let session = session(&bridge);
        bridge.fail_next_send("device unauthorized.\nThis adb server's $ADB_VENDOR_KEYS is not set");

        // Act
        let result = session.dispatch(&command()).await;

        // Assert
        assert!(matches!(result, Err(ControlError::Unauthorized { .. })));
        assert_eq!(bridge.send_calls(), 1);
        assert_eq!(bridge.connect_calls(), 1);
        assert!(!session.is_connected().await);
    }

    #[tokio::test]
    async fn test_unauthorized_on_retry_is_classified_unauthorized() {
        let bridge = MockBridge::new();
        let session = session(&bridge);
        bridge.fail_next_send("closed");
        bridge.fail_next_send("device unauthorized");

        let result = session.dispatch(&command()).await;

        assert_eq!(
            result,
            Err(ControlError::Unauthorized {
                detail: "device unauthorized".into()
            })
        );
        assert_eq!(bridge.send_calls(), 2);
    }

    #[tokio::test]
    async fn test_hung_send_resolves_to_command_failed() {
        // Arrange: every send takes far longer than the timeout
        let bridge = MockBridge::new();
        bridge.delay_sends(Duration::from_secs(30));
        let session = ControlSession::new(
            Arc::new(bridge.clone()),
            address(),
            Duration::from_millis(20),
        );

        // Act
        let result = session.dispatch(&command()).await;

        // Assert
        match result {
            Err(ControlError::CommandFailed(msg)) => assert!(msg.contains("no response")),
            other => panic!("expected CommandFailed, got {other:?}"),
        }
        assert_eq!(bridge.send_calls(), 2);
    }

    #[tokio::test]
    async fn test_session_recovers_after_failure() {
        // Arrange: a dispatch that fails completely
        let bridge = MockBridge::new();
        let session = session(&bridge);
        bridge.fail_next_send("closed");
        bridge.fail_next_send("closed");
        assert!(session.dispatch(&command()).await.is_err());

        // Act: the next dispatch starts from Disconnected and succeeds
        let result = session.dispatch(&command()).await;

        // Assert
        assert!(result.is_ok());
        assert!(session.is_connected().await);
    }

    #[tokio::test]
    async fn test_concurrent_dispatches_share_one_connection() {
        // Arrange
        let bridge = MockBridge::new();
        let session = Arc::new(session(&bridge));

        // Act
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let session = Arc::clone(&session);
                tokio::spawn(async move { session.dispatch(&command()).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        // Assert: the lock serialised acquisition, so only one connect happened
        assert_eq!(bridge.connect_calls(), 1);
        assert_eq!(bridge.send_calls(), 8);
    }
}
