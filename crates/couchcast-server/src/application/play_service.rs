//! PlayService: the `GET /play/{id}` use case.
//!
//! ```text
//! raw id ──► ContentId::parse ──► ThrottleGate ──► ControlCommand::launch ──► ControlSession::dispatch
//!              │ 400                 │ 429                                      │ 403 / 500
//! ```
//!
//! Validation runs first, so a malformed id is rejected without consuming
//! the throttle window or touching the network.

use std::time::{Duration, Instant};

use couchcast_core::{Admission, ContentId, ControlCommand, PlayError, PlayReply, ThrottleGate};
use tracing::{info, warn};

use super::control_session::ControlSession;

/// Owns the per-service state of the play path: the device session and the
/// throttle.  Shared between request handlers behind an `Arc`.
pub struct PlayService {
    session: ControlSession,
    throttle: ThrottleGate,
    cooldown: Duration,
}

impl PlayService {
    /// `cooldown` of zero disables throttling.
    pub fn new(session: ControlSession, cooldown: Duration) -> Self {
        Self {
            session,
            throttle: ThrottleGate::new(),
            cooldown,
        }
    }

    pub fn session(&self) -> &ControlSession {
        &self.session
    }

    /// Handles a play request arriving now.
    pub async fn play(&self, raw_id: &str) -> PlayReply {
        self.play_at(raw_id, Instant::now()).await
    }

    /// Handles a play request that arrived at `now` (monotonic).
    pub async fn play_at(&self, raw_id: &str, now: Instant) -> PlayReply {
        let outcome = self.try_play(raw_id, now).await;
        if let Err(e) = &outcome {
            warn!("play request for {raw_id:?} failed: {e}");
        }
        PlayReply::from_outcome(&outcome)
    }

    async fn try_play(&self, raw_id: &str, now: Instant) -> Result<ContentId, PlayError> {
        let id = ContentId::parse(raw_id)?;

        if let Admission::Throttled { retry_after } = self.throttle.try_accept(now, self.cooldown) {
            return Err(PlayError::Throttled { retry_after });
        }

        let command = ControlCommand::launch(&id);
        info!("launching {id} on {}", self.session.address());
        self.session.dispatch(&command).await?;
        Ok(id)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use couchcast_core::{ControlError, DeviceAddress, PlayStatus};

    use crate::application::mock_bridge::MockBridge;

    fn service(bridge: &MockBridge, cooldown: Duration) -> PlayService {
        let session = ControlSession::new(
            Arc::new(bridge.clone()),
            DeviceAddress::new("192.168.1.50", 5555).unwrap(),
            Duration::from_secs(2),
        );
        PlayService::new(session, cooldown)
    }

    #[tokio::test]
    async fn test_valid_request_dispatches_launch_command() {
        // Arrange
        let bridge = MockBridge::new();
        let svc = service(&bridge, Duration::from_secs(2));

        // Act
        let reply = svc.play("abc-123_XYZ").await;

        // Assert
        assert_eq!(reply.code, 200);
        assert_eq!(reply.body.status, PlayStatus::Success);
        let expected = ControlCommand::launch(&ContentId::parse("abc-123_XYZ").unwrap());
        assert_eq!(bridge.sent_commands(), vec![expected.as_str().to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_id_touches_neither_throttle_nor_device() {
        let bridge = MockBridge::new();
        let svc = service(&bridge, Duration::from_secs(2));
        let t0 = Instant::now();

        let reply = svc.play_at("bad id!", t0).await;

        assert_eq!(reply.code, 400);
        assert_eq!(reply.body.message, "Invalid video ID");
        assert_eq!(bridge.connect_calls(), 0);
        // The window is still open for a valid request at the same instant.
        assert_eq!(svc.play_at("abc", t0).await.code, 200);
    }

    #[tokio::test]
    async fn test_throttled_request_is_not_dispatched() {
        let bridge = MockBridge::new();
        let svc = service(&bridge, Duration::from_secs(2));
        let t0 = Instant::now();

        svc.play_at("abc", t0).await;
        let reply = svc.play_at("abc", t0 + Duration::from_secs(1)).await;

        assert_eq!(reply.code, 429);
        assert!(reply.body.message.contains("1 more second"));
        assert_eq!(bridge.send_calls(), 1);
    }

    #[tokio::test]
    async fn test_zero_cooldown_never_throttles() {
        let bridge = MockBridge::new();
        let svc = service(&bridge, Duration::ZERO);
        let t0 = Instant::now();

        for _ in 0..3 {
            assert_eq!(svc.play_at("abc", t0).await.code, 200);
        }
        assert_eq!(bridge.send_calls(), 3);
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_403_with_guidance() {
        let bridge = MockBridge::new();
        bridge.fail_next_send("device unauthorized");
        let svc = service(&bridge, Duration::ZERO);

        let reply = svc.play("abc").await;

        assert_eq!(reply.code, 403);
        assert!(reply.body.message.contains("Allow USB debugging"));
    }

    #[tokio::test]
    async fn test_missing_binary_maps_to_500_with_error_text() {
        let bridge = MockBridge::new();
        bridge.fail_next_connect(ControlError::TransportUnavailable(
            "ADB not found. Install Android Platform Tools".into(),
        ));
        let svc = service(&bridge, Duration::ZERO);

        let reply = svc.play("abc").await;

        assert_eq!(reply.code, 500);
        assert_eq!(reply.body.status, PlayStatus::Error);
        assert!(reply.body.message.starts_with("ADB not found"));
    }

    #[tokio::test]
    async fn test_failed_dispatch_still_consumes_throttle_window() {
        // Acceptance is recorded before dispatch; a failing device does not
        // reopen the window.
        let bridge = MockBridge::new();
        bridge.fail_next_connect(ControlError::TransportUnavailable("gone".into()));
        let svc = service(&bridge, Duration::from_secs(2));
        let t0 = Instant::now();

        assert_eq!(svc.play_at("abc", t0).await.code, 500);
        assert_eq!(svc.play_at("abc", t0 + Duration::from_secs(1)).await.code, 429);
    }
}
