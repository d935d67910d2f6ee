//! Integration tests for the pure play rules: validation first, then the
//! throttle, then the reply mapping.
//!
//! These tests use only the public API of `couchcast-core` the same way the
//! server's play service does, without any device or network involved.

use std::time::{Duration, Instant};

use couchcast_core::{
    Admission, ContentId, ControlCommand, PlayError, PlayReply, PlayStatus, ThrottleGate,
};

/// Mirrors the order the play service applies: an invalid id is answered
/// before the throttle is consulted.
fn admit(gate: &ThrottleGate, raw: &str, now: Instant) -> Result<ContentId, PlayError> {
    let id = ContentId::parse(raw)?;
    match gate.try_accept(now, Duration::from_secs(2)) {
        Admission::Accepted => Ok(id),
        Admission::Throttled { retry_after } => Err(PlayError::Throttled { retry_after }),
    }
}

#[test]
fn test_scenario_accept_throttle_then_reject_invalid_id() {
    // Arrange
    let gate = ThrottleGate::new();
    let t0 = Instant::now();

    // Act
    let first = PlayReply::from_outcome(&admit(&gate, "abc-123_XYZ", t0));
    let second = PlayReply::from_outcome(&admit(&gate, "abc-123_XYZ", t0 + Duration::from_secs(1)));
    let third = PlayReply::from_outcome(&admit(&gate, "bad id!", t0 + Duration::from_secs(5)));

    // Assert
    assert_eq!(first.code, 200);
    assert_eq!(first.body.status, PlayStatus::Success);

    assert_eq!(second.code, 429);
    assert!(second.body.message.contains("1 more second"), "{}", second.body.message);

    assert_eq!(third.code, 400);
    // The invalid request must not have consumed the throttle window.
    assert_eq!(gate.last_accepted(), Some(t0));
}

#[test]
fn test_invalid_ids_never_reach_the_command_builder() {
    for raw in ["", "bad id!", "x;reboot", "a\"b"] {
        // `ControlCommand::launch` only accepts a `ContentId`, so the only
        // path to a command is through a successful parse.
        let parsed = ContentId::parse(raw);
        assert!(parsed.is_err(), "{raw:?} must be rejected");
        assert!(parsed.ok().map(|id| ControlCommand::launch(&id)).is_none());
    }
}

#[test]
fn test_two_seconds_apart_are_both_accepted() {
    let gate = ThrottleGate::new();
    let t0 = Instant::now();
    assert!(admit(&gate, "abc", t0).is_ok());
    assert!(admit(&gate, "abc", t0 + Duration::from_secs(2)).is_ok());
}
