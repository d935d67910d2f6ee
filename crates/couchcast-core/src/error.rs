//! Error taxonomy of the play path and its mapping to browser replies.
//!
//! ```text
//! PlayError
//!  ├─ Validation      400  malformed id, rejected before any network activity
//!  ├─ Throttled       429  too soon after the previous play; wait and retry
//!  └─ Control
//!       ├─ TransportUnavailable  500  adb binary or daemon missing
//!       ├─ DeviceUnavailable     500  daemon up, device unreachable
//!       ├─ Unauthorized          403  device has not trusted this computer
//!       └─ CommandFailed         500  send failed (after one reconnect + retry)
//! ```
//!
//! None of these are fatal to the process; the next request is served
//! normally.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::content_id::{ContentId, ValidationError};

/// Remediation steps shown when the device rejects this computer.
pub const UNAUTHORIZED_GUIDANCE: &str = "Fire TV has not authorized this computer for ADB. \
    On your Fire TV screen, look for an 'Allow USB debugging?' (or similar) prompt and select Allow. \
    If you don't see it, run 'adb kill-server' in a terminal, then try again.";

/// Returns `true` when a transport error message says the device refused
/// this computer's debug key.
///
/// The debug bridge reports this only as text (`device unauthorized. ...`),
/// so the check is a case-insensitive substring match.  Keep it here and only
/// here: if a future daemon changes its wording, this is the one place to
/// update.
pub fn is_authorization_denied(message: &str) -> bool {
    message.to_ascii_lowercase().contains("unauthorized")
}

/// Failures of the device control session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// The adb executable could not be found, or its daemon could not be
    /// reached even after a start attempt.
    #[error("{0}")]
    TransportUnavailable(String),

    /// The daemon is running but the device at `serial` is not attached,
    /// even after an explicit connect.
    #[error("could not connect to device at {serial}")]
    DeviceUnavailable { serial: String },

    /// The device has not accepted this computer's debug key.
    #[error("device rejected the command: {detail}")]
    Unauthorized { detail: String },

    /// Sending the command failed and the single reconnect + retry did not
    /// help.
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// Failures of a play request, in the order they are checked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayError {
    #[error("invalid video id: {0}")]
    Validation(#[from] ValidationError),

    #[error("play requests are throttled; retry in {retry_after:?}")]
    Throttled { retry_after: Duration },

    #[error(transparent)]
    Control(#[from] ControlError),
}

impl PlayError {
    /// HTTP status code the front end answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            PlayError::Validation(_) => 400,
            PlayError::Throttled { .. } => 429,
            PlayError::Control(ControlError::Unauthorized { .. }) => 403,
            PlayError::Control(_) => 500,
        }
    }

    /// Human-readable message for the browser.
    pub fn user_message(&self) -> String {
        match self {
            PlayError::Validation(_) => "Invalid video ID".to_string(),
            PlayError::Throttled { retry_after } => {
                let secs = whole_seconds_rounded_up(*retry_after);
                let unit = if secs == 1 { "second" } else { "seconds" };
                format!("Please wait {secs} more {unit} before playing again.")
            }
            PlayError::Control(ControlError::Unauthorized { .. }) => {
                UNAUTHORIZED_GUIDANCE.to_string()
            }
            PlayError::Control(other) => other.to_string(),
        }
    }
}

/// Rounds up to whole seconds, never reporting less than one.
fn whole_seconds_rounded_up(d: Duration) -> u64 {
    let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
    secs.max(1)
}

// ── Browser reply ─────────────────────────────────────────────────────────────

/// `"success"` or `"error"` in the JSON reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayStatus {
    Success,
    Error,
}

/// JSON body returned by the play endpoint: `{"status": ..., "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayResponse {
    pub status: PlayStatus,
    pub message: String,
}

/// A [`PlayResponse`] together with its HTTP status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayReply {
    pub code: u16,
    pub body: PlayResponse,
}

impl PlayReply {
    /// Maps the outcome of a play request onto the reply the browser sees.
    pub fn from_outcome(outcome: &Result<ContentId, PlayError>) -> Self {
        match outcome {
            Ok(id) => Self {
                code: 200,
                body: PlayResponse {
                    status: PlayStatus::Success,
                    message: format!("Playing video {id}"),
                },
            },
            Err(e) => Self {
                code: e.status_code(),
                body: PlayResponse {
                    status: PlayStatus::Error,
                    message: e.user_message(),
                },
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
