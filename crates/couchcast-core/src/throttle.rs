//! Minimum-interval gate for play requests.
//!
//! Clicking a poster twice in quick succession would send two launch
//! commands to the device; the second one restarts playback.  The gate
//! accepts at most one request per `min_interval`.
//!
//! # Clock
//!
//! Callers pass `now` as a [`std::time::Instant`], which is monotonic, so a
//! wall-clock adjustment can neither lock the gate nor let a burst through.
//! Taking `now` as a parameter also lets tests drive the gate with exact
//! offsets instead of sleeping.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

/// Outcome of [`ThrottleGate::try_accept`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The request may proceed.
    Accepted,
    /// The request arrived too soon; the caller should wait `retry_after`.
    Throttled { retry_after: Duration },
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted)
    }
}

/// Remembers when the last request was accepted.
///
/// The check-and-set in [`try_accept`](Self::try_accept) runs under one
/// mutex, so two callers racing with timestamps closer than the interval can
/// never both be accepted.  The lock is never held across an `.await`.
#[derive(Debug, Default)]
pub struct ThrottleGate {
    last_accepted: Mutex<Option<Instant>>,
}

impl ThrottleGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts iff at least `min_interval` has elapsed since the last
    /// accepted request (or none has been accepted yet).
    ///
    /// A zero `min_interval` disables the gate: every call is accepted and the
    /// stored timestamp is left untouched.  Rejections never update state.
    pub fn try_accept(&self, now: Instant, min_interval: Duration) -> Admission {
        if min_interval.is_zero() {
            return Admission::Accepted;
        }

        // A poisoned lock only means another thread panicked mid-check; the
        // stored `Option<Instant>` is still a valid value.
        let mut last = self
            .last_accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(previous) = *last {
            // `saturating_duration_since` yields zero for an out-of-order
            // `now`, which keeps the stored instant non-decreasing.
            let elapsed = now.saturating_duration_since(previous);
            if elapsed < min_interval {
                let retry_after = min_interval - elapsed;
                debug!("play request throttled; retry in {retry_after:?}");
                return Admission::Throttled { retry_after };
            }
        }

        *last = Some(now);
        Admission::Accepted
    }

    /// Returns the instant of the most recent accepted request, if any.
    pub fn last_accepted(&self) -> Option<Instant> {
        *self
            .last_accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
