//! Validated streaming-service content identifiers.
//!
//! Content ids arrive from the browser as part of the request path and end
//! up interpolated into a shell command on the device.  The only way to
//! obtain a [`ContentId`] is [`ContentId::parse`], which rejects anything
//! outside `[A-Za-z0-9_-]`, so shell metacharacters, quotes, and whitespace
//! can never reach the command builder.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Accepted identifier shape: one or more ASCII letters, digits, `_` or `-`.
static CONTENT_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // The pattern is a compile-time constant, so it always compiles.
    Regex::new(r"^[A-Za-z0-9_-]+$").unwrap()
});

/// Error returned when a string is not a usable content identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The identifier was the empty string.
    #[error("content id is empty")]
    Empty,

    /// The identifier contained a character outside `[A-Za-z0-9_-]`.
    #[error("content id contains characters outside [A-Za-z0-9_-]")]
    InvalidCharacters,
}

/// Returns `true` iff `identifier` matches `^[A-Za-z0-9_-]+$`.
///
/// The empty string is rejected.
pub fn validate(identifier: &str) -> bool {
    CONTENT_ID_PATTERN.is_match(identifier)
}

/// A content identifier that has passed [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentId(String);

impl ContentId {
    /// Validates `raw` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Empty`] for `""` and
    /// [`ValidationError::InvalidCharacters`] for anything else that does not
    /// match the accepted pattern.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.is_empty() {
            return Err(ValidationError::Empty);
        }
        if !validate(raw) {
            return Err(ValidationError::InvalidCharacters);
        }
        Ok(Self(raw.to_string()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
