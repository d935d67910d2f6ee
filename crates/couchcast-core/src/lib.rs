//! # couchcast-core
//!
//! Shared library for couchcast containing the domain types that the server
//! builds on: validated content identifiers, the launch command builder, the
//! target device address, the play throttle, and the error taxonomy used to
//! answer play requests.
//!
//! It has zero dependencies on sockets, processes, or HTTP frameworks.
//!
//! # Architecture overview (for beginners)
//!
//! couchcast shows a grid of movie posters in a browser.  Clicking a poster
//! asks a streaming device on the local network (reached through the Android
//! debug bridge) to open that movie via a deep link.
//!
//! This crate (`couchcast-core`) is the pure foundation:
//!
//! - **`domain`** – Value types.  A [`ContentId`] can only be constructed
//!   from a string that passed validation, and a [`ControlCommand`] can only
//!   be built from a [`ContentId`], so an unvalidated string never reaches the
//!   device's shell.
//!
//! - **`throttle`** – The [`ThrottleGate`], a minimum-interval rate limiter
//!   driven by a monotonic clock.
//!
//! - **`error`** – The typed failures of the control path and their mapping
//!   onto the JSON reply and HTTP status code the browser receives.

pub mod domain;
pub mod error;
pub mod throttle;

// Re-export the most-used types at the crate root so callers can write
// `couchcast_core::ContentId` instead of `couchcast_core::domain::content_id::ContentId`.
pub use domain::catalog::CatalogEntry;
pub use domain::command::ControlCommand;
pub use domain::content_id::{ContentId, ValidationError};
pub use domain::device::{AddressError, DeviceAddress};
pub use error::{is_authorization_denied, ControlError, PlayError, PlayReply, PlayResponse, PlayStatus};
pub use throttle::{Admission, ThrottleGate};
