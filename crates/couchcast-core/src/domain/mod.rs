//! Domain layer for couchcast.
//!
//! The domain layer contains pure value types with no dependencies on I/O,
//! networking, or external frameworks.
//!
//! # What belongs in the domain layer?
//!
//! - The validated content identifier and the command rendered from it
//! - The target device address
//! - The catalog entry shape shared by the store and the web page
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `TcpStream`, or process types
//! - File I/O or environment variable reading

pub mod catalog;
pub mod command;
pub mod content_id;
pub mod device;

pub use catalog::CatalogEntry;
pub use command::ControlCommand;
pub use content_id::{ContentId, ValidationError};
pub use device::{AddressError, DeviceAddress};
