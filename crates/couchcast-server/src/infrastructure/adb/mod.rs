//! Android debug bridge adapter.
//!
//! - **`locator`** – finds the `adb` executable.
//! - **`transport`** – `BridgeTransport` implementation over the local adb
//!   daemon, spoken through the `adb_client` crate.

pub mod locator;
pub mod transport;

pub use locator::BinaryLocator;
pub use transport::{AdbError, AdbTransport, ADB_NOT_FOUND, DEFAULT_DAEMON_PORT};
