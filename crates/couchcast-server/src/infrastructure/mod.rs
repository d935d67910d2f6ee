//! Infrastructure layer for couchcast-server.
//!
//! Concrete implementations of the application-layer traits, plus the HTTP
//! server.  Everything that touches the network, the file system, or child
//! processes lives here.
//!
//! # Sub-modules
//!
//! - **`adb`** – `BridgeTransport` over the local adb daemon, and the adb
//!   executable locator.
//! - **`catalog_store`** – `CatalogStore` over the `movies.json` file;
//!   watchlist export reader.
//! - **`tmdb`** – `PosterLookup` over the TMDB search API.
//! - **`http_server`** – axum router and server loop.

pub mod adb;
pub mod catalog_store;
pub mod http_server;
pub mod tmdb;

pub use adb::{AdbTransport, BinaryLocator};
pub use catalog_store::{load_watchlist, JsonCatalogStore};
pub use http_server::{router, run_server, HttpState};
pub use tmdb::TmdbPosterLookup;
