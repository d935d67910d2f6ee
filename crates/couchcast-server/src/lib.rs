//! couchcast-server library crate.
//!
//! Serves a poster grid of the catalog and, when a poster is clicked, tells
//! the streaming device to open that title through the Android debug bridge.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Browser (HTML grid, GET /play/{id})
//!         ↕
//! [couchcast-server]
//!   ├── domain/           ServerConfig
//!   ├── application/      ControlSession, PlayService, library + watchlist use cases
//!   └── infrastructure/
//!         ├── adb/          binary locator + daemon client (adb_client)
//!         ├── catalog_store JSON catalog file
//!         ├── tmdb          poster lookup
//!         └── http_server   axum router
//!         ↕
//! adb daemon (127.0.0.1:5037) ── TCP ──► device (host:5555)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain`, `couchcast-core`, and the traits it
//!   declares itself (`BridgeTransport`, `PosterLookup`, `CatalogStore`).
//! - `infrastructure` implements those traits with sockets, processes, files
//!   and HTTP.

/// Domain layer: configuration types (no I/O).
pub mod domain;

/// Application layer: device control session and play/library use cases.
pub mod application;

/// Infrastructure layer: adb adapter, catalog file, TMDB, and HTTP server.
pub mod infrastructure;
