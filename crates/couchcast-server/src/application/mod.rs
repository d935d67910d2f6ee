//! Application layer use cases for couchcast-server.
//!
//! Use cases in this layer orchestrate domain types and depend on traits
//! (`BridgeTransport`, `CatalogStore`, `PosterLookup`) rather than on sockets,
//! processes, or files.  Infrastructure implementations are injected at
//! construction time, which keeps every use case unit-testable.
//!
//! # Sub-modules
//!
//! - **`control_session`** – Caches the device handle, sends commands, and
//!   applies the reconnect-and-retry-once policy.
//! - **`play_service`** – Validation, throttling, and dispatch for one play
//!   request, mapped onto the browser reply.
//! - **`library`** – Loads the catalog and fills in missing posters.
//! - **`watchlist`** – Merges an exported watchlist into the catalog.
//! - **`mock_bridge`** – In-memory `BridgeTransport` for tests.

pub mod control_session;
pub mod library;
pub mod mock_bridge;
pub mod play_service;
pub mod watchlist;

pub use control_session::{BridgeClient, BridgeTransport, ControlSession, DeviceHandle, SendError};
pub use library::{build_library, CatalogError, CatalogStore, PosterLookup};
pub use play_service::PlayService;
pub use watchlist::{merge_watchlist, MergeReport, WatchlistItem};
