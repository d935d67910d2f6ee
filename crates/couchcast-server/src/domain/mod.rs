//! Domain layer for couchcast-server.
//!
//! Holds the plain configuration struct.  Reading flags and environment
//! variables happens in `main.rs`; everything below receives an already
//! validated [`ServerConfig`].

pub mod config;

pub use config::ServerConfig;
