//! JSON file persistence for the catalog.
//!
//! The catalog is a JSON array kept next to the server (`movies.json` by
//! default):
//!
//! ```json
//! [
//!   { "title": "Encanto", "id": "abc-123", "poster": "https://image.tmdb.org/t/p/w500/x.jpg" },
//!   { "title": "Something Unlisted", "id": "", "poster": "" }
//! ]
//! ```
//!
//! `id` and `poster` may be empty or absent.  Posters found at startup are
//! written back so they are not fetched again.

use std::path::{Path, PathBuf};

use couchcast_core::CatalogEntry;
use tracing::{debug, warn};

use crate::application::{CatalogError, CatalogStore, WatchlistItem};

/// [`CatalogStore`] backed by a JSON file.
#[derive(Debug, Clone)]
pub struct JsonCatalogStore {
    path: PathBuf,
}

impl JsonCatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the catalog, returning an empty list if the file does not exist.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Io`] for file-system errors other than "not found",
    /// [`CatalogError::Parse`] if the content is not a catalog array.
    pub fn try_load(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        read_json(&self.path)
    }
}

impl CatalogStore for JsonCatalogStore {
    fn load(&self) -> Vec<CatalogEntry> {
        match self.try_load() {
            Ok(entries) => {
                debug!("loaded {} catalog entries from {}", entries.len(), self.path.display());
                entries
            }
            Err(e) => {
                warn!("{e}; starting with an empty catalog");
                Vec::new()
            }
        }
    }

    fn save(&self, entries: &[CatalogEntry]) -> Result<(), CatalogError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| CatalogError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let content = serde_json::to_string_pretty(entries).map_err(CatalogError::Serialize)?;
        std::fs::write(&self.path, content).map_err(|source| CatalogError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Reads an exported watchlist (`[{"title": ..., "id": ...}]`).
///
/// Unlike the catalog, a missing watchlist file is an error.
pub fn load_watchlist(path: &Path) -> Result<Vec<WatchlistItem>, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json(path: &Path) -> Result<Vec<CatalogEntry>, CatalogError> {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(source) => Err(CatalogError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
