//! Library use case: load the catalog and fill in missing posters.
//!
//! Runs once at startup.  Entries without a poster are looked up; found
//! posters are written back to the catalog so the next start does not ask
//! again.  Titles whose lookup finds nothing keep an empty poster and are
//! retried on the next start.

use std::path::PathBuf;

use async_trait::async_trait;
use couchcast_core::CatalogEntry;
use thiserror::Error;
use tracing::{info, warn};

/// Error type for catalog file operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing catalog at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file content is not the expected JSON shape.
    #[error("failed to parse catalog JSON at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The entries could not be serialized.
    #[error("failed to serialize catalog: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Persistent storage for the catalog.
#[cfg_attr(test, mockall::automock)]
pub trait CatalogStore: Send + Sync {
    /// Returns the stored entries in order.  A missing or unreadable catalog
    /// yields an empty list.
    fn load(&self) -> Vec<CatalogEntry>;

    /// Replaces the stored entries.
    fn save(&self, entries: &[CatalogEntry]) -> Result<(), CatalogError>;
}

/// Resolves a title to a poster image URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PosterLookup: Send + Sync {
    /// Returns the poster URL for `title`, or `None` if nothing was found or
    /// the lookup failed.
    async fn find_poster(&self, title: &str) -> Option<String>;
}

/// Loads the catalog and fills in missing posters, saving once if any were
/// found.  Returns the entries in catalog order.
pub async fn build_library(store: &dyn CatalogStore, lookup: &dyn PosterLookup) -> Vec<CatalogEntry> {
    let mut entries = store.load();
    let mut updated = false;

    for entry in entries.iter_mut().filter(|e| e.poster.is_empty() && !e.title.is_empty()) {
        info!("fetching poster for {:?}", entry.title);
        if let Some(url) = lookup.find_poster(&entry.title).await {
            entry.poster = url;
            updated = true;
        }
    }

    if updated {
        info!("updating catalog with new posters");
        if let Err(e) = store.save(&entries) {
            warn!("could not cache posters: {e}");
        }
    }

    entries
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, id: &str, poster: &str) -> CatalogEntry {
        CatalogEntry {
            title: title.to_string(),
            id: id.to_string(),
            poster: poster.to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_posters_are_fetched_and_saved() {
        // Arrange
        let mut store = MockCatalogStore::new();
        store
            .expect_load()
            .returning(|| vec![entry("Encanto", "abc", ""), entry("Moana", "def", "cached")]);
        store
            .expect_save()
            .withf(|entries: &[CatalogEntry]| entries[0].poster == "https://img/encanto.jpg")
            .times(1)
            .returning(|_| Ok(()));

        let mut lookup = MockPosterLookup::new();
        lookup
            .expect_find_poster()
            .withf(|title: &str| title == "Encanto")
            .times(1)
            .returning(|_| Some("https://img/encanto.jpg".to_string()));

        // Act
        let library = build_library(&store, &lookup).await;

        // Assert
        assert_eq!(library[0].poster, "https://img/encanto.jpg");
        assert_eq!(library[1].poster, "cached");
    }

    #[tokio::test]
    async fn test_nothing_saved_when_no_poster_found() {
        let mut store = MockCatalogStore::new();
        store.expect_load().returning(|| vec![entry("Unknown", "", "")]);
        store.expect_save().times(0);

        let mut lookup = MockPosterLookup::new();
        lookup.expect_find_poster().times(1).returning(|_| None);

        let library = build_library(&store, &lookup).await;

        assert_eq!(library, vec![entry("Unknown", "", "")]);
    }

    #[tokio::test]
    async fn test_cached_posters_are_not_looked_up() {
        let mut store = MockCatalogStore::new();
        store.expect_load().returning(|| vec![entry("Moana", "def", "cached")]);
        store.expect_save().times(0);

        let mut lookup = MockPosterLookup::new();
        lookup.expect_find_poster().times(0);

        let library = build_library(&store, &lookup).await;

        assert_eq!(library.len(), 1);
    }

    #[tokio::test]
    async fn test_save_failure_still_returns_library() {
        let mut store = MockCatalogStore::new();
        store.expect_load().returning(|| vec![entry("Encanto", "abc", "")]);
        store.expect_save().times(1).returning(|_| {
            Err(CatalogError::Io {
                path: PathBuf::from("movies.json"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        });

        let mut lookup = MockPosterLookup::new();
        lookup
            .expect_find_poster()
            .returning(|_| Some("https://img/encanto.jpg".to_string()));

        let library = build_library(&store, &lookup).await;

        assert_eq!(library[0].poster, "https://img/encanto.jpg");
    }
}
