//! Watchlist import: merge titles exported from the streaming site into the
//! catalog.
//!
//! The export is a JSON array of `{"title": ..., "id": ...}` objects saved
//! from the watchlist page in the browser.  Items whose id would be rejected
//! by the play endpoint are skipped, and ids already in the catalog are not
//! added twice, so running the import again is harmless.

use std::collections::HashSet;

use couchcast_core::{CatalogEntry, ContentId};
use serde::Deserialize;
use tracing::debug;

/// One exported watchlist item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WatchlistItem {
    pub title: String,
    pub id: String,
}

/// What [`merge_watchlist`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub added: usize,
    pub skipped_invalid: usize,
    pub skipped_duplicate: usize,
}

/// Appends new watchlist items to `catalog`, keeping existing entries (and
/// their cached posters) untouched.
pub fn merge_watchlist(catalog: &mut Vec<CatalogEntry>, items: Vec<WatchlistItem>) -> MergeReport {
    let mut report = MergeReport::default();
    let mut known: HashSet<String> = catalog
        .iter()
        .filter(|e| !e.id.is_empty())
        .map(|e| e.id.clone())
        .collect();

    for item in items {
        let title = item.title.trim();
        let id = item.id.trim();

        if title.is_empty() || ContentId::parse(id).is_err() {
            debug!("skipping watchlist item {title:?} with id {id:?}");
            report.skipped_invalid += 1;
            continue;
        }
        if !known.insert(id.to_string()) {
            report.skipped_duplicate += 1;
            continue;
        }

        catalog.push(CatalogEntry {
            title: title.to_string(),
            id: id.to_string(),
            poster: String::new(),
        });
        report.added += 1;
    }

    report
}
