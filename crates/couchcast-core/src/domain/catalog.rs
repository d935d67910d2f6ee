//! Catalog entry shape shared by the catalog file and the poster grid.

use serde::{Deserialize, Serialize};

/// One title in the catalog.
///
/// Stored in `movies.json` as `{"title": ..., "id": ..., "poster": ...}`.
/// `id` and `poster` may be empty: an empty id disables the play action for
/// the entry, an empty poster means the lookup found nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub title: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub poster: String,
}

impl CatalogEntry {
    /// Returns `true` when the entry carries a content id that can be played.
    pub fn is_playable(&self) -> bool {
        super::content_id::validate(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_id_and_poster_default_to_empty() {
        let entry: CatalogEntry = serde_json::from_str(r#"{"title": "Encanto"}"#).unwrap();
        assert_eq!(entry.id, "");
        assert_eq!(entry.poster, "");
        assert!(!entry.is_playable());
    }

    #[test]
    fn test_entry_with_valid_id_is_playable() {
        let entry = CatalogEntry {
            title: "Encanto".to_string(),
            id: "abc-123".to_string(),
            poster: String::new(),
        };
        assert!(entry.is_playable());
    }
}
