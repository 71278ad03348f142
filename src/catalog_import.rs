//! Catalog import from a JSON document.
//!
//! ```json
//! {
//!   "genres":  [{"id": 1, "name": "Rock"}],
//!   "artists": [{"id": 1, "name": "The Rockers"}],
//!   "tracks":  [{"id": 1, "title": "Opening", "artist_id": 1, "genre_id": 1}]
//! }
//! ```
//!
//! `genre_id` may be omitted. The whole document is imported in a single
//! transaction.

use crate::catalog_store::{Artist, Genre, Track};
use crate::sqlite_store::SqliteMusicStore;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogDocument {
    pub genres: Vec<Genre>,
    pub artists: Vec<Artist>,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub genres_imported: usize,
    pub artists_imported: usize,
    pub tracks_imported: usize,
}

impl CatalogDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog file: {:?}", path))
    }

    /// Checks ids and references before anything touches the database, so
    /// errors name the offending entry.
    pub fn validate(&self) -> Result<()> {
        let mut genre_ids = HashSet::new();
        for genre in &self.genres {
            if genre.id <= 0 {
                bail!("Genre {:?} has a non-positive id", genre.name);
            }
            if !genre_ids.insert(genre.id) {
                bail!("Duplicate genre id {}", genre.id);
            }
        }

        let mut artist_ids = HashSet::new();
        for artist in &self.artists {
            if artist.id <= 0 {
                bail!("Artist {:?} has a non-positive id", artist.name);
            }
            if !artist_ids.insert(artist.id) {
                bail!("Duplicate artist id {}", artist.id);
            }
        }

        let mut track_ids = HashSet::new();
        for track in &self.tracks {
            if track.id <= 0 {
                bail!("Track {:?} has a non-positive id", track.title);
            }
            if !track_ids.insert(track.id) {
                bail!("Duplicate track id {}", track.id);
            }
            if !artist_ids.contains(&track.artist_id) {
                bail!(
                    "Track {} references unknown artist {}",
                    track.id,
                    track.artist_id
                );
            }
            if let Some(genre_id) = track.genre_id {
                if !genre_ids.contains(&genre_id) {
                    bail!("Track {} references unknown genre {}", track.id, genre_id);
                }
            }
        }
        Ok(())
    }
}

pub fn import_catalog_document(
    store: &SqliteMusicStore,
    document: &CatalogDocument,
) -> Result<ImportStats> {
    document.validate()?;
    store.import_catalog(&document.genres, &document.artists, &document.tracks)?;
    Ok(ImportStats {
        genres_imported: document.genres.len(),
        artists_imported: document.artists.len(),
        tracks_imported: document.tracks.len(),
    })
}

pub fn import_catalog_file(store: &SqliteMusicStore, path: &Path) -> Result<ImportStats> {
    info!("Loading catalog from {}", path.display());
    let document = CatalogDocument::load(path)?;
    import_catalog_document(store, &document)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> CatalogDocument {
        serde_json::from_str(
            r#"{
                "genres": [{"id": 1, "name": "Rock"}],
                "artists": [{"id": 1, "name": "The Rockers"}],
                "tracks": [
                    {"id": 1, "title": "Opening", "artist_id": 1, "genre_id": 1},
                    {"id": 2, "title": "Untagged", "artist_id": 1}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn parses_optional_genre() {
        let document = document();
        assert_eq!(document.tracks[0].genre_id, Some(1));
        assert_eq!(document.tracks[1].genre_id, None);
        document.validate().unwrap();
    }

    #[test]
    fn rejects_dangling_references() {
        let mut document = document();
        document.tracks[1].artist_id = 9;
        let err = document.validate().unwrap_err();
        assert!(err.to_string().contains("unknown artist 9"));

        let mut document = self::document();
        document.tracks[1].genre_id = Some(4);
        assert!(document.validate().is_err());
    }

    #[test]
    fn rejects_duplicates_and_bad_ids() {
        let mut document = document();
        document.genres.push(Genre {
            id: 1,
            name: "Again".to_string(),
        });
        assert!(document.validate().is_err());

        let mut document = self::document();
        document.tracks[0].id = 0;
        assert!(document.validate().is_err());
    }

    #[test]
    fn imports_into_store() {
        let store = SqliteMusicStore::in_memory().unwrap();
        let stats = import_catalog_document(&store, &document()).unwrap();
        assert_eq!(
            stats,
            ImportStats {
                genres_imported: 1,
                artists_imported: 1,
                tracks_imported: 2,
            }
        );
        assert_eq!(store.get_counts().unwrap().tracks, 2);
    }
}
