//! Test fixture creation for the catalog document and database

use super::constants::*;
use anyhow::Result;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

/// The test catalog as an import document: 2 genres, 2 artists, 10 tracks.
pub fn test_catalog_json() -> serde_json::Value {
    let mut tracks = Vec::new();
    for id in ROCK_TRACK_IDS {
        tracks.push(json!({
            "id": id,
            "title": format!("Rock Song {}", id),
            "artist_id": ARTIST_1_ID,
            "genre_id": ROCK_GENRE_ID,
        }));
    }
    for id in JAZZ_TRACK_IDS {
        tracks.push(json!({
            "id": id,
            "title": format!("Jazz Tune {}", id),
            "artist_id": ARTIST_2_ID,
            "genre_id": JAZZ_GENRE_ID,
        }));
    }

    json!({
        "genres": [
            {"id": ROCK_GENRE_ID, "name": ROCK_GENRE_NAME},
            {"id": JAZZ_GENRE_ID, "name": JAZZ_GENRE_NAME},
        ],
        "artists": [
            {"id": ARTIST_1_ID, "name": ARTIST_1_NAME},
            {"id": ARTIST_2_ID, "name": ARTIST_2_NAME},
        ],
        "tracks": tracks,
    })
}

/// Writes the test catalog document into `dir`, returns its path.
pub fn write_test_catalog(dir: &Path) -> Result<PathBuf> {
    let path = dir.join("catalog.json");
    fs::write(&path, serde_json::to_string_pretty(&test_catalog_json())?)?;
    Ok(path)
}
