//! Catalog models.
//!
//! Identifiers are SQLite row ids. Valid ids are strictly positive.

use serde::{Deserialize, Serialize};

pub type TrackId = i64;
pub type ArtistId = i64;
pub type GenreId = i64;

/// A playable track. Immutable once ingested into the catalog.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist_id: ArtistId,
    /// Tracks may be ingested without a genre.
    pub genre_id: Option<GenreId>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

/// Which fields a catalog search matches against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Title,
    Artist,
    /// Title, artist name or genre name.
    #[default]
    All,
}
