//! CatalogStore trait definition.
//!
//! The recommender only reads from the catalog. Implementations must be
//! shareable across threads; each call is an independent blocking read.

use super::filter::TrackFilter;
use super::models::{Artist, ArtistId, Genre, GenreId, SearchKind, Track, TrackId};
use anyhow::Result;
use std::collections::HashSet;

pub trait CatalogStore: Send + Sync {
    /// All tracks, ordered by id.
    fn list_tracks(&self) -> Result<Vec<Track>>;

    /// Tracks whose genre is one of `genre_ids`, ordered by id.
    fn list_tracks_by_genres(&self, genre_ids: &[GenreId]) -> Result<Vec<Track>>;

    /// Tracks by any of `artist_ids`, ordered by id.
    fn list_tracks_by_artists(&self, artist_ids: &[ArtistId]) -> Result<Vec<Track>>;

    /// Up to `limit` distinct tracks matching `filter`, in random order.
    ///
    /// The order is intentionally not stable across calls.
    fn find_tracks(&self, filter: &TrackFilter, limit: usize) -> Result<Vec<Track>>;

    /// Up to `count` distinct random tracks whose id is not in `exclude`.
    fn random_tracks(&self, count: usize, exclude: &HashSet<TrackId>) -> Result<Vec<Track>> {
        self.find_tracks(&TrackFilter::all().excluding(exclude.iter().copied()), count)
    }

    /// Tracks for the given ids. Unknown ids are skipped.
    fn get_tracks(&self, track_ids: &[TrackId]) -> Result<Vec<Track>>;

    /// Artists for the given ids. Unknown ids are skipped.
    fn get_artists(&self, artist_ids: &[ArtistId]) -> Result<Vec<Artist>>;

    /// Genres for the given ids. Unknown ids are skipped.
    fn get_genres(&self, genre_ids: &[GenreId]) -> Result<Vec<Genre>>;

    fn get_tracks_count(&self) -> Result<usize>;

    /// Tracks whose `kind` fields contain `query`, ignoring ASCII case,
    /// ordered by title then id. A blank query matches nothing.
    fn search_tracks(&self, query: &str, kind: SearchKind) -> Result<Vec<Track>>;
}
