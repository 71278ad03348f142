//! Track selection predicate.
//!
//! A `TrackFilter` describes "genre in G OR artist in A, and id not in E"
//! without committing to a storage backend. The SQLite store renders it to a
//! parameterized query, the in-memory store evaluates [`TrackFilter::matches`].

use super::models::{ArtistId, GenreId, Track, TrackId};
use std::collections::BTreeSet;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackFilter {
    genre_ids: BTreeSet<GenreId>,
    artist_ids: BTreeSet<ArtistId>,
    excluded_ids: BTreeSet<TrackId>,
}

impl TrackFilter {
    /// A filter matching every track in the catalog.
    pub fn all() -> Self {
        Self::default()
    }

    /// Tracks whose genre is any of `genre_ids` or whose artist is any of
    /// `artist_ids`.
    pub fn any_of<G, A>(genre_ids: G, artist_ids: A) -> Self
    where
        G: IntoIterator<Item = GenreId>,
        A: IntoIterator<Item = ArtistId>,
    {
        Self {
            genre_ids: genre_ids.into_iter().collect(),
            artist_ids: artist_ids.into_iter().collect(),
            excluded_ids: BTreeSet::new(),
        }
    }

    pub fn excluding<E>(mut self, track_ids: E) -> Self
    where
        E: IntoIterator<Item = TrackId>,
    {
        self.excluded_ids.extend(track_ids);
        self
    }

    pub fn genre_ids(&self) -> &BTreeSet<GenreId> {
        &self.genre_ids
    }

    pub fn artist_ids(&self) -> &BTreeSet<ArtistId> {
        &self.artist_ids
    }

    pub fn excluded_ids(&self) -> &BTreeSet<TrackId> {
        &self.excluded_ids
    }

    /// True when neither a genre nor an artist restriction is set, in which
    /// case only the exclusion applies.
    pub fn is_unrestricted(&self) -> bool {
        self.genre_ids.is_empty() && self.artist_ids.is_empty()
    }

    pub fn matches(&self, track: &Track) -> bool {
        if self.excluded_ids.contains(&track.id) {
            return false;
        }
        if self.is_unrestricted() {
            return true;
        }
        let genre_match = track
            .genre_id
            .map(|genre_id| self.genre_ids.contains(&genre_id))
            .unwrap_or(false);
        genre_match || self.artist_ids.contains(&track.artist_id)
    }
}
