//! HistoryStore trait definition.

use super::models::{PlayEvent, TrackPlayCount, UserId};
use crate::catalog_store::{ArtistId, GenreId, TrackId};
use anyhow::Result;
use std::collections::{HashMap, HashSet};

/// Append-only listening history.
///
/// A user without any play event is not an error: every read returns an
/// empty collection for them.
pub trait HistoryStore: Send + Sync {
    /// Appends a play event. Returns the id of the stored event.
    fn record_play(&self, event: &PlayEvent) -> Result<i64>;

    /// Every track the user has played at least once.
    fn played_track_ids(&self, user_id: UserId) -> Result<HashSet<TrackId>>;

    /// Play counts of the user grouped by the genre of the played track.
    /// Plays of tracks without a genre are not counted.
    fn genre_play_counts(&self, user_id: UserId) -> Result<HashMap<GenreId, u64>>;

    /// Play counts of the user grouped by the artist of the played track.
    fn artist_play_counts(&self, user_id: UserId) -> Result<HashMap<ArtistId, u64>>;

    /// The user's most played tracks, most played first.
    fn user_top_tracks(&self, user_id: UserId, limit: usize) -> Result<Vec<TrackPlayCount>>;

    /// Most played tracks across all users, most played first. Catalog
    /// tracks nobody played are ranked last with a count of zero.
    fn popular_tracks(&self, limit: usize) -> Result<Vec<TrackPlayCount>>;
}
