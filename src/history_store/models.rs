use crate::catalog_store::TrackId;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

pub type UserId = i64;

/// One playback action. Created once, never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayEvent {
    pub user_id: UserId,
    pub track_id: TrackId,
    /// Unix timestamp (seconds) when playback started
    pub played_at: i64,
}

impl PlayEvent {
    pub fn new(user_id: UserId, track_id: TrackId, played_at: i64) -> Self {
        Self {
            user_id,
            track_id,
            played_at,
        }
    }

    /// An event stamped with the current wall clock time.
    pub fn now(user_id: UserId, track_id: TrackId) -> Self {
        let played_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Self::new(user_id, track_id, played_at)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackPlayCount {
    pub track_id: TrackId,
    pub play_count: u64,
}

/// Sorts by play count descending, ties by ascending track id, and keeps the
/// first `limit` entries.
pub(crate) fn rank_track_counts<I>(counts: I, limit: usize) -> Vec<TrackPlayCount>
where
    I: IntoIterator<Item = (TrackId, u64)>,
{
    let mut ranked: Vec<TrackPlayCount> = counts
        .into_iter()
        .map(|(track_id, play_count)| TrackPlayCount {
            track_id,
            play_count,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.play_count
            .cmp(&a.play_count)
            .then(a.track_id.cmp(&b.track_id))
    });
    ranked.truncate(limit);
    ranked
}
