//! In-memory history store backed by a [`MemoryCatalogStore`], which supplies
//! the genre and artist of each played track.

use super::models::{rank_track_counts, PlayEvent, TrackPlayCount, UserId};
use super::trait_def::HistoryStore;
use crate::catalog_store::{ArtistId, CatalogStore, GenreId, MemoryCatalogStore, TrackId};
use anyhow::{anyhow, bail, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard};

pub struct MemoryHistoryStore {
    catalog: Arc<MemoryCatalogStore>,
    events: RwLock<Vec<PlayEvent>>,
}

impl MemoryHistoryStore {
    pub fn new(catalog: Arc<MemoryCatalogStore>) -> Self {
        Self {
            catalog,
            events: RwLock::new(Vec::new()),
        }
    }

    fn events(&self) -> Result<RwLockReadGuard<'_, Vec<PlayEvent>>> {
        self.events
            .read()
            .map_err(|_| anyhow!("memory history lock poisoned"))
    }

    fn user_track_counts(&self, user_id: UserId) -> Result<HashMap<TrackId, u64>> {
        let mut counts = HashMap::new();
        for event in self.events()?.iter().filter(|e| e.user_id == user_id) {
            *counts.entry(event.track_id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn record_play(&self, event: &PlayEvent) -> Result<i64> {
        if event.user_id <= 0 {
            bail!("Invalid user id {}", event.user_id);
        }
        if !self.catalog.contains_track(event.track_id)? {
            bail!("Unknown track {}", event.track_id);
        }
        let mut events = self
            .events
            .write()
            .map_err(|_| anyhow!("memory history lock poisoned"))?;
        events.push(event.clone());
        Ok(events.len() as i64)
    }

    fn played_track_ids(&self, user_id: UserId) -> Result<HashSet<TrackId>> {
        Ok(self
            .events()?
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.track_id)
            .collect())
    }

    fn genre_play_counts(&self, user_id: UserId) -> Result<HashMap<GenreId, u64>> {
        let mut counts = HashMap::new();
        for (track_id, plays) in self.user_track_counts(user_id)? {
            if let Some(genre_id) = self.catalog.track_genre(track_id)? {
                *counts.entry(genre_id).or_insert(0) += plays;
            }
        }
        Ok(counts)
    }

    fn artist_play_counts(&self, user_id: UserId) -> Result<HashMap<ArtistId, u64>> {
        let mut counts = HashMap::new();
        for (track_id, plays) in self.user_track_counts(user_id)? {
            if let Some(artist_id) = self.catalog.track_artist(track_id)? {
                *counts.entry(artist_id).or_insert(0) += plays;
            }
        }
        Ok(counts)
    }

    fn user_top_tracks(&self, user_id: UserId, limit: usize) -> Result<Vec<TrackPlayCount>> {
        Ok(rank_track_counts(self.user_track_counts(user_id)?, limit))
    }

    fn popular_tracks(&self, limit: usize) -> Result<Vec<TrackPlayCount>> {
        let mut counts: HashMap<TrackId, u64> = self
            .catalog
            .list_tracks()?
            .into_iter()
            .map(|t| (t.id, 0))
            .collect();
        for event in self.events()?.iter() {
            *counts.entry(event.track_id).or_insert(0) += 1;
        }
        Ok(rank_track_counts(counts, limit))
    }
}
