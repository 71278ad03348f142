//! In-memory catalog store.
//!
//! Used as a fake in tests and by tools that assemble a catalog without a
//! database. Referential rules mirror the SQLite schema: a track must point
//! to a known artist and, if set, a known genre.

use super::filter::TrackFilter;
use super::models::{Artist, ArtistId, Genre, GenreId, SearchKind, Track, TrackId};
use super::trait_def::CatalogStore;
use anyhow::{anyhow, bail, Result};
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct CatalogData {
    tracks: BTreeMap<TrackId, Track>,
    artists: BTreeMap<ArtistId, Artist>,
    genres: BTreeMap<GenreId, Genre>,
}

#[derive(Default)]
pub struct MemoryCatalogStore {
    data: RwLock<CatalogData>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CatalogData>> {
        self.data
            .read()
            .map_err(|_| anyhow!("memory catalog lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CatalogData>> {
        self.data
            .write()
            .map_err(|_| anyhow!("memory catalog lock poisoned"))
    }

    pub fn add_genre(&self, id: GenreId, name: &str) -> Result<()> {
        let mut data = self.write()?;
        if data.genres.contains_key(&id) {
            bail!("Genre {} already exists", id);
        }
        data.genres.insert(
            id,
            Genre {
                id,
                name: name.to_string(),
            },
        );
        Ok(())
    }

    pub fn add_artist(&self, id: ArtistId, name: &str) -> Result<()> {
        let mut data = self.write()?;
        if data.artists.contains_key(&id) {
            bail!("Artist {} already exists", id);
        }
        data.artists.insert(
            id,
            Artist {
                id,
                name: name.to_string(),
            },
        );
        Ok(())
    }

    pub fn add_track(&self, track: Track) -> Result<()> {
        let mut data = self.write()?;
        if data.tracks.contains_key(&track.id) {
            bail!("Track {} already exists", track.id);
        }
        if !data.artists.contains_key(&track.artist_id) {
            bail!("Track {} references unknown artist {}", track.id, track.artist_id);
        }
        if let Some(genre_id) = track.genre_id {
            if !data.genres.contains_key(&genre_id) {
                bail!("Track {} references unknown genre {}", track.id, genre_id);
            }
        }
        data.tracks.insert(track.id, track);
        Ok(())
    }

    /// Genre of a track, `None` for unknown tracks or tracks without genre.
    pub fn track_genre(&self, track_id: TrackId) -> Result<Option<GenreId>> {
        Ok(self.read()?.tracks.get(&track_id).and_then(|t| t.genre_id))
    }

    pub fn track_artist(&self, track_id: TrackId) -> Result<Option<ArtistId>> {
        Ok(self.read()?.tracks.get(&track_id).map(|t| t.artist_id))
    }

    pub fn contains_track(&self, track_id: TrackId) -> Result<bool> {
        Ok(self.read()?.tracks.contains_key(&track_id))
    }
}

impl CatalogStore for MemoryCatalogStore {
    fn list_tracks(&self) -> Result<Vec<Track>> {
        Ok(self.read()?.tracks.values().cloned().collect())
    }

    fn list_tracks_by_genres(&self, genre_ids: &[GenreId]) -> Result<Vec<Track>> {
        Ok(self
            .read()?
            .tracks
            .values()
            .filter(|t| t.genre_id.is_some_and(|g| genre_ids.contains(&g)))
            .cloned()
            .collect())
    }

    fn list_tracks_by_artists(&self, artist_ids: &[ArtistId]) -> Result<Vec<Track>> {
        Ok(self
            .read()?
            .tracks
            .values()
            .filter(|t| artist_ids.contains(&t.artist_id))
            .cloned()
            .collect())
    }

    fn find_tracks(&self, filter: &TrackFilter, limit: usize) -> Result<Vec<Track>> {
        let mut matching: Vec<Track> = self
            .read()?
            .tracks
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        matching.shuffle(&mut rand::rng());
        matching.truncate(limit);
        Ok(matching)
    }

    fn get_tracks(&self, track_ids: &[TrackId]) -> Result<Vec<Track>> {
        let data = self.read()?;
        Ok(track_ids
            .iter()
            .filter_map(|id| data.tracks.get(id).cloned())
            .collect())
    }

    fn get_artists(&self, artist_ids: &[ArtistId]) -> Result<Vec<Artist>> {
        let data = self.read()?;
        Ok(artist_ids
            .iter()
            .filter_map(|id| data.artists.get(id).cloned())
            .collect())
    }

    fn get_genres(&self, genre_ids: &[GenreId]) -> Result<Vec<Genre>> {
        let data = self.read()?;
        Ok(genre_ids
            .iter()
            .filter_map(|id| data.genres.get(id).cloned())
            .collect())
    }

    fn get_tracks_count(&self) -> Result<usize> {
        Ok(self.read()?.tracks.len())
    }

    fn search_tracks(&self, query: &str, kind: SearchKind) -> Result<Vec<Track>> {
        let needle = query.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let data = self.read()?;
        let contains = |text: &str| text.to_ascii_lowercase().contains(&needle);
        let artist_matches = |track: &Track| {
            data.artists
                .get(&track.artist_id)
                .is_some_and(|a| contains(&a.name))
        };
        let genre_matches = |track: &Track| {
            track
                .genre_id
                .and_then(|id| data.genres.get(&id))
                .is_some_and(|g| contains(&g.name))
        };

        let mut found: Vec<Track> = data
            .tracks
            .values()
            .filter(|t| match kind {
                SearchKind::Title => contains(&t.title),
                SearchKind::Artist => artist_matches(t),
                SearchKind::All => contains(&t.title) || artist_matches(t) || genre_matches(t),
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn make_store() -> MemoryCatalogStore {
        let store = MemoryCatalogStore::new();
        store.add_genre(1, "Rock").unwrap();
        store.add_genre(2, "Jazz").unwrap();
        store.add_artist(1, "The Test Band").unwrap();
        store.add_artist(2, "Jazz Ensemble").unwrap();
        for id in 1..=4 {
            store
                .add_track(Track {
                    id,
                    title: format!("Rock {}", id),
                    artist_id: 1,
                    genre_id: Some(1),
                })
                .unwrap();
        }
        store
            .add_track(Track {
                id: 5,
                title: "Untagged".to_string(),
                artist_id: 2,
                genre_id: None,
            })
            .unwrap();
        store
    }

    #[test]
    fn rejects_dangling_references() {
        let store = make_store();
        let unknown_artist = store.add_track(Track {
            id: 10,
            title: "x".to_string(),
            artist_id: 99,
            genre_id: None,
        });
        assert!(unknown_artist.is_err());

        let unknown_genre = store.add_track(Track {
            id: 11,
            title: "x".to_string(),
            artist_id: 1,
            genre_id: Some(99),
        });
        assert!(unknown_genre.is_err());
        assert!(store.add_genre(1, "Rock again").is_err());
    }

    #[test]
    fn lists_by_genre_and_artist() {
        let store = make_store();
        let rock: Vec<TrackId> = store
            .list_tracks_by_genres(&[1])
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(rock, vec![1, 2, 3, 4]);

        let ensemble = store.list_tracks_by_artists(&[2]).unwrap();
        assert_eq!(ensemble.len(), 1);
        assert_eq!(ensemble[0].id, 5);
        assert_eq!(store.get_tracks_count().unwrap(), 5);
    }

    #[test]
    fn random_tracks_respect_exclusion_and_count() {
        let store = make_store();
        let exclude: HashSet<TrackId> = [1, 2].into_iter().collect();
        let picked = store.random_tracks(10, &exclude).unwrap();
        let ids: HashSet<TrackId> = picked.iter().map(|t| t.id).collect();
        assert_eq!(ids, [3, 4, 5].into_iter().collect());

        let two = store.random_tracks(2, &HashSet::new()).unwrap();
        assert_eq!(two.len(), 2);
        assert_ne!(two[0].id, two[1].id);
    }

    #[test]
    fn search_matches_title_artist_and_genre() {
        let store = make_store();
        let ids = |query: &str, kind: SearchKind| -> Vec<TrackId> {
            store
                .search_tracks(query, kind)
                .unwrap()
                .iter()
                .map(|t| t.id)
                .collect()
        };

        assert_eq!(ids("rock 3", SearchKind::Title), vec![3]);
        assert_eq!(ids("JAZZ", SearchKind::Artist), vec![5]);
        assert!(ids("jazz", SearchKind::Title).is_empty());
        assert_eq!(ids("tag", SearchKind::All), vec![5]);
        assert_eq!(ids("rock", SearchKind::All), vec![1, 2, 3, 4]);
        assert!(ids("", SearchKind::All).is_empty());
        assert!(ids("   ", SearchKind::Title).is_empty());
    }

    #[test]
    fn lookups_skip_unknown_ids() {
        let store = make_store();
        assert_eq!(store.get_tracks(&[1, 42]).unwrap().len(), 1);
        assert_eq!(store.get_artists(&[2, 42]).unwrap()[0].name, "Jazz Ensemble");
        assert!(store.get_genres(&[42]).unwrap().is_empty());
        assert_eq!(store.track_genre(5).unwrap(), None);
        assert_eq!(store.track_artist(5).unwrap(), Some(2));
    }
}
