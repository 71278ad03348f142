//! Affinity ranking.
//!
//! Derives a user's favourite genres and artists from play counts. Nothing is
//! cached: every call reads the history store again.

use super::errors::RecommendationError;
use super::types::{ArtistAffinity, GenreAffinity};
use crate::catalog_store::{ArtistId, GenreId};
use crate::history_store::{HistoryStore, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Orders by count descending, ties by ascending id. Zero counts never
/// contribute affinity.
fn rank_counts(counts: HashMap<i64, u64>, k: usize) -> Vec<(i64, u64)> {
    let mut ranked: Vec<(i64, u64)> = counts.into_iter().filter(|(_, c)| *c > 0).collect();
    ranked.sort_by(|(a_id, a_count), (b_id, b_count)| {
        b_count.cmp(a_count).then(a_id.cmp(b_id))
    });
    ranked.truncate(k);
    ranked
}

#[derive(Clone)]
pub struct AffinityRanker {
    history: Arc<dyn HistoryStore>,
}

impl AffinityRanker {
    pub fn new(history: Arc<dyn HistoryStore>) -> Self {
        Self { history }
    }

    pub fn genre_affinities(
        &self,
        user_id: UserId,
        k: usize,
    ) -> Result<Vec<GenreAffinity>, RecommendationError> {
        let counts = self
            .history
            .genre_play_counts(user_id)
            .map_err(RecommendationError::history)?;
        let ranked = rank_counts(counts, k);
        debug!("user {} genre affinity: {:?}", user_id, ranked);
        Ok(ranked
            .into_iter()
            .map(|(genre_id, play_count)| GenreAffinity {
                genre_id,
                play_count,
            })
            .collect())
    }

    pub fn artist_affinities(
        &self,
        user_id: UserId,
        k: usize,
    ) -> Result<Vec<ArtistAffinity>, RecommendationError> {
        let counts = self
            .history
            .artist_play_counts(user_id)
            .map_err(RecommendationError::history)?;
        let ranked = rank_counts(counts, k);
        debug!("user {} artist affinity: {:?}", user_id, ranked);
        Ok(ranked
            .into_iter()
            .map(|(artist_id, play_count)| ArtistAffinity {
                artist_id,
                play_count,
            })
            .collect())
    }

    /// The user's `k` most played genres, most played first.
    pub fn top_genres(
        &self,
        user_id: UserId,
        k: usize,
    ) -> Result<Vec<GenreId>, RecommendationError> {
        Ok(self
            .genre_affinities(user_id, k)?
            .into_iter()
            .map(|a| a.genre_id)
            .collect())
    }

    /// The user's `k` most played artists, most played first.
    pub fn top_artists(
        &self,
        user_id: UserId,
        k: usize,
    ) -> Result<Vec<ArtistId>, RecommendationError> {
        Ok(self
            .artist_affinities(user_id, k)?
            .into_iter()
            .map(|a| a.artist_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::{MemoryCatalogStore, Track};
    use crate::history_store::{MemoryHistoryStore, PlayEvent};

    fn ranker_with_plays(plays: &[(UserId, i64, usize)]) -> AffinityRanker {
        let catalog = Arc::new(MemoryCatalogStore::new());
        for genre_id in 1..=5 {
            catalog
                .add_genre(genre_id, &format!("Genre {}", genre_id))
                .unwrap();
            catalog
                .add_artist(genre_id, &format!("Artist {}", genre_id))
                .unwrap();
        }
        // Track n belongs to genre n and artist n.
        for id in 1..=5 {
            catalog
                .add_track(Track {
                    id,
                    title: format!("Track {}", id),
                    artist_id: id,
                    genre_id: Some(id),
                })
                .unwrap();
        }
        let history = MemoryHistoryStore::new(catalog);
        for (user_id, track_id, times) in plays {
            for _ in 0..*times {
                history
                    .record_play(&PlayEvent::new(*user_id, *track_id, 0))
                    .unwrap();
            }
        }
        AffinityRanker::new(Arc::new(history))
    }

    #[test]
    fn ranks_by_count_then_id() {
        let ranker = ranker_with_plays(&[(1, 4, 2), (1, 2, 5), (1, 3, 2), (1, 1, 1)]);
        assert_eq!(ranker.top_genres(1, 3).unwrap(), vec![2, 3, 4]);
        assert_eq!(ranker.top_artists(1, 2).unwrap(), vec![2, 3]);

        let affinities = ranker.genre_affinities(1, 1).unwrap();
        assert_eq!(
            affinities,
            vec![GenreAffinity {
                genre_id: 2,
                play_count: 5
            }]
        );
    }

    #[test]
    fn ranking_is_deterministic() {
        let ranker = ranker_with_plays(&[(1, 5, 1), (1, 3, 1), (1, 1, 1), (1, 4, 1)]);
        let first = ranker.top_genres(1, 3).unwrap();
        for _ in 0..10 {
            assert_eq!(ranker.top_genres(1, 3).unwrap(), first);
        }
        assert_eq!(first, vec![1, 3, 4]);
    }

    #[test]
    fn user_without_history_has_no_affinity() {
        let ranker = ranker_with_plays(&[(1, 1, 3)]);
        assert!(ranker.top_genres(2, 3).unwrap().is_empty());
        assert!(ranker.top_artists(2, 3).unwrap().is_empty());
    }

    #[test]
    fn zero_counts_are_dropped() {
        let ranked = rank_counts(HashMap::from([(1, 0), (2, 3)]), 3);
        assert_eq!(ranked, vec![(2, 3)]);
    }
}
