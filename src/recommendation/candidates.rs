//! Candidate selection.
//!
//! Picks affinity matches first, tops up with random catalog tracks, and
//! applies the [`ExhaustedCatalogPolicy`] when the exclusion set leaves the
//! catalog short.

use super::errors::RecommendationError;
use super::types::{Candidate, CandidateSource, ExhaustedCatalogPolicy};
use crate::catalog_store::{ArtistId, CatalogStore, GenreId, Track, TrackFilter, TrackId};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Accumulates candidates, keeping ids unique.
struct Selection {
    candidates: Vec<Candidate>,
    seen: HashSet<TrackId>,
    limit: usize,
}

impl Selection {
    fn new(limit: usize) -> Self {
        Self {
            candidates: Vec::with_capacity(limit),
            seen: HashSet::with_capacity(limit),
            limit,
        }
    }

    fn missing(&self) -> usize {
        self.limit.saturating_sub(self.candidates.len())
    }

    fn push_all<F>(&mut self, tracks: Vec<Track>, source_of: F)
    where
        F: Fn(&Track) -> CandidateSource,
    {
        for track in tracks {
            if self.missing() == 0 {
                break;
            }
            if self.seen.insert(track.id) {
                let source = source_of(&track);
                self.candidates.push(Candidate { track, source });
            }
        }
    }
}

#[derive(Clone)]
pub struct CandidateSelector {
    catalog: Arc<dyn CatalogStore>,
    policy: ExhaustedCatalogPolicy,
}

impl CandidateSelector {
    pub fn new(catalog: Arc<dyn CatalogStore>, policy: ExhaustedCatalogPolicy) -> Self {
        Self { catalog, policy }
    }

    /// Tracks matching any of the affinity genres or artists, excluding
    /// `exclude_ids`, topped up with random tracks when fewer than `limit`
    /// match. With no affinity at all this is [`Self::random_fill`].
    pub fn select_candidates(
        &self,
        genre_ids: &[GenreId],
        artist_ids: &[ArtistId],
        exclude_ids: &HashSet<TrackId>,
        limit: usize,
    ) -> Result<Vec<Candidate>, RecommendationError> {
        if genre_ids.is_empty() && artist_ids.is_empty() {
            return self.random_fill(limit, exclude_ids);
        }

        let mut selection = Selection::new(limit);
        if limit == 0 {
            return Ok(selection.candidates);
        }

        let filter = TrackFilter::any_of(genre_ids.iter().copied(), artist_ids.iter().copied())
            .excluding(exclude_ids.iter().copied());
        let matched = self
            .catalog
            .find_tracks(&filter, limit)
            .map_err(RecommendationError::catalog)?;
        debug!(
            "{} affinity matches for genres {:?} artists {:?}",
            matched.len(),
            genre_ids,
            artist_ids
        );
        selection.push_all(matched, |_| CandidateSource::Affinity);

        self.top_up(selection, exclude_ids)
    }

    /// Up to `limit` random tracks not in `exclude_ids`, subject to the
    /// exhaustion policy.
    pub fn random_fill(
        &self,
        limit: usize,
        exclude_ids: &HashSet<TrackId>,
    ) -> Result<Vec<Candidate>, RecommendationError> {
        self.top_up(Selection::new(limit), exclude_ids)
    }

    fn top_up(
        &self,
        mut selection: Selection,
        exclude_ids: &HashSet<TrackId>,
    ) -> Result<Vec<Candidate>, RecommendationError> {
        if selection.missing() > 0 {
            let excluded: HashSet<TrackId> =
                exclude_ids.union(&selection.seen).copied().collect();
            let random = self
                .catalog
                .random_tracks(selection.missing(), &excluded)
                .map_err(RecommendationError::catalog)?;
            debug!("{} random tracks fill the selection", random.len());
            selection.push_all(random, |_| CandidateSource::Random);
        }

        if selection.missing() > 0 && self.policy == ExhaustedCatalogPolicy::AllowRepeats {
            // Only the result's own ids stay excluded; played tracks come back.
            warn!(
                "Catalog exhausted: {} of {} tracks selected, allowing played tracks",
                selection.candidates.len(),
                selection.limit
            );
            let repeats = self
                .catalog
                .random_tracks(selection.missing(), &selection.seen)
                .map_err(RecommendationError::catalog)?;
            selection.push_all(repeats, |track| {
                if exclude_ids.contains(&track.id) {
                    CandidateSource::Repeat
                } else {
                    CandidateSource::Random
                }
            });
        }

        Ok(selection.candidates)
    }
}
