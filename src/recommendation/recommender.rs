//! Recommendation entry point.

use super::affinity::AffinityRanker;
use super::candidates::CandidateSelector;
use super::errors::RecommendationError;
use super::types::{Candidate, RecommendationResult, RecommendationSettings, RecommendedTrack};
use crate::catalog_store::CatalogStore;
use crate::history_store::{HistoryStore, UserId};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// Stateless recommender: every call reads fresh data from both stores and
/// keeps nothing between calls, so one instance can serve many threads.
#[derive(Clone)]
pub struct Recommender {
    catalog: Arc<dyn CatalogStore>,
    history: Arc<dyn HistoryStore>,
    ranker: AffinityRanker,
    selector: CandidateSelector,
    settings: RecommendationSettings,
}

impl Recommender {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        history: Arc<dyn HistoryStore>,
        settings: RecommendationSettings,
    ) -> Self {
        Self {
            ranker: AffinityRanker::new(history.clone()),
            selector: CandidateSelector::new(catalog.clone(), settings.exhausted_catalog_policy),
            catalog,
            history,
            settings,
        }
    }

    pub fn settings(&self) -> &RecommendationSettings {
        &self.settings
    }

    pub fn ranker(&self) -> &AffinityRanker {
        &self.ranker
    }

    /// Recommends `settings.default_limit` tracks.
    pub fn recommend_default(
        &self,
        user_id: UserId,
    ) -> Result<RecommendationResult, RecommendationError> {
        self.recommend(user_id, self.settings.default_limit)
    }

    /// Up to `limit` distinct tracks for `user_id`.
    ///
    /// Tracks matching the user's top genres or artists come first, random
    /// unplayed tracks fill the rest. A user without history gets random
    /// tracks only. Any store failure fails the whole request.
    ///
    /// A non-positive `user_id` or a `limit` above the configured
    /// `max_limit` is rejected with `InvalidArgument` before any store is
    /// read. A `limit` of zero yields an empty result.
    pub fn recommend(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<RecommendationResult, RecommendationError> {
        self.validate(user_id, limit)?;
        if limit == 0 {
            return Ok(RecommendationResult::empty(user_id));
        }

        let top_k = self.settings.affinity_top_k;
        let genre_ids = self.ranker.top_genres(user_id, top_k)?;
        let artist_ids = self.ranker.top_artists(user_id, top_k)?;
        let played = self
            .history
            .played_track_ids(user_id)
            .map_err(RecommendationError::history)?;

        let cold_start = genre_ids.is_empty() && artist_ids.is_empty();
        let candidates = if cold_start {
            debug!("user {} has no affinity, cold start", user_id);
            self.selector.random_fill(limit, &played)?
        } else {
            self.selector
                .select_candidates(&genre_ids, &artist_ids, &played, limit)?
        };

        let tracks = self.annotate(candidates)?;
        info!(
            "Recommended {} of {} tracks to user {}{}",
            tracks.len(),
            limit,
            user_id,
            if cold_start { " (cold start)" } else { "" }
        );

        Ok(RecommendationResult {
            user_id,
            cold_start,
            tracks,
        })
    }

    fn validate(&self, user_id: UserId, limit: usize) -> Result<(), RecommendationError> {
        if user_id <= 0 {
            return Err(RecommendationError::InvalidArgument(format!(
                "user id must be positive, got {}",
                user_id
            )));
        }
        if limit > self.settings.max_limit {
            return Err(RecommendationError::InvalidArgument(format!(
                "limit {} exceeds maximum {}",
                limit, self.settings.max_limit
            )));
        }
        Ok(())
    }

    /// Resolves artist and genre names. Names are display only: a missing
    /// name leaves the field empty rather than dropping the track.
    fn annotate(
        &self,
        candidates: Vec<Candidate>,
    ) -> Result<Vec<RecommendedTrack>, RecommendationError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let artist_ids: Vec<_> = candidates
            .iter()
            .map(|c| c.track.artist_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let genre_ids: Vec<_> = candidates
            .iter()
            .filter_map(|c| c.track.genre_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let artist_names: HashMap<_, _> = self
            .catalog
            .get_artists(&artist_ids)
            .map_err(RecommendationError::catalog)?
            .into_iter()
            .map(|a| (a.id, a.name))
            .collect();
        let genre_names: HashMap<_, _> = self
            .catalog
            .get_genres(&genre_ids)
            .map_err(RecommendationError::catalog)?
            .into_iter()
            .map(|g| (g.id, g.name))
            .collect();

        Ok(candidates
            .into_iter()
            .map(|candidate| RecommendedTrack {
                artist_name: artist_names.get(&candidate.track.artist_id).cloned(),
                genre_name: candidate
                    .track
                    .genre_id
                    .and_then(|id| genre_names.get(&id).cloned()),
                source: candidate.source,
                track: candidate.track,
            })
            .collect())
    }
}
