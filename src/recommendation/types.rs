use crate::catalog_store::{ArtistId, GenreId, Track, TrackId};
use crate::history_store::UserId;
use serde::Serialize;

pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 8;
pub const DEFAULT_MAX_RECOMMENDATION_LIMIT: usize = 100;
pub const DEFAULT_AFFINITY_TOP_K: usize = 3;

/// What to do when the exclusion set leaves fewer catalog tracks than
/// requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExhaustedCatalogPolicy {
    /// Refill with already played tracks. The result never repeats a track.
    #[default]
    AllowRepeats,
    /// Return fewer tracks than requested.
    ReturnFewer,
}

/// Which selection step supplied a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Matches one of the user's top genres or artists.
    Affinity,
    /// Random catalog track not played by the user.
    Random,
    /// Already played track, used only when the catalog ran out.
    Repeat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub track: Track,
    pub source: CandidateSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenreAffinity {
    pub genre_id: GenreId,
    pub play_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArtistAffinity {
    pub artist_id: ArtistId,
    pub play_count: u64,
}

/// A recommended track with display names resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendedTrack {
    pub track: Track,
    pub artist_name: Option<String>,
    pub genre_name: Option<String>,
    pub source: CandidateSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationResult {
    pub user_id: UserId,
    /// True when the user had no affinity and every track came from random
    /// sampling.
    pub cold_start: bool,
    pub tracks: Vec<RecommendedTrack>,
}

impl RecommendationResult {
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            cold_start: false,
            tracks: Vec::new(),
        }
    }

    pub fn track_ids(&self) -> Vec<TrackId> {
        self.tracks.iter().map(|t| t.track.id).collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationSettings {
    pub default_limit: usize,
    pub max_limit: usize,
    pub affinity_top_k: usize,
    pub exhausted_catalog_policy: ExhaustedCatalogPolicy,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_RECOMMENDATION_LIMIT,
            max_limit: DEFAULT_MAX_RECOMMENDATION_LIMIT,
            affinity_top_k: DEFAULT_AFFINITY_TOP_K,
            exhausted_catalog_policy: ExhaustedCatalogPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ValueEnum;

    #[test]
    fn policy_parses_kebab_case() {
        assert_eq!(
            ExhaustedCatalogPolicy::from_str("return-fewer", true).unwrap(),
            ExhaustedCatalogPolicy::ReturnFewer
        );
        assert_eq!(
            ExhaustedCatalogPolicy::from_str("Allow-Repeats", true).unwrap(),
            ExhaustedCatalogPolicy::AllowRepeats
        );
        assert!(ExhaustedCatalogPolicy::from_str("never", true).is_err());
    }

    #[test]
    fn result_serializes_sources() {
        let result = RecommendationResult {
            user_id: 1,
            cold_start: true,
            tracks: vec![RecommendedTrack {
                track: Track {
                    id: 5,
                    title: "Five".to_string(),
                    artist_id: 2,
                    genre_id: None,
                },
                artist_name: Some("Two".to_string()),
                genre_name: None,
                source: CandidateSource::Random,
            }],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["tracks"][0]["source"], "random");
        assert_eq!(json["cold_start"], true);
        assert_eq!(result.track_ids(), vec![5]);
    }
}
