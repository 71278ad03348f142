mod affinity;
mod candidates;
mod errors;
mod recommender;
mod types;

pub use affinity::AffinityRanker;
pub use candidates::CandidateSelector;
pub use errors::{RecommendationError, StoreKind};
pub use recommender::Recommender;
pub use types::*;
