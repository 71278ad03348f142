use std::fmt;
use thiserror::Error;

/// Which collaborator failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Catalog,
    History,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Catalog => write!(f, "catalog"),
            StoreKind::History => write!(f, "history"),
        }
    }
}

/// Errors that can occur while producing recommendations.
///
/// An empty recommendation list is never an error.
#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("{store} store unavailable: {source:#}")]
    StoreUnavailable {
        store: StoreKind,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl RecommendationError {
    pub fn catalog(source: anyhow::Error) -> Self {
        RecommendationError::StoreUnavailable {
            store: StoreKind::Catalog,
            source,
        }
    }

    pub fn history(source: anyhow::Error) -> Self {
        RecommendationError::StoreUnavailable {
            store: StoreKind::History,
            source,
        }
    }

    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, RecommendationError::StoreUnavailable { .. })
    }
}
