//! Music Recommender Library
//!
//! Track recommendations from listening history, over a SQLite catalog and
//! play log. Exposes the internal modules for the CLI and for testing.

pub mod catalog_import;
pub mod catalog_store;
pub mod config;
pub mod history_store;
pub mod recommendation;
pub mod sqlite_persistence;
pub mod sqlite_store;

// Re-export commonly used types for convenience
pub use catalog_store::{CatalogStore, MemoryCatalogStore};
pub use history_store::{HistoryStore, MemoryHistoryStore};
pub use recommendation::{RecommendationError, RecommendationResult, Recommender};
pub use sqlite_store::SqliteMusicStore;
