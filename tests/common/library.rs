//! A throwaway music database seeded with the test catalog

use super::fixtures::write_test_catalog;
use music_recommender::catalog_import::import_catalog_file;
use music_recommender::history_store::{HistoryStore, PlayEvent, UserId};
use music_recommender::recommendation::{
    ExhaustedCatalogPolicy, RecommendationSettings, Recommender,
};
use music_recommender::sqlite_store::SqliteMusicStore;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestLibrary {
    pub store: Arc<SqliteMusicStore>,
    pub db_path: PathBuf,
    // Keeps the database directory alive for the duration of the test
    _temp_dir: TempDir,
}

impl TestLibrary {
    /// Creates a database in a temp directory and imports the test catalog.
    pub fn create() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("music.db");
        let store = SqliteMusicStore::new(&db_path).expect("Failed to create music store");
        let catalog_path =
            write_test_catalog(temp_dir.path()).expect("Failed to write test catalog");
        import_catalog_file(&store, &catalog_path).expect("Failed to import test catalog");

        Self {
            store: Arc::new(store),
            db_path,
            _temp_dir: temp_dir,
        }
    }

    pub fn add_user(&self, handle: &str) -> UserId {
        self.store
            .create_user(handle)
            .expect("Failed to create user")
    }

    pub fn play(&self, user_id: UserId, track_id: i64, times: usize) {
        for i in 0..times {
            self.store
                .record_play(&PlayEvent::new(user_id, track_id, 1_700_000_000 + i as i64))
                .expect("Failed to record play");
        }
    }

    pub fn recommender(&self, policy: ExhaustedCatalogPolicy) -> Recommender {
        Recommender::new(
            self.store.clone(),
            self.store.clone(),
            RecommendationSettings {
                exhausted_catalog_policy: policy,
                ..Default::default()
            },
        )
    }
}
