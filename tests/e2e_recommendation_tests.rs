//! End-to-end tests for recommendations over a SQLite music database
//!
//! Covers cold start, affinity matching, random top-up, catalog exhaustion
//! and argument validation.

mod common;

use common::{
    TestLibrary, ARTIST_1_NAME, CATALOG_SIZE, JAZZ_TRACK_IDS, OTHER_USER, ROCK_GENRE_NAME,
    ROCK_TRACK_IDS, TEST_USER,
};
use music_recommender::history_store::HistoryStore;
use music_recommender::recommendation::{
    CandidateSource, ExhaustedCatalogPolicy, RecommendationError, RecommendationResult,
    Recommender,
};
use music_recommender::sqlite_store::SqliteMusicStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

fn ids(result: &RecommendationResult) -> HashSet<i64> {
    result.track_ids().into_iter().collect()
}

// =============================================================================
// Cold start
// =============================================================================

#[test]
fn test_cold_start_returns_default_limit() {
    let library = TestLibrary::create();
    let user_id = library.add_user(TEST_USER);

    let result = library
        .recommender(ExhaustedCatalogPolicy::AllowRepeats)
        .recommend_default(user_id)
        .unwrap();

    assert!(result.cold_start);
    assert_eq!(result.len(), 8);
    assert_eq!(ids(&result).len(), 8);
    assert!(result
        .tracks
        .iter()
        .all(|t| t.source == CandidateSource::Random));
}

#[test]
fn test_unknown_user_is_cold_start() {
    let library = TestLibrary::create();

    let result = library
        .recommender(ExhaustedCatalogPolicy::AllowRepeats)
        .recommend(4242, 3)
        .unwrap();

    assert!(result.cold_start);
    assert_eq!(result.len(), 3);
}

// =============================================================================
// Affinity
// =============================================================================

#[test]
fn test_favourite_genre_scenario() {
    let library = TestLibrary::create();
    let user_id = library.add_user(TEST_USER);
    library.play(user_id, ROCK_TRACK_IDS[0], 4);

    let result = library
        .recommender(ExhaustedCatalogPolicy::AllowRepeats)
        .recommend(user_id, 4)
        .unwrap();

    assert!(!result.cold_start);
    let expected: HashSet<i64> = ROCK_TRACK_IDS[1..].iter().copied().collect();
    assert_eq!(ids(&result), expected);
    for entry in &result.tracks {
        assert_eq!(entry.source, CandidateSource::Affinity);
        assert_eq!(entry.artist_name.as_deref(), Some(ARTIST_1_NAME));
        assert_eq!(entry.genre_name.as_deref(), Some(ROCK_GENRE_NAME));
    }
}

#[test]
fn test_affinity_is_topped_up_with_unplayed_tracks() {
    let library = TestLibrary::create();
    let user_id = library.add_user(TEST_USER);
    library.play(user_id, ROCK_TRACK_IDS[0], 4);
    library.play(user_id, ROCK_TRACK_IDS[1], 1);

    let result = library
        .recommender(ExhaustedCatalogPolicy::AllowRepeats)
        .recommend(user_id, 6)
        .unwrap();

    assert_eq!(result.len(), 6);
    let recommended = ids(&result);
    assert!(!recommended.contains(&ROCK_TRACK_IDS[0]));
    assert!(!recommended.contains(&ROCK_TRACK_IDS[1]));

    let random: Vec<i64> = result
        .tracks
        .iter()
        .filter(|t| t.source == CandidateSource::Random)
        .map(|t| t.track.id)
        .collect();
    assert_eq!(random.len(), 3);
    assert!(random.iter().all(|id| JAZZ_TRACK_IDS.contains(id)));
}

#[test]
fn test_other_users_history_does_not_leak() {
    let library = TestLibrary::create();
    let user_id = library.add_user(TEST_USER);
    let other_id = library.add_user(OTHER_USER);
    library.play(other_id, JAZZ_TRACK_IDS[0], 10);
    library.play(user_id, ROCK_TRACK_IDS[0], 1);

    let result = library
        .recommender(ExhaustedCatalogPolicy::AllowRepeats)
        .recommend(user_id, 4)
        .unwrap();

    let expected: HashSet<i64> = ROCK_TRACK_IDS[1..].iter().copied().collect();
    assert_eq!(ids(&result), expected);
}

// =============================================================================
// Exhaustion
// =============================================================================

#[test]
fn test_exhausted_catalog_allows_repeats() {
    let library = TestLibrary::create();
    let user_id = library.add_user(TEST_USER);
    for track_id in ROCK_TRACK_IDS.iter().chain(JAZZ_TRACK_IDS[..4].iter()) {
        library.play(user_id, *track_id, 1);
    }

    let result = library
        .recommender(ExhaustedCatalogPolicy::AllowRepeats)
        .recommend(user_id, 5)
        .unwrap();

    assert_eq!(result.len(), 5);
    assert_eq!(ids(&result).len(), 5);
    assert!(ids(&result).contains(&JAZZ_TRACK_IDS[4]));
    let repeats = result
        .tracks
        .iter()
        .filter(|t| t.source == CandidateSource::Repeat)
        .count();
    assert_eq!(repeats, 4);
}

#[test]
fn test_exhausted_catalog_returns_fewer() {
    let library = TestLibrary::create();
    let user_id = library.add_user(TEST_USER);
    for track_id in ROCK_TRACK_IDS.iter().chain(JAZZ_TRACK_IDS[..4].iter()) {
        library.play(user_id, *track_id, 1);
    }

    let result = library
        .recommender(ExhaustedCatalogPolicy::ReturnFewer)
        .recommend(user_id, 5)
        .unwrap();

    assert_eq!(result.track_ids(), vec![JAZZ_TRACK_IDS[4]]);
}

#[test]
fn test_limit_larger_than_catalog() {
    let library = TestLibrary::create();
    let user_id = library.add_user(TEST_USER);

    let result = library
        .recommender(ExhaustedCatalogPolicy::AllowRepeats)
        .recommend(user_id, 50)
        .unwrap();

    assert_eq!(result.len(), CATALOG_SIZE);
    assert_eq!(ids(&result).len(), CATALOG_SIZE);
}

// =============================================================================
// Validation and failures
// =============================================================================

#[test]
fn test_invalid_arguments() {
    let library = TestLibrary::create();
    let recommender = library.recommender(ExhaustedCatalogPolicy::AllowRepeats);

    assert!(matches!(
        recommender.recommend(0, 4),
        Err(RecommendationError::InvalidArgument(_))
    ));
    assert!(matches!(
        recommender.recommend(1, 1000),
        Err(RecommendationError::InvalidArgument(_))
    ));
    assert!(recommender.recommend(1, 0).unwrap().is_empty());
}

#[test]
fn test_locked_database_is_store_unavailable() {
    let library = TestLibrary::create();
    let user_id = library.add_user(TEST_USER);
    library.play(user_id, ROCK_TRACK_IDS[0], 1);

    let blocked =
        SqliteMusicStore::with_timeout(&library.db_path, std::time::Duration::from_millis(50))
            .unwrap();
    let recommender = Recommender::new(
        Arc::new(blocked.clone()),
        Arc::new(blocked),
        Default::default(),
    );

    let locker = rusqlite::Connection::open(&library.db_path).unwrap();
    locker.execute_batch("BEGIN EXCLUSIVE;").unwrap();

    let err = recommender.recommend(user_id, 4).unwrap_err();
    assert!(err.is_store_unavailable(), "unexpected error {:?}", err);

    locker.execute_batch("COMMIT;").unwrap();
    assert_eq!(recommender.recommend(user_id, 4).unwrap().len(), 4);
}

#[test]
fn test_recommender_is_shared_across_threads() {
    let library = TestLibrary::create();
    let user_id = library.add_user(TEST_USER);
    library.play(user_id, ROCK_TRACK_IDS[0], 2);
    let recommender = Arc::new(library.recommender(ExhaustedCatalogPolicy::AllowRepeats));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let recommender = recommender.clone();
            thread::spawn(move || recommender.recommend(user_id, 8).unwrap())
        })
        .collect();

    for handle in handles {
        let result = handle.join().unwrap();
        assert_eq!(result.len(), 8);
        assert_eq!(ids(&result).len(), 8);
        assert!(!ids(&result).contains(&ROCK_TRACK_IDS[0]));
    }
    assert_eq!(
        library.store.played_track_ids(user_id).unwrap(),
        HashSet::from([ROCK_TRACK_IDS[0]])
    );
}
