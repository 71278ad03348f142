//! Shared constants for end-to-end tests
//!
//! When the test catalog changes, update only this file.

// ============================================================================
// Test Catalog IDs
// ============================================================================

pub const ROCK_GENRE_ID: i64 = 1;
pub const ROCK_GENRE_NAME: &str = "Rock";

pub const JAZZ_GENRE_ID: i64 = 2;
pub const JAZZ_GENRE_NAME: &str = "Jazz";

/// Artist of every Rock track
pub const ARTIST_1_ID: i64 = 1;
pub const ARTIST_1_NAME: &str = "The Test Band";

/// Artist of every Jazz track
pub const ARTIST_2_ID: i64 = 2;
pub const ARTIST_2_NAME: &str = "Jazz Ensemble";

/// Rock tracks, by The Test Band
pub const ROCK_TRACK_IDS: [i64; 5] = [1, 2, 3, 4, 5];

/// Jazz tracks, by Jazz Ensemble
pub const JAZZ_TRACK_IDS: [i64; 5] = [6, 7, 8, 9, 10];

pub const CATALOG_SIZE: usize = 10;

// ============================================================================
// Test Users
// ============================================================================

pub const TEST_USER: &str = "testuser";
pub const OTHER_USER: &str = "otheruser";
