//! SQLite schema of the music database.
//!
//! A single file holds the catalog (genres, artists, tracks) and the
//! listening history (users, play events) so affinity counts are a join.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

pub(super) const GENRES_TABLE: Table = Table {
    name: "genres",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true, is_unique = true),
    ],
    indices: &[],
};

pub(super) const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_artists_name", "name")],
};

pub(super) const TRACKS_TABLE: Table = Table {
    name: "tracks",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "artists",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "genre_id",
            &SqlType::Integer,
            foreign_key = Some(&ForeignKey {
                foreign_table: "genres",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::SetNull,
            })
        ),
    ],
    indices: &[
        ("idx_tracks_artist", "artist_id"),
        ("idx_tracks_genre", "genre_id"),
    ],
};

pub(super) const USERS_TABLE: Table = Table {
    name: "users",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("handle", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
};

/// Append-only. Repeated (user, track) pairs are meaningful.
pub(super) const PLAY_EVENTS_TABLE: Table = Table {
    name: "play_events",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "users",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "track_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "tracks",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("played_at", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_play_events_user", "user_id"),
        ("idx_play_events_track", "track_id"),
    ],
};

pub const MUSIC_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        GENRES_TABLE,
        ARTISTS_TABLE,
        TRACKS_TABLE,
        USERS_TABLE,
        PLAY_EVENTS_TABLE,
    ],
    migration: None,
}];
