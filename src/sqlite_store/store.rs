use super::query::{
    find_tracks_query, id_array, like_pattern, search_tracks_query, TRACK_COLUMNS,
};
use super::schema::MUSIC_VERSIONED_SCHEMAS;
use crate::catalog_store::{
    Artist, ArtistId, CatalogStore, Genre, GenreId, SearchKind, Track, TrackFilter, TrackId,
};
use crate::history_store::{HistoryStore, PlayEvent, TrackPlayCount, UserId};
use crate::sqlite_persistence::{read_schema_version, BASE_DB_VERSION};
use anyhow::{anyhow, bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Row counts of every table, used to report on imports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub genres: usize,
    pub artists: usize,
    pub tracks: usize,
    pub users: usize,
    pub play_events: usize,
}

/// Catalog and listening history in one SQLite database.
#[derive(Clone)]
pub struct SqliteMusicStore {
    conn: Arc<Mutex<Connection>>,
}

fn track_from_row(row: &Row) -> rusqlite::Result<Track> {
    Ok(Track {
        id: row.get(0)?,
        title: row.get(1)?,
        artist_id: row.get(2)?,
        genre_id: row.get(3)?,
    })
}

fn play_count_from_row(row: &Row) -> rusqlite::Result<TrackPlayCount> {
    Ok(TrackPlayCount {
        track_id: row.get(0)?,
        play_count: row.get::<_, i64>(1)? as u64,
    })
}

fn insert_genre(conn: &Connection, genre: &Genre) -> Result<()> {
    conn.execute(
        "INSERT INTO genres (id, name) VALUES (?1, ?2)",
        params![genre.id, genre.name],
    )
    .with_context(|| format!("Failed to insert genre {} ({})", genre.id, genre.name))?;
    Ok(())
}

fn insert_artist(conn: &Connection, artist: &Artist) -> Result<()> {
    conn.execute(
        "INSERT INTO artists (id, name) VALUES (?1, ?2)",
        params![artist.id, artist.name],
    )
    .with_context(|| format!("Failed to insert artist {} ({})", artist.id, artist.name))?;
    Ok(())
}

fn insert_track(conn: &Connection, track: &Track) -> Result<()> {
    conn.execute(
        "INSERT INTO tracks (id, title, artist_id, genre_id) VALUES (?1, ?2, ?3, ?4)",
        params![track.id, track.title, track.artist_id, track.genre_id],
    )
    .with_context(|| format!("Failed to insert track {} ({})", track.id, track.title))?;
    Ok(())
}

fn count_rows(conn: &Connection, table: &str) -> Result<usize> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?;
    Ok(count as usize)
}

impl SqliteMusicStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        Self::with_timeout(db_path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Opens (or creates) the database at `db_path`. A locked database makes
    /// calls fail after `busy_timeout` instead of blocking indefinitely.
    pub fn with_timeout<T: AsRef<Path>>(db_path: T, busy_timeout: Duration) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = if db_path.exists() {
            Connection::open_with_flags(
                db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .with_context(|| format!("Failed to open database {}", db_path.display()))?
        } else {
            info!("Creating music database at {}", db_path.display());
            let conn = Connection::open(db_path)?;
            Self::latest_schema()?.create(&conn)?;
            conn
        };
        Self::from_connection(conn, busy_timeout)
    }

    /// A fresh database that lives only as long as the store.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::latest_schema()?.create(&conn)?;
        Self::from_connection(conn, DEFAULT_BUSY_TIMEOUT)
    }

    fn latest_schema() -> Result<&'static crate::sqlite_persistence::VersionedSchema> {
        MUSIC_VERSIONED_SCHEMAS
            .last()
            .context("No music schema defined")
    }

    fn from_connection(conn: Connection, busy_timeout: Duration) -> Result<Self> {
        conn.busy_timeout(busy_timeout)?;
        // Foreign key enforcement is per connection in SQLite.
        conn.pragma_update(None, "foreign_keys", true)?;

        let version = read_schema_version(&conn)?;
        if version >= MUSIC_VERSIONED_SCHEMAS.len() {
            bail!("Database version {} is too new", version);
        }
        MUSIC_VERSIONED_SCHEMAS
            .get(version)
            .context("Failed to get schema")?
            .validate(&conn)?;

        Self::migrate_if_needed(&conn, version)?;

        Ok(SqliteMusicStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn migrate_if_needed(conn: &Connection, version: usize) -> Result<()> {
        let mut latest_from = version;
        for schema in MUSIC_VERSIONED_SCHEMAS.iter().skip(version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating music db from version {} to {}",
                    latest_from, schema.version
                );
                migration_fn(conn)?;
                latest_from = schema.version;
            }
        }
        conn.pragma_update(None, "user_version", (BASE_DB_VERSION + latest_from) as i64)?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("music database connection lock poisoned"))
    }

    pub fn add_genre(&self, genre: &Genre) -> Result<()> {
        let conn = self.conn()?;
        insert_genre(&conn, genre)
    }

    pub fn add_artist(&self, artist: &Artist) -> Result<()> {
        let conn = self.conn()?;
        insert_artist(&conn, artist)
    }

    pub fn add_track(&self, track: &Track) -> Result<()> {
        let conn = self.conn()?;
        insert_track(&conn, track)
    }

    /// Inserts a whole catalog in a single transaction. Any failing row
    /// (duplicate id, unknown artist or genre) rolls the import back.
    pub fn import_catalog(
        &self,
        genres: &[Genre],
        artists: &[Artist],
        tracks: &[Track],
    ) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for genre in genres {
            insert_genre(&tx, genre)?;
        }
        for artist in artists {
            insert_artist(&tx, artist)?;
        }
        for track in tracks {
            insert_track(&tx, track)?;
        }
        tx.commit()?;
        info!(
            "Imported {} genres, {} artists, {} tracks",
            genres.len(),
            artists.len(),
            tracks.len()
        );
        Ok(())
    }

    pub fn create_user(&self, handle: &str) -> Result<UserId> {
        let conn = self.conn()?;
        conn.execute("INSERT INTO users (handle) VALUES (?1)", params![handle])
            .with_context(|| format!("Failed to create user {}", handle))?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_user_id(&self, handle: &str) -> Result<Option<UserId>> {
        let conn = self.conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM users WHERE handle = ?1",
                params![handle],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    pub fn get_counts(&self) -> Result<StoreCounts> {
        let conn = self.conn()?;
        Ok(StoreCounts {
            genres: count_rows(&conn, "genres")?,
            artists: count_rows(&conn, "artists")?,
            tracks: count_rows(&conn, "tracks")?,
            users: count_rows(&conn, "users")?,
            play_events: count_rows(&conn, "play_events")?,
        })
    }

    fn query_tracks_by_ids(&self, sql: &str, ids: &[i64]) -> Result<Vec<Track>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(sql)?;
        let tracks = stmt
            .query_map(params![id_array(ids)?], track_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tracks)
    }

    fn grouped_play_counts(&self, sql: &str, user_id: UserId) -> Result<HashMap<i64, u64>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(sql)?;
        let counts = stmt
            .query_map(params![user_id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(counts)
    }
}

impl CatalogStore for SqliteMusicStore {
    fn list_tracks(&self) -> Result<Vec<Track>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM tracks ORDER BY id",
            TRACK_COLUMNS
        ))?;
        let tracks = stmt
            .query_map([], track_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tracks)
    }

    fn list_tracks_by_genres(&self, genre_ids: &[GenreId]) -> Result<Vec<Track>> {
        self.query_tracks_by_ids(
            &format!(
                "SELECT {} FROM tracks WHERE genre_id IN (SELECT value FROM json_each(?1)) ORDER BY id",
                TRACK_COLUMNS
            ),
            genre_ids,
        )
    }

    fn list_tracks_by_artists(&self, artist_ids: &[ArtistId]) -> Result<Vec<Track>> {
        self.query_tracks_by_ids(
            &format!(
                "SELECT {} FROM tracks WHERE artist_id IN (SELECT value FROM json_each(?1)) ORDER BY id",
                TRACK_COLUMNS
            ),
            artist_ids,
        )
    }

    fn find_tracks(&self, filter: &TrackFilter, limit: usize) -> Result<Vec<Track>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let (sql, values) = find_tracks_query(filter, limit)?;
        debug!("find_tracks: {}", sql);
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let tracks = stmt
            .query_map(rusqlite::params_from_iter(values.iter()), track_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tracks)
    }

    fn get_tracks(&self, track_ids: &[TrackId]) -> Result<Vec<Track>> {
        self.query_tracks_by_ids(
            &format!(
                "SELECT {} FROM tracks WHERE id IN (SELECT value FROM json_each(?1)) ORDER BY id",
                TRACK_COLUMNS
            ),
            track_ids,
        )
    }

    fn get_artists(&self, artist_ids: &[ArtistId]) -> Result<Vec<Artist>> {
        if artist_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, name FROM artists WHERE id IN (SELECT value FROM json_each(?1)) ORDER BY id",
        )?;
        let artists = stmt
            .query_map(params![id_array(artist_ids)?], |row| {
                Ok(Artist {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artists)
    }

    fn get_genres(&self, genre_ids: &[GenreId]) -> Result<Vec<Genre>> {
        if genre_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, name FROM genres WHERE id IN (SELECT value FROM json_each(?1)) ORDER BY id",
        )?;
        let genres = stmt
            .query_map(params![id_array(genre_ids)?], |row| {
                Ok(Genre {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(genres)
    }

    fn get_tracks_count(&self) -> Result<usize> {
        let conn = self.conn()?;
        count_rows(&conn, "tracks")
    }

    fn search_tracks(&self, query: &str, kind: SearchKind) -> Result<Vec<Track>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&search_tracks_query(kind))?;
        let tracks = stmt
            .query_map(params![like_pattern(query)], track_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tracks)
    }
}

impl HistoryStore for SqliteMusicStore {
    fn record_play(&self, event: &PlayEvent) -> Result<i64> {
        if event.user_id <= 0 {
            bail!("Invalid user id {}", event.user_id);
        }
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO play_events (user_id, track_id, played_at) VALUES (?1, ?2, ?3)",
            params![event.user_id, event.track_id, event.played_at],
        )
        .with_context(|| {
            format!(
                "Failed to record play of track {} by user {}",
                event.track_id, event.user_id
            )
        })?;
        Ok(conn.last_insert_rowid())
    }

    fn played_track_ids(&self, user_id: UserId) -> Result<HashSet<TrackId>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare_cached("SELECT DISTINCT track_id FROM play_events WHERE user_id = ?1")?;
        let ids = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<Result<HashSet<TrackId>, _>>()?;
        Ok(ids)
    }

    fn genre_play_counts(&self, user_id: UserId) -> Result<HashMap<GenreId, u64>> {
        self.grouped_play_counts(
            "SELECT t.genre_id, COUNT(*) FROM play_events p \
             JOIN tracks t ON t.id = p.track_id \
             WHERE p.user_id = ?1 AND t.genre_id IS NOT NULL \
             GROUP BY t.genre_id",
            user_id,
        )
    }

    fn artist_play_counts(&self, user_id: UserId) -> Result<HashMap<ArtistId, u64>> {
        self.grouped_play_counts(
            "SELECT t.artist_id, COUNT(*) FROM play_events p \
             JOIN tracks t ON t.id = p.track_id \
             WHERE p.user_id = ?1 \
             GROUP BY t.artist_id",
            user_id,
        )
    }

    fn user_top_tracks(&self, user_id: UserId, limit: usize) -> Result<Vec<TrackPlayCount>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT track_id, COUNT(*) AS plays FROM play_events WHERE user_id = ?1 \
             GROUP BY track_id ORDER BY plays DESC, track_id ASC LIMIT ?2",
        )?;
        let top = stmt
            .query_map(params![user_id, limit as i64], play_count_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(top)
    }

    fn popular_tracks(&self, limit: usize) -> Result<Vec<TrackPlayCount>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT t.id, COUNT(p.id) AS plays FROM tracks t \
             LEFT JOIN play_events p ON p.track_id = t.id \
             GROUP BY t.id ORDER BY plays DESC, t.id ASC LIMIT ?1",
        )?;
        let popular = stmt
            .query_map(params![limit as i64], play_count_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(popular)
    }
}
