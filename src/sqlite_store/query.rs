//! Renders a [`TrackFilter`] to a parameterized SQL query.
//!
//! Id sets are bound as a single JSON array parameter and expanded with
//! `json_each`, so the statement text never contains caller values and the
//! parameter count does not grow with the size of the exclusion set.

use crate::catalog_store::{SearchKind, TrackFilter};
use anyhow::Result;
use rusqlite::types::Value;
use std::collections::BTreeSet;

pub(super) const TRACK_COLUMNS: &str = "id, title, artist_id, genre_id";

/// Binds a set of ids as one JSON array parameter.
pub(super) fn id_array<'a, I>(ids: I) -> Result<Value>
where
    I: IntoIterator<Item = &'a i64>,
{
    let ids: Vec<i64> = ids.into_iter().copied().collect();
    Ok(Value::Text(serde_json::to_string(&ids)?))
}

fn in_set(column: &str, ids: &BTreeSet<i64>, params: &mut Vec<Value>) -> Result<String> {
    params.push(id_array(ids)?);
    Ok(format!(
        "{} IN (SELECT value FROM json_each(?{}))",
        column,
        params.len()
    ))
}

/// Builds the `find_tracks` query: matching tracks in random order, at most
/// `limit` rows.
pub(super) fn find_tracks_query(filter: &TrackFilter, limit: usize) -> Result<(String, Vec<Value>)> {
    let mut params = Vec::new();
    let mut clauses = Vec::new();

    if !filter.is_unrestricted() {
        let mut alternatives = Vec::new();
        if !filter.genre_ids().is_empty() {
            alternatives.push(in_set("genre_id", filter.genre_ids(), &mut params)?);
        }
        if !filter.artist_ids().is_empty() {
            alternatives.push(in_set("artist_id", filter.artist_ids(), &mut params)?);
        }
        clauses.push(format!("({})", alternatives.join(" OR ")));
    }

    if !filter.excluded_ids().is_empty() {
        clauses.push(format!(
            "NOT {}",
            in_set("id", filter.excluded_ids(), &mut params)?
        ));
    }

    let mut sql = format!("SELECT {} FROM tracks", TRACK_COLUMNS);
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    params.push(Value::Integer(limit.min(i64::MAX as usize) as i64));
    sql.push_str(&format!(" ORDER BY RANDOM() LIMIT ?{}", params.len()));

    Ok((sql, params))
}

/// `LIKE` pattern for a substring match on `query`. Wildcards typed by the
/// user are escaped with a backslash.
pub(super) fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Builds the `search_tracks` query. The pattern is bound once as `?1`.
pub(super) fn search_tracks_query(kind: SearchKind) -> String {
    let condition = match kind {
        SearchKind::Title => "t.title LIKE ?1 ESCAPE '\\'",
        SearchKind::Artist => "a.name LIKE ?1 ESCAPE '\\'",
        SearchKind::All => {
            "t.title LIKE ?1 ESCAPE '\\' OR a.name LIKE ?1 ESCAPE '\\' \
             OR g.name LIKE ?1 ESCAPE '\\'"
        }
    };
    format!(
        "SELECT t.id, t.title, t.artist_id, t.genre_id FROM tracks t \
         JOIN artists a ON a.id = t.artist_id \
         LEFT JOIN genres g ON g.id = t.genre_id \
         WHERE {} ORDER BY t.title, t.id",
        condition
    )
}
