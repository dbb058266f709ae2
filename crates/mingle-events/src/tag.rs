//! Tag store. Tags carry no visibility rule of their own.

use std::collections::HashMap;

use rusqlite::{params, params_from_iter, Connection, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EventError;

/// A label that can be attached to any number of events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Unique tag id.
    pub id: String,
    /// Globally unique tag name.
    pub name: String,
    /// Display color as a `#RRGGBB` string.
    pub color: String,
}

/// Creates a new tag.
///
/// # Errors
///
/// Returns [`EventError::TagExists`] when the name is taken.
pub fn create_tag(conn: &Connection, name: &str, color: &str) -> Result<Tag, EventError> {
    let id = Uuid::new_v4().to_string();
    conn.query_row(
        "INSERT INTO tags (id, name, color) VALUES (?1, ?2, ?3)
         RETURNING id, name, color",
        params![id, name, color],
        map_row_to_tag,
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(code, _)
            if code.code == rusqlite::ffi::ErrorCode::ConstraintViolation =>
        {
            EventError::TagExists(name.to_string())
        }
        other => EventError::Database(other),
    })
}

/// Lists all tags ordered by name.
pub fn list_tags(conn: &Connection) -> Result<Vec<Tag>, EventError> {
    let mut stmt = conn.prepare("SELECT id, name, color FROM tags ORDER BY name ASC")?;
    let rows = stmt.query_map([], map_row_to_tag)?;
    let mut tags = Vec::new();
    for row in rows {
        tags.push(row?);
    }
    Ok(tags)
}

/// Fetches the tags matching `ids`. Unknown ids are simply absent from the
/// result, which is how the API layer detects invalid tag references.
pub fn list_tags_by_ids(conn: &Connection, ids: &[String]) -> Result<Vec<Tag>, EventError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; ids.len()].join(",");
    let sql = format!("SELECT id, name, color FROM tags WHERE id IN ({placeholders})");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(ids), map_row_to_tag)?;
    let mut tags = Vec::new();
    for row in rows {
        tags.push(row?);
    }
    Ok(tags)
}

/// Attaches a tag to an event. Idempotent.
pub fn tag_event(conn: &Connection, event_id: &str, tag_id: &str) -> Result<(), EventError> {
    conn.execute(
        "INSERT OR IGNORE INTO event_tags (event_id, tag_id) VALUES (?1, ?2)",
        params![event_id, tag_id],
    )?;
    Ok(())
}

/// Loads the tags of many events in one query, keyed by event id. Tags come
/// back name-ordered within each event.
pub fn tags_for_events(
    conn: &Connection,
    event_ids: &[String],
) -> Result<HashMap<String, Vec<Tag>>, EventError> {
    if event_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = vec!["?"; event_ids.len()].join(",");
    let sql = format!(
        "SELECT et.event_id, t.id, t.name, t.color
         FROM event_tags et
         JOIN tags t ON t.id = et.tag_id
         WHERE et.event_id IN ({placeholders})
         ORDER BY t.name ASC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(event_ids), |row| {
        Ok((
            row.get::<_, String>(0)?,
            Tag {
                id: row.get(1)?,
                name: row.get(2)?,
                color: row.get(3)?,
            },
        ))
    })?;

    let mut map: HashMap<String, Vec<Tag>> = HashMap::new();
    for row in rows {
        let (event_id, tag) = row?;
        map.entry(event_id).or_default().push(tag);
    }
    Ok(map)
}

fn map_row_to_tag(row: &Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
    })
}
