//! Event persistence.

use mingle_identity::User;
use mingle_types::Visibility;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EventError;
use crate::tag::{tags_for_events, Tag};

/// A stored event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event id.
    pub id: String,
    /// The creating user. Fixed at creation.
    pub owner_id: String,
    /// Event title.
    pub title: String,
    /// Optional long-form description.
    pub description: Option<String>,
    /// Optional cover image reference.
    pub image_url: Option<String>,
    /// Where the event takes place.
    pub location: String,
    /// Entry price in the platform's minor currency unit.
    pub price: i64,
    /// When the event takes place (RFC 3339).
    pub scheduled_at: String,
    /// Who may see the owner's real identity. `None` when the stored value
    /// is unrecognized, in which case the owner is masked for everyone but
    /// themselves.
    pub visibility: Option<Visibility>,
    /// Creation timestamp (ISO 8601).
    pub created_at: String,
}

/// An event together with its owner's raw profile and tags, as loaded for
/// the read paths. The owner here is the *unprojected* record; what a viewer
/// actually sees is decided later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventWithOwner {
    pub event: Event,
    pub owner: User,
    pub tags: Vec<Tag>,
}

/// Parameters for creating a new event.
#[derive(Debug, Clone)]
pub struct CreateEventParams {
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub location: String,
    pub price: i64,
    pub scheduled_at: String,
    pub visibility: Visibility,
}

const EVENT_OWNER_COLUMNS: &str = "
    e.id, e.owner_id, e.title, e.description, e.image_url, e.location,
    e.price, e.scheduled_at, e.visibility, e.created_at,
    u.id, u.external_id, u.display_name, u.image_url, u.is_verified, u.created_at";

/// Creates a new event. The owner's participation record is a separate
/// insert owned by the caller.
pub fn create_event(conn: &Connection, params: &CreateEventParams) -> Result<Event, EventError> {
    let id = Uuid::new_v4().to_string();
    let event = conn.query_row(
        "INSERT INTO events (
            id, owner_id, title, description, image_url, location,
            price, scheduled_at, visibility
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        RETURNING id, owner_id, title, description, image_url, location,
                  price, scheduled_at, visibility, created_at",
        params![
            id,
            params.owner_id,
            params.title,
            params.description,
            params.image_url,
            params.location,
            params.price,
            params.scheduled_at,
            params.visibility.as_str(),
        ],
        map_row_to_event,
    )?;
    Ok(event)
}

/// Retrieves an event with its owner profile and tags.
///
/// # Errors
///
/// Returns [`EventError::NotFound`] if no such event exists.
pub fn get_event(conn: &Connection, event_id: &str) -> Result<EventWithOwner, EventError> {
    let found = conn
        .query_row(
            &format!(
                "SELECT {EVENT_OWNER_COLUMNS}
                 FROM events e
                 JOIN users u ON u.id = e.owner_id
                 WHERE e.id = ?1"
            ),
            [event_id],
            map_row_to_event_with_owner,
        )
        .optional()?;

    let Some(mut with_owner) = found else {
        return Err(EventError::NotFound(event_id.to_string()));
    };

    let mut tag_map = tags_for_events(conn, std::slice::from_ref(&with_owner.event.id))?;
    with_owner.tags = tag_map.remove(&with_owner.event.id).unwrap_or_default();
    Ok(with_owner)
}

/// Lists upcoming events (scheduled now or later) in ascending schedule
/// order, each with its owner profile and tags.
pub fn list_upcoming_events(conn: &Connection) -> Result<Vec<EventWithOwner>, EventError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_OWNER_COLUMNS}
         FROM events e
         JOIN users u ON u.id = e.owner_id
         WHERE datetime(e.scheduled_at) >= datetime('now')
         ORDER BY datetime(e.scheduled_at) ASC"
    ))?;

    let rows = stmt.query_map([], map_row_to_event_with_owner)?;
    let mut events = Vec::new();
    for row in rows {
        events.push(row?);
    }

    let event_ids: Vec<String> = events.iter().map(|e| e.event.id.clone()).collect();
    let mut tag_map = tags_for_events(conn, &event_ids)?;
    for with_owner in &mut events {
        with_owner.tags = tag_map.remove(&with_owner.event.id).unwrap_or_default();
    }

    Ok(events)
}

fn map_row_to_event(row: &Row) -> rusqlite::Result<Event> {
    let id: String = row.get(0)?;
    let visibility_str: String = row.get(8)?;
    let visibility = Visibility::parse(&visibility_str);
    if visibility.is_none() {
        // Stored value outside the known set: a configuration error. The
        // reveal policy fails closed for this event.
        tracing::warn!(
            event_id = %id,
            value = %visibility_str,
            "unrecognized visibility level, owner will be masked"
        );
    }

    Ok(Event {
        id,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        image_url: row.get(4)?,
        location: row.get(5)?,
        price: row.get(6)?,
        scheduled_at: row.get(7)?,
        visibility,
        created_at: row.get(9)?,
    })
}

fn map_row_to_event_with_owner(row: &Row) -> rusqlite::Result<EventWithOwner> {
    let event = map_row_to_event(row)?;
    let owner = User {
        id: row.get(10)?,
        external_id: row.get(11)?,
        display_name: row.get(12)?,
        image_url: row.get(13)?,
        is_verified: row.get(14)?,
        created_at: row.get(15)?,
    };
    Ok(EventWithOwner {
        event,
        owner,
        tags: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{create_tag, tag_event};
    use mingle_db::run_migrations;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().expect("failed to open in-memory db");
        run_migrations(&conn).expect("failed to run migrations");
        conn.execute(
            "INSERT INTO users (id, external_id, display_name, is_verified)
             VALUES ('u-owner', 'ext-owner', 'Owner', 1)",
            [],
        )
        .expect("failed to seed user");
        conn
    }

    fn event_params(title: &str, scheduled_at: &str) -> CreateEventParams {
        CreateEventParams {
            owner_id: "u-owner".to_string(),
            title: title.to_string(),
            description: None,
            image_url: None,
            location: "Shibuya".to_string(),
            price: 1500,
            scheduled_at: scheduled_at.to_string(),
            visibility: Visibility::Public,
        }
    }

    #[test]
    fn create_and_get_event() {
        let conn = setup_db();

        let event = create_event(&conn, &event_params("Boardgames", "2030-05-01T18:00:00Z"))
            .expect("create failed");
        assert_eq!(event.visibility, Some(Visibility::Public));

        let tag = create_tag(&conn, "games", "#AA00FF").expect("tag create failed");
        tag_event(&conn, &event.id, &tag.id).expect("tag link failed");

        let loaded = get_event(&conn, &event.id).expect("get failed");
        assert_eq!(loaded.event, event);
        assert_eq!(loaded.owner.display_name, "Owner");
        assert!(loaded.owner.is_verified);
        assert_eq!(loaded.tags, vec![tag]);
    }

    #[test]
    fn get_unknown_event() {
        let conn = setup_db();
        let err = get_event(&conn, "nope").unwrap_err();
        match err {
            EventError::NotFound(id) => assert_eq!(id, "nope"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn listing_is_upcoming_only_and_ascending() {
        let conn = setup_db();

        create_event(&conn, &event_params("Later", "2031-01-01T10:00:00Z")).expect("create failed");
        create_event(&conn, &event_params("Sooner", "2030-01-01T10:00:00Z"))
            .expect("create failed");
        create_event(&conn, &event_params("Past", "2001-01-01T10:00:00Z")).expect("create failed");

        let events = list_upcoming_events(&conn).expect("list failed");
        let titles: Vec<&str> = events.iter().map(|e| e.event.title.as_str()).collect();
        assert_eq!(titles, vec!["Sooner", "Later"]);
    }

    #[test]
    fn unrecognized_visibility_maps_to_none() {
        let conn = setup_db();

        let event = create_event(&conn, &event_params("Odd", "2030-01-01T10:00:00Z"))
            .expect("create failed");
        conn.execute(
            "UPDATE events SET visibility = 'FRIENDS_ONLY' WHERE id = ?1",
            [&event.id],
        )
        .expect("update failed");

        let loaded = get_event(&conn, &event.id).expect("get failed");
        assert_eq!(loaded.event.visibility, None);
    }
}
