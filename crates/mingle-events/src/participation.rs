//! Participation store: who joined which event, under which pseudonym.

use std::collections::HashMap;

use mingle_identity::User;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EventError;

/// A user's membership in one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    /// Unique participation id.
    pub id: String,
    /// The joined user.
    pub user_id: String,
    /// The joined event.
    pub event_id: String,
    /// Optional per-event pseudonym. Never empty: blank strings are
    /// normalised to `None` before insert.
    pub anonymous_name: Option<String>,
    /// Join timestamp (ISO 8601).
    pub created_at: String,
}

/// Joins `user_id` to `event_id`, optionally under a pseudonym.
///
/// At most one participation may exist per (user, event) pair.
///
/// # Errors
///
/// Returns [`EventError::AlreadyJoined`] on a duplicate pair.
pub fn join_event(
    conn: &Connection,
    user_id: &str,
    event_id: &str,
    anonymous_name: Option<&str>,
) -> Result<Participation, EventError> {
    let anonymous_name = anonymous_name.filter(|name| !name.is_empty());

    let already_joined = || EventError::AlreadyJoined {
        user_id: user_id.to_string(),
        event_id: event_id.to_string(),
    };

    if find_participation(conn, user_id, event_id)?.is_some() {
        return Err(already_joined());
    }

    let id = Uuid::new_v4().to_string();
    conn.query_row(
        "INSERT INTO participations (id, user_id, event_id, anonymous_name)
         VALUES (?1, ?2, ?3, ?4)
         RETURNING id, user_id, event_id, anonymous_name, created_at",
        params![id, user_id, event_id, anonymous_name],
        map_row_to_participation,
    )
    .map_err(|e| match e {
        // A concurrent writer can still land first; surface it as the same
        // conflict the pre-check reports.
        rusqlite::Error::SqliteFailure(code, _)
            if code.code == rusqlite::ffi::ErrorCode::ConstraintViolation =>
        {
            already_joined()
        }
        other => EventError::Database(other),
    })
}

/// Looks up the participation for one (user, event) pair.
pub fn find_participation(
    conn: &Connection,
    user_id: &str,
    event_id: &str,
) -> Result<Option<Participation>, EventError> {
    conn.query_row(
        "SELECT id, user_id, event_id, anonymous_name, created_at
         FROM participations WHERE user_id = ?1 AND event_id = ?2",
        params![user_id, event_id],
        map_row_to_participation,
    )
    .optional()
    .map_err(EventError::Database)
}

/// Lists all participations for an event in join order.
pub fn list_participations(
    conn: &Connection,
    event_id: &str,
) -> Result<Vec<Participation>, EventError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, event_id, anonymous_name, created_at
         FROM participations WHERE event_id = ?1 ORDER BY created_at ASC, rowid ASC",
    )?;

    let rows = stmt.query_map([event_id], map_row_to_participation)?;
    let mut participations = Vec::new();
    for row in rows {
        participations.push(row?);
    }
    Ok(participations)
}

/// A participation joined with the participant's raw profile, as loaded for
/// the event-detail path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventParticipant {
    pub participation: Participation,
    pub user: User,
}

/// Lists an event's participations with each participant's profile, in join
/// order.
pub fn list_event_participants(
    conn: &Connection,
    event_id: &str,
) -> Result<Vec<EventParticipant>, EventError> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.user_id, p.event_id, p.anonymous_name, p.created_at,
                u.id, u.external_id, u.display_name, u.image_url, u.is_verified, u.created_at
         FROM participations p
         JOIN users u ON u.id = p.user_id
         WHERE p.event_id = ?1
         ORDER BY p.created_at ASC, p.rowid ASC",
    )?;

    let rows = stmt.query_map([event_id], |row| {
        Ok(EventParticipant {
            participation: map_row_to_participation(row)?,
            user: User {
                id: row.get(5)?,
                external_id: row.get(6)?,
                display_name: row.get(7)?,
                image_url: row.get(8)?,
                is_verified: row.get(9)?,
                created_at: row.get(10)?,
            },
        })
    })?;

    let mut participants = Vec::new();
    for row in rows {
        participants.push(row?);
    }
    Ok(participants)
}

/// Loads the participations of many events in one query, keyed by
/// `(event_id, user_id)`.
///
/// This is the listing-path batch: one lookup structure per request instead
/// of one query per event.
pub fn participation_map_for_events(
    conn: &Connection,
    event_ids: &[String],
) -> Result<HashMap<(String, String), Participation>, EventError> {
    if event_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = vec!["?"; event_ids.len()].join(",");
    let sql = format!(
        "SELECT id, user_id, event_id, anonymous_name, created_at
         FROM participations WHERE event_id IN ({placeholders})"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(event_ids), map_row_to_participation)?;

    let mut map = HashMap::new();
    for row in rows {
        let participation = row?;
        map.insert(
            (
                participation.event_id.clone(),
                participation.user_id.clone(),
            ),
            participation,
        );
    }
    Ok(map)
}

fn map_row_to_participation(row: &Row) -> rusqlite::Result<Participation> {
    Ok(Participation {
        id: row.get(0)?,
        user_id: row.get(1)?,
        event_id: row.get(2)?,
        anonymous_name: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{create_event, CreateEventParams};
    use mingle_db::run_migrations;
    use mingle_types::Visibility;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().expect("failed to open in-memory db");
        run_migrations(&conn).expect("failed to run migrations");
        for (id, subject, name) in [("u-owner", "ext-owner", "Owner"), ("u-kai", "ext-kai", "Kai")]
        {
            conn.execute(
                "INSERT INTO users (id, external_id, display_name) VALUES (?1, ?2, ?3)",
                params![id, subject, name],
            )
            .expect("failed to seed user");
        }
        conn
    }

    fn make_event(conn: &Connection, title: &str) -> String {
        create_event(
            conn,
            &CreateEventParams {
                owner_id: "u-owner".to_string(),
                title: title.to_string(),
                description: None,
                image_url: None,
                location: "Ueno".to_string(),
                price: 0,
                scheduled_at: "2030-06-01T12:00:00Z".to_string(),
                visibility: Visibility::Public,
            },
        )
        .expect("create event failed")
        .id
    }

    #[test]
    fn join_once_then_conflict() {
        let conn = setup_db();
        let event_id = make_event(&conn, "Picnic");

        let p = join_event(&conn, "u-kai", &event_id, Some("Fox")).expect("join failed");
        assert_eq!(p.anonymous_name.as_deref(), Some("Fox"));

        let err = join_event(&conn, "u-kai", &event_id, None).unwrap_err();
        match err {
            EventError::AlreadyJoined { user_id, event_id: e } => {
                assert_eq!(user_id, "u-kai");
                assert_eq!(e, event_id);
            }
            other => panic!("expected AlreadyJoined, got {other:?}"),
        }

        // The pair count stays at one.
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM participations WHERE user_id = 'u-kai' AND event_id = ?1",
                [&event_id],
                |row| row.get(0),
            )
            .expect("count failed");
        assert_eq!(count, 1);
    }

    #[test]
    fn blank_pseudonym_is_stored_as_null() {
        let conn = setup_db();
        let event_id = make_event(&conn, "Picnic");

        let p = join_event(&conn, "u-kai", &event_id, Some("")).expect("join failed");
        assert_eq!(p.anonymous_name, None);

        let found = find_participation(&conn, "u-kai", &event_id)
            .expect("find failed")
            .expect("should exist");
        assert_eq!(found.anonymous_name, None);
    }

    #[test]
    fn batch_map_is_keyed_by_event_and_user() {
        let conn = setup_db();
        let first = make_event(&conn, "First");
        let second = make_event(&conn, "Second");

        join_event(&conn, "u-owner", &first, Some("Host")).expect("join failed");
        join_event(&conn, "u-kai", &first, None).expect("join failed");
        join_event(&conn, "u-owner", &second, None).expect("join failed");

        let map =
            participation_map_for_events(&conn, &[first.clone(), second.clone()])
                .expect("map failed");
        assert_eq!(map.len(), 3);
        assert_eq!(
            map[&(first.clone(), "u-owner".to_string())]
                .anonymous_name
                .as_deref(),
            Some("Host")
        );
        assert!(map
            .get(&(second.clone(), "u-kai".to_string()))
            .is_none());

        let empty = participation_map_for_events(&conn, &[]).expect("map failed");
        assert!(empty.is_empty());
    }

    #[test]
    fn participations_list_in_join_order() {
        let conn = setup_db();
        let event_id = make_event(&conn, "Picnic");

        join_event(&conn, "u-owner", &event_id, None).expect("join failed");
        join_event(&conn, "u-kai", &event_id, None).expect("join failed");

        let list = list_participations(&conn, &event_id).expect("list failed");
        let users: Vec<&str> = list.iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(users, vec!["u-owner", "u-kai"]);
    }
}
