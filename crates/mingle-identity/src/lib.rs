//! User accounts for the Mingle platform.
//!
//! Manages the `users` table, linking external auth-provider subjects to
//! platform accounts. Profile fields (display name, avatar, verified badge)
//! are owned by the auth provider and mirrored here at account creation;
//! from every other crate's perspective a [`User`] is immutable.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("user not found: {0}")]
    NotFound(String),
    #[error("user already exists for subject: {0}")]
    AlreadyExists(String),
}

/// A platform account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user id.
    pub id: String,
    /// Subject issued by the external auth provider.
    pub external_id: String,
    /// Real display name.
    pub display_name: String,
    /// Avatar reference, if the provider supplied one.
    pub image_url: Option<String>,
    /// Verified badge.
    pub is_verified: bool,
    /// Creation timestamp (ISO 8601).
    pub created_at: String,
}

/// Creates a new user for the given auth subject.
///
/// # Errors
///
/// Returns [`IdentityError::AlreadyExists`] if an account already exists for
/// `external_id`, or [`IdentityError::Database`] on any other SQL failure.
pub fn create_user(
    conn: &Connection,
    external_id: &str,
    display_name: &str,
    image_url: Option<&str>,
) -> Result<User, IdentityError> {
    let id = Uuid::new_v4().to_string();
    let result = conn.execute(
        "INSERT INTO users (id, external_id, display_name, image_url) VALUES (?1, ?2, ?3, ?4)",
        params![id, external_id, display_name, image_url],
    );

    match result {
        Ok(_) => get_user(conn, &id),
        Err(rusqlite::Error::SqliteFailure(code, _))
            if code.code == rusqlite::ffi::ErrorCode::ConstraintViolation =>
        {
            Err(IdentityError::AlreadyExists(external_id.to_string()))
        }
        Err(e) => Err(IdentityError::Database(e)),
    }
}

/// Retrieves a user by platform id.
///
/// # Errors
///
/// Returns [`IdentityError::NotFound`] if no such user exists.
pub fn get_user(conn: &Connection, id: &str) -> Result<User, IdentityError> {
    conn.query_row(
        "SELECT id, external_id, display_name, image_url, is_verified, created_at
         FROM users WHERE id = ?1",
        [id],
        map_row_to_user,
    )
    .optional()?
    .ok_or_else(|| IdentityError::NotFound(id.to_string()))
}

/// Looks up a user by the external auth subject.
///
/// Returns `Ok(None)` when no account has been created for the subject yet.
pub fn find_user_by_external_id(
    conn: &Connection,
    external_id: &str,
) -> Result<Option<User>, IdentityError> {
    conn.query_row(
        "SELECT id, external_id, display_name, image_url, is_verified, created_at
         FROM users WHERE external_id = ?1",
        [external_id],
        map_row_to_user,
    )
    .optional()
    .map_err(IdentityError::Database)
}

fn map_row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        external_id: row.get(1)?,
        display_name: row.get(2)?,
        image_url: row.get(3)?,
        is_verified: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mingle_db::run_migrations;
    use rusqlite::Connection;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().expect("failed to open in-memory db");
        run_migrations(&conn).expect("failed to run migrations");
        conn
    }

    #[test]
    fn create_and_fetch_user() {
        let conn = setup_db();

        let user = create_user(&conn, "auth0|alice", "Alice", Some("https://img/alice.png"))
            .expect("create failed");
        assert_eq!(user.external_id, "auth0|alice");
        assert_eq!(user.display_name, "Alice");
        assert_eq!(user.image_url.as_deref(), Some("https://img/alice.png"));
        assert!(!user.is_verified);

        let fetched = get_user(&conn, &user.id).expect("get failed");
        assert_eq!(fetched, user);

        let found = find_user_by_external_id(&conn, "auth0|alice")
            .expect("lookup failed")
            .expect("should exist");
        assert_eq!(found.id, user.id);
    }

    #[test]
    fn duplicate_subject_is_rejected() {
        let conn = setup_db();

        create_user(&conn, "auth0|bob", "Bob", None).expect("first create failed");
        let err = create_user(&conn, "auth0|bob", "Bob Again", None).unwrap_err();
        match err {
            IdentityError::AlreadyExists(subject) => assert_eq!(subject, "auth0|bob"),
            other => panic!("expected AlreadyExists, got {other:?}"),
        }
    }

    #[test]
    fn unknown_lookups() {
        let conn = setup_db();

        assert!(find_user_by_external_id(&conn, "auth0|ghost")
            .expect("lookup failed")
            .is_none());

        let err = get_user(&conn, "no-such-id").unwrap_err();
        match err {
            IdentityError::NotFound(id) => assert_eq!(id, "no-such-id"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
