//! Error types for the event stores.

use thiserror::Error;

/// Errors that can occur during event, participation, chat, or tag
/// operations.
#[derive(Debug, Error)]
pub enum EventError {
    /// A database operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The (user, event) participation pair already exists.
    #[error("user {user_id} already joined event {event_id}")]
    AlreadyJoined {
        /// The joining user.
        user_id: String,
        /// The target event.
        event_id: String,
    },

    /// A tag with this name already exists.
    #[error("tag already exists: {0}")]
    TagExists(String),
}
