//! Append-only event chat store.

use mingle_identity::User;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EventError;

/// A message in an event's chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message id.
    pub id: String,
    /// The event this message belongs to.
    pub event_id: String,
    /// The authoring user. Must hold a participation for the event; the
    /// HTTP layer enforces that before any write.
    pub sender_id: String,
    /// Message text.
    pub content: String,
    /// Creation timestamp (ISO 8601).
    pub created_at: String,
}

/// Appends a message to an event's chat.
pub fn create_message(
    conn: &Connection,
    event_id: &str,
    sender_id: &str,
    content: &str,
) -> Result<ChatMessage, EventError> {
    let id = Uuid::new_v4().to_string();
    let message = conn.query_row(
        "INSERT INTO chat_messages (id, event_id, sender_id, content)
         VALUES (?1, ?2, ?3, ?4)
         RETURNING id, event_id, sender_id, content, created_at",
        params![id, event_id, sender_id, content],
        map_row_to_message,
    )?;
    Ok(message)
}

/// Lists an event's messages in ascending creation order.
pub fn list_messages(conn: &Connection, event_id: &str) -> Result<Vec<ChatMessage>, EventError> {
    // rowid breaks ties between messages created within the same second.
    let mut stmt = conn.prepare(
        "SELECT id, event_id, sender_id, content, created_at
         FROM chat_messages WHERE event_id = ?1
         ORDER BY created_at ASC, rowid ASC",
    )?;

    let rows = stmt.query_map([event_id], map_row_to_message)?;
    let mut messages = Vec::new();
    for row in rows {
        messages.push(row?);
    }
    Ok(messages)
}

/// A message joined with its sender's raw profile, as loaded for the chat
/// read path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageWithSender {
    pub message: ChatMessage,
    pub sender: User,
}

/// Lists an event's messages with sender profiles, ascending by creation
/// time.
pub fn list_messages_with_senders(
    conn: &Connection,
    event_id: &str,
) -> Result<Vec<MessageWithSender>, EventError> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.event_id, m.sender_id, m.content, m.created_at,
                u.id, u.external_id, u.display_name, u.image_url, u.is_verified, u.created_at
         FROM chat_messages m
         JOIN users u ON u.id = m.sender_id
         WHERE m.event_id = ?1
         ORDER BY m.created_at ASC, m.rowid ASC",
    )?;

    let rows = stmt.query_map([event_id], |row| {
        Ok(MessageWithSender {
            message: map_row_to_message(row)?,
            sender: User {
                id: row.get(5)?,
                external_id: row.get(6)?,
                display_name: row.get(7)?,
                image_url: row.get(8)?,
                is_verified: row.get(9)?,
                created_at: row.get(10)?,
            },
        })
    })?;

    let mut messages = Vec::new();
    for row in rows {
        messages.push(row?);
    }
    Ok(messages)
}

fn map_row_to_message(row: &Row) -> rusqlite::Result<ChatMessage> {
    Ok(ChatMessage {
        id: row.get(0)?,
        event_id: row.get(1)?,
        sender_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}
