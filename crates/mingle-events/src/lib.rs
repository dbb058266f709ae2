//! Event model and stores for the Mingle platform.
//!
//! Implements event persistence, participation (joining an event, optionally
//! under a per-event pseudonym), the append-only event chat, and tags.
//!
//! Every function here is a plain operation over `&rusqlite::Connection`;
//! the HTTP layer owns pooling and blocking-task placement. Identity
//! projection does not happen here — stores return raw records and the
//! assembler in the server crate decides what a viewer may see.

mod error;
mod event;
mod message;
mod participation;
mod tag;

pub use error::EventError;
pub use event::{
    create_event, get_event, list_upcoming_events, CreateEventParams, Event, EventWithOwner,
};
pub use message::{
    create_message, list_messages, list_messages_with_senders, ChatMessage, MessageWithSender,
};
pub use participation::{
    find_participation, join_event, list_event_participants, list_participations,
    participation_map_for_events, EventParticipant, Participation,
};
pub use tag::{create_tag, list_tags, list_tags_by_ids, tag_event, tags_for_events, Tag};
