//! Response assembly for the event read paths.
//!
//! Everything here is a pure function over already-loaded rows: the handlers
//! fetch the event, its participations, and the viewer's [`FollowSets`], and
//! this module decides which identity facade each subject gets.
//!
//! The follow-visibility gate applies to the event **owner only**. A
//! participant's or chat sender's real identity is shown to every viewer of
//! the payload unless that participant chose a pseudonym. That asymmetry is
//! deliberate product behavior and must survive refactors.

use std::collections::HashMap;

use mingle_events::{
    Event, EventParticipant, EventWithOwner, MessageWithSender, Participation, Tag,
};
use mingle_graph::{can_reveal, project, FollowSets};
use mingle_identity::User;
use mingle_types::DisplayIdentity;
use serde::Serialize;

/// One participant row in the event-detail payload.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantView {
    #[serde(flatten)]
    pub identity: DisplayIdentity,
    pub is_owner: bool,
}

/// The event-detail payload.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetailView {
    #[serde(flatten)]
    pub event: Event,
    pub owner: DisplayIdentity,
    pub tags: Vec<Tag>,
    pub participants: Vec<ParticipantView>,
    pub has_joined: bool,
}

/// One event in the event-listing payload. Participants are not included
/// in the collection view.
#[derive(Debug, Clone, Serialize)]
pub struct EventListItemView {
    #[serde(flatten)]
    pub event: Event,
    pub owner: DisplayIdentity,
    pub tags: Vec<Tag>,
}

/// One message in the chat payload.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessageView {
    pub id: String,
    pub content: String,
    pub created_at: String,
    pub sender: DisplayIdentity,
}

/// Projects the owner's identity for `viewer_id` under the event's
/// visibility level.
pub fn owner_identity(
    event: &Event,
    owner: &User,
    owner_pseudonym: Option<&str>,
    viewer_id: &str,
    follows: &FollowSets,
) -> DisplayIdentity {
    let reveal = can_reveal(event.visibility, viewer_id, &event.owner_id, follows);
    project(owner, owner_pseudonym, reveal)
}

/// Assembles the event-detail payload.
///
/// The owner goes through the full visibility gate; each participant is
/// projected with reveal unconditionally allowed, so only their own
/// pseudonym can alter what is shown.
pub fn event_detail(
    loaded: EventWithOwner,
    participants: Vec<EventParticipant>,
    viewer_id: &str,
    follows: &FollowSets,
) -> EventDetailView {
    let owner_pseudonym = participants
        .iter()
        .find(|p| p.participation.user_id == loaded.event.owner_id)
        .and_then(|p| p.participation.anonymous_name.as_deref());

    let owner = owner_identity(
        &loaded.event,
        &loaded.owner,
        owner_pseudonym,
        viewer_id,
        follows,
    );

    let has_joined = participants
        .iter()
        .any(|p| p.participation.user_id == viewer_id);

    let participant_views = participants
        .iter()
        .map(|p| ParticipantView {
            identity: project(&p.user, p.participation.anonymous_name.as_deref(), true),
            is_owner: p.participation.user_id == loaded.event.owner_id,
        })
        .collect();

    EventDetailView {
        event: loaded.event,
        owner,
        tags: loaded.tags,
        participants: participant_views,
        has_joined,
    }
}

/// Assembles the event-listing payload.
///
/// `participations` is the batched lookup keyed by `(event_id, user_id)`;
/// only the owner's entry is consulted per event.
pub fn event_listing(
    events: Vec<EventWithOwner>,
    participations: &HashMap<(String, String), Participation>,
    viewer_id: &str,
    follows: &FollowSets,
) -> Vec<EventListItemView> {
    events
        .into_iter()
        .map(|loaded| {
            let owner_pseudonym = participations
                .get(&(loaded.event.id.clone(), loaded.event.owner_id.clone()))
                .and_then(|p| p.anonymous_name.as_deref());

            let owner = owner_identity(
                &loaded.event,
                &loaded.owner,
                owner_pseudonym,
                viewer_id,
                follows,
            );

            EventListItemView {
                event: loaded.event,
                owner,
                tags: loaded.tags,
            }
        })
        .collect()
}

/// Assembles the chat payload.
///
/// Senders are never masked by the follow policy; the pseudonym map built
/// from the event's participations is the only identity transformation.
pub fn chat_listing(
    messages: Vec<MessageWithSender>,
    participations: &[Participation],
) -> Vec<ChatMessageView> {
    let pseudonyms: HashMap<&str, &str> = participations
        .iter()
        .filter_map(|p| {
            p.anonymous_name
                .as_deref()
                .map(|name| (p.user_id.as_str(), name))
        })
        .collect();

    messages
        .into_iter()
        .map(|with_sender| {
            let pseudonym = pseudonyms
                .get(with_sender.message.sender_id.as_str())
                .copied();
            ChatMessageView {
                sender: project(&with_sender.sender, pseudonym, true),
                id: with_sender.message.id,
                content: with_sender.message.content,
                created_at: with_sender.message.created_at,
            }
        })
        .collect()
}
