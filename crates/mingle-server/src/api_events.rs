//! Event handlers: listing, creation, detail, and joining.

use crate::middleware::UserContext;
use crate::views;
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
};
use mingle_events::{
    create_event, get_event, join_event, list_event_participants, list_tags_by_ids,
    list_upcoming_events, participation_map_for_events, tag_event, CreateEventParams, EventError,
};
use mingle_graph::load_follow_sets;
use mingle_types::Visibility;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Maximum length for an event title.
const MAX_TITLE_LEN: usize = 256;
/// Maximum length for an event location.
const MAX_LOCATION_LEN: usize = 256;
/// Maximum length for an event description.
const MAX_DESCRIPTION_LEN: usize = 4096;
/// Maximum length for a per-event pseudonym.
const MAX_PSEUDONYM_LEN: usize = 64;

/// Maps an [`EventError`] to the correct HTTP status code, logging
/// unexpected errors.
///
/// `NotFound` → 404, conflicts → 409, everything else → 500 (logged).
pub(crate) fn event_err_to_status(e: EventError) -> StatusCode {
    match e {
        EventError::NotFound(_) => StatusCode::NOT_FOUND,
        EventError::AlreadyJoined { .. } | EventError::TagExists(_) => StatusCode::CONFLICT,
        EventError::Database(err) => {
            tracing::error!(error = %err, "event store operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Maps a graph error, which has no client-caused variants, to 500.
pub(crate) fn graph_err_to_status(e: mingle_graph::GraphError) -> StatusCode {
    tracing::error!(error = %e, "follow graph operation failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub location: String,
    pub price: i64,
    pub scheduled_at: String,
    #[serde(default)]
    pub tag_ids: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub anonymous_name: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct JoinEventRequest {
    #[serde(default)]
    pub anonymous_name: Option<String>,
}

/// GET /api/events
///
/// Upcoming events in ascending schedule order, each with the owner's
/// identity as this viewer may see it. One batched participation lookup
/// serves every owner-pseudonym check.
pub async fn list_events_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext(viewer)): Extension<UserContext>,
) -> Result<Json<Vec<views::EventListItemView>>, StatusCode> {
    let pool = state.pool.clone();
    let payload = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for list_events");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        let follows = load_follow_sets(&conn, &viewer.id).map_err(graph_err_to_status)?;
        let events = list_upcoming_events(&conn).map_err(event_err_to_status)?;
        let event_ids: Vec<String> = events.iter().map(|e| e.event.id.clone()).collect();
        let participations =
            participation_map_for_events(&conn, &event_ids).map_err(event_err_to_status)?;

        Ok::<_, StatusCode>(views::event_listing(
            events,
            &participations,
            &viewer.id,
            &follows,
        ))
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "list_events task join error");
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    Ok(Json(payload))
}

/// POST /api/events
///
/// Creates an event and auto-joins the owner, optionally under a pseudonym.
/// Every referenced tag must exist.
pub async fn create_event_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext(viewer)): Extension<UserContext>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), StatusCode> {
    if payload.title.is_empty() || payload.title.len() > MAX_TITLE_LEN {
        return Err(StatusCode::BAD_REQUEST);
    }
    if payload.location.is_empty() || payload.location.len() > MAX_LOCATION_LEN {
        return Err(StatusCode::BAD_REQUEST);
    }
    if let Some(ref description) = payload.description {
        if description.len() > MAX_DESCRIPTION_LEN {
            return Err(StatusCode::BAD_REQUEST);
        }
    }
    if let Some(ref name) = payload.anonymous_name {
        if name.len() > MAX_PSEUDONYM_LEN {
            return Err(StatusCode::BAD_REQUEST);
        }
    }
    if payload.price < 0 {
        return Err(StatusCode::BAD_REQUEST);
    }
    if chrono::DateTime::parse_from_rfc3339(&payload.scheduled_at).is_err() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for create_event");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        // All referenced tags must exist before anything is written.
        let known = list_tags_by_ids(&conn, &payload.tag_ids).map_err(event_err_to_status)?;
        if known.len() != payload.tag_ids.len() {
            return Err(StatusCode::BAD_REQUEST);
        }

        let event = create_event(
            &conn,
            &CreateEventParams {
                owner_id: viewer.id.clone(),
                title: payload.title.clone(),
                description: payload.description.clone(),
                image_url: payload.image_url.clone(),
                location: payload.location.clone(),
                price: payload.price,
                scheduled_at: payload.scheduled_at.clone(),
                visibility: payload.visibility,
            },
        )
        .map_err(event_err_to_status)?;

        for tag in &known {
            tag_event(&conn, &event.id, &tag.id).map_err(event_err_to_status)?;
        }

        join_event(
            &conn,
            &viewer.id,
            &event.id,
            payload.anonymous_name.as_deref(),
        )
        .map_err(event_err_to_status)?;

        Ok((
            StatusCode::CREATED,
            Json(json!({"status": "created", "event": event})),
        ))
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "create_event task join error");
        StatusCode::INTERNAL_SERVER_ERROR
    })?
}

/// GET /api/events/:eventId
///
/// The full detail payload: projected owner, participant list (pseudonyms
/// applied, never follow-gated), tags, and whether the viewer has joined.
pub async fn get_event_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext(viewer)): Extension<UserContext>,
    Path(event_id): Path<String>,
) -> Result<Json<views::EventDetailView>, StatusCode> {
    let pool = state.pool.clone();
    let payload = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for get_event");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        let loaded = get_event(&conn, &event_id).map_err(event_err_to_status)?;
        let participants =
            list_event_participants(&conn, &event_id).map_err(event_err_to_status)?;
        let follows = load_follow_sets(&conn, &viewer.id).map_err(graph_err_to_status)?;

        Ok::<_, StatusCode>(views::event_detail(loaded, participants, &viewer.id, &follows))
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "get_event task join error");
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    Ok(Json(payload))
}

/// POST /api/events/:eventId/join
///
/// Joins the caller to the event. The body is optional; a blank pseudonym
/// counts as none. A second join for the same pair is a conflict.
pub async fn join_event_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext(viewer)): Extension<UserContext>,
    Path(event_id): Path<String>,
    payload: Option<Json<JoinEventRequest>>,
) -> Result<(StatusCode, Json<serde_json::Value>), StatusCode> {
    let anonymous_name = payload.and_then(|Json(body)| body.anonymous_name);
    if let Some(ref name) = anonymous_name {
        if name.len() > MAX_PSEUDONYM_LEN {
            return Err(StatusCode::BAD_REQUEST);
        }
    }

    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for join_event");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        // 404 before 409: an unknown event is not a conflict.
        let loaded = get_event(&conn, &event_id).map_err(event_err_to_status)?;

        let participation = join_event(
            &conn,
            &viewer.id,
            &loaded.event.id,
            anonymous_name.as_deref(),
        )
        .map_err(event_err_to_status)?;

        Ok((
            StatusCode::CREATED,
            Json(json!({"status": "joined", "participation": participation})),
        ))
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "join_event task join error");
        StatusCode::INTERNAL_SERVER_ERROR
    })?
}
