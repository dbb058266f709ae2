//! Event chat handlers. Participants only, in both directions.

use crate::api_events::event_err_to_status;
use crate::middleware::UserContext;
use crate::views;
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
};
use mingle_events::{
    create_message, find_participation, list_messages_with_senders, list_participations,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Maximum length for a chat message.
const MAX_CONTENT_LEN: usize = 4096;

#[derive(Deserialize)]
pub struct CreateMessageRequest {
    pub content: String,
}

/// GET /api/events/:eventId/messages
///
/// The event's chat in ascending creation order, senders projected through
/// their pseudonyms. Non-participants are turned away before any rows are
/// read.
pub async fn list_messages_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext(viewer)): Extension<UserContext>,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<views::ChatMessageView>>, StatusCode> {
    let pool = state.pool.clone();
    let payload = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for list_messages");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        if find_participation(&conn, &viewer.id, &event_id)
            .map_err(event_err_to_status)?
            .is_none()
        {
            return Err(StatusCode::FORBIDDEN);
        }

        let participations = list_participations(&conn, &event_id).map_err(event_err_to_status)?;
        let messages = list_messages_with_senders(&conn, &event_id).map_err(event_err_to_status)?;

        Ok(views::chat_listing(messages, &participations))
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "list_messages task join error");
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    Ok(Json(payload))
}

/// POST /api/events/:eventId/messages
///
/// Appends a message to the event's chat. Posting requires a participation.
pub async fn create_message_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext(viewer)): Extension<UserContext>,
    Path(event_id): Path<String>,
    Json(payload): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), StatusCode> {
    if payload.content.is_empty() || payload.content.len() > MAX_CONTENT_LEN {
        return Err(StatusCode::BAD_REQUEST);
    }

    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for create_message");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        if find_participation(&conn, &viewer.id, &event_id)
            .map_err(event_err_to_status)?
            .is_none()
        {
            return Err(StatusCode::FORBIDDEN);
        }

        let message = create_message(&conn, &event_id, &viewer.id, &payload.content)
            .map_err(event_err_to_status)?;

        Ok((
            StatusCode::CREATED,
            Json(json!({"status": "sent", "message": message})),
        ))
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "create_message task join error");
        StatusCode::INTERNAL_SERVER_ERROR
    })?
}
