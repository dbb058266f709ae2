//! Account bootstrap and follow-edge handlers.

use crate::middleware::{external_subject, UserContext};
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use mingle_graph::{follow, unfollow};
use mingle_identity::{create_user, find_user_by_external_id, get_user, IdentityError};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Maximum length for a display name.
const MAX_DISPLAY_NAME_LEN: usize = 128;
/// Maximum length for an avatar URL.
const MAX_IMAGE_URL_LEN: usize = 2048;

/// Maps an [`IdentityError`] to the correct HTTP status code, logging
/// unexpected errors.
pub(crate) fn identity_err_to_status(e: IdentityError) -> StatusCode {
    match e {
        IdentityError::NotFound(_) => StatusCode::NOT_FOUND,
        IdentityError::AlreadyExists(_) => StatusCode::CONFLICT,
        IdentityError::Database(err) => {
            tracing::error!(error = %err, "user store operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[derive(Deserialize)]
pub struct InitUserRequest {
    pub display_name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// POST /api/users/init
///
/// Creates the platform account for the authenticated subject if it does
/// not exist yet. The route sits outside the auth middleware because the
/// middleware requires the account this handler creates.
pub async fn init_user_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<InitUserRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), StatusCode> {
    let subject = external_subject(&headers)?;

    if payload.display_name.is_empty() || payload.display_name.len() > MAX_DISPLAY_NAME_LEN {
        return Err(StatusCode::BAD_REQUEST);
    }
    if let Some(ref url) = payload.image_url {
        if url.len() > MAX_IMAGE_URL_LEN {
            return Err(StatusCode::BAD_REQUEST);
        }
    }

    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for init_user");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        if let Some(user) = find_user_by_external_id(&conn, &subject)
            .map_err(identity_err_to_status)?
        {
            return Ok((
                StatusCode::OK,
                Json(json!({"status": "exists", "user": user})),
            ));
        }

        match create_user(
            &conn,
            &subject,
            &payload.display_name,
            payload.image_url.as_deref(),
        ) {
            Ok(user) => Ok((
                StatusCode::CREATED,
                Json(json!({"status": "created", "user": user})),
            )),
            // A concurrent init landed between the lookup and the insert.
            Err(IdentityError::AlreadyExists(_)) => {
                Ok((StatusCode::OK, Json(json!({"status": "exists"}))))
            }
            Err(e) => Err(identity_err_to_status(e)),
        }
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "init_user task join error");
        StatusCode::INTERNAL_SERVER_ERROR
    })?
}

/// POST /api/users/:userId/follow
///
/// Records that the caller follows `userId`. Idempotent.
pub async fn follow_user_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext(viewer)): Extension<UserContext>,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for follow_user");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        // Validate the target before touching the edge table.
        let target = get_user(&conn, &user_id).map_err(identity_err_to_status)?;

        follow(&conn, &viewer.id, &target.id).map_err(|e| {
            tracing::error!(error = %e, "failed to create follow edge");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        Ok(Json(json!({"status": "following", "user_id": target.id})))
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "follow_user task join error");
        StatusCode::INTERNAL_SERVER_ERROR
    })?
}

/// DELETE /api/users/:userId/follow
///
/// Removes the caller's follow edge to `userId` if present. Idempotent.
pub async fn unfollow_user_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext(viewer)): Extension<UserContext>,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for unfollow_user");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        let target = get_user(&conn, &user_id).map_err(identity_err_to_status)?;

        unfollow(&conn, &viewer.id, &target.id).map_err(|e| {
            tracing::error!(error = %e, "failed to delete follow edge");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        Ok(Json(json!({"status": "unfollowed", "user_id": target.id})))
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "unfollow_user task join error");
        StatusCode::INTERNAL_SERVER_ERROR
    })?
}
