//! Tag handlers.

use crate::api_events::event_err_to_status;
use crate::middleware::UserContext;
use crate::AppState;
use axum::{extract::Extension, http::StatusCode, response::Json};
use mingle_events::{create_tag, list_tags, Tag};
use serde::Deserialize;
use std::sync::Arc;

/// Maximum length for a tag name.
const MAX_TAG_NAME_LEN: usize = 64;

/// True for a `#RRGGBB` color code.
fn is_valid_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
    pub color: String,
}

/// GET /api/tags
pub async fn list_tags_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext(_viewer)): Extension<UserContext>,
) -> Result<Json<Vec<Tag>>, StatusCode> {
    let pool = state.pool.clone();
    let tags = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for list_tags");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        list_tags(&conn).map_err(event_err_to_status)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "list_tags task join error");
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    Ok(Json(tags))
}

/// POST /api/tags
///
/// Creates a tag. Names are unique platform-wide; colors must be `#RRGGBB`.
pub async fn create_tag_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext(_viewer)): Extension<UserContext>,
    Json(payload): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<Tag>), StatusCode> {
    if payload.name.is_empty() || payload.name.len() > MAX_TAG_NAME_LEN {
        return Err(StatusCode::BAD_REQUEST);
    }
    if !is_valid_color(&payload.color) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let pool = state.pool.clone();
    let tag = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for create_tag");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        create_tag(&conn, &payload.name, &payload.color).map_err(event_err_to_status)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "create_tag task join error");
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    Ok((StatusCode::CREATED, Json(tag)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_validation() {
        assert!(is_valid_color("#A1B2C3"));
        assert!(is_valid_color("#000000"));
        assert!(is_valid_color("#ffffff"));

        assert!(!is_valid_color("A1B2C3"));
        assert!(!is_valid_color("#A1B2C"));
        assert!(!is_valid_color("#A1B2C3D"));
        assert!(!is_valid_color("#GGGGGG"));
        assert!(!is_valid_color(""));
    }
}
