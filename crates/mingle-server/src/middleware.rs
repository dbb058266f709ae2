//! Request authentication.

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use mingle_identity::{find_user_by_external_id, User};
use std::sync::Arc;

use crate::AppState;

/// Wrapper for the authenticated [`User`] stored in request extensions.
#[derive(Clone, Debug)]
pub struct UserContext(pub User);

/// Extracts the external auth subject from `X-Mingle-User` or
/// `Authorization: Bearer`.
///
/// Session issuance and token verification belong to the external auth
/// provider; at this boundary the bearer token IS the provider's subject,
/// and the middleware only resolves it to a platform account.
pub fn external_subject(headers: &HeaderMap) -> Result<String, StatusCode> {
    if let Some(val) = headers.get("X-Mingle-User") {
        return Ok(val
            .to_str()
            .map_err(|_| StatusCode::UNAUTHORIZED)?
            .to_string());
    }

    if let Some(val) = headers.get("Authorization") {
        let val_str = val.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;
        if let Some(token) = val_str.strip_prefix("Bearer ") {
            return Ok(token.to_string());
        }
    }

    Err(StatusCode::UNAUTHORIZED)
}

/// Middleware that resolves the caller's subject to a [`User`] and stores it
/// in request extensions. Requests without an account are rejected — account
/// creation goes through the open `POST /api/users/init` route.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let subject = external_subject(req.headers())?;

    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?
        .clone();

    let user = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        find_user_by_external_id(&conn, &subject)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::UNAUTHORIZED)
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)??;

    req.extensions_mut().insert(UserContext(user));

    Ok(next.run(req).await)
}
