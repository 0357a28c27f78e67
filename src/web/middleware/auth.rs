use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::services::auth_service;
use crate::web::models::AuthenticatedUser;
use crate::web::{AppState, error::AppError};

/// Pulls the key out of an `Authorization: Token <key>` header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Token ")
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

pub async fn auth(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(key) = token_from_headers(req.headers()).map(str::to_owned) else {
        return Err(AppError::Unauthorized(
            "Authentication credentials were not provided.".to_string(),
        ));
    };
    let user = auth_service::authenticate_token(&state.db_pool, &key)
        .await
        .map_err(|err| {
            debug!(error = %err, "token authentication failed");
            err
        })?;
    req.extensions_mut().insert(AuthenticatedUser {
        id: user.id,
        email: user.email,
    });
    Ok(next.run(req).await)
}
