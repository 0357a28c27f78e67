use axum::{
    Router,
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
    routing::post,
};
use std::sync::Arc;
use tracing::info;

use crate::services::auth_service;
use crate::web::extract::Json;
use crate::web::middleware::auth::token_from_headers;
use crate::web::models::{
    AuthenticatedUser, CreateUserRequest, TokenRequest, TokenResponse, UserResponse,
};
use crate::web::{AppError, AppState};

/// Routes reachable without a token.
pub fn public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create/", post(create_user_handler))
        .route("/token/create/", post(obtain_token_handler))
}

/// Routes behind the auth middleware.
pub fn protected_router() -> Router<Arc<AppState>> {
    Router::new().route("/token/discard/", post(discard_token_handler))
}

/// Sign-up is for anonymous callers only; a request carrying a valid token
/// is refused outright.
async fn create_user_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    if let Some(key) = token_from_headers(&headers)
        && auth_service::authenticate_token(&app_state.db_pool, key)
            .await
            .is_ok()
    {
        return Err(AppError::Forbidden(
            "You are already authenticated.".to_string(),
        ));
    }

    let user =
        auth_service::register_user(&app_state.db_pool, &payload.email, &payload.password, &payload.name)
            .await?;
    info!(user_id = user.id, "registered user");
    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn obtain_token_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token =
        auth_service::issue_token(&app_state.db_pool, &payload.email, &payload.password).await?;
    Ok(Json(TokenResponse { token }))
}

async fn discard_token_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<StatusCode, AppError> {
    auth_service::discard_tokens(&app_state.db_pool, auth_user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
