use axum::{
    Router,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::services::tag_service;
use crate::web::extract::Json;
use crate::web::models::{AuthenticatedUser, NameInput, RenameInput, TaxonomyResponse};
use crate::web::routes::{clean_required, parse_bool_flag};
use crate::web::{AppError, AppState};

#[derive(Deserialize)]
pub struct TagListQuery {
    assigned_only: Option<String>,
}

async fn list_tags_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<TagListQuery>,
) -> Result<Json<Vec<TaxonomyResponse>>, AppError> {
    let assigned_only = parse_bool_flag(query.assigned_only.as_deref());
    let tags = tag_service::list_tags(&app_state.db_pool, auth_user.id, assigned_only).await?;
    Ok(Json(tags.into_iter().map(Into::into).collect()))
}

async fn create_tag_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<NameInput>,
) -> Result<(StatusCode, Json<TaxonomyResponse>), AppError> {
    let name = clean_required("name", &payload.name)?;
    let tag = tag_service::create_tag(&app_state.db_pool, auth_user.id, &name)
        .await
        .map_err(|err| duplicate_as_invalid(err, "name: tag with this name already exists."))?;
    Ok((StatusCode::CREATED, Json(tag.into())))
}

async fn get_tag_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<i32>,
) -> Result<Json<TaxonomyResponse>, AppError> {
    let tag = tag_service::find_tag(&app_state.db_pool, auth_user.id, tag_id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(tag.into()))
}

async fn update_tag_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<i32>,
    Json(payload): Json<RenameInput>,
) -> Result<Json<TaxonomyResponse>, AppError> {
    let tag = match payload.name {
        Some(raw) => {
            let name = clean_required("name", &raw)?;
            tag_service::rename_tag(&app_state.db_pool, auth_user.id, tag_id, &name)
                .await
                .map_err(|err| {
                    duplicate_as_invalid(err, "name: tag with this name already exists.")
                })?
        }
        None => tag_service::find_tag(&app_state.db_pool, auth_user.id, tag_id).await?,
    };
    tag.map(|tag| Json(tag.into())).ok_or_else(not_found)
}

async fn delete_tag_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let rows = tag_service::delete_tag(&app_state.db_pool, auth_user.id, tag_id).await?;
    if rows > 0 {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Tag not found.".to_string())
}

fn duplicate_as_invalid(err: sea_orm::DbErr, message: &str) -> AppError {
    if matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    ) {
        AppError::InvalidInput(message.to_string())
    } else {
        err.into()
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tags_handler).post(create_tag_handler))
        .route(
            "/{tag_id}/",
            get(get_tag_handler)
                .put(update_tag_handler)
                .patch(update_tag_handler)
                .delete(delete_tag_handler),
        )
}
