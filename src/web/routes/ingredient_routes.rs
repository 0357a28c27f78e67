use axum::{
    Router,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::services::ingredient_service;
use crate::web::extract::Json;
use crate::web::models::{AuthenticatedUser, NameInput, RenameInput, TaxonomyResponse};
use crate::web::routes::{clean_required, parse_bool_flag};
use crate::web::{AppError, AppState};

#[derive(Deserialize)]
pub struct IngredientListQuery {
    assigned_only: Option<String>,
}

async fn list_ingredients_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<IngredientListQuery>,
) -> Result<Json<Vec<TaxonomyResponse>>, AppError> {
    let assigned_only = parse_bool_flag(query.assigned_only.as_deref());
    let ingredients =
        ingredient_service::list_ingredients(&app_state.db_pool, auth_user.id, assigned_only)
            .await?;
    Ok(Json(ingredients.into_iter().map(Into::into).collect()))
}

async fn create_ingredient_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<NameInput>,
) -> Result<(StatusCode, Json<TaxonomyResponse>), AppError> {
    let name = clean_required("name", &payload.name)?;
    let ingredient = ingredient_service::create_ingredient(&app_state.db_pool, auth_user.id, &name)
        .await
        .map_err(|err| {
            duplicate_as_invalid(err, "name: ingredient with this name already exists.")
        })?;
    Ok((StatusCode::CREATED, Json(ingredient.into())))
}

async fn get_ingredient_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(ingredient_id): Path<i32>,
) -> Result<Json<TaxonomyResponse>, AppError> {
    let ingredient =
        ingredient_service::find_ingredient(&app_state.db_pool, auth_user.id, ingredient_id)
            .await?
            .ok_or_else(not_found)?;
    Ok(Json(ingredient.into()))
}

async fn update_ingredient_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(ingredient_id): Path<i32>,
    Json(payload): Json<RenameInput>,
) -> Result<Json<TaxonomyResponse>, AppError> {
    let ingredient = match payload.name {
        Some(raw) => {
            let name = clean_required("name", &raw)?;
            ingredient_service::rename_ingredient(
                &app_state.db_pool,
                auth_user.id,
                ingredient_id,
                &name,
            )
            .await
            .map_err(|err| {
                duplicate_as_invalid(err, "name: ingredient with this name already exists.")
            })?
        }
        None => {
            ingredient_service::find_ingredient(&app_state.db_pool, auth_user.id, ingredient_id)
                .await?
        }
    };
    ingredient
        .map(|ingredient| Json(ingredient.into()))
        .ok_or_else(not_found)
}

async fn delete_ingredient_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(ingredient_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let rows =
        ingredient_service::delete_ingredient(&app_state.db_pool, auth_user.id, ingredient_id)
            .await?;
    if rows > 0 {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Ingredient not found.".to_string())
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
        .route(
            "/",
            get(list_ingredients_handler).post(create_ingredient_handler),
        )
        .route(
            "/{ingredient_id}/",
            get(get_ingredient_handler)
                .put(update_ingredient_handler)
                .patch(update_ingredient_handler)
                .delete(delete_ingredient_handler),
        )
}
