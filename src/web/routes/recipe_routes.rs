use axum::{
    Router,
    extract::{Extension, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::db::services::recipe_service::{self, NewRecipe, RecipeChanges};
use crate::web::extract::Json;
use crate::web::models::{
    AuthenticatedUser, CreateRecipeRequest, RecipeDetail, RecipeImageResponse, RecipeListItem,
    UpdateRecipeRequest,
};
use crate::web::routes::{clean_names, clean_required, parse_id_list};
use crate::web::{AppError, AppState};

#[derive(Deserialize)]
pub struct RecipeListQuery {
    tags_in: Option<String>,
    ingredients_in: Option<String>,
}

async fn list_recipes_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<RecipeListQuery>,
) -> Result<Json<Vec<RecipeListItem>>, AppError> {
    let tag_ids = query
        .tags_in
        .as_deref()
        .map(|raw| parse_id_list("tags_in", raw))
        .transpose()?;
    let ingredient_ids = query
        .ingredients_in
        .as_deref()
        .map(|raw| parse_id_list("ingredients_in", raw))
        .transpose()?;
    let recipes =
        recipe_service::list_recipes(&app_state.db_pool, auth_user.id, tag_ids, ingredient_ids)
            .await?;
    Ok(Json(recipes.into_iter().map(Into::into).collect()))
}

async fn create_recipe_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<RecipeDetail>), AppError> {
    let input = NewRecipe {
        title: clean_required("title", &payload.title)?,
        description: payload.description.unwrap_or_default(),
        time_minutes: clean_time_minutes(payload.time_minutes)?,
        price: payload.price,
        link: payload.link,
        tags: clean_names("tags", payload.tags.unwrap_or_default())?,
        ingredients: clean_names("ingredients", payload.ingredients.unwrap_or_default())?,
    };
    let recipe = recipe_service::create_recipe(&app_state.db_pool, auth_user.id, input).await?;
    let full = recipe_service::load_relations(&app_state.db_pool, recipe).await?;
    Ok((StatusCode::CREATED, Json(full.into())))
}

async fn get_recipe_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<Json<RecipeDetail>, AppError> {
    let full = recipe_service::get_recipe(&app_state.db_pool, auth_user.id, recipe_id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(full.into()))
}

/// PUT: full replacement, scalar fields required.
async fn put_recipe_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
    Json(payload): Json<CreateRecipeRequest>,
) -> Result<Json<RecipeDetail>, AppError> {
    let changes = RecipeChanges {
        title: Some(clean_required("title", &payload.title)?),
        time_minutes: Some(clean_time_minutes(payload.time_minutes)?),
        price: Some(payload.price),
        description: payload.description,
        link: payload.link,
        tags: payload.tags.map(|t| clean_names("tags", t)).transpose()?,
        ingredients: payload
            .ingredients
            .map(|i| clean_names("ingredients", i))
            .transpose()?,
    };
    apply_update(&app_state, auth_user.id, recipe_id, changes).await
}

/// PATCH: partial update; absent fields, including the relation lists,
/// stay untouched.
async fn patch_recipe_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
    Json(payload): Json<UpdateRecipeRequest>,
) -> Result<Json<RecipeDetail>, AppError> {
    let changes = RecipeChanges {
        title: payload
            .title
            .map(|t| clean_required("title", &t))
            .transpose()?,
        time_minutes: payload.time_minutes.map(clean_time_minutes).transpose()?,
        price: payload.price,
        description: payload.description,
        link: payload.link,
        tags: payload.tags.map(|t| clean_names("tags", t)).transpose()?,
        ingredients: payload
            .ingredients
            .map(|i| clean_names("ingredients", i))
            .transpose()?,
    };
    apply_update(&app_state, auth_user.id, recipe_id, changes).await
}

async fn apply_update(
    app_state: &AppState,
    user_id: i32,
    recipe_id: i32,
    changes: RecipeChanges,
) -> Result<Json<RecipeDetail>, AppError> {
    let recipe = recipe_service::update_recipe(&app_state.db_pool, user_id, recipe_id, changes)
        .await?
        .ok_or_else(not_found)?;
    let full = recipe_service::load_relations(&app_state.db_pool, recipe).await?;
    Ok(Json(full.into()))
}

async fn delete_recipe_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let rows = recipe_service::delete_recipe(&app_state.db_pool, auth_user.id, recipe_id).await?;
    if rows > 0 {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

/// Accepts a multipart `image` field, checks it actually decodes as an
/// image, and stores it under a collision-free random name. The previous
/// file reference, if any, is simply overwritten.
async fn upload_image_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<RecipeImageResponse>, AppError> {
    recipe_service::find_recipe(&app_state.db_pool, auth_user.id, recipe_id)
        .await?
        .ok_or_else(not_found)?;

    let mut file_name = None;
    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("image") {
            file_name = field.file_name().map(str::to_owned);
            data = Some(field.bytes().await.map_err(|e| {
                AppError::InvalidInput(format!("failed to read image field: {e}"))
            })?);
        }
    }
    let data = data.ok_or_else(|| {
        AppError::InvalidInput("image: no file was submitted.".to_string())
    })?;

    let format = image::guess_format(&data).map_err(invalid_image)?;
    image::load_from_memory(&data).map_err(invalid_image)?;

    let extension = file_name
        .as_deref()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .or_else(|| format.extensions_str().first().map(|ext| ext.to_string()))
        .unwrap_or_else(|| "bin".to_string());
    let relative_path = format!("recipe/{}.{}", Uuid::new_v4(), extension);
    let absolute_path = app_state.config.media_root.join(&relative_path);
    if let Some(parent) = absolute_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&absolute_path, &data).await?;
    debug!(recipe_id, path = %relative_path, "stored recipe image");

    let recipe =
        recipe_service::set_image(&app_state.db_pool, auth_user.id, recipe_id, &relative_path)
            .await?
            .ok_or_else(not_found)?;
    Ok(Json(recipe.into()))
}

fn clean_time_minutes(value: i32) -> Result<i32, AppError> {
    if value < 0 {
        return Err(AppError::InvalidInput(
            "time_minutes: ensure this value is greater than or equal to 0.".to_string(),
        ));
    }
    Ok(value)
}

fn invalid_image(err: image::ImageError) -> AppError {
    AppError::InvalidInput(format!(
        "image: upload a valid image, the file is not decodable ({err})."
    ))
}

fn not_found() -> AppError {
    AppError::NotFound("Recipe not found.".to_string())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_recipes_handler).post(create_recipe_handler))
        .route(
            "/{recipe_id}/",
            get(get_recipe_handler)
                .put(put_recipe_handler)
                .patch(patch_recipe_handler)
                .delete(delete_recipe_handler),
        )
        .route("/{recipe_id}/upload-image/", post(upload_image_handler))
}
