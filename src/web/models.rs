use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::entities::{ingredient, recipe, tag, user};
use crate::db::services::recipe_service::RecipeWithRelations;

/// Resolved requester, inserted as a request extension by the auth
/// middleware. Everything downstream scopes queries to `id`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub name: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// A nested `{"name": ...}` object in recipe payloads, and the body of
/// direct tag/ingredient creation.
#[derive(Debug, Deserialize)]
pub struct NameInput {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameInput {
    pub name: Option<String>,
}

/// Output shape shared by tags and ingredients.
#[derive(Debug, Serialize)]
pub struct TaxonomyResponse {
    pub id: i32,
    pub name: String,
}

impl From<tag::Model> for TaxonomyResponse {
    fn from(tag: tag::Model) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
        }
    }
}

impl From<ingredient::Model> for TaxonomyResponse {
    fn from(ingredient: ingredient::Model) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRecipeRequest {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<NameInput>>,
    #[serde(default)]
    pub ingredients: Option<Vec<NameInput>>,
}

/// PATCH body: every field optional, absent fields untouched. Unknown
/// fields (including any attempt to write `user`) are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub tags: Option<Vec<NameInput>>,
    pub ingredients: Option<Vec<NameInput>>,
}

/// List output shape: scalar summary plus resolved associations.
#[derive(Debug, Serialize)]
pub struct RecipeListItem {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub tags: Vec<TaxonomyResponse>,
    pub ingredients: Vec<TaxonomyResponse>,
}

/// Detail output shape, a superset of [`RecipeListItem`].
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub tags: Vec<TaxonomyResponse>,
    pub ingredients: Vec<TaxonomyResponse>,
    pub description: String,
    pub image: Option<String>,
}

impl From<RecipeWithRelations> for RecipeListItem {
    fn from(full: RecipeWithRelations) -> Self {
        Self {
            id: full.recipe.id,
            title: full.recipe.title,
            time_minutes: full.recipe.time_minutes,
            price: full.recipe.price,
            link: full.recipe.link,
            tags: full.tags.into_iter().map(Into::into).collect(),
            ingredients: full.ingredients.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<RecipeWithRelations> for RecipeDetail {
    fn from(full: RecipeWithRelations) -> Self {
        Self {
            id: full.recipe.id,
            title: full.recipe.title,
            time_minutes: full.recipe.time_minutes,
            price: full.recipe.price,
            link: full.recipe.link,
            description: full.recipe.description,
            image: full.recipe.image,
            tags: full.tags.into_iter().map(Into::into).collect(),
            ingredients: full.ingredients.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeImageResponse {
    pub id: i32,
    pub image: Option<String>,
}

impl From<recipe::Model> for RecipeImageResponse {
    fn from(recipe: recipe::Model) -> Self {
        Self {
            id: recipe.id,
            image: recipe.image,
        }
    }
}
