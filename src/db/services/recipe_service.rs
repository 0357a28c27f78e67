use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    JoinType, LoaderTrait, ModelTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    TransactionTrait,
};
use tracing::debug;

use crate::db::entities::{ingredient, recipe, recipe_ingredient, recipe_tag, tag};
use crate::db::services::{ingredient_service, tag_service};

/// Scalar fields plus the nested name lists for a recipe create.
#[derive(Debug)]
pub struct NewRecipe {
    pub title: String,
    pub description: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub tags: Vec<String>,
    pub ingredients: Vec<String>,
}

/// Partial update. `None` leaves a field untouched; for the relation lists,
/// `Some(vec![])` clears every association while `None` keeps them as-is.
#[derive(Debug, Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<String>>,
    pub ingredients: Option<Vec<String>>,
}

/// A recipe together with its materialized association sets.
#[derive(Debug)]
pub struct RecipeWithRelations {
    pub recipe: recipe::Model,
    pub tags: Vec<tag::Model>,
    pub ingredients: Vec<ingredient::Model>,
}

/// Lists a user's recipes, newest first, optionally restricted to recipes
/// carrying at least one of the given tag/ingredient IDs. Joining the
/// junction tables can yield one row per match, hence the DISTINCT.
pub async fn list_recipes<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    tag_ids: Option<Vec<i32>>,
    ingredient_ids: Option<Vec<i32>>,
) -> Result<Vec<RecipeWithRelations>, DbErr> {
    let mut query = recipe::Entity::find().filter(recipe::Column::UserId.eq(user_id));
    if let Some(ids) = tag_ids.filter(|ids| !ids.is_empty()) {
        query = query
            .join(JoinType::InnerJoin, recipe::Relation::RecipeTags.def())
            .filter(recipe_tag::Column::TagId.is_in(ids))
            .distinct();
    }
    if let Some(ids) = ingredient_ids.filter(|ids| !ids.is_empty()) {
        query = query
            .join(JoinType::InnerJoin, recipe::Relation::RecipeIngredients.def())
            .filter(recipe_ingredient::Column::IngredientId.is_in(ids))
            .distinct();
    }
    let recipes = query.order_by_desc(recipe::Column::Id).all(db).await?;

    let tags = recipes
        .load_many_to_many(tag::Entity, recipe_tag::Entity, db)
        .await?;
    let ingredients = recipes
        .load_many_to_many(ingredient::Entity, recipe_ingredient::Entity, db)
        .await?;

    Ok(recipes
        .into_iter()
        .zip(tags)
        .zip(ingredients)
        .map(|((recipe, tags), ingredients)| RecipeWithRelations {
            recipe,
            tags,
            ingredients,
        })
        .collect())
}

/// Resolves a recipe only within the given user's rows.
pub async fn find_recipe<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    recipe_id: i32,
) -> Result<Option<recipe::Model>, DbErr> {
    recipe::Entity::find_by_id(recipe_id)
        .filter(recipe::Column::UserId.eq(user_id))
        .one(db)
        .await
}

pub async fn get_recipe<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    recipe_id: i32,
) -> Result<Option<RecipeWithRelations>, DbErr> {
    match find_recipe(db, user_id, recipe_id).await? {
        Some(recipe) => load_relations(db, recipe).await.map(Some),
        None => Ok(None),
    }
}

pub async fn load_relations<C: ConnectionTrait>(
    db: &C,
    recipe: recipe::Model,
) -> Result<RecipeWithRelations, DbErr> {
    let tags = recipe.find_related(tag::Entity).all(db).await?;
    let ingredients = recipe.find_related(ingredient::Entity).all(db).await?;
    Ok(RecipeWithRelations {
        recipe,
        tags,
        ingredients,
    })
}

/// Creates the recipe row, then reconciles both name lists against the
/// owner's taxonomy tables, all in one transaction.
pub async fn create_recipe(
    db: &DatabaseConnection,
    user_id: i32,
    input: NewRecipe,
) -> Result<recipe::Model, DbErr> {
    let txn = db.begin().await?;
    let now = Utc::now();
    let recipe = recipe::ActiveModel {
        user_id: Set(user_id),
        title: Set(input.title),
        description: Set(input.description),
        time_minutes: Set(input.time_minutes),
        price: Set(input.price),
        link: Set(input.link),
        image: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    reconcile_tags(&txn, recipe.id, user_id, &input.tags).await?;
    reconcile_ingredients(&txn, recipe.id, user_id, &input.ingredients).await?;
    txn.commit().await?;
    debug!(recipe_id = recipe.id, user_id, "created recipe");
    Ok(recipe)
}

/// Applies a partial update. When a relation list is present the existing
/// association set is cleared and rebuilt from the list (a replace, not a
/// merge). Returns `None` when the recipe does not exist for this user.
pub async fn update_recipe(
    db: &DatabaseConnection,
    user_id: i32,
    recipe_id: i32,
    changes: RecipeChanges,
) -> Result<Option<recipe::Model>, DbErr> {
    let txn = db.begin().await?;
    let Some(existing) = find_recipe(&txn, user_id, recipe_id).await? else {
        txn.rollback().await?;
        return Ok(None);
    };

    let mut active: recipe::ActiveModel = existing.into();
    if let Some(title) = changes.title {
        active.title = Set(title);
    }
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if let Some(time_minutes) = changes.time_minutes {
        active.time_minutes = Set(time_minutes);
    }
    if let Some(price) = changes.price {
        active.price = Set(price);
    }
    if let Some(link) = changes.link {
        active.link = Set(Some(link));
    }
    active.updated_at = Set(Utc::now());
    let recipe = active.update(&txn).await?;

    if let Some(names) = changes.tags {
        tag_service::clear_recipe_tags(&txn, recipe.id).await?;
        reconcile_tags(&txn, recipe.id, user_id, &names).await?;
    }
    if let Some(names) = changes.ingredients {
        ingredient_service::clear_recipe_ingredients(&txn, recipe.id).await?;
        reconcile_ingredients(&txn, recipe.id, user_id, &names).await?;
    }
    txn.commit().await?;
    Ok(Some(recipe))
}

pub async fn delete_recipe<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    recipe_id: i32,
) -> Result<u64, DbErr> {
    let result = recipe::Entity::delete_many()
        .filter(recipe::Column::Id.eq(recipe_id))
        .filter(recipe::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Points the recipe at a newly stored image file. Any previous file is
/// left orphaned on disk; cleanup belongs to the storage layer.
pub async fn set_image<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    recipe_id: i32,
    image_path: &str,
) -> Result<Option<recipe::Model>, DbErr> {
    let Some(existing) = find_recipe(db, user_id, recipe_id).await? else {
        return Ok(None);
    };
    let mut active: recipe::ActiveModel = existing.into();
    active.image = Set(Some(image_path.to_owned()));
    active.updated_at = Set(Utc::now());
    active.update(db).await.map(Some)
}

async fn reconcile_tags<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    user_id: i32,
    names: &[String],
) -> Result<(), DbErr> {
    for name in names {
        let tag = tag_service::find_or_create_tag(db, user_id, name).await?;
        tag_service::attach_tag(db, recipe_id, tag.id).await?;
    }
    Ok(())
}

async fn reconcile_ingredients<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    user_id: i32,
    names: &[String],
) -> Result<(), DbErr> {
    for name in names {
        let ingredient = ingredient_service::find_or_create_ingredient(db, user_id, name).await?;
        ingredient_service::attach_ingredient(db, recipe_id, ingredient.id).await?;
    }
    Ok(())
}
