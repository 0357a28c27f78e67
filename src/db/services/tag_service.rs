use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, SqlErr,
};

use crate::db::entities::{recipe_tag, tag};

/// Lists a user's tags, descending by name. With `assigned_only` the result
/// is restricted to tags attached to at least one recipe, deduplicated.
pub async fn list_tags<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    assigned_only: bool,
) -> Result<Vec<tag::Model>, DbErr> {
    let mut query = tag::Entity::find().filter(tag::Column::UserId.eq(user_id));
    if assigned_only {
        query = query
            .join(JoinType::InnerJoin, tag::Relation::RecipeTags.def())
            .distinct();
    }
    query.order_by_desc(tag::Column::Name).all(db).await
}

/// Resolves a tag only within the given user's rows.
pub async fn find_tag<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    tag_id: i32,
) -> Result<Option<tag::Model>, DbErr> {
    tag::Entity::find_by_id(tag_id)
        .filter(tag::Column::UserId.eq(user_id))
        .one(db)
        .await
}

pub async fn create_tag<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    name: &str,
) -> Result<tag::Model, DbErr> {
    tag::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn rename_tag<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    tag_id: i32,
    name: &str,
) -> Result<Option<tag::Model>, DbErr> {
    let Some(existing) = find_tag(db, user_id, tag_id).await? else {
        return Ok(None);
    };
    let mut active: tag::ActiveModel = existing.into();
    active.name = Set(name.to_owned());
    active.update(db).await.map(Some)
}

pub async fn delete_tag<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    tag_id: i32,
) -> Result<u64, DbErr> {
    let result = tag::Entity::delete_many()
        .filter(tag::Column::Id.eq(tag_id))
        .filter(tag::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Atomic find-or-insert keyed on (user_id, name). A unique-constraint hit
/// means another writer created the row first; re-fetch and use theirs.
pub async fn find_or_create_tag<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    name: &str,
) -> Result<tag::Model, DbErr> {
    let lookup = || {
        tag::Entity::find()
            .filter(tag::Column::UserId.eq(user_id))
            .filter(tag::Column::Name.eq(name))
    };
    if let Some(existing) = lookup().one(db).await? {
        return Ok(existing);
    }
    let inserted = tag::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await;
    match inserted {
        Ok(model) => Ok(model),
        Err(err) => {
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                lookup().one(db).await?.ok_or(err)
            } else {
                Err(err)
            }
        }
    }
}

/// Associates a tag with a recipe; a no-op when the association exists.
pub async fn attach_tag<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    tag_id: i32,
) -> Result<(), DbErr> {
    recipe_tag::Entity::insert(recipe_tag::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(tag_id),
    })
    .on_conflict(
        OnConflict::columns([recipe_tag::Column::RecipeId, recipe_tag::Column::TagId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(db)
    .await?;
    Ok(())
}

/// Drops every tag association for a recipe. The tag rows themselves stay.
pub async fn clear_recipe_tags<C: ConnectionTrait>(db: &C, recipe_id: i32) -> Result<u64, DbErr> {
    let result = recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
