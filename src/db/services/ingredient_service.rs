use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, SqlErr,
};

use crate::db::entities::{ingredient, recipe_ingredient};

pub async fn list_ingredients<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    assigned_only: bool,
) -> Result<Vec<ingredient::Model>, DbErr> {
    let mut query = ingredient::Entity::find().filter(ingredient::Column::UserId.eq(user_id));
    if assigned_only {
        query = query
            .join(
                JoinType::InnerJoin,
                ingredient::Relation::RecipeIngredients.def(),
            )
            .distinct();
    }
    query.order_by_desc(ingredient::Column::Name).all(db).await
}

pub async fn find_ingredient<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    ingredient_id: i32,
) -> Result<Option<ingredient::Model>, DbErr> {
    ingredient::Entity::find_by_id(ingredient_id)
        .filter(ingredient::Column::UserId.eq(user_id))
        .one(db)
        .await
}

pub async fn create_ingredient<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    name: &str,
) -> Result<ingredient::Model, DbErr> {
    ingredient::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn rename_ingredient<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    ingredient_id: i32,
    name: &str,
) -> Result<Option<ingredient::Model>, DbErr> {
    let Some(existing) = find_ingredient(db, user_id, ingredient_id).await? else {
        return Ok(None);
    };
    let mut active: ingredient::ActiveModel = existing.into();
    active.name = Set(name.to_owned());
    active.update(db).await.map(Some)
}

pub async fn delete_ingredient<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    ingredient_id: i32,
) -> Result<u64, DbErr> {
    let result = ingredient::Entity::delete_many()
        .filter(ingredient::Column::Id.eq(ingredient_id))
        .filter(ingredient::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Same contract as `tag_service::find_or_create_tag`, independent table.
pub async fn find_or_create_ingredient<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    name: &str,
) -> Result<ingredient::Model, DbErr> {
    let lookup = || {
        ingredient::Entity::find()
            .filter(ingredient::Column::UserId.eq(user_id))
            .filter(ingredient::Column::Name.eq(name))
    };
    if let Some(existing) = lookup().one(db).await? {
        return Ok(existing);
    }
    let inserted = ingredient::ActiveModel {
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

pub async fn attach_ingredient<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    ingredient_id: i32,
) -> Result<(), DbErr> {
    recipe_ingredient::Entity::insert(recipe_ingredient::ActiveModel {
        recipe_id: Set(recipe_id),
        ingredient_id: Set(ingredient_id),
    })
    .on_conflict(
        OnConflict::columns([
            recipe_ingredient::Column::RecipeId,
            recipe_ingredient::Column::IngredientId,
        ])
        .do_nothing()
        .to_owned(),
    )
    .exec_without_returning(db)
    .await?;
    Ok(())
}

pub async fn clear_recipe_ingredients<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
) -> Result<u64, DbErr> {
    let result = recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
