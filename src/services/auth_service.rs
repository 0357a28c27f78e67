use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::Utc;
use rand::RngCore;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};
use tracing::warn;

use crate::db::entities::{auth_token, user};
use crate::web::error::AppError;

/// Lowercases the domain part of an email address, leaving the local part
/// untouched. Uniqueness checks and login both go through this.
pub fn normalize_email(raw: &str) -> String {
    let email = raw.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_owned(),
    }
}

pub async fn register_user(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
    name: &str,
) -> Result<user::Model, AppError> {
    let email = normalize_email(email);
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::InvalidInput(
            "email: enter a valid email address.".to_string(),
        ));
    }
    if password.len() < 5 {
        return Err(AppError::InvalidInput(
            "password: ensure this field has at least 5 characters.".to_string(),
        ));
    }

    let password_hash = hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;

    let now = Utc::now();
    let inserted = user::ActiveModel {
        email: Set(email),
        password_hash: Set(password_hash),
        name: Set(name.to_owned()),
        is_active: Set(true),
        is_staff: Set(false),
        is_superuser: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(model) => Ok(model),
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Err(
            AppError::InvalidInput("email: user with this email already exists.".to_string()),
        ),
        Err(err) => Err(err.into()),
    }
}

/// Checks credentials and returns the user's token key, creating the token
/// row on first login. Bad credentials are a validation failure (400), not
/// an authentication failure, matching the token-obtain contract.
pub async fn issue_token(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<String, AppError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::InvalidInput(
            "email and password are required.".to_string(),
        ));
    }
    let email = normalize_email(email);
    let Some(user) = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?
    else {
        return Err(AppError::BadCredentials);
    };
    if !user.is_active {
        return Err(AppError::BadCredentials);
    }
    let valid = verify(password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("password verification failed: {e}")))?;
    if !valid {
        return Err(AppError::BadCredentials);
    }

    let lookup = || auth_token::Entity::find().filter(auth_token::Column::UserId.eq(user.id));
    if let Some(existing) = lookup().one(db).await? {
        return Ok(existing.key);
    }
    let inserted = auth_token::ActiveModel {
        key: Set(generate_token_key()),
        user_id: Set(user.id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await;
    match inserted {
        Ok(token) => Ok(token.key),
        Err(err) => {
            // Concurrent first login; the other request's token wins.
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                lookup().one(db).await?.map(|t| t.key).ok_or(err.into())
            } else {
                Err(err.into())
            }
        }
    }
}

/// Revokes every token the user holds. Idempotent.
pub async fn discard_tokens(db: &DatabaseConnection, user_id: i32) -> Result<(), AppError> {
    auth_token::Entity::delete_many()
        .filter(auth_token::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Resolves a token key to its active user, or 401.
pub async fn authenticate_token(
    db: &DatabaseConnection,
    key: &str,
) -> Result<user::Model, AppError> {
    let Some(token) = auth_token::Entity::find()
        .filter(auth_token::Column::Key.eq(key))
        .one(db)
        .await?
    else {
        return Err(AppError::Unauthorized("Invalid token.".to_string()));
    };
    let Some(user) = user::Entity::find_by_id(token.user_id).one(db).await? else {
        warn!(token_id = token.id, "token points at a missing user");
        return Err(AppError::Unauthorized("Invalid token.".to_string()));
    };
    if !user.is_active {
        return Err(AppError::Unauthorized(
            "User inactive or deleted.".to_string(),
        ));
    }
    Ok(user)
}

fn generate_token_key() -> String {
    let mut bytes = [0u8; 20];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
