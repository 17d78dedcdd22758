//! MySQL user repository implementation.

use super::parse_id;
use crate::entities::{NewUser, User, UserChanges};
use crate::pool::DatabasePool;
use crate::traits::UserRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paylink_core::{PaylinkError, PaylinkResult, UserId};
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct MySqlUserRepository {
    pool: Arc<DatabasePool>,
}

impl MySqlUserRepository {
    #[must_use]
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }

    fn map_write_error(err: sqlx::Error, email: &str) -> PaylinkError {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                PaylinkError::conflict(format!("User with email {} already exists", email))
            }
            _ => err.into(),
        }
    }
}

/// Database row representation of a user.
#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = PaylinkError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&row.id)?,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn create(&self, user: NewUser) -> PaylinkResult<User> {
        let user = user.into_user();
        debug!("Creating user {}", user.id);

        sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name, email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(self.pool.inner())
        .await
        .map_err(|e| Self::map_write_error(e, &user.email))?;

        Ok(user)
    }

    async fn find_all(&self) -> PaylinkResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool.inner())
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn find_by_id(&self, id: UserId) -> PaylinkResult<Option<User>> {
        debug!("Finding user by id: {}", id);

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(self.pool.inner())
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> PaylinkResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER(?)"
        ))
        .bind(email)
        .fetch_optional(self.pool.inner())
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn update(&self, id: UserId, changes: UserChanges) -> PaylinkResult<Option<User>> {
        let Some(mut user) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        changes.apply_to(&mut user);

        sqlx::query(
            r#"
            UPDATE users
            SET first_name = ?, last_name = ?, email = ?, password_hash = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.updated_at)
        .bind(id.to_string())
        .execute(self.pool.inner())
        .await
        .map_err(|e| Self::map_write_error(e, &user.email))?;

        Ok(Some(user))
    }

    async fn delete(&self, id: UserId) -> PaylinkResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.to_string())
            .execute(self.pool.inner())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
