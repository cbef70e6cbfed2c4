/// Status model and database operations
///
/// A status is a named state every task must carry. Names are unique and the
/// creation timestamp is set by the database once.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE statuses (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Named task state
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Status {
    /// Unique status ID
    pub id: i64,

    /// Display name, unique across statuses
    pub name: String,

    /// When the status was created (immutable)
    pub created_at: DateTime<Utc>,
}

impl Status {
    /// Creates a status
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `statuses_name_key` for a duplicate name.
    pub async fn create(pool: &PgPool, name: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Status>(
            r#"
            INSERT INTO statuses (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(name)
        .fetch_one(pool)
        .await
    }

    /// Finds a status by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Status>("SELECT id, name, created_at FROM statuses WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Renames a status, returning None if it doesn't exist
    pub async fn update(pool: &PgPool, id: i64, name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Status>(
            r#"
            UPDATE statuses
            SET name = $2
            WHERE id = $1
            RETURNING id, name, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a status
    ///
    /// # Returns
    ///
    /// True if deleted, false if it didn't exist
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation while any task uses the status.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM statuses WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all statuses in creation order
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Status>("SELECT id, name, created_at FROM statuses ORDER BY id ASC")
            .fetch_all(pool)
            .await
    }

    /// Returns true if any task carries this status
    pub async fn is_referenced(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tasks WHERE status_id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }
}
