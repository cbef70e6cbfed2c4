/// Label model and database operations
///
/// Labels are free-form tags attached to tasks through `task_labels`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE labels (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_labels (
///     task_id BIGINT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     label_id BIGINT NOT NULL REFERENCES labels(id) ON DELETE RESTRICT,
///     PRIMARY KEY (task_id, label_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Named tag for tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Label {
    /// Unique label ID
    pub id: i64,

    /// Display name, unique across labels
    pub name: String,

    /// When the label was created
    pub created_at: DateTime<Utc>,
}

/// A label together with the task it is attached to
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskLabel {
    /// Task the label is attached to
    pub task_id: i64,

    /// Label ID
    pub id: i64,

    /// Label name
    pub name: String,

    /// Label creation time
    pub created_at: DateTime<Utc>,
}

impl From<TaskLabel> for Label {
    fn from(row: TaskLabel) -> Self {
        Label {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

impl Label {
    /// Creates a label
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `labels_name_key` for a duplicate name.
    pub async fn create(pool: &PgPool, name: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Label>(
            r#"
            INSERT INTO labels (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(name)
        .fetch_one(pool)
        .await
    }

    /// Finds a label by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Label>("SELECT id, name, created_at FROM labels WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Renames a label, returning None if it doesn't exist
    pub async fn update(pool: &PgPool, id: i64, name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Label>(
            r#"
            UPDATE labels
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

    /// Deletes a label
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation while any task carries the label.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM labels WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all labels in creation order
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Label>("SELECT id, name, created_at FROM labels ORDER BY id ASC")
            .fetch_all(pool)
            .await
    }

    /// Returns true if any task carries this label
    pub async fn is_referenced(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM task_labels WHERE label_id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Loads the labels of the given tasks, ordered by task then label ID
    pub async fn list_for_tasks(
        pool: &PgPool,
        task_ids: &[i64],
    ) -> Result<Vec<TaskLabel>, sqlx::Error> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, TaskLabel>(
            r#"
            SELECT tl.task_id, l.id, l.name, l.created_at
            FROM task_labels tl
            JOIN labels l ON l.id = tl.label_id
            WHERE tl.task_id = ANY($1)
            ORDER BY tl.task_id ASC, l.id ASC
            "#,
        )
        .bind(task_ids)
        .fetch_all(pool)
        .await
    }
}
