/// Task model and database operations
///
/// A task always carries a status and an author. The author is taken from the
/// acting principal at creation and no update input can express a new one:
/// [`UpdateTask`] has no author field.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status_id BIGINT NOT NULL REFERENCES statuses(id) ON DELETE RESTRICT,
///     author_id BIGINT NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
///     executor_id BIGINT REFERENCES users(id) ON DELETE RESTRICT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::task::{Task, CreateTask, UpdateTask};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     name: "Fix login".to_string(),
///     description: String::new(),
///     status_id: 1,
///     author_id: 1,
///     executor_id: Some(2),
///     labels: vec![1, 2],
/// }).await?;
///
/// Task::update(&pool, task.id, UpdateTask {
///     name: "Fix login page".to_string(),
///     description: "Broken on mobile".to_string(),
///     status_id: 2,
///     executor_id: None,
///     labels: vec![],
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};

use super::label::Label;

/// Columns and joins producing a [`TaskDetail`] row
pub(crate) const DETAIL_SELECT: &str = r#"
    SELECT t.id, t.name, t.description,
           t.status_id, s.name AS status_name,
           t.author_id, a.username AS author_username,
           t.executor_id, e.username AS executor_username,
           t.created_at
    FROM tasks t
    JOIN statuses s ON s.id = t.status_id
    JOIN users a ON a.id = t.author_id
    LEFT JOIN users e ON e.id = t.executor_id
"#;

/// Task row as stored
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: i64,

    /// Task name
    pub name: String,

    /// Free-form description (may be empty)
    pub description: String,

    /// Current status
    pub status_id: i64,

    /// User who created the task; never changes
    pub author_id: i64,

    /// User assigned to work the task
    pub executor_id: Option<i64>,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

/// Task joined with the names of everything it references
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskDetail {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub status_id: i64,
    pub status_name: String,
    pub author_id: i64,
    pub author_username: String,
    pub executor_id: Option<i64>,
    pub executor_username: Option<String>,
    pub created_at: DateTime<Utc>,

    /// Attached labels, loaded separately
    #[sqlx(skip)]
    pub labels: Vec<Label>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Task name
    pub name: String,

    /// Description
    pub description: String,

    /// Status ID (must exist)
    pub status_id: i64,

    /// Acting principal's user ID
    pub author_id: i64,

    /// Optional executor user ID
    pub executor_id: Option<i64>,

    /// Label IDs to attach
    pub labels: Vec<i64>,
}

/// Input for updating a task
///
/// Replaces every editable field, including the label set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTask {
    /// New name
    pub name: String,

    /// New description
    pub description: String,

    /// New status ID
    pub status_id: i64,

    /// New executor (None clears it)
    pub executor_id: Option<i64>,

    /// New label set
    pub labels: Vec<i64>,
}

impl Task {
    /// Creates a task and attaches its labels in one transaction
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation if the status, executor or any
    /// label doesn't exist.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (name, description, status_id, author_id, executor_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, status_id, author_id, executor_id, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.status_id)
        .bind(data.author_id)
        .bind(data.executor_id)
        .fetch_one(&mut *tx)
        .await?;

        replace_labels(&mut tx, task.id, &data.labels).await?;

        tx.commit().await?;

        Ok(task)
    }

    /// Finds a task row by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, name, description, status_id, author_id, executor_id, created_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists every task row, oldest first
    ///
    /// Pages use [`crate::filter::list_tasks`] instead.
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, name, description, status_id, author_id, executor_id, created_at
            FROM tasks
            ORDER BY id ASC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Finds a task with its status, author, executor and labels resolved
    pub async fn find_detail(pool: &PgPool, id: i64) -> Result<Option<TaskDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE t.id = $1");

        let task = sqlx::query_as::<_, TaskDetail>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        match task {
            Some(task) => {
                let mut tasks = [task];
                attach_labels(pool, &mut tasks).await?;
                let [task] = tasks;
                Ok(Some(task))
            }
            None => Ok(None),
        }
    }

    /// Updates the editable fields of a task and replaces its label set
    ///
    /// The author is left untouched.
    ///
    /// # Returns
    ///
    /// The updated task, or None if it doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET name = $2, description = $3, status_id = $4, executor_id = $5
            WHERE id = $1
            RETURNING id, name, description, status_id, author_id, executor_id, created_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.status_id)
        .bind(data.executor_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(task) = task else {
            tx.rollback().await?;
            return Ok(None);
        };

        replace_labels(&mut tx, task.id, &data.labels).await?;

        tx.commit().await?;

        Ok(Some(task))
    }

    /// Deletes a task; its label links go with it
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Replaces the label set of a task inside an open transaction
async fn replace_labels(
    tx: &mut Transaction<'_, Postgres>,
    task_id: i64,
    labels: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM task_labels WHERE task_id = $1")
        .bind(task_id)
        .execute(&mut **tx)
        .await?;

    let labels = dedup_ids(labels);
    if labels.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO task_labels (task_id, label_id)
        SELECT $1, UNNEST($2::BIGINT[])
        "#,
    )
    .bind(task_id)
    .bind(&labels)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Loads labels for every task in the slice with a single query
pub(crate) async fn attach_labels(
    pool: &PgPool,
    tasks: &mut [TaskDetail],
) -> Result<(), sqlx::Error> {
    let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();

    for row in Label::list_for_tasks(pool, &ids).await? {
        if let Some(task) = tasks.iter_mut().find(|t| t.id == row.task_id) {
            task.labels.push(row.into());
        }
    }

    Ok(())
}

/// Sorted, duplicate-free copy of an ID list
fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}
