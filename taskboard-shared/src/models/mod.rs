/// Database models for the task tracker
///
/// This module contains the entity store: every model with its CRUD
/// operations against PostgreSQL.
///
/// # Models
///
/// - `user`: Accounts, authors and executors of tasks
/// - `status`: Named task states
/// - `label`: Tags attached to tasks (many-to-many via `task_labels`)
/// - `task`: Tasks with status, author, optional executor and labels
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::status::Status;
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let status = Status::create(&pool, "new").await?;
/// let all = Status::list(&pool).await?;
/// assert!(all.iter().any(|s| s.id == status.id));
/// # Ok(())
/// # }
/// ```

pub mod label;
pub mod status;
pub mod task;
pub mod user;
