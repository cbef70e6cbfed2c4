/// Reference guard
///
/// Users, statuses and labels may not disappear while a task still points at
/// them. Two equivalent strategies are available:
///
/// - [`GuardStrategy::Constraint`]: attempt the delete and read a foreign key
///   violation (SQLSTATE 23503) as "blocked".
/// - [`GuardStrategy::PreCheck`]: ask the store whether any task references
///   the entity, and only delete when none does. A violation raised by the
///   delete itself (a reference created in between) still reads as "blocked".
///
/// Either way a blocked entity is left untouched and the caller gets
/// [`DeleteOutcome::Blocked`] rather than an error.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::guard::{guarded_delete, DeleteOutcome, GuardedEntity};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// match guarded_delete(&pool, GuardedEntity::Status(3)).await? {
///     DeleteOutcome::Deleted => println!("gone"),
///     DeleteOutcome::Blocked => println!("still in use"),
///     DeleteOutcome::NotFound => println!("no such status"),
/// }
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use tracing::{debug, info};

use crate::db::{constraint_violation, FOREIGN_KEY_VIOLATION};
use crate::models::{label::Label, status::Status, user::User};

/// How deletion of a referenced entity is detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStrategy {
    /// Query for references before deleting
    PreCheck,

    /// Delete and interpret the store's foreign key violation
    Constraint,
}

/// An entity that tasks can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedEntity {
    /// Referenced as task author or executor
    User(i64),

    /// Referenced as task status
    Status(i64),

    /// Referenced through task labels
    Label(i64),
}

/// Result of a guarded delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The entity was removed
    Deleted,

    /// The entity is still referenced and was left in place
    Blocked,

    /// No entity with that ID
    NotFound,
}

impl GuardedEntity {
    /// Strategy used by [`guarded_delete`] for this kind
    pub fn default_strategy(&self) -> GuardStrategy {
        match self {
            GuardedEntity::User(_) | GuardedEntity::Status(_) => GuardStrategy::Constraint,
            GuardedEntity::Label(_) => GuardStrategy::PreCheck,
        }
    }

    /// Kind name used in notices and logs
    pub fn kind(&self) -> &'static str {
        match self {
            GuardedEntity::User(_) => "user",
            GuardedEntity::Status(_) => "status",
            GuardedEntity::Label(_) => "label",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            GuardedEntity::User(id) | GuardedEntity::Status(id) | GuardedEntity::Label(id) => *id,
        }
    }

    /// Notice shown when the delete is blocked
    pub fn blocked_notice(&self) -> String {
        format!("Cannot delete {} because it is in use", self.kind())
    }

    /// Returns true if any task references the entity
    pub async fn is_referenced(&self, pool: &PgPool) -> Result<bool, sqlx::Error> {
        match *self {
            GuardedEntity::User(id) => User::is_referenced(pool, id).await,
            GuardedEntity::Status(id) => Status::is_referenced(pool, id).await,
            GuardedEntity::Label(id) => Label::is_referenced(pool, id).await,
        }
    }

    async fn delete_row(&self, pool: &PgPool) -> Result<bool, sqlx::Error> {
        match *self {
            GuardedEntity::User(id) => User::delete(pool, id).await,
            GuardedEntity::Status(id) => Status::delete(pool, id).await,
            GuardedEntity::Label(id) => Label::delete(pool, id).await,
        }
    }
}

/// Deletes the entity unless a task references it, using its default strategy
pub async fn guarded_delete(
    pool: &PgPool,
    target: GuardedEntity,
) -> Result<DeleteOutcome, sqlx::Error> {
    guarded_delete_with(pool, target, target.default_strategy()).await
}

/// Deletes the entity unless a task references it
///
/// # Errors
///
/// Only store faults unrelated to referential integrity are returned.
pub async fn guarded_delete_with(
    pool: &PgPool,
    target: GuardedEntity,
    strategy: GuardStrategy,
) -> Result<DeleteOutcome, sqlx::Error> {
    if strategy == GuardStrategy::PreCheck && target.is_referenced(pool).await? {
        info!(kind = target.kind(), id = target.id(), "Delete blocked by existing references");
        return Ok(DeleteOutcome::Blocked);
    }

    let outcome = interpret_delete(target.delete_row(pool).await)?;

    match outcome {
        DeleteOutcome::Blocked => {
            info!(kind = target.kind(), id = target.id(), "Delete refused by foreign key")
        }
        _ => debug!(kind = target.kind(), id = target.id(), ?outcome, "Guarded delete finished"),
    }

    Ok(outcome)
}

/// Maps the result of a raw delete onto a [`DeleteOutcome`]
pub fn interpret_delete(result: Result<bool, sqlx::Error>) -> Result<DeleteOutcome, sqlx::Error> {
    match result {
        Ok(true) => Ok(DeleteOutcome::Deleted),
        Ok(false) => Ok(DeleteOutcome::NotFound),
        Err(err) if constraint_violation(&err, FOREIGN_KEY_VIOLATION).is_some() => {
            Ok(DeleteOutcome::Blocked)
        }
        Err(err) => Err(err),
    }
}
