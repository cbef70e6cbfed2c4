/// User model and database operations
///
/// Users register themselves, may author tasks and may be assigned to tasks
/// as executor. A user referenced by any task cannot be deleted (see
/// [`crate::guard`]).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     username VARCHAR(150) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     first_name VARCHAR(150) NOT NULL DEFAULT '',
///     last_name VARCHAR(150) NOT NULL DEFAULT '',
///     email VARCHAR(254) NOT NULL DEFAULT '',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::user::{User, CreateUser};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     username: "john".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     first_name: "John".to_string(),
///     last_name: "Doe".to_string(),
///     email: String::new(),
/// }).await?;
///
/// let found = User::find_by_username(&pool, "john").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

const USER_COLUMNS: &str = "id, username, password_hash, first_name, last_name, email, created_at";

/// User model representing an account
///
/// Passwords are stored as Argon2id hashes and are never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: i64,

    /// Login name, unique across all users
    pub username: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Given name (may be empty)
    pub first_name: String,

    /// Family name (may be empty)
    pub last_name: String,

    /// Contact email (may be empty)
    pub email: String,

    /// When the account was registered
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Returns "First Last", falling back to the username when both are empty
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Login name
    pub username: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Contact email
    pub email: String,
}

/// Input for updating an existing user
///
/// All fields are optional. Only non-None fields will be updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    /// New login name
    pub username: Option<String>,

    /// New password hash
    pub password_hash: Option<String>,

    /// New given name
    pub first_name: Option<String>,

    /// New family name
    pub last_name: Option<String>,

    /// New contact email
    pub email: Option<String>,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the username is taken (`users_username_key`)
    /// or the database connection fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, password_hash, first_name, last_name, email)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(data.username)
            .bind(data.password_hash)
            .bind(data.first_name)
            .bind(data.last_name)
            .bind(data.email)
            .fetch_one(pool)
            .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by username (exact match)
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Updates an existing user
    ///
    /// Only non-None fields in `data` are written.
    ///
    /// # Returns
    ///
    /// The updated user, or None if the user doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if the new username belongs to another user or the
    /// database connection fails
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut assignments = Vec::new();
        let mut bind_count = 1;

        for (column, present) in [
            ("username", data.username.is_some()),
            ("password_hash", data.password_hash.is_some()),
            ("first_name", data.first_name.is_some()),
            ("last_name", data.last_name.is_some()),
            ("email", data.email.is_some()),
        ] {
            if present {
                bind_count += 1;
                assignments.push(format!("{column} = ${bind_count}"));
            }
        }

        if assignments.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let query = format!(
            "UPDATE users SET {} WHERE id = $1 RETURNING {USER_COLUMNS}",
            assignments.join(", ")
        );

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        for value in [
            data.username,
            data.password_hash,
            data.first_name,
            data.last_name,
            data.email,
        ]
        .into_iter()
        .flatten()
        {
            q = q.bind(value);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a user by ID
    ///
    /// # Returns
    ///
    /// True if the user was deleted, false if the user didn't exist
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation (SQLSTATE 23503) while any task
    /// names the user as author or executor.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all users in registration order
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC");

        sqlx::query_as::<_, User>(&query).fetch_all(pool).await
    }

    /// Returns true if any task names this user as author or executor
    pub async fn is_referenced(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM tasks WHERE author_id = $1 OR executor_id = $1
            )",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }
}
