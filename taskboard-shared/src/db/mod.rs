/// Database layer
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health check
/// - `migrations`: Embedded schema migrations
/// - Models are in the `models` module at crate root level

pub mod migrations;
pub mod pool;

/// SQLSTATE for `foreign_key_violation`
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

/// SQLSTATE for `unique_violation`
pub const UNIQUE_VIOLATION: &str = "23505";

/// Returns the violated constraint name if `err` carries the given SQLSTATE
pub fn constraint_violation<'a>(err: &'a sqlx::Error, sqlstate: &str) -> Option<&'a str> {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(sqlstate) => {
            Some(db_err.constraint().unwrap_or_default())
        }
        _ => None,
    }
}
