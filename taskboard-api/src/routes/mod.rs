/// Route handlers
///
/// One module per resource. Every handler runs its checks in the same order:
/// the access gate (middleware) has already resolved the principal, then the
/// ownership policy is consulted, then, for deletes of shared entities, the
/// reference guard, and only then the store is written.
///
/// - `home`: landing page
/// - `health`: health check endpoint
/// - `auth`: login and logout
/// - `users`: registration, listing, self-service update and delete
/// - `statuses`, `labels`: shared vocabularies
/// - `tasks`: task CRUD and the filtered task list

pub mod auth;
pub mod health;
pub mod home;
pub mod labels;
pub mod statuses;
pub mod tasks;
pub mod users;

use axum_extra::extract::CookieJar;
use taskboard_shared::auth::policy::AuthzError;

use crate::notice::Outcome;

/// Redirect carrying the denial notice
pub(crate) fn denied(jar: CookieJar, err: AuthzError) -> Outcome {
    tracing::info!(reason = %err, "Action denied");
    Outcome::redirect(jar, err.redirect_to()).error(err.notice())
}

/// 404 for a missing entity
pub(crate) fn not_found(kind: &str, id: i64) -> crate::error::ApiError {
    crate::error::ApiError::NotFound(format!("{} {} not found", kind, id))
}

/// Trimmed name, or a `name` field error when blank
pub(crate) fn required_name(name: &str) -> crate::error::ApiResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(crate::error::ApiError::invalid("name", "This field is required."));
    }
    Ok(name)
}
