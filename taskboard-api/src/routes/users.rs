/// User endpoints
///
/// - `GET /users/` - list users (public)
/// - `POST /users/create/` - register (public); redirects to the login page
///   without signing the new user in
/// - `GET|POST /users/:id/update/` - edit own account
/// - `GET|POST /users/:id/delete/` - delete own account, unless a task still
///   names the user as author or executor

use std::borrow::Cow;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::access_gate::SESSION_COOKIE,
    notice::Outcome,
    routes::{denied, not_found},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use serde_json::json;
use taskboard_shared::{
    auth::{
        password,
        policy::{authorize, Action, EntityKind, Operation, Target, LOGIN_ROUTE, USERS_LIST_ROUTE},
        principal::Principal,
    },
    guard::{guarded_delete, DeleteOutcome, GuardedEntity},
    models::user::{CreateUser, UpdateUser, User},
};
use validator::{Validate, ValidateEmail, ValidationError};

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 1, max = 150, message = "Required. 150 characters or fewer."),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub last_name: String,

    #[serde(default)]
    #[validate(custom(function = "validate_optional_email"))]
    pub email: String,

    pub password1: String,

    /// Confirmation; must equal `password1`
    pub password2: String,
}

/// Account update request
///
/// The password is only changed when `password1` is given.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(
        length(min = 1, max = 150, message = "Required. 150 characters or fewer."),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub last_name: String,

    #[serde(default)]
    #[validate(custom(function = "validate_optional_email"))]
    pub email: String,

    #[serde(default)]
    pub password1: Option<String>,

    #[serde(default)]
    pub password2: Option<String>,
}

/// Letters, digits and `@.+-_` only
fn validate_username(username: &str) -> Result<(), ValidationError> {
    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("username").with_message(Cow::Borrowed(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        )))
    }
}

/// Email is optional, but must be valid when present
fn validate_optional_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() || email.validate_email() {
        Ok(())
    } else {
        Err(ValidationError::new("email").with_message(Cow::Borrowed("Enter a valid email address.")))
    }
}

/// Checks the password pair, reporting problems on `password2`
fn check_passwords(password1: &str, password2: &str) -> ApiResult<()> {
    password::validate_new_password(password1, password2)
        .map_err(|message| ApiError::invalid("password2", &message))
}

/// List users
pub async fn list_users(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, Action::new(EntityKind::User, Operation::List), Target::None) {
        return Ok(denied(jar, err));
    }

    let users = User::list(&state.db).await?;

    Outcome::render(jar, &json!({ "users": users }))
}

/// Register a new user
///
/// # Errors
///
/// - `422 Unprocessable Entity`: invalid fields, password mismatch, or the
///   username is taken
pub async fn create_user(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, Action::new(EntityKind::User, Operation::Create), Target::None) {
        return Ok(denied(jar, err));
    }

    req.validate()?;
    check_passwords(&req.password1, &req.password2)?;

    let password_hash = password::hash_password(&req.password1)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok(Outcome::redirect(jar, LOGIN_ROUTE).success("User registered successfully. Please sign in."))
}

/// Account edit page
pub async fn update_user_page(
    Path(id): Path<i64>,
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, Action::new(EntityKind::User, Operation::Update), Target::User { id }) {
        return Ok(denied(jar, err));
    }

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("User", id))?;

    Outcome::render(jar, &json!({ "user": user }))
}

/// Update own account
pub async fn update_user(
    Path(id): Path<i64>,
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, Action::new(EntityKind::User, Operation::Update), Target::User { id }) {
        return Ok(denied(jar, err));
    }

    req.validate()?;

    let password_hash = match req.password1.as_deref().filter(|p| !p.is_empty()) {
        Some(password1) => {
            check_passwords(password1, req.password2.as_deref().unwrap_or_default())?;
            Some(password::hash_password(password1)?)
        }
        None => None,
    };

    let user = User::update(
        &state.db,
        id,
        UpdateUser {
            username: Some(req.username),
            password_hash,
            first_name: Some(req.first_name),
            last_name: Some(req.last_name),
            email: Some(req.email),
        },
    )
    .await?
    .ok_or_else(|| not_found("User", id))?;

    tracing::info!(user_id = user.id, "User updated");

    Ok(Outcome::redirect(jar, USERS_LIST_ROUTE).success("User updated successfully."))
}

/// Account delete confirmation page
pub async fn delete_user_page(
    Path(id): Path<i64>,
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, Action::new(EntityKind::User, Operation::Delete), Target::User { id }) {
        return Ok(denied(jar, err));
    }

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("User", id))?;

    Outcome::render(jar, &json!({ "user": user }))
}

/// Delete own account
///
/// A referenced account stays in place and the response carries an error
/// notice. A deleted account is signed out.
pub async fn delete_user(
    Path(id): Path<i64>,
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, Action::new(EntityKind::User, Operation::Delete), Target::User { id }) {
        return Ok(denied(jar, err));
    }

    let target = GuardedEntity::User(id);
    let outcome = Outcome::redirect(jar, USERS_LIST_ROUTE);

    match guarded_delete(&state.db, target).await? {
        DeleteOutcome::Deleted => {
            tracing::info!(user_id = id, "User deleted");
            Ok(outcome
                .success("User deleted successfully")
                .map_jar(|jar| jar.remove(Cookie::build(SESSION_COOKIE).path("/"))))
        }
        DeleteOutcome::Blocked => Ok(outcome.error(target.blocked_notice())),
        DeleteOutcome::NotFound => Err(not_found("User", id)),
    }
}
