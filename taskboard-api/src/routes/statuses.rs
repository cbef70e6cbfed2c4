/// Status endpoints
///
/// - `GET /statuses/` - list statuses
/// - `POST /statuses/create/` - create
/// - `GET|POST /statuses/:id/update/` - rename
/// - `GET|POST /statuses/:id/delete/` - delete unless a task uses it
///
/// Any authenticated user may manage statuses; there is no owner.

use crate::{
    app::AppState,
    error::ApiResult,
    notice::Outcome,
    routes::{denied, not_found, required_name},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;
use taskboard_shared::{
    auth::{
        policy::{authorize, Action, EntityKind, Operation, Target},
        principal::Principal,
    },
    guard::{guarded_delete, DeleteOutcome, GuardedEntity},
    models::status::Status,
};
use validator::Validate;

const STATUSES_ROUTE: &str = "/statuses/";

/// Create/rename request
#[derive(Debug, Deserialize, Validate)]
pub struct StatusRequest {
    #[validate(length(min = 1, max = 255, message = "This field is required."))]
    pub name: String,
}

fn action(operation: Operation) -> Action {
    Action::new(EntityKind::Status, operation)
}

pub async fn list_statuses(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, action(Operation::List), Target::Shared) {
        return Ok(denied(jar, err));
    }

    let statuses = Status::list(&state.db).await?;

    Outcome::render(jar, &json!({ "statuses": statuses }))
}

/// Create a status
///
/// # Errors
///
/// - `422 Unprocessable Entity`: empty or duplicate name
pub async fn create_status(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<StatusRequest>,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, action(Operation::Create), Target::Shared) {
        return Ok(denied(jar, err));
    }

    req.validate()?;
    let status = Status::create(&state.db, required_name(&req.name)?).await?;
    tracing::info!(status_id = status.id, "Status created");

    Ok(Outcome::redirect(jar, STATUSES_ROUTE).success("Status created successfully"))
}

pub async fn update_status_page(
    Path(id): Path<i64>,
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, action(Operation::Update), Target::Shared) {
        return Ok(denied(jar, err));
    }

    let status = Status::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Status", id))?;

    Outcome::render(jar, &json!({ "status": status }))
}

pub async fn update_status(
    Path(id): Path<i64>,
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<StatusRequest>,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, action(Operation::Update), Target::Shared) {
        return Ok(denied(jar, err));
    }

    req.validate()?;
    Status::update(&state.db, id, required_name(&req.name)?)
        .await?
        .ok_or_else(|| not_found("Status", id))?;

    Ok(Outcome::redirect(jar, STATUSES_ROUTE).success("Status updated successfully"))
}

pub async fn delete_status_page(
    Path(id): Path<i64>,
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, action(Operation::Delete), Target::Shared) {
        return Ok(denied(jar, err));
    }

    let status = Status::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Status", id))?;

    Outcome::render(jar, &json!({ "status": status }))
}

/// Delete a status
///
/// A status still used by a task is kept; the redirect carries an error
/// notice instead.
pub async fn delete_status(
    Path(id): Path<i64>,
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, action(Operation::Delete), Target::Shared) {
        return Ok(denied(jar, err));
    }

    let target = GuardedEntity::Status(id);
    let outcome = Outcome::redirect(jar, STATUSES_ROUTE);

    match guarded_delete(&state.db, target).await? {
        DeleteOutcome::Deleted => Ok(outcome.success("Status deleted successfully")),
        DeleteOutcome::Blocked => Ok(outcome.error(target.blocked_notice())),
        DeleteOutcome::NotFound => Err(not_found("Status", id)),
    }
}
