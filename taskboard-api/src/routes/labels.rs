/// Label endpoints
///
/// - `GET /labels/` - list labels
/// - `POST /labels/create/` - create
/// - `GET|POST /labels/:id/update/` - rename
/// - `GET|POST /labels/:id/delete/` - delete unless attached to a task
///
/// Labels are shared like statuses. Their delete checks for attached tasks
/// before touching the row.

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
    models::label::Label,
};
use validator::Validate;

const LABELS_ROUTE: &str = "/labels/";

/// Create/rename request
#[derive(Debug, Deserialize, Validate)]
pub struct LabelRequest {
    #[validate(length(min = 1, max = 255, message = "This field is required."))]
    pub name: String,
}

fn action(operation: Operation) -> Action {
    Action::new(EntityKind::Label, operation)
}

pub async fn list_labels(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, action(Operation::List), Target::Shared) {
        return Ok(denied(jar, err));
    }

    let labels = Label::list(&state.db).await?;

    Outcome::render(jar, &json!({ "labels": labels }))
}

/// Create a label
///
/// # Errors
///
/// - `422 Unprocessable Entity`: empty or duplicate name
pub async fn create_label(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LabelRequest>,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, action(Operation::Create), Target::Shared) {
        return Ok(denied(jar, err));
    }

    req.validate()?;
    let label = Label::create(&state.db, required_name(&req.name)?).await?;
    tracing::info!(label_id = label.id, "Label created");

    Ok(Outcome::redirect(jar, LABELS_ROUTE).success("Label created successfully"))
}

pub async fn update_label_page(
    Path(id): Path<i64>,
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, action(Operation::Update), Target::Shared) {
        return Ok(denied(jar, err));
    }

    let label = Label::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Label", id))?;

    Outcome::render(jar, &json!({ "label": label }))
}

pub async fn update_label(
    Path(id): Path<i64>,
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LabelRequest>,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, action(Operation::Update), Target::Shared) {
        return Ok(denied(jar, err));
    }

    req.validate()?;
    Label::update(&state.db, id, required_name(&req.name)?)
        .await?
        .ok_or_else(|| not_found("Label", id))?;

    Ok(Outcome::redirect(jar, LABELS_ROUTE).success("Label updated successfully"))
}

pub async fn delete_label_page(
    Path(id): Path<i64>,
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, action(Operation::Delete), Target::Shared) {
        return Ok(denied(jar, err));
    }

    let label = Label::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Label", id))?;

    Outcome::render(jar, &json!({ "label": label }))
}

/// Delete a label
///
/// A label attached to any task is kept and the redirect carries an error
/// notice instead.
pub async fn delete_label(
    Path(id): Path<i64>,
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, action(Operation::Delete), Target::Shared) {
        return Ok(denied(jar, err));
    }

    let target = GuardedEntity::Label(id);
    let outcome = Outcome::redirect(jar, LABELS_ROUTE);

    match guarded_delete(&state.db, target).await? {
        DeleteOutcome::Deleted => Ok(outcome.success("Label deleted successfully")),
        DeleteOutcome::Blocked => Ok(outcome.error(target.blocked_notice())),
        DeleteOutcome::NotFound => Err(not_found("Label", id)),
    }
}
