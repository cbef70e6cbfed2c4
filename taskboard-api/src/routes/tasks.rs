/// Task endpoints
///
/// - `GET /tasks/` - filtered, paginated list
///   (`?status=&executor=&label=&self_tasks=on&page=2`)
/// - `GET|POST /tasks/create/` - form choices / create (the principal becomes author)
/// - `GET /tasks/:id/` - detail
/// - `GET|POST /tasks/:id/update/` - any authenticated user
/// - `GET|POST /tasks/:id/delete/` - author only
///
/// # Create / update body
///
/// ```json
/// { "name": "Fix login", "description": "", "status": 1, "executor": 2, "labels": [1, 3] }
/// ```

use crate::{
    app::AppState,
    error::ApiResult,
    notice::Outcome,
    routes::{denied, not_found, required_name},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use taskboard_shared::{
    auth::{
        policy::{authorize, Action, AuthzError, EntityKind, Operation, Target, TASKS_LIST_ROUTE},
        principal::Principal,
    },
    filter::{self, TaskFilter, TaskFilterParams},
    models::{
        label::Label,
        status::Status,
        task::{CreateTask, Task, UpdateTask},
        user::User,
    },
};
use validator::Validate;

/// Create/update request
#[derive(Debug, Deserialize, Validate)]
pub struct TaskRequest {
    #[validate(length(min = 1, max = 255, message = "This field is required."))]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Status ID
    pub status: i64,

    /// Executor user ID
    #[serde(default)]
    pub executor: Option<i64>,

    /// Label IDs
    #[serde(default)]
    pub labels: Vec<i64>,
}

fn action(operation: Operation) -> Action {
    Action::new(EntityKind::Task, operation)
}

/// Everything a task form can pick from
async fn choices(pool: &PgPool) -> Result<serde_json::Value, sqlx::Error> {
    let statuses = Status::list(pool).await?;
    let users = User::list(pool).await?;
    let labels = Label::list(pool).await?;

    Ok(json!({
        "statuses": statuses,
        "executors": users,
        "labels": labels,
    }))
}

async fn find_task(pool: &PgPool, id: i64) -> ApiResult<Task> {
    Task::find_by_id(pool, id)
        .await?
        .ok_or_else(|| not_found("Task", id))
}

/// Filtered task list
pub async fn list_tasks(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    Query(params): Query<TaskFilterParams>,
    jar: CookieJar,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, action(Operation::List), Target::None) {
        return Ok(denied(jar, err));
    }

    let filter = TaskFilter::new(&params, principal.user_id());
    let page = filter::list_tasks(
        &state.db,
        &filter,
        params.page_request(),
        state.config.pagination.tasks_page_size,
    )
    .await?;

    Outcome::render(
        jar,
        &json!({
            "tasks": page,
            "filter": {
                "status": params.status,
                "executor": params.executor,
                "label": params.label,
                "self_tasks": params.self_tasks,
            },
            "choices": choices(&state.db).await?,
        }),
    )
}

pub async fn task_detail(
    Path(id): Path<i64>,
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Outcome> {
    let task = Task::find_detail(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Task", id))?;

    if let Err(err) = authorize(&principal, action(Operation::View), Target::Task { author_id: task.author_id }) {
        return Ok(denied(jar, err));
    }

    Outcome::render(jar, &json!({ "task": task }))
}

pub async fn create_task_page(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, action(Operation::Create), Target::None) {
        return Ok(denied(jar, err));
    }

    Outcome::render(jar, &json!({ "choices": choices(&state.db).await? }))
}

/// Create a task authored by the principal
///
/// # Errors
///
/// - `422 Unprocessable Entity`: empty name, or unknown status, executor or label
pub async fn create_task(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<TaskRequest>,
) -> ApiResult<Outcome> {
    if let Err(err) = authorize(&principal, action(Operation::Create), Target::None) {
        return Ok(denied(jar, err));
    }
    let Some(author_id) = principal.user_id() else {
        return Ok(denied(jar, AuthzError::AuthenticationRequired));
    };

    req.validate()?;
    let name = required_name(&req.name)?.to_string();

    let task = Task::create(
        &state.db,
        CreateTask {
            name,
            description: req.description,
            status_id: req.status,
            author_id,
            executor_id: req.executor,
            labels: req.labels,
        },
    )
    .await?;

    tracing::info!(task_id = task.id, author_id, "Task created");

    Ok(Outcome::redirect(jar, TASKS_LIST_ROUTE).success("Task created successfully"))
}

pub async fn update_task_page(
    Path(id): Path<i64>,
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Outcome> {
    let task = Task::find_detail(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Task", id))?;

    if let Err(err) = authorize(&principal, action(Operation::Update), Target::Task { author_id: task.author_id }) {
        return Ok(denied(jar, err));
    }

    Outcome::render(
        jar,
        &json!({
            "task": task,
            "choices": choices(&state.db).await?,
        }),
    )
}

/// Update a task
///
/// The author never changes; the request has no way to name one.
pub async fn update_task(
    Path(id): Path<i64>,
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<TaskRequest>,
) -> ApiResult<Outcome> {
    let task = find_task(&state.db, id).await?;

    if let Err(err) = authorize(&principal, action(Operation::Update), Target::Task { author_id: task.author_id }) {
        return Ok(denied(jar, err));
    }

    req.validate()?;
    let name = required_name(&req.name)?.to_string();

    Task::update(
        &state.db,
        id,
        UpdateTask {
            name,
            description: req.description,
            status_id: req.status,
            executor_id: req.executor,
            labels: req.labels,
        },
    )
    .await?
    .ok_or_else(|| not_found("Task", id))?;

    tracing::info!(task_id = id, "Task updated");

    Ok(Outcome::redirect(jar, TASKS_LIST_ROUTE).success("Task updated successfully"))
}

pub async fn delete_task_page(
    Path(id): Path<i64>,
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Outcome> {
    let task = Task::find_detail(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Task", id))?;

    if let Err(err) = authorize(&principal, action(Operation::Delete), Target::Task { author_id: task.author_id }) {
        return Ok(denied(jar, err));
    }

    Outcome::render(jar, &json!({ "task": task }))
}

/// Delete a task (author only)
pub async fn delete_task(
    Path(id): Path<i64>,
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Outcome> {
    let task = find_task(&state.db, id).await?;

    if let Err(err) = authorize(&principal, action(Operation::Delete), Target::Task { author_id: task.author_id }) {
        return Ok(denied(jar, err));
    }

    if !Task::delete(&state.db, id).await? {
        return Err(not_found("Task", id));
    }

    tracing::info!(task_id = id, "Task deleted");

    Ok(Outcome::redirect(jar, TASKS_LIST_ROUTE).success("Task deleted successfully"))
}
