/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskboard_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{access_gate::access_gate, allowed_hosts::validate_host, security::SecurityHeadersLayer},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Key for signing and validating session tokens
    pub fn session_secret(&self) -> &str {
        &self.config.session.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// /                              GET        home (public)
/// /health                        GET        health check (public)
/// /login/                        GET, POST  sign in (public)
/// /logout/                       POST       sign out
/// /users/                        GET        user list (public)
/// /users/create/                 POST       registration (public)
/// /users/:id/update/             GET, POST  self only
/// /users/:id/delete/             GET, POST  self only
/// /statuses/ and /labels/        GET        list
///   create/                      POST
///   :id/update/, :id/delete/     GET, POST
/// /tasks/                        GET        filtered, paginated list
/// /tasks/create/                 GET, POST
/// /tasks/:id/                    GET
/// /tasks/:id/update/             GET, POST
/// /tasks/:id/delete/             GET, POST  author only
/// ```
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS
/// 3. Security headers
/// 4. Host validation
/// 5. Access gate
pub fn build_router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/users/", get(routes::users::list_users))
        .route("/users/create/", post(routes::users::create_user))
        .route(
            "/users/:id/update/",
            get(routes::users::update_user_page).post(routes::users::update_user),
        )
        .route(
            "/users/:id/delete/",
            get(routes::users::delete_user_page).post(routes::users::delete_user),
        );

    let status_routes = Router::new()
        .route("/statuses/", get(routes::statuses::list_statuses))
        .route("/statuses/create/", post(routes::statuses::create_status))
        .route(
            "/statuses/:id/update/",
            get(routes::statuses::update_status_page).post(routes::statuses::update_status),
        )
        .route(
            "/statuses/:id/delete/",
            get(routes::statuses::delete_status_page).post(routes::statuses::delete_status),
        );

    let label_routes = Router::new()
        .route("/labels/", get(routes::labels::list_labels))
        .route("/labels/create/", post(routes::labels::create_label))
        .route(
            "/labels/:id/update/",
            get(routes::labels::update_label_page).post(routes::labels::update_label),
        )
        .route(
            "/labels/:id/delete/",
            get(routes::labels::delete_label_page).post(routes::labels::delete_label),
        );

    let task_routes = Router::new()
        .route("/tasks/", get(routes::tasks::list_tasks))
        .route(
            "/tasks/create/",
            get(routes::tasks::create_task_page).post(routes::tasks::create_task),
        )
        .route("/tasks/:id/", get(routes::tasks::task_detail))
        .route(
            "/tasks/:id/update/",
            get(routes::tasks::update_task_page).post(routes::tasks::update_task),
        )
        .route(
            "/tasks/:id/delete/",
            get(routes::tasks::delete_task_page).post(routes::tasks::delete_task),
        );

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route("/", get(routes::home::index))
        .route("/health", get(routes::health::health_check))
        .route("/login/", get(routes::auth::login_page).post(routes::auth::login))
        .route("/logout/", post(routes::auth::logout))
        .merge(user_routes)
        .merge(status_routes)
        .merge(label_routes)
        .merge(task_routes)
        .layer(axum::middleware::from_fn_with_state(state.clone(), access_gate))
        .layer(axum::middleware::from_fn_with_state(state.clone(), validate_host))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
