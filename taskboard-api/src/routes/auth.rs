/// Authentication endpoints
///
/// - `GET /login/` - login page (echoes a safe `next` target)
/// - `POST /login/` - verify credentials, set the session cookie, redirect
/// - `POST /logout/` - clear the session cookie, redirect home
///
/// The session is an HS256 token in an HttpOnly `session` cookie; see
/// [`taskboard_shared::auth::session`]. Registration lives in
/// [`super::users`] and deliberately does not sign the new user in.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::access_gate::SESSION_COOKIE,
    notice::Outcome,
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::json;
use taskboard_shared::{
    auth::{
        password,
        principal::Principal,
        session::{create_token, SessionClaims},
    },
    models::user::User,
};
use validator::Validate;

/// Form-wide error for a failed login
pub const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "This field is required."))]
    pub username: String,

    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,

    /// Where to go after login; the query parameter is used when absent
    #[serde(default)]
    pub next: Option<String>,
}

/// `?next=` query parameter
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Returns true for local, absolute paths only
///
/// Rejects scheme-relative (`//host`) and backslash tricks so `next` can't
/// send the user to another site.
pub fn is_safe_next(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Login page
pub async fn login_page(
    Extension(principal): Extension<Principal>,
    Query(query): Query<NextQuery>,
    jar: CookieJar,
) -> ApiResult<Outcome> {
    let next = query.next.filter(|n| is_safe_next(n));

    Outcome::render(
        jar,
        &json!({
            "principal": principal,
            "next": next,
            "form": { "username": "", "password": "" },
        }),
    )
}

/// Login
///
/// # Errors
///
/// - `422 Unprocessable Entity`: missing fields or wrong credentials
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Outcome> {
    req.validate()?;

    let user = User::find_by_username(&state.db, &req.username).await?;

    let verified = match &user {
        Some(user) => match password::verify_password(&req.password, &user.password_hash) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!(user_id = user.id, error = %e, "Stored password hash unusable");
                false
            }
        },
        None => false,
    };

    let Some(user) = user.filter(|_| verified) else {
        tracing::info!(username = %req.username, "Failed login attempt");
        return Err(ApiError::invalid("__all__", INVALID_LOGIN));
    };

    let claims = SessionClaims::new(user.id, &user.username, state.config.session_ttl());
    let token = create_token(&claims, state.session_secret())?;

    let target = req
        .next
        .or(query.next)
        .filter(|n| is_safe_next(n))
        .unwrap_or_else(|| "/".to_string());

    tracing::info!(user_id = user.id, "User logged in");

    let secure = state.config.api.production;
    Ok(Outcome::redirect(jar, target)
        .success("You are logged in")
        .map_jar(|jar| jar.add(session_cookie(token, secure))))
}

/// Logout (POST only)
pub async fn logout(Extension(principal): Extension<Principal>, jar: CookieJar) -> Outcome {
    if let Some(user_id) = principal.user_id() {
        tracing::info!(user_id, "User logged out");
    }

    Outcome::redirect(jar, "/")
        .info("You are logged out")
        .map_jar(|jar| jar.remove(Cookie::build(SESSION_COOKIE).path("/")))
}
