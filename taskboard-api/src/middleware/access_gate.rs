/// Access gate
///
/// Outermost application middleware. For every request it:
///
/// 1. Resolves the [`Principal`] from the `session` cookie. A missing,
///    expired or tampered token resolves to [`Principal::Anonymous`], and so
///    does a valid token whose account no longer exists.
/// 2. Inserts the principal into the request extensions.
/// 3. Classifies the path. Protected paths requested anonymously are
///    redirected to `/login/?next=<original path and query>` with a
///    "login required" notice, and the handler never runs.
///
/// Public paths: `/`, `/login/`, `/users/create/`, `/users/`, `/health`, and
/// anything under `/static/` or `/admin/`.

use axum::{
    extract::{Request, State},
    http::Uri,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use sqlx::PgPool;
use taskboard_shared::{
    auth::{
        policy::{AuthzError, LOGIN_ROUTE},
        principal::{AuthContext, Principal},
        session,
    },
    models::user::User,
};

use crate::{app::AppState, error::ApiError, notice::Outcome};

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

const PUBLIC_PATHS: [&str; 5] = ["/", LOGIN_ROUTE, "/users/create/", "/users/", "/health"];

const PUBLIC_PREFIXES: [&str; 2] = ["/static/", "/admin/"];

/// Whether a path needs an authenticated principal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Public,
    Protected,
}

/// Classifies a request path (without query)
pub fn classify_path(path: &str) -> PathClass {
    if PUBLIC_PATHS.contains(&path) || PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p)) {
        PathClass::Public
    } else {
        PathClass::Protected
    }
}

/// Resolves the principal carried by the session cookie
pub fn resolve_principal(jar: &CookieJar, secret: &str) -> Principal {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Principal::Anonymous;
    };

    match session::validate_token(cookie.value(), secret) {
        Ok(claims) => Principal::Authenticated(AuthContext::from_session(&claims)),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid session cookie");
            Principal::Anonymous
        }
    }
}

/// Checks that an authenticated principal's account still exists
///
/// Tokens outlive accounts: a deleted user's session reads as anonymous. The
/// username is refreshed from the store.
pub async fn confirm_account(pool: &PgPool, principal: Principal) -> Result<Principal, sqlx::Error> {
    let Some(user_id) = principal.user_id() else {
        return Ok(principal);
    };

    match User::find_by_id(pool, user_id).await? {
        Some(user) => Ok(Principal::user(user.id, user.username)),
        None => {
            tracing::info!(user_id, "Session for a deleted account");
            Ok(Principal::Anonymous)
        }
    }
}

/// Login URL that returns to `uri` after authentication
pub fn login_redirect_target(uri: &Uri) -> String {
    let full_path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    // Slashes stay readable, as in `/login/?next=/tasks/`
    let next = urlencoding::encode(full_path).replace("%2F", "/");
    format!("{}?next={}", LOGIN_ROUTE, next)
}

/// Access gate middleware
pub async fn access_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let principal = match confirm_account(&state.db, resolve_principal(&jar, state.session_secret())).await {
        Ok(principal) => principal,
        Err(e) => return ApiError::from(e).into_response(),
    };

    if !principal.is_authenticated() && classify_path(req.uri().path()) == PathClass::Protected {
        let target = login_redirect_target(req.uri());
        tracing::info!(path = %req.uri().path(), "Anonymous request to protected path");

        return Outcome::redirect(jar, target)
            .error(AuthzError::AuthenticationRequired.notice())
            .into_response();
    }

    req.extensions_mut().insert(principal);
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use taskboard_shared::auth::session::{create_token, SessionClaims};
    use axum_extra::extract::cookie::Cookie;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_public_paths() {
        for path in ["/", "/login/", "/users/", "/users/create/", "/health", "/static/app.css", "/admin/"] {
            assert_eq!(classify_path(path), PathClass::Public, "{}", path);
        }
    }

    #[test]
    fn test_protected_paths() {
        for path in [
            "/tasks/",
            "/tasks/1/",
            "/statuses/",
            "/labels/create/",
            "/users/1/update/",
            "/users/1/delete/",
            "/logout/",
            "/login",
            "/users",
        ] {
            assert_eq!(classify_path(path), PathClass::Protected, "{}", path);
        }
    }

    #[test]
    fn test_login_redirect_keeps_path_and_query() {
        let uri: Uri = "/tasks/?status=2&self_tasks=on".parse().unwrap();
        assert_eq!(
            login_redirect_target(&uri),
            "/login/?next=/tasks/%3Fstatus%3D2%26self_tasks%3Don"
        );

        let uri: Uri = "/statuses/".parse().unwrap();
        assert_eq!(login_redirect_target(&uri), "/login/?next=/statuses/");
    }

    #[test]
    fn test_resolve_principal() {
        assert_eq!(resolve_principal(&CookieJar::new(), SECRET), Principal::Anonymous);

        let token = create_token(&SessionClaims::new(3, "john", Duration::hours(1)), SECRET).unwrap();
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, token));
        assert_eq!(resolve_principal(&jar, SECRET), Principal::user(3, "john"));

        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "garbage"));
        assert_eq!(resolve_principal(&jar, SECRET), Principal::Anonymous);
    }

    #[test]
    fn test_expired_session_is_anonymous() {
        let token = create_token(&SessionClaims::new(3, "john", Duration::hours(-1)), SECRET).unwrap();
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, token));
        assert_eq!(resolve_principal(&jar, SECRET), Principal::Anonymous);
    }
}
