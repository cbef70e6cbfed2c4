/// User-facing notices and action outcomes
///
/// Every action ends in one of two ways: a redirect (302) or a rendered page.
/// Notices produced along the way travel with the outcome. A redirect stores
/// them in the `messages` cookie; the next rendered page drains the cookie
/// and shows them, together with any notices of its own, as
///
/// ```json
/// { "messages": [{ "level": "success", "message": "Status created successfully" }], "data": { ... } }
/// ```
///
/// # Example
///
/// ```no_run
/// use axum_extra::extract::CookieJar;
/// use taskboard_api::notice::Outcome;
///
/// async fn create(jar: CookieJar) -> Outcome {
///     Outcome::redirect(jar, "/statuses/").success("Status created successfully")
/// }
/// ```

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;

/// Cookie carrying notices across a redirect
pub const MESSAGES_COOKIE: &str = "messages";

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

/// A message shown to the user once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Notices stored by earlier redirects
///
/// The jar percent-decodes the value; a malformed cookie reads as empty.
pub fn pending(jar: &CookieJar) -> Vec<Notice> {
    jar.get(MESSAGES_COOKIE)
        .and_then(|cookie| serde_json::from_str(cookie.value()).ok())
        .unwrap_or_default()
}

fn store(jar: CookieJar, notices: &[Notice]) -> CookieJar {
    if notices.is_empty() {
        return jar;
    }

    // Raw JSON; the jar percent-encodes it on the way out
    let json = match serde_json::to_string(notices) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode notices");
            return jar;
        }
    };

    jar.add(
        Cookie::build((MESSAGES_COOKIE, json))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

fn clear(jar: CookieJar) -> CookieJar {
    if jar.get(MESSAGES_COOKIE).is_none() {
        return jar;
    }

    jar.remove(Cookie::build(MESSAGES_COOKIE).path("/"))
}

#[derive(Debug)]
enum OutcomeKind {
    Redirect(String),
    Render(serde_json::Value),
}

/// Result of an action: a redirect or a rendered page, plus notices
#[derive(Debug)]
pub struct Outcome {
    jar: CookieJar,
    notices: Vec<Notice>,
    kind: OutcomeKind,
}

impl Outcome {
    /// 302 redirect to `to`
    pub fn redirect(jar: CookieJar, to: impl Into<String>) -> Self {
        Self {
            jar,
            notices: Vec::new(),
            kind: OutcomeKind::Redirect(to.into()),
        }
    }

    /// 200 page carrying `data`
    pub fn render<T: Serialize>(jar: CookieJar, data: &T) -> ApiResult<Self> {
        let data = serde_json::to_value(data).map_err(|e| {
            crate::error::ApiError::InternalError(format!("Failed to render page: {}", e))
        })?;

        Ok(Self {
            jar,
            notices: Vec::new(),
            kind: OutcomeKind::Render(data),
        })
    }

    pub fn notice(mut self, level: NoticeLevel, message: impl Into<String>) -> Self {
        self.notices.push(Notice::new(level, message));
        self
    }

    pub fn success(self, message: impl Into<String>) -> Self {
        self.notice(NoticeLevel::Success, message)
    }

    pub fn error(self, message: impl Into<String>) -> Self {
        self.notice(NoticeLevel::Error, message)
    }

    pub fn info(self, message: impl Into<String>) -> Self {
        self.notice(NoticeLevel::Info, message)
    }

    /// Applies a change to the cookie jar (e.g. setting the session)
    pub fn map_jar(mut self, f: impl FnOnce(CookieJar) -> CookieJar) -> Self {
        self.jar = f(self.jar);
        self
    }

    /// Redirect target, if this is a redirect
    pub fn location(&self) -> Option<&str> {
        match &self.kind {
            OutcomeKind::Redirect(to) => Some(to),
            OutcomeKind::Render(_) => None,
        }
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        let mut messages = pending(&self.jar);
        messages.extend(self.notices);

        match self.kind {
            OutcomeKind::Redirect(to) => {
                let jar = store(self.jar, &messages);
                (StatusCode::FOUND, jar, [(header::LOCATION, to)]).into_response()
            }
            OutcomeKind::Render(data) => {
                let jar = clear(self.jar);
                let body = Json(serde_json::json!({
                    "messages": messages,
                    "data": data,
                }));
                (StatusCode::OK, jar, body).into_response()
            }
        }
    }
}
