/// Host header validation
///
/// Rejects requests whose `Host` is not in the configured allow list with
/// 400 Bad Request. Entries match exactly (case-insensitive, port ignored);
/// an entry starting with `.` matches that domain and every subdomain; `*`
/// matches anything.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{app::AppState, error::ApiError};

/// Strips the port from a host value, keeping IPv6 literals intact
fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }

    host.rsplit_once(':').map(|(name, _)| name).unwrap_or(host)
}

/// Returns true if `host` matches any allowed pattern
pub fn host_allowed(host: &str, allowed: &[String]) -> bool {
    let host = strip_port(host.trim()).trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() {
        return false;
    }

    allowed.iter().any(|pattern| {
        let pattern = pattern.to_ascii_lowercase();

        if pattern == "*" {
            true
        } else if let Some(domain) = pattern.strip_prefix('.') {
            host == domain || host.ends_with(&pattern)
        } else {
            host == pattern
        }
    })
}

/// Host validation middleware
pub async fn validate_host(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().host())
        .unwrap_or_default();

    if !host_allowed(host, &state.config.api.allowed_hosts) {
        tracing::warn!(host, "Rejected request with disallowed Host header");
        return ApiError::BadRequest(format!("Invalid HTTP_HOST header: '{}'", host)).into_response();
    }

    next.run(req).await
}
