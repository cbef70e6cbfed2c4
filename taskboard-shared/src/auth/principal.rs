/// The actor behind a request
///
/// The API's access gate resolves a [`Principal`] for every request and
/// inserts it into the request extensions, so every handler can take it with
/// `Extension<Principal>`:
///
/// ```
/// use taskboard_shared::auth::principal::Principal;
///
/// fn greet(principal: &Principal) -> String {
///     match principal.user_id() {
///         Some(id) => format!("Hello, user {}!", id),
///         None => "Hello, stranger!".to_string(),
///     }
/// }
/// ```

use serde::{Deserialize, Serialize};

use super::session::SessionClaims;

/// Identity of an authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: i64,

    /// Username carried by the session
    pub username: String,
}

impl AuthContext {
    /// Creates auth context from validated session claims
    pub fn from_session(claims: &SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username.clone(),
        }
    }
}

/// Authenticated user or anonymous visitor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Principal {
    /// No valid session
    #[default]
    Anonymous,

    /// Valid session for a user
    Authenticated(AuthContext),
}

impl Principal {
    /// Shorthand for an authenticated principal
    pub fn user(user_id: i64, username: impl Into<String>) -> Self {
        Principal::Authenticated(AuthContext {
            user_id,
            username: username.into(),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::Authenticated(_))
    }

    /// User ID, if authenticated
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Principal::Authenticated(ctx) => Some(ctx.user_id),
            Principal::Anonymous => None,
        }
    }

    /// Auth context, if authenticated
    pub fn context(&self) -> Option<&AuthContext> {
        match self {
            Principal::Authenticated(ctx) => Some(ctx),
            Principal::Anonymous => None,
        }
    }
}
