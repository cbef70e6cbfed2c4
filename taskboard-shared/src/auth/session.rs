/// Session tokens
///
/// A successful login issues an HS256-signed JWT naming the user. The API
/// keeps it in an HttpOnly cookie and validates it on every request; a
/// missing, expired or tampered token simply means the request is anonymous.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::session::{create_token, validate_token, SessionClaims};
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "your-secret-key-at-least-32-bytes-long";
/// let claims = SessionClaims::new(7, "john", Duration::days(14));
/// let token = create_token(&claims, secret)?;
///
/// let validated = validate_token(&token, secret)?;
/// assert_eq!(validated.sub, 7);
/// assert_eq!(validated.username, "john");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Issuer written into and required from every session token
pub const ISSUER: &str = "taskboard";

/// Error type for session token operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Failed to create token
    #[error("Failed to create session token: {0}")]
    CreateError(String),

    /// Token signature, issuer or format is invalid
    #[error("Invalid session token: {0}")]
    Invalid(String),

    /// Token has expired
    #[error("Session has expired")]
    Expired,
}

/// Session claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject - user ID
    pub sub: i64,

    /// Username at login time
    pub username: String,

    /// Issuer - always [`ISSUER`]
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl SessionClaims {
    /// Creates claims for a user, valid for `ttl` from now
    pub fn new(user_id: i64, username: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            username: username.into(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
        }
    }
}

/// Signs claims into a token string
pub fn create_token(claims: &SessionClaims, secret: &str) -> Result<String, SessionError> {
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| SessionError::CreateError(e.to_string()))
}

/// Validates signature, issuer, expiry and not-before, returning the claims
pub fn validate_token(token: &str, secret: &str) -> Result<SessionClaims, SessionError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let token_data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
            _ => SessionError::Invalid(e.to_string()),
        }
    })?;

    Ok(token_data.claims)
}
