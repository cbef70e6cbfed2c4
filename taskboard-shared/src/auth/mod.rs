/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and registration password rules
/// - [`session`]: Signed session tokens issued at login
/// - [`principal`]: The actor behind a request (authenticated or anonymous)
/// - [`policy`]: Ownership policy deciding who may change what
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::password::{hash_password, verify_password};
/// use taskboard_shared::auth::session::{create_token, SessionClaims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = SessionClaims::new(1, "john", chrono::Duration::days(14));
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long")?;
/// # Ok(())
/// # }
/// ```

pub mod password;
pub mod policy;
pub mod principal;
pub mod session;
