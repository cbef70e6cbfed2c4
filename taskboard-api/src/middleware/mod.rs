/// Middleware modules for the API server
///
/// - `access_gate`: session resolution and login redirect for protected paths
/// - `allowed_hosts`: `Host` header validation
/// - `security`: security response headers

pub mod access_gate;
pub mod allowed_hosts;
pub mod security;
