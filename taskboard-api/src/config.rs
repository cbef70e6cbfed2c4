/// Configuration management for the API server
///
/// This module loads configuration from environment variables (and a `.env`
/// file when present) and resolves it into plain values. Nothing below the
/// router reads the environment.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `SECRET_KEY`: Session signing key, at least 32 characters in production
/// - `SESSION_TTL_HOURS`: Session lifetime (default: 336, two weeks)
/// - `ENV`, `DEBUG` / `DJANGO_DEBUG`: production flag (`ENV=production` or a
///   false-ish debug value)
/// - `ALLOWED_HOSTS` (or legacy `HOSTS`): comma-separated host names
/// - `RENDER_EXTERNAL_HOSTNAME`: public host name added to allowed hosts
/// - `CORS_ORIGINS`: comma-separated origins (default: `*` outside production)
/// - `TASKS_PAGE_SIZE`: tasks per list page (default: 20)
/// - `ROLLBAR_TOKEN`, `ROLLBAR_ENVIRONMENT`, `ROLLBAR_ENDPOINT`, `CODE_VERSION`:
///   error reporting
///
/// # Example
///
/// ```no_run
/// use taskboard_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

/// Signing key used when none is configured outside production
const DEV_SECRET_KEY: &str = "dev-insecure-secret-key-do-not-use-in-production";

/// Default Rollbar item endpoint
const DEFAULT_ROLLBAR_ENDPOINT: &str = "https://api.rollbar.com/api/1/item/";

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Session configuration
    pub session: SessionConfig,

    /// List pagination
    pub pagination: PaginationConfig,

    /// Error reporting
    pub telemetry: TelemetryConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Production mode: HSTS, secure cookies, no default hosts
    pub production: bool,

    /// Allowed CORS origins (`*` = permissive)
    pub cors_origins: Vec<String>,

    /// Accepted `Host` header values
    pub allowed_hosts: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Secret key for session token signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    #[serde(skip_serializing)]
    pub secret: String,

    /// Session lifetime in hours
    pub ttl_hours: i64,
}

/// Pagination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Tasks per page on the task list
    pub tasks_page_size: i64,
}

/// Error reporting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Rollbar access token; reporting is off without one
    #[serde(skip_serializing)]
    pub access_token: Option<String>,

    /// Environment name attached to reports
    pub environment: String,

    /// Item endpoint
    pub endpoint: String,

    /// Code version attached to reports
    pub code_version: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` is missing
    /// - A numeric variable doesn't parse
    /// - `SECRET_KEY` is missing or shorter than 32 characters in production
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let production = is_production(
            non_empty("DEBUG").or_else(|| non_empty("DJANGO_DEBUG")).as_deref(),
            non_empty("ENV").as_deref(),
        );

        let api_host = non_empty("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let api_port = non_empty("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()?;

        let hosts_raw = non_empty("ALLOWED_HOSTS")
            .or_else(|| non_empty("HOSTS"))
            .unwrap_or_default();
        let allowed_hosts = parse_allowed_hosts(
            &hosts_raw,
            non_empty("RENDER_EXTERNAL_HOSTNAME").as_deref(),
            production,
        );

        let cors_origins = match non_empty("CORS_ORIGINS") {
            Some(raw) => split_list(&raw),
            None if production => Vec::new(),
            None => vec!["*".to_string()],
        };

        let database_url = non_empty("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = non_empty("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()?;

        let secret = match non_empty("SECRET_KEY") {
            Some(secret) => secret,
            None if production => {
                anyhow::bail!("SECRET_KEY environment variable is required in production")
            }
            None => {
                tracing::warn!("SECRET_KEY not set, using an insecure development key");
                DEV_SECRET_KEY.to_string()
            }
        };

        if production && secret.len() < 32 {
            anyhow::bail!("SECRET_KEY must be at least 32 characters long");
        }

        let ttl_hours = non_empty("SESSION_TTL_HOURS")
            .unwrap_or_else(|| "336".to_string())
            .parse::<i64>()?;
        if ttl_hours <= 0 {
            anyhow::bail!("SESSION_TTL_HOURS must be positive");
        }

        let tasks_page_size = non_empty("TASKS_PAGE_SIZE")
            .unwrap_or_else(|| "20".to_string())
            .parse::<i64>()?;
        if tasks_page_size <= 0 {
            anyhow::bail!("TASKS_PAGE_SIZE must be positive");
        }

        let telemetry = TelemetryConfig {
            access_token: non_empty("ROLLBAR_TOKEN"),
            environment: non_empty("ROLLBAR_ENVIRONMENT").unwrap_or_else(|| {
                let name = if production { "production" } else { "development" };
                name.to_string()
            }),
            endpoint: non_empty("ROLLBAR_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_ROLLBAR_ENDPOINT.to_string()),
            code_version: non_empty("CODE_VERSION").unwrap_or_else(|| "1.0".to_string()),
        };

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                production,
                cors_origins,
                allowed_hosts,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            session: SessionConfig { secret, ttl_hours },
            pagination: PaginationConfig { tasks_page_size },
            telemetry,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Session lifetime as a duration
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session.ttl_hours)
    }
}

/// Production when `ENV=production` or the debug flag is explicitly off
pub fn is_production(debug: Option<&str>, env_name: Option<&str>) -> bool {
    let debug_off = debug
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no"))
        .unwrap_or(false);
    let env_production = env_name
        .map(|v| v.trim().eq_ignore_ascii_case("production"))
        .unwrap_or(false);

    debug_off || env_production
}

/// Resolves the allowed host list
///
/// Entries are trimmed and deduplicated in order, the platform host name is
/// appended, production always accepts the internal `webserver` name first,
/// and development falls back to localhost when nothing is configured.
pub fn parse_allowed_hosts(raw: &str, render_host: Option<&str>, production: bool) -> Vec<String> {
    let mut hosts: Vec<String> = Vec::new();

    for host in split_list(raw).into_iter().chain(render_host.map(str::to_string)) {
        if !hosts.contains(&host) {
            hosts.push(host);
        }
    }

    if production {
        let mut with_internal = vec!["webserver".to_string()];
        with_internal.extend(hosts);
        return with_internal;
    }

    if hosts.is_empty() {
        return vec!["localhost".to_string(), "127.0.0.1".to_string()];
    }

    hosts
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
