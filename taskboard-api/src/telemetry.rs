/// Error reporting
///
/// Internal errors are forwarded to a Rollbar-compatible item endpoint. The
/// reporter is configured once at startup; later calls to [`init`] are
/// ignored. Reporting happens on a spawned task and any failure is only
/// logged, so a broken reporter can never affect the request that hit the
/// error.

use std::sync::OnceLock;

use serde_json::json;

use crate::config::TelemetryConfig;

static REPORTER: OnceLock<Option<Reporter>> = OnceLock::new();

/// Configured error reporter
#[derive(Debug, Clone)]
pub struct Reporter {
    client: reqwest::Client,
    access_token: String,
    environment: String,
    endpoint: String,
    code_version: String,
}

impl Reporter {
    /// Builds a reporter, or None when no access token is configured
    pub fn from_config(config: &TelemetryConfig) -> Option<Self> {
        let access_token = config.access_token.clone()?;

        Some(Self {
            client: reqwest::Client::new(),
            access_token,
            environment: config.environment.clone(),
            endpoint: config.endpoint.clone(),
            code_version: config.code_version.clone(),
        })
    }

    /// Rollbar item payload for an error message
    pub fn payload(&self, message: &str) -> serde_json::Value {
        json!({
            "data": {
                "environment": self.environment,
                "level": "error",
                "code_version": self.code_version,
                "platform": "rust",
                "language": "rust",
                "notifier": {
                    "name": "taskboard",
                    "version": env!("CARGO_PKG_VERSION"),
                },
                "body": {
                    "message": { "body": message }
                }
            }
        })
    }

    async fn send(&self, message: String) {
        let result = self
            .client
            .post(&self.endpoint)
            .header("X-Rollbar-Access-Token", &self.access_token)
            .json(&self.payload(&message))
            .send()
            .await
            .and_then(|response| response.error_for_status());

        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to report error");
        }
    }
}

/// Initializes the global reporter
///
/// # Returns
///
/// True if reporting is enabled after the call
pub fn init(config: &TelemetryConfig) -> bool {
    let enabled = REPORTER
        .get_or_init(|| Reporter::from_config(config))
        .is_some();

    tracing::info!(enabled, environment = %config.environment, "Error reporting initialized");
    enabled
}

/// Reports an internal error, if a reporter is configured
///
/// Never blocks and never fails; outside a Tokio runtime the report is dropped.
pub fn report(message: &str) {
    let Some(Some(reporter)) = REPORTER.get() else {
        return;
    };

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let reporter = reporter.clone();
            let message = message.to_string();
            handle.spawn(async move { reporter.send(message).await });
        }
        Err(_) => tracing::debug!("No runtime available, error report dropped"),
    }
}
