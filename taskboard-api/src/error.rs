/// Error handling for the API server
///
/// Handlers return `ApiResult<T>`. Denied permissions, blocked deletes and
/// failed logins are not errors here: handlers turn them into redirects or
/// re-rendered forms through [`crate::notice::Outcome`]. What remains maps
/// onto HTTP status codes below.
///
/// Unique and foreign key violations raised while creating or updating an
/// entity become field-level validation errors, so a duplicate status name
/// or a stale label ID reads like any other invalid input.
///
/// # Example
///
/// ```
/// use taskboard_api::error::{ApiError, ApiResult};
///
/// fn parse_id(raw: &str) -> ApiResult<i64> {
///     raw.parse()
///         .map_err(|_| ApiError::BadRequest(format!("not an id: {}", raw)))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskboard_shared::db::{constraint_violation, FOREIGN_KEY_VIOLATION, UNIQUE_VIOLATION};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Not found (404)
    NotFound(String),

    /// Unprocessable entity (422) - form errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation (`__all__` for form-wide errors)
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "not_found")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Single-field validation error
    pub fn invalid(field: &str, message: &str) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail::new(field, message)])
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                crate::telemetry::report(&msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Field and message for a violated constraint
fn constraint_field(constraint: &str) -> (&'static str, &'static str) {
    const INVALID_CHOICE: &str =
        "Select a valid choice. That choice is not one of the available choices.";

    match constraint {
        "users_username_key" => ("username", "A user with that username already exists."),
        "statuses_name_key" => ("name", "Status with this Name already exists."),
        "labels_name_key" => ("name", "Label with this Name already exists."),
        "tasks_status_id_fkey" => ("status", INVALID_CHOICE),
        "tasks_executor_id_fkey" => ("executor", INVALID_CHOICE),
        "tasks_author_id_fkey" => ("author", INVALID_CHOICE),
        "task_labels_label_id_fkey" => ("labels", INVALID_CHOICE),
        _ => ("__all__", "Invalid reference."),
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(constraint) = constraint_violation(&err, UNIQUE_VIOLATION)
            .or_else(|| constraint_violation(&err, FOREIGN_KEY_VIOLATION))
        {
            let (field, message) = constraint_field(constraint);
            tracing::debug!(constraint, field, "Constraint violation mapped to form error");
            return ApiError::invalid(field, message);
        }

        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert validator errors to field-level errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        let mut errors: Vec<ValidationErrorDetail> = e
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Enter a valid value.".to_string()),
                })
            })
            .collect();
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(errors)
    }
}

/// Convert password errors to API errors
impl From<taskboard_shared::auth::password::PasswordError> for ApiError {
    fn from(err: taskboard_shared::auth::password::PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert session errors to API errors
///
/// Only signing can fail on the request path; invalid tokens are resolved to
/// an anonymous principal before any handler runs.
impl From<taskboard_shared::auth::session::SessionError> for ApiError {
    fn from(err: taskboard_shared::auth::session::SessionError) -> Self {
        ApiError::InternalError(format!("Session operation failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::invalid("name", "x"), StatusCode::UNPROCESSABLE_ENTITY),
            (ApiError::InternalError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_constraint_fields() {
        assert_eq!(constraint_field("users_username_key").0, "username");
        assert_eq!(constraint_field("statuses_name_key").0, "name");
        assert_eq!(constraint_field("labels_name_key").0, "name");
        assert_eq!(constraint_field("tasks_status_id_fkey").0, "status");
        assert_eq!(constraint_field("tasks_executor_id_fkey").0, "executor");
        assert_eq!(constraint_field("task_labels_label_id_fkey").0, "labels");
        assert_eq!(constraint_field("something_else").0, "__all__");
    }

    #[test]
    fn test_row_not_found_is_404() {
        assert!(matches!(ApiError::from(sqlx::Error::RowNotFound), ApiError::NotFound(_)));
        assert!(matches!(
            ApiError::from(sqlx::Error::PoolTimedOut),
            ApiError::InternalError(_)
        ));
    }

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 1, message = "This field is required."))]
        name: String,
    }

    #[test]
    fn test_validator_errors_map_to_fields() {
        let err = ApiError::from(Form { name: String::new() }.validate().unwrap_err());

        match err {
            ApiError::ValidationError(errors) => {
                assert_eq!(errors, vec![ValidationErrorDetail::new("name", "This field is required.")]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
