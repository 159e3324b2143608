//! Error types for Ramify.
//!
//! This module provides [`ViewError`], the error type every view operation
//! returns. The view layer never swallows or retries a failure: errors from
//! the persistence model or search index pass through `?` unchanged and are
//! rendered by the surrounding framework via [`ViewError::to_envelope`].

use http::StatusCode;
use ramify_router::RouterError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias using [`ViewError`].
pub type ViewResult<T> = Result<T, ViewError>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Invalid request body or parameters.
    Validation,
    /// Permission denied by the access-control factory.
    Authorization,
    /// Entity missing or outside its parent's scope.
    NotFound,
    /// HTTP method has no action at this depth.
    MethodNotAllowed,
    /// Primary store failure.
    Persistence,
    /// Search index failure.
    SearchIndex,
    /// Malformed resource tree or binding.
    Configuration,
    /// Anything else.
    Internal,
}

impl ErrorCategory {
    /// Returns the snake_case name used in logs and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authorization => "authorization",
            Self::NotFound => "not_found",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::Persistence => "persistence",
            Self::SearchIndex => "search_index",
            Self::Configuration => "configuration",
            Self::Internal => "internal",
        }
    }

    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::SearchIndex => StatusCode::BAD_GATEWAY,
            Self::Persistence | Self::Configuration | Self::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Standard error type for the view layer.
///
/// # Example
///
/// ```
/// use ramify_core::{ErrorCategory, ViewError};
///
/// let err = ViewError::not_found_resource("Story", "4");
/// assert_eq!(err.category(), ErrorCategory::NotFound);
/// assert_eq!(err.to_string(), "Not found: Story(4) not found");
/// ```
#[derive(Error, Debug)]
pub enum ViewError {
    /// Request validation failed.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable error message.
        message: String,
        /// Field-specific validation errors.
        #[source]
        field_errors: Option<FieldErrors>,
    },

    /// Access denied.
    #[error("Authorization denied: {message}")]
    Authorization {
        /// Human-readable error message.
        message: String,
    },

    /// Entity not found, or not a member of its parent's scope.
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
        /// The entity type that was not found.
        resource_type: Option<String>,
        /// The resource key that was looked up.
        resource_id: Option<String>,
    },

    /// The method has no action at the addressed depth.
    #[error("Method not allowed: {method}")]
    MethodNotAllowed {
        /// The rejected method.
        method: String,
        /// Methods that would have been accepted.
        allowed: Vec<String>,
    },

    /// The persistence model reported a failure.
    #[error("Persistence error: {message}")]
    Persistence {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The search index reported a failure.
    #[error("Search index error: {message}")]
    SearchIndex {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The resource tree or a view binding is malformed.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Human-readable error message.
        message: String,
    },

    /// Internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl ViewError {
    /// Creates a validation error with a message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    /// Creates a validation error with field-specific errors.
    #[must_use]
    pub fn validation_with_fields(message: impl Into<String>, field_errors: FieldErrors) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }

    /// Creates an authorization error.
    #[must_use]
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            resource_type: None,
            resource_id: None,
        }
    }

    /// Creates a not found error naming the entity type and resource key,
    /// rendered as `Type(key) not found`.
    #[must_use]
    pub fn not_found_resource(
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        let resource_type = resource_type.into();
        let resource_id = resource_id.into();
        Self::NotFound {
            message: format!("{resource_type}({resource_id}) not found"),
            resource_type: Some(resource_type),
            resource_id: Some(resource_id),
        }
    }

    /// Creates a method-not-allowed error.
    #[must_use]
    pub fn method_not_allowed(method: &http::Method, allowed: &[http::Method]) -> Self {
        Self::MethodNotAllowed {
            method: method.to_string(),
            allowed: allowed.iter().map(ToString::to_string).collect(),
        }
    }

    /// Creates a persistence error.
    #[must_use]
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a persistence error with a source error.
    pub fn persistence_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Persistence {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a search index error.
    #[must_use]
    pub fn search_index(message: impl Into<String>) -> Self {
        Self::SearchIndex {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Authorization { .. } => ErrorCategory::Authorization,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::MethodNotAllowed { .. } => ErrorCategory::MethodNotAllowed,
            Self::Persistence { .. } => ErrorCategory::Persistence,
            Self::SearchIndex { .. } => ErrorCategory::SearchIndex,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Returns true for [`ViewError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Converts this error to a serializable error envelope.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                category: self.category(),
                details: self.error_details(),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }

    const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Authorization { .. } => "AUTHORIZATION_DENIED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            Self::Persistence { .. } => "PERSISTENCE_ERROR",
            Self::SearchIndex { .. } => "SEARCH_INDEX_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation {
                field_errors: Some(errors),
                ..
            } => serde_json::to_value(errors).ok(),
            Self::NotFound {
                resource_type: Some(rt),
                resource_id: Some(rid),
                ..
            } => Some(serde_json::json!({
                "resource_type": rt,
                "resource_id": rid
            })),
            Self::MethodNotAllowed { allowed, .. } => Some(serde_json::json!({
                "allowed": allowed
            })),
            _ => None,
        }
    }
}

impl From<RouterError> for ViewError {
    fn from(err: RouterError) -> Self {
        match err {
            RouterError::MissingParameter { .. } => Self::internal_with_source(
                "cannot build resource location",
                err,
            ),
            other => Self::configuration(other.to_string()),
        }
    }
}

/// Field-specific validation errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Error)]
#[error("Field validation errors")]
pub struct FieldErrors {
    /// Map of field path to list of error messages.
    pub fields: HashMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Creates a new empty `FieldErrors`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Returns `true` if there are no field errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Error category.
    pub category: ErrorCategory,
    /// Additional error details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_resource_message() {
        let error = ViewError::not_found_resource("Story", "4");
        assert_eq!(error.category(), ErrorCategory::NotFound);
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert!(error.is_not_found());
        assert!(error.to_string().contains("Story(4) not found"));

        let envelope = error.to_envelope(Some("req-1"));
        let details = envelope.error.details.unwrap();
        assert_eq!(details["resource_type"], "Story");
        assert_eq!(details["resource_id"], "4");
    }

    #[test]
    fn test_validation_error_with_fields() {
        let mut field_errors = FieldErrors::new();
        field_errors.add("title", "Required");
        field_errors.add("title", "Too short");

        let error = ViewError::validation_with_fields("Invalid story", field_errors);
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert!(error.to_envelope(None).error.details.is_some());
    }

    #[test]
    fn test_method_not_allowed() {
        let error = ViewError::method_not_allowed(
            &http::Method::TRACE,
            &[http::Method::GET, http::Method::POST],
        );
        assert_eq!(error.status_code(), StatusCode::METHOD_NOT_ALLOWED);

        let envelope = error.to_envelope(None);
        assert_eq!(
            envelope.error.details.unwrap()["allowed"],
            serde_json::json!(["GET", "POST"])
        );
    }

    #[test]
    fn test_persistence_error_keeps_source() {
        let error = ViewError::persistence_with_source(
            "save failed",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        assert_eq!(error.category(), ErrorCategory::Persistence);
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_router_error_conversion() {
        let err: ViewError = RouterError::UnknownResource(3).into();
        assert_eq!(err.category(), ErrorCategory::Configuration);

        let err: ViewError = RouterError::MissingParameter {
            uid: "user".to_string(),
            name: "user_id".to_string(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Internal);
    }

    #[test]
    fn test_error_envelope_serialization() {
        let error = ViewError::not_found("Resource not found");
        let envelope = error.to_envelope(Some("req-456"));

        let json = serde_json::to_string(&envelope).expect("serialization should work");
        assert!(json.contains("\"code\":\"NOT_FOUND\""));
        assert!(json.contains("\"request_id\":\"req-456\""));
        assert!(json.contains("\"category\":\"not_found\""));
    }

    #[test]
    fn test_all_error_categories_have_status_codes() {
        let categories = [
            ErrorCategory::Validation,
            ErrorCategory::Authorization,
            ErrorCategory::NotFound,
            ErrorCategory::MethodNotAllowed,
            ErrorCategory::Persistence,
            ErrorCategory::SearchIndex,
            ErrorCategory::Configuration,
            ErrorCategory::Internal,
        ];

        for category in categories {
            let status = category.default_status_code();
            assert!(
                status.is_client_error() || status.is_server_error(),
                "Category {:?} should map to error status code, got {}",
                category,
                status
            );
        }
    }
}
