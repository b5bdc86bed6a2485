use std::collections::BTreeMap;

use thiserror::Error;

/// Core error types for caredesk operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("API error (HTTP {status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Api { status: u16, detail: Option<String> },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Not found: {resource}/{id}")]
    NotFound { resource: String, id: String },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Time parsing error: {0}")]
    TimeError(#[from] time::error::Parse),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Unknown form field: {0}")]
    InvalidField(String),

    #[error("Invalid patient status: {0}")]
    InvalidStatus(String),

    #[error("Invalid DateTime: {0}")]
    InvalidDateTime(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    /// Create a new Api error from a status code and the server's `detail`, if any
    pub fn api(status: u16, detail: Option<String>) -> Self {
        Self::Api { status, detail }
    }

    /// Create a new Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new NotFound error
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a new InvalidField error
    pub fn invalid_field(name: impl Into<String>) -> Self {
        Self::InvalidField(name.into())
    }

    /// Create a new InvalidStatus error
    pub fn invalid_status(status: impl Into<String>) -> Self {
        Self::InvalidStatus(status.into())
    }

    /// Create a new InvalidDateTime error
    pub fn invalid_date_time(datetime: impl Into<String>) -> Self {
        Self::InvalidDateTime(datetime.into())
    }

    /// Create a new Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Errors raised before anything reached the network.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::InvalidField(_) | Self::InvalidStatus(_)
        )
    }

    /// Non-2xx responses and transport failures.
    pub fn is_network_error(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::Transport(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Get error category for logging and for choosing how the view reacts
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) | Self::InvalidField(_) | Self::InvalidStatus(_) => {
                ErrorCategory::Validation
            }
            Self::Api { .. } | Self::Transport(_) => ErrorCategory::Network,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::JsonError(_) | Self::TimeError(_) | Self::InvalidDateTime(_) => {
                ErrorCategory::Serialization
            }
            Self::UrlError(_) | Self::Configuration(_) => ErrorCategory::Configuration,
        }
    }

    /// Text for a user-visible notice.
    ///
    /// The server's `detail` wins when present; otherwise the caller's
    /// generic message is used.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.clone(),
            _ => fallback.to_string(),
        }
    }

    /// Field-level messages of a validation failure, keyed by field name.
    ///
    /// Empty for every other kind of error.
    pub fn field_messages(&self) -> BTreeMap<String, Vec<String>> {
        let mut details = BTreeMap::new();
        if let Self::Validation(errors) = self {
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                details.insert(field.to_string(), messages);
            }
        }
        details
    }
}

/// Error categories, mirroring how each kind is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Blocks submission with field-scoped messages.
    Validation,
    /// Transient notice; the draft is kept for a retry.
    Network,
    /// Full-page failure state.
    NotFound,
    Serialization,
    Configuration,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Network => write!(f, "network"),
            Self::NotFound => write!(f, "not_found"),
            Self::Serialization => write!(f, "serialization"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use validator::{ValidationError, ValidationErrors};

    fn validation_error() -> CoreError {
        let mut errors = ValidationErrors::new();
        errors.add(
            "first_name",
            ValidationError::new("length").with_message(Cow::Borrowed("First name is required")),
        );
        errors.add("status", ValidationError::new("status"));
        CoreError::Validation(errors)
    }

    #[test]
    fn test_api_error_display() {
        let err = CoreError::api(400, Some("Bad payload".to_string()));
        assert_eq!(err.to_string(), "API error (HTTP 400): Bad payload");

        let err = CoreError::api(500, None);
        assert_eq!(err.to_string(), "API error (HTTP 500): no detail");
        assert!(err.is_network_error());
        assert_eq!(err.category(), ErrorCategory::Network);
    }

    #[test]
    fn test_not_found_error() {
        let err = CoreError::not_found("patients", "abc-123");
        assert_eq!(err.to_string(), "Not found: patients/abc-123");
        assert!(err.is_not_found());
        assert!(!err.is_network_error());
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_user_message_prefers_detail() {
        let err = CoreError::api(400, Some("Duplicate patient".to_string()));
        assert_eq!(err.user_message("Failed to add patient"), "Duplicate patient");

        let err = CoreError::api(400, Some("   ".to_string()));
        assert_eq!(err.user_message("Failed to add patient"), "Failed to add patient");

        let err = CoreError::transport("connection refused");
        assert_eq!(err.user_message("Failed to add patient"), "Failed to add patient");
    }

    #[test]
    fn test_field_messages() {
        let err = validation_error();
        assert!(err.is_validation_error());
        assert_eq!(err.category(), ErrorCategory::Validation);

        let messages = err.field_messages();
        assert_eq!(messages["first_name"], vec!["First name is required"]);
        // no message attached: the code stands in
        assert_eq!(messages["status"], vec!["status"]);

        assert!(CoreError::transport("x").field_messages().is_empty());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("{ invalid json }").unwrap_err();
        let core_err: CoreError = json_err.into();

        assert!(matches!(core_err, CoreError::JsonError(_)));
        assert_eq!(core_err.category(), ErrorCategory::Serialization);
    }

    #[test]
    fn test_url_error_conversion() {
        let url_err = url::Url::parse("not a url").unwrap_err();
        let core_err: CoreError = url_err.into();

        assert!(matches!(core_err, CoreError::UrlError(_)));
        assert_eq!(core_err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_error_categories_display() {
        assert_eq!(ErrorCategory::Validation.to_string(), "validation");
        assert_eq!(ErrorCategory::Network.to_string(), "network");
        assert_eq!(ErrorCategory::NotFound.to_string(), "not_found");
        assert_eq!(ErrorCategory::Serialization.to_string(), "serialization");
        assert_eq!(ErrorCategory::Configuration.to_string(), "configuration");
    }

    #[test]
    fn test_invalid_input_errors() {
        let err = CoreError::invalid_field("nickname");
        assert_eq!(err.to_string(), "Unknown form field: nickname");
        assert!(err.is_validation_error());

        let err = CoreError::invalid_status("ARCHIVED");
        assert_eq!(err.to_string(), "Invalid patient status: ARCHIVED");
        assert_eq!(err.category(), ErrorCategory::Validation);
    }
}
