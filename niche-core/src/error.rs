//! Unified error handling system
//!
//! Structured error types with context, recovery suggestions and retry hints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type NicheResult<T> = Result<T, NicheError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the Niche workspace
#[derive(Error, Debug)]
pub enum NicheError {
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Provider error ({provider}): {message}")]
    Provider {
        provider: String,
        message: String,
        status: Option<u16>,
        context: ErrorContext,
    },

    #[error("LLM error: {message}")]
    Llm {
        message: String,
        model: Option<String>,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Task '{task}' failed: {message}")]
    Task {
        task: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Operation timeout: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl NicheError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            NicheError::Config { context, .. } => Some(context),
            NicheError::Network { context, .. } => Some(context),
            NicheError::Provider { context, .. } => Some(context),
            NicheError::Llm { context, .. } => Some(context),
            NicheError::Validation { context, .. } => Some(context),
            NicheError::Task { context, .. } => Some(context),
            NicheError::Timeout { context, .. } => Some(context),
            NicheError::Internal { context, .. } => Some(context),
            NicheError::Io(_) | NicheError::Serialization(_) => None,
        }
    }

    /// Check if error is worth retrying
    pub fn is_recoverable(&self) -> bool {
        match self {
            NicheError::Network { .. } => true,
            NicheError::Timeout { .. } => true,
            NicheError::Llm { .. } => true,
            NicheError::Provider { status, .. } => {
                matches!(status, Some(429) | Some(500..=599))
            }
            NicheError::Task { .. } => true,
            _ => false,
        }
    }

    /// Get retry delay in milliseconds for recoverable errors
    pub fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            NicheError::Network { .. } => Some(1000),
            NicheError::Timeout { .. } => Some(2000),
            NicheError::Provider {
                status: Some(429), ..
            } => Some(5000),
            _ => None,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            NicheError::Internal { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Internal error occurred"
                );
            }
            NicheError::Config { .. } | NicheError::Validation { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Configuration or validation error"
                );
            }
            NicheError::Network { .. } | NicheError::Timeout { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Network or timeout error (may be recoverable)"
                );
            }
            _ => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Error occurred"
                );
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::NicheError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'niche config --init' to create default config"),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::NicheError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}

#[macro_export]
macro_rules! provider_error {
    ($provider:expr, $msg:expr, $component:expr) => {
        $crate::NicheError::Provider {
            provider: $provider.to_string(),
            message: $msg.to_string(),
            status: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the provider status message and your account limits"),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_with_status(status: u16) -> NicheError {
        NicheError::Provider {
            provider: "dataforseo".to_string(),
            message: "failed".to_string(),
            status: Some(status),
            context: ErrorContext::new("test"),
        }
    }

    #[test]
    fn test_provider_status_recoverability() {
        assert!(provider_with_status(429).is_recoverable());
        assert!(provider_with_status(503).is_recoverable());
        assert!(!provider_with_status(401).is_recoverable());
        assert!(!provider_with_status(404).is_recoverable());
    }

    #[test]
    fn test_context_builder() {
        let context = ErrorContext::new("scorer")
            .with_operation("parse")
            .with_metadata("records", "3")
            .with_suggestion("Fix the input");

        assert_eq!(context.component, "scorer");
        assert_eq!(context.operation.as_deref(), Some("parse"));
        assert_eq!(context.metadata.get("records").map(String::as_str), Some("3"));
        assert_eq!(context.recovery_suggestions.len(), 1);
    }

    #[test]
    fn test_transparent_variants_have_no_context() {
        let err: NicheError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(err.context().is_none());
        assert!(!err.is_recoverable());
    }
}
