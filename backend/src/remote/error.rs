//! Error types for remote schedule service operations.
//!
//! Every variant carries a structured [`ErrorContext`] so failures surfaced
//! to the user and written to the log name the operation and entity involved.

use std::fmt;

/// Result type for remote service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Structured context for service errors.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "fetch_schedule", "remove_course")
    pub operation: Option<String>,
    /// The entity type involved (e.g., "enrollment", "course")
    pub entity: Option<String>,
    /// The entity ID if applicable
    pub entity_id: Option<String>,
    /// HTTP status code when the failure came from a response
    pub status: Option<u16>,
    /// Additional details about the error
    pub details: Option<String>,
    /// Whether a later identical request could succeed
    pub retryable: bool,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref entity) = self.entity {
            parts.push(format!("entity={}", entity));
        }
        if let Some(ref id) = self.entity_id {
            parts.push(format!("id={}", id));
        }
        if let Some(status) = self.status {
            parts.push(format!("status={}", status));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for remote service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The service could not be reached.
    #[error("Connection error: {message} {context}")]
    Connection {
        message: String,
        context: ErrorContext,
    },

    /// The request did not complete within the client timeout.
    #[error("Timeout error: {message} {context}")]
    Timeout {
        message: String,
        context: ErrorContext,
    },

    /// 401/403 from the service. Re-authentication is not handled here.
    #[error("Unauthorized: {message} {context}")]
    Unauthorized {
        message: String,
        context: ErrorContext,
    },

    /// 404 from the service.
    #[error("Not found: {message} {context}")]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    /// The service refused the request as invalid (4xx other than 401/403/404).
    #[error("Rejected: {message} {context}")]
    Rejected {
        message: String,
        context: ErrorContext,
    },

    /// 5xx from the service.
    #[error("Server error: {message} {context}")]
    Server {
        message: String,
        context: ErrorContext,
    },

    /// The response body could not be decoded.
    #[error("Invalid response: {message} {context}")]
    InvalidResponse {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message} {context}")]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Internal error: {message} {context}")]
    Internal {
        message: String,
        context: ErrorContext,
    },
}

impl ServiceError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            context: ErrorContext::default().retryable(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
            context: ErrorContext::default().retryable(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn not_found_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::NotFound {
            message: message.into(),
            context,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn rejected_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Rejected {
            message: message.into(),
            context,
        }
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
            context: ErrorContext::default().retryable(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Classify an HTTP error status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        let context = ErrorContext::default().with_status(status);
        match status {
            401 | 403 => Self::Unauthorized { message, context },
            404 => Self::NotFound { message, context },
            408 => Self::Timeout {
                message,
                context: context.retryable(),
            },
            400..=499 => Self::Rejected { message, context },
            _ => Self::Server {
                message,
                context: context.retryable(),
            },
        }
    }

    /// Transient failures: the watchdog or a re-drag may succeed later.
    pub fn is_retryable(&self) -> bool {
        self.context().retryable
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Connection { context, .. }
            | Self::Timeout { context, .. }
            | Self::Unauthorized { context, .. }
            | Self::NotFound { context, .. }
            | Self::Rejected { context, .. }
            | Self::Server { context, .. }
            | Self::InvalidResponse { context, .. }
            | Self::Configuration { context, .. }
            | Self::Internal { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Connection { context, .. }
            | Self::Timeout { context, .. }
            | Self::Unauthorized { context, .. }
            | Self::NotFound { context, .. }
            | Self::Rejected { context, .. }
            | Self::Server { context, .. }
            | Self::InvalidResponse { context, .. }
            | Self::Configuration { context, .. }
            | Self::Internal { context, .. } => context,
        }
    }

    /// Add or update the operation in the error context.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>, id: impl ToString) -> Self {
        let context = self.context_mut();
        context.entity = Some(entity.into());
        context.entity_id = Some(id.to_string());
        self
    }

    /// Short message without the context suffix, for user-facing notifications.
    pub fn summary(&self) -> &str {
        match self {
            Self::Connection { message, .. }
            | Self::Timeout { message, .. }
            | Self::Unauthorized { message, .. }
            | Self::NotFound { message, .. }
            | Self::Rejected { message, .. }
            | Self::Server { message, .. }
            | Self::InvalidResponse { message, .. }
            | Self::Configuration { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::invalid_response(err.to_string())
    }
}

#[cfg(feature = "http-client")]
impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::timeout(err.to_string())
        } else if err.is_connect() {
            ServiceError::connection(err.to_string())
        } else if err.is_decode() {
            ServiceError::invalid_response(err.to_string())
        } else if let Some(status) = err.status() {
            ServiceError::from_status(status.as_u16(), err.to_string())
        } else {
            ServiceError::connection_with_details(err.to_string())
        }
    }
}

#[cfg(feature = "http-client")]
impl ServiceError {
    fn connection_with_details(message: String) -> Self {
        Self::Connection {
            message,
            context: ErrorContext::default()
                .with_details("request_error")
                .retryable(),
        }
    }
}
