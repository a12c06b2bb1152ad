//! Error types for the TimeMachine client.

use thiserror::Error;

use crate::gateway::GatewayError;

/// A shared error type for the whole client.
///
/// Storage and configuration problems are carried as typed variants; backend
/// failures keep their [`GatewayError`] tag so callers can still switch on
/// the kind (network, HTTP, expired session).
#[derive(Error, Debug, Clone)]
pub enum TimeMachineError {
    /// Lookup by id found nothing
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// File system failure
    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    /// Stored or configured data could not be (de)serialized
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    /// Action attempted without a logged-in identity
    #[error("Authentication required")]
    Unauthenticated,

    /// Backend request failed
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Poisoned locks, failed background tasks
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TimeMachineError {
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// True when the backend rejected the stored credentials (HTTP 401).
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::Gateway(GatewayError::Unauthorized))
    }

    /// Returns the gateway error, if this error came from the backend.
    pub fn as_gateway(&self) -> Option<&GatewayError> {
        match self {
            Self::Gateway(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TimeMachineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for TimeMachineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for TimeMachineError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for TimeMachineError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TimeMachineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_expired_detection() {
        let err = TimeMachineError::from(GatewayError::Unauthorized);
        assert!(err.is_session_expired());
        assert!(err.as_gateway().is_some());

        let err = TimeMachineError::storage("disk full");
        assert!(!err.is_session_expired());
        assert!(err.as_gateway().is_none());
    }

    #[test]
    fn test_json_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json");
        let err: TimeMachineError = parse.unwrap_err().into();
        assert!(matches!(err, TimeMachineError::Serialization { ref format, .. } if format == "JSON"));
    }
}
