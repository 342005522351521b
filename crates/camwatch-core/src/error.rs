//! Error types for the camwatch system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CamwatchError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    /// Credentials rejected or token invalid/expired.
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    /// Authenticated, but the role does not grant the capability.
    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    /// Client-side or server-side input validation failures.
    #[error("Validation error: {}", .messages.join("; "))]
    Validation { messages: Vec<String> },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// A newer request replaced this one before it settled.
    #[error("Request superseded by a newer one")]
    Superseded,

    #[error("Token storage error: {0}")]
    Storage(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CamwatchError {
    /// Shorthand for a single-message validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        CamwatchError::Validation {
            messages: vec![message.into()],
        }
    }

    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        CamwatchError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Message suitable for showing next to a form or in a status line.
    ///
    /// Authentication failures show the bare reason ("Invalid username or
    /// password"); everything else uses the full display text.
    pub fn user_message(&self) -> String {
        match self {
            CamwatchError::AuthenticationFailed { reason } => reason.clone(),
            CamwatchError::AuthorizationDenied { reason } => reason.clone(),
            other => other.to_string(),
        }
    }
}

pub type CamwatchResult<T> = Result<T, CamwatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_joined() {
        let err = CamwatchError::Validation {
            messages: vec!["Serial number is required".into(), "Invalid IP".into()],
        };
        assert_eq!(
            err.to_string(),
            "Validation error: Serial number is required; Invalid IP"
        );
    }

    #[test]
    fn user_message_strips_prefix_for_auth_errors() {
        let err = CamwatchError::AuthenticationFailed {
            reason: "Invalid username or password".into(),
        };
        assert_eq!(err.user_message(), "Invalid username or password");
    }
}
