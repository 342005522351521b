//! Credential store error types.

use camwatch_core::error::CamwatchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Account is deactivated")]
    AccountInactive,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Could not validate credentials")]
    TokenInvalid(String),

    #[error("Current password is incorrect")]
    IncorrectPassword,

    #[error("Cannot delete your own account")]
    SelfDeactivation,

    #[error("{0}")]
    Forbidden(String),

    #[error("CAMWATCH_JWT_SECRET must be set in production")]
    MissingSecret,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for CamwatchError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::AccountInactive
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => CamwatchError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::IncorrectPassword | AuthError::SelfDeactivation => {
                CamwatchError::validation(err.to_string())
            }
            AuthError::Forbidden(reason) => CamwatchError::AuthorizationDenied { reason },
            AuthError::MissingSecret | AuthError::InvalidConfig(_) => {
                CamwatchError::Internal(err.to_string())
            }
            AuthError::Crypto(msg) => CamwatchError::Crypto(msg),
        }
    }
}
