//! Credential store configuration.

use std::env;

use crate::error::AuthError;

/// Deployment environment; production refuses to start without a secret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("production") || value.eq_ignore_ascii_case("prod") {
            Environment::Production
        } else {
            Environment::Development
        }
    }
}

/// Configuration for the credential service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for HS256 access tokens.
    pub jwt_secret: String,
    /// Access token lifetime in seconds (default: 1800 = 30 minutes).
    pub access_token_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Optional pepper prepended to passwords before Argon2id hashing.
    pub pepper: Option<String>,
    pub min_password_length: usize,
    pub environment: Environment,
}

const DEV_SECRET: &str = "camwatch-development-secret-change-me";

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_SECRET.into(),
            access_token_lifetime_secs: 1800,
            jwt_issuer: "camwatch".into(),
            pepper: None,
            min_password_length: camwatch_core::validation::MIN_PASSWORD_LENGTH,
            environment: Environment::Development,
        }
    }
}

impl AuthConfig {
    /// Read `CAMWATCH_*` variables on top of the defaults.
    ///
    /// `CAMWATCH_JWT_SECRET` is mandatory in production.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AuthError> {
        let mut config = Self::default();

        if let Some(environment) = lookup("CAMWATCH_ENVIRONMENT") {
            config.environment = Environment::parse(&environment);
        }

        match lookup("CAMWATCH_JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => config.jwt_secret = secret,
            None if config.environment == Environment::Production => {
                return Err(AuthError::MissingSecret);
            }
            None => {
                tracing::warn!("CAMWATCH_JWT_SECRET not set, using development secret");
            }
        }

        if let Some(minutes) = lookup("CAMWATCH_ACCESS_TOKEN_EXPIRE_MINUTES") {
            let minutes: u64 = minutes.parse().map_err(|_| {
                AuthError::InvalidConfig(format!(
                    "CAMWATCH_ACCESS_TOKEN_EXPIRE_MINUTES must be a number, got {minutes:?}"
                ))
            })?;
            config.access_token_lifetime_secs = minutes * 60;
        }
        if let Some(issuer) = lookup("CAMWATCH_JWT_ISSUER") {
            config.jwt_issuer = issuer;
        }
        config.pepper = lookup("CAMWATCH_PASSWORD_PEPPER").filter(|p| !p.is_empty());

        Ok(config)
    }
}
