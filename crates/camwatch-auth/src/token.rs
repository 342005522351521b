//! HS256 access token issuance and verification.

use camwatch_core::models::UserId;
use camwatch_core::models::role::Role;
use camwatch_core::models::user::User;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Claims carried by a camwatch access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject: numeric user id as a string.
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id.
    pub jti: String,
}

impl AccessTokenClaims {
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub
            .parse()
            .map_err(|_| AuthError::TokenInvalid(format!("bad subject {:?}", self.sub)))
    }
}

pub fn issue_access_token(user: &User, config: &AuthConfig) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = AccessTokenClaims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        role: user.role,
        iss: config.jwt_issuer.clone(),
        iat: now,
        exp: now + config.access_token_lifetime_secs as i64,
        jti: Uuid::new_v4().to_string(),
    };

    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| AuthError::Crypto(format!("could not sign access token: {e}")))
}

fn rules(config: &AuthConfig) -> Validation {
    let mut rules = Validation::new(Algorithm::HS256);
    rules.set_issuer(&[config.jwt_issuer.as_str()]);
    rules.set_required_spec_claims(&["sub", "iat", "exp", "iss"]);
    rules
}

/// Verify signature, expiry and issuer.
pub fn decode_access_token(
    token: &str,
    config: &AuthConfig,
) -> Result<AccessTokenClaims, AuthError> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    match jsonwebtoken::decode::<AccessTokenClaims>(token, &key, &rules(config)) {
        Ok(data) => Ok(data.claims),
        Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => Err(AuthError::TokenExpired),
        Err(e) => Err(AuthError::TokenInvalid(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "unit-test-secret".into(),
            jwt_issuer: "camwatch-test".into(),
            ..AuthConfig::default()
        }
    }

    fn user() -> User {
        let now = Utc::now();
        User {
            id: 7,
            username: "operator".into(),
            email: "operator@example.com".into(),
            full_name: "Olive Operator".into(),
            password_hash: String::new(),
            role: Role::Operator,
            is_active: true,
            is_verified: true,
            assigned_location_id: None,
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }

    #[test]
    fn claims_carry_identity() {
        let config = test_config();
        let token = issue_access_token(&user(), &config).unwrap();
        let claims = decode_access_token(&token, &config).unwrap();
        assert_eq!(claims.user_id().unwrap(), 7);
        assert_eq!(claims.username, "operator");
        assert_eq!(claims.role, Role::Operator);
        assert_eq!(claims.iss, "camwatch-test");
        assert_eq!(claims.exp - claims.iat, 1800);
    }

    #[test]
    fn every_token_gets_its_own_id() {
        let config = test_config();
        let ids: Vec<String> = (0..2)
            .map(|_| {
                let token = issue_access_token(&user(), &config).unwrap();
                decode_access_token(&token, &config).unwrap().jti
            })
            .collect();
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_access_token(&user(), &test_config()).unwrap();
        let other = AuthConfig {
            jwt_secret: "another-secret".into(),
            ..test_config()
        };
        assert!(matches!(
            decode_access_token(&token, &other),
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = AuthConfig {
            access_token_lifetime_secs: 0,
            ..test_config()
        };
        let mut claims = decode_access_token(
            &issue_access_token(&user(), &test_config()).unwrap(),
            &test_config(),
        )
        .unwrap();
        claims.exp = Utc::now().timestamp() - 3600;
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();
        assert!(matches!(
            decode_access_token(&token, &config),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            decode_access_token("not.a.jwt", &test_config()),
            Err(AuthError::TokenInvalid(_))
        ));
    }
}
