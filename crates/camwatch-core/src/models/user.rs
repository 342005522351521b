//! User and identity domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::role::Role;
use super::{LocationId, UserId};
use crate::policy::PolicyContext;
use crate::validation::{not_blank, username_charset};

/// Public profile of an authenticated actor (`GET /auth/me`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    /// `None` means the identity is not restricted to a single location.
    #[serde(default)]
    pub assigned_location_id: Option<LocationId>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn policy_context(&self) -> PolicyContext {
        PolicyContext {
            assigned_location: self.assigned_location_id,
        }
    }
}

/// Stored user record, including the password hash.
///
/// Only the credential store sees this type; everything handed to
/// clients is an [`Identity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    pub assigned_location_id: Option<LocationId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
            is_active: self.is_active,
            assigned_location_id: self.assigned_location_id,
            created_at: self.created_at,
            last_login: self.last_login,
        }
    }
}

/// Input for registering a user (`POST /auth/register`).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(
        length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"),
        custom(
            function = "username_charset",
            message = "Username may only contain letters, digits, '.', '_' and '-'"
        )
    )]
    pub username: String,
    #[validate(email(message = "Email address is invalid"))]
    pub email: String,
    #[validate(length(min = 2, max = 100, message = "Full name must be between 2 and 100 characters"))]
    pub full_name: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub assigned_location_id: Option<LocationId>,
}

/// A user ready for storage: the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
    pub is_verified: bool,
    pub assigned_location_id: Option<LocationId>,
}

/// Administrator update of another user (`PUT /auth/users/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
pub struct UpdateUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Email address is invalid"))]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, max = 100, message = "Full name must be between 2 and 100 characters"))]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// `Some(Some(id))` = assign, `Some(None)` = clear, `None` = no change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_location_id: Option<Option<LocationId>>,
}

/// Self-service profile update (`PUT /auth/me`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Email address is invalid"))]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, max = 100, message = "Full name must be between 2 and 100 characters"))]
    pub full_name: Option<String>,
}

/// Password change (`PUT /auth/me/password`, `PUT /auth/users/{id}/password`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordChange {
    /// Required when changing one's own password.
    #[serde(default)]
    pub current_password: String,
    pub new_password: String,
}

/// Partial identity merged into a live session without re-authenticating.
#[derive(Debug, Clone, Default)]
pub struct IdentityPatch {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub assigned_location_id: Option<Option<LocationId>>,
    pub last_login: Option<DateTime<Utc>>,
}

impl IdentityPatch {
    pub fn apply(self, identity: &mut Identity) {
        if let Some(email) = self.email {
            identity.email = email;
        }
        if let Some(full_name) = self.full_name {
            identity.full_name = full_name;
        }
        if let Some(location) = self.assigned_location_id {
            identity.assigned_location_id = location;
        }
        if let Some(last_login) = self.last_login {
            identity.last_login = Some(last_login);
        }
    }
}

impl From<ProfileUpdate> for IdentityPatch {
    fn from(update: ProfileUpdate) -> Self {
        Self {
            email: update.email,
            full_name: update.full_name,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "not_blank", message = "Username is required"))]
    pub username: String,
    #[validate(custom(function = "not_blank", message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub user: Identity,
}

fn bearer() -> String {
    "bearer".into()
}

/// Filters for the administrator user list.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub assigned_location: Option<LocationId>,
    /// Case-insensitive match against username, full name and email.
    pub search: Option<String>,
}

/// Page of users as returned by `GET /auth/users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserList {
    pub users: Vec<Identity>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}
