//! Credential service: login, token resolution and user administration.

use camwatch_core::error::{CamwatchError, CamwatchResult};
use camwatch_core::models::{LocationId, UserId};
use camwatch_core::models::role::Role;
use camwatch_core::models::user::{
    CreateUser, Identity, LoginRequest, LoginResponse, NewUser, PasswordChange, ProfileUpdate,
    UpdateUser, User, UserFilter, UserList,
};
use camwatch_core::policy::{self, Capability};
use camwatch_core::repository::{CredentialApi, Pagination, UserRepository};
use camwatch_core::validation;
use chrono::Utc;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Accounts created by [`CredentialService::seed_demo_users`].
pub const DEMO_USERS: [(&str, &str, Role); 3] = [
    ("admin", "admin123", Role::Administrator),
    ("operator", "oper123", Role::Operator),
    ("viewer", "view123", Role::Viewer),
];

/// Credential service.
///
/// Generic over the user repository so that it has no dependency on a
/// storage engine. Administrative operations take the acting identity
/// and check it against the authorization policy.
#[derive(Clone)]
pub struct CredentialService<U: UserRepository> {
    users: U,
    config: AuthConfig,
}

fn require(actor: &Identity, capability: Capability, message: &str) -> CamwatchResult<()> {
    if policy::decide(Some(actor.role), capability, &actor.policy_context()) {
        Ok(())
    } else {
        Err(AuthError::Forbidden(message.into()).into())
    }
}

fn require_admin(actor: &Identity) -> CamwatchResult<()> {
    require(actor, Capability::ManageUsers, "Administrator access required")
}

impl<U: UserRepository> CredentialService<U> {
    pub fn new(users: U, config: AuthConfig) -> Self {
        Self { users, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn pepper(&self) -> Option<&str> {
        self.config.pepper.as_deref()
    }

    /// Look up by username first, then email.
    async fn find_login_user(&self, username_or_email: &str) -> CamwatchResult<User> {
        match self.users.get_by_username(username_or_email).await {
            Ok(user) => Ok(user),
            Err(CamwatchError::NotFound { .. }) => self
                .users
                .get_by_email(username_or_email)
                .await
                .map_err(|_| CamwatchError::from(AuthError::InvalidCredentials)),
            Err(e) => Err(e),
        }
    }

    /// Verify credentials and issue an access token.
    pub async fn login(&self, request: LoginRequest) -> CamwatchResult<LoginResponse> {
        let user = self.find_login_user(&request.username).await;
        let user = match user {
            Ok(user) => user,
            Err(e) => {
                info!(username = %request.username, "login rejected: unknown user");
                return Err(e);
            }
        };

        let valid = password::verify_password(&request.password, &user.password_hash, self.pepper())?;
        if !valid {
            info!(user_id = user.id, "login rejected: bad password");
            return Err(AuthError::InvalidCredentials.into());
        }
        if !user.is_active {
            info!(user_id = user.id, "login rejected: account deactivated");
            return Err(AuthError::AccountInactive.into());
        }

        let user = self.users.record_login(user.id, Utc::now()).await?;
        let access_token = token::issue_access_token(&user, &self.config)?;
        info!(user_id = user.id, role = %user.role, "login succeeded");

        Ok(LoginResponse {
            access_token,
            token_type: "bearer".into(),
            expires_in: self.config.access_token_lifetime_secs,
            user: user.identity(),
        })
    }

    /// Resolve a bearer token to the current, active identity.
    pub async fn authenticate(&self, access_token: &str) -> CamwatchResult<Identity> {
        let claims = token::decode_access_token(access_token, &self.config)?;
        let user = match self.users.get_by_id(claims.user_id()?).await {
            Ok(user) => user,
            Err(CamwatchError::NotFound { .. }) => {
                return Err(AuthError::TokenInvalid("unknown subject".into()).into());
            }
            Err(e) => return Err(e),
        };
        if !user.is_active {
            return Err(AuthError::AccountInactive.into());
        }
        Ok(user.identity())
    }

    /// Self-service update; role and location cannot be changed here.
    pub async fn update_profile(
        &self,
        actor: &Identity,
        update: ProfileUpdate,
    ) -> CamwatchResult<Identity> {
        validation::check(&update)?;
        let user = self
            .users
            .update(
                actor.id,
                UpdateUser {
                    email: update.email,
                    full_name: update.full_name,
                    ..Default::default()
                },
            )
            .await?;
        Ok(user.identity())
    }

    pub async fn change_own_password(
        &self,
        actor: &Identity,
        change: PasswordChange,
    ) -> CamwatchResult<()> {
        self.set_password(actor, actor.id, change).await
    }

    /// Administrator reset of another user's password.
    ///
    /// Resetting one's own password still requires the current one.
    pub async fn reset_password(
        &self,
        actor: &Identity,
        user_id: UserId,
        change: PasswordChange,
    ) -> CamwatchResult<()> {
        if actor.id != user_id {
            require(
                actor,
                Capability::ManageUsers,
                "Not authorized to update this user's password",
            )?;
        }
        self.set_password(actor, user_id, change).await
    }

    async fn set_password(
        &self,
        actor: &Identity,
        user_id: UserId,
        change: PasswordChange,
    ) -> CamwatchResult<()> {
        let own = actor.id == user_id;
        validation::validate_password_change(&change, own, self.config.min_password_length)?;

        let user = self.users.get_by_id(user_id).await?;
        if own && !password::verify_password(&change.current_password, &user.password_hash, self.pepper())? {
            return Err(AuthError::IncorrectPassword.into());
        }

        let hash = password::hash_password(&change.new_password, self.pepper())?;
        self.users.set_password_hash(user_id, hash).await?;
        info!(actor = actor.id, user_id, "password updated");
        Ok(())
    }

    /// Register a user (administrator only).
    pub async fn create_user(&self, actor: &Identity, input: CreateUser) -> CamwatchResult<Identity> {
        require_admin(actor)?;
        self.insert_user(input).await
    }

    async fn insert_user(&self, input: CreateUser) -> CamwatchResult<Identity> {
        validation::validate_new_user(&input, self.config.min_password_length)?;
        let password_hash = password::hash_password(&input.password, self.pepper())?;
        let user = self
            .users
            .create(NewUser {
                username: input.username,
                email: input.email,
                full_name: input.full_name,
                password_hash,
                role: input.role,
                is_verified: true,
                assigned_location_id: input.assigned_location_id,
            })
            .await?;
        info!(user_id = user.id, username = %user.username, role = %user.role, "user created");
        Ok(user.identity())
    }

    /// Create `input` unless a user with that username already exists.
    ///
    /// Used to bootstrap the first administrator from configuration.
    pub async fn ensure_user(&self, input: CreateUser) -> CamwatchResult<Identity> {
        match self.users.get_by_username(&input.username).await {
            Ok(user) => Ok(user.identity()),
            Err(CamwatchError::NotFound { .. }) => self.insert_user(input).await,
            Err(e) => Err(e),
        }
    }

    /// Create the fixed demo accounts, skipping ones that exist.
    ///
    /// Demo passwords predate the password policy, so they bypass it.
    pub async fn seed_demo_users(&self) -> CamwatchResult<Vec<Identity>> {
        let mut seeded = Vec::with_capacity(DEMO_USERS.len());
        for (username, raw_password, role) in DEMO_USERS {
            if let Ok(user) = self.users.get_by_username(username).await {
                seeded.push(user.identity());
                continue;
            }
            let user = self
                .users
                .create(NewUser {
                    username: username.into(),
                    email: format!("{username}@camwatch.local"),
                    full_name: format!("Demo {role}"),
                    password_hash: password::hash_password(raw_password, self.pepper())?,
                    role,
                    is_verified: true,
                    assigned_location_id: None,
                })
                .await?;
            warn!(username, "seeded demo account with a well-known password");
            seeded.push(user.identity());
        }
        Ok(seeded)
    }

    /// Paged user list, newest first (administrator only).
    pub async fn list_users(
        &self,
        actor: &Identity,
        filter: UserFilter,
        pagination: Pagination,
    ) -> CamwatchResult<UserList> {
        require_admin(actor)?;
        let page = self.users.list(filter, pagination).await?;
        Ok(UserList {
            users: page.items.iter().map(User::identity).collect(),
            total: page.total,
            page: page.skip / page.limit + 1,
            per_page: page.limit,
        })
    }

    pub async fn users_by_role(&self, actor: &Identity, role: Role) -> CamwatchResult<Vec<Identity>> {
        require_admin(actor)?;
        self.all_matching(UserFilter {
            role: Some(role),
            ..Default::default()
        })
        .await
    }

    /// Active users assigned to a location (administrators and operators).
    pub async fn users_by_location(
        &self,
        actor: &Identity,
        location_id: LocationId,
    ) -> CamwatchResult<Vec<Identity>> {
        require(
            actor,
            Capability::EditResource,
            "Administrator or Operator access required",
        )?;
        self.all_matching(UserFilter {
            assigned_location: Some(location_id),
            is_active: Some(true),
            ..Default::default()
        })
        .await
    }

    async fn all_matching(&self, filter: UserFilter) -> CamwatchResult<Vec<Identity>> {
        let mut out = Vec::new();
        let mut pagination = Pagination::new(0, Pagination::MAX_LIMIT);
        loop {
            let page = self.users.list(filter.clone(), pagination).await?;
            out.extend(page.items.iter().map(User::identity));
            if !page.has_more {
                return Ok(out);
            }
            pagination = pagination.next();
        }
    }

    pub async fn get_user(&self, actor: &Identity, user_id: UserId) -> CamwatchResult<Identity> {
        require_admin(actor)?;
        Ok(self.users.get_by_id(user_id).await?.identity())
    }

    pub async fn update_user(
        &self,
        actor: &Identity,
        user_id: UserId,
        update: UpdateUser,
    ) -> CamwatchResult<Identity> {
        require_admin(actor)?;
        validation::check(&update)?;
        let user = self.users.update(user_id, update).await?;
        info!(actor = actor.id, user_id, "user updated");
        Ok(user.identity())
    }

    /// Soft delete. Administrators cannot deactivate themselves.
    pub async fn deactivate_user(&self, actor: &Identity, user_id: UserId) -> CamwatchResult<()> {
        require_admin(actor)?;
        if actor.id == user_id {
            return Err(AuthError::SelfDeactivation.into());
        }
        self.set_active(user_id, false).await?;
        info!(actor = actor.id, user_id, "user deactivated");
        Ok(())
    }

    pub async fn activate_user(&self, actor: &Identity, user_id: UserId) -> CamwatchResult<Identity> {
        require_admin(actor)?;
        let user = self.set_active(user_id, true).await?;
        info!(actor = actor.id, user_id, "user activated");
        Ok(user.identity())
    }

    async fn set_active(&self, user_id: UserId, active: bool) -> CamwatchResult<User> {
        self.users
            .update(
                user_id,
                UpdateUser {
                    is_active: Some(active),
                    ..Default::default()
                },
            )
            .await
    }
}

impl<U: UserRepository> CredentialApi for CredentialService<U> {
    async fn login(&self, request: LoginRequest) -> CamwatchResult<LoginResponse> {
        CredentialService::login(self, request).await
    }

    async fn profile(&self, token: &str) -> CamwatchResult<Identity> {
        self.authenticate(token).await
    }
}
