use std::sync::Arc;

use camwatch_core::error::{CamwatchError, CamwatchResult};
use camwatch_core::models::role::Role;
use camwatch_core::models::user::{
    CreateUser, Identity, PasswordChange, ProfileUpdate, UpdateUser, UserFilter, UserList,
};
use camwatch_core::models::{LocationId, UserId};
use camwatch_core::policy::Capability;
use camwatch_core::repository::Pagination;
use camwatch_core::validation;
use tracing::info;

use super::PendingDeletion;
use crate::api::{ApiClient, Query, segment};
use crate::transport::Transport;

/// User administration and the caller's own profile.
pub struct UserService<T: Transport> {
    api: Arc<ApiClient<T>>,
}

impl<T: Transport> Clone for UserService<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
        }
    }
}

impl<T: Transport> UserService<T> {
    pub fn new(api: Arc<ApiClient<T>>) -> Self {
        Self { api }
    }

    fn me(&self) -> CamwatchResult<Identity> {
        self.api
            .auth()
            .identity()
            .ok_or_else(|| CamwatchError::AuthenticationFailed {
                reason: "Not authenticated".into(),
            })
    }

    // -----------------------------------------------------------------------
    // Own profile
    // -----------------------------------------------------------------------

    /// Returns the updated identity; merge it into the session with
    /// `SessionHolder::update_identity`.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> CamwatchResult<Identity> {
        self.me()?;
        validation::check(update)?;
        self.api.put("/auth/me", update).await
    }

    pub async fn change_own_password(&self, change: &PasswordChange) -> CamwatchResult<()> {
        self.me()?;
        validation::validate_password_change(change, true, validation::MIN_PASSWORD_LENGTH)?;
        self.api.put_unit("/auth/me/password", change).await?;
        info!("own password changed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------------

    pub async fn list(
        &self,
        filter: &UserFilter,
        pagination: Pagination,
    ) -> CamwatchResult<UserList> {
        self.api.require(Capability::ManageUsers)?;
        let query = Query::new()
            .page(pagination)
            .opt("role", filter.role.map(|r| r.as_str()))
            .opt("is_active", filter.is_active)
            .text("search", filter.search.as_deref());
        self.api.get("/auth/users", query).await
    }

    pub async fn by_role(&self, role: Role) -> CamwatchResult<Vec<Identity>> {
        self.api.require(Capability::ManageUsers)?;
        self.api
            .get(&format!("/auth/users/role/{}", segment(role.as_str())), Query::new())
            .await
    }

    /// Active users assigned to `location` (administrators and operators).
    pub async fn by_location(&self, location: LocationId) -> CamwatchResult<Vec<Identity>> {
        self.api.require(Capability::EditResource)?;
        self.api
            .get(&format!("/auth/users/location/{location}"), Query::new())
            .await
    }

    pub async fn get(&self, id: UserId) -> CamwatchResult<Identity> {
        self.api.require(Capability::ManageUsers)?;
        self.api.get(&format!("/auth/users/{id}"), Query::new()).await
    }

    pub async fn create(&self, input: &CreateUser) -> CamwatchResult<Identity> {
        self.api.require(Capability::ManageUsers)?;
        validation::validate_new_user(input, validation::MIN_PASSWORD_LENGTH)?;
        let user: Identity = self.api.post("/auth/register", input).await?;
        info!(user_id = user.id, username = %user.username, role = %user.role, "user created");
        Ok(user)
    }

    pub async fn update(&self, id: UserId, update: &UpdateUser) -> CamwatchResult<Identity> {
        self.api.require(Capability::ManageUsers)?;
        validation::check(update)?;
        self.api.put(&format!("/auth/users/{id}"), update).await
    }

    /// Set another user's password without knowing the current one.
    pub async fn reset_password(&self, id: UserId, new_password: &str) -> CamwatchResult<()> {
        self.api.require(Capability::ManageUsers)?;
        let change = PasswordChange {
            current_password: String::new(),
            new_password: new_password.to_string(),
        };
        validation::validate_password_change(&change, false, validation::MIN_PASSWORD_LENGTH)?;
        self.api
            .put_unit(&format!("/auth/users/{id}/password"), &change)
            .await
    }

    pub async fn activate(&self, id: UserId) -> CamwatchResult<Identity> {
        self.api.require(Capability::ManageUsers)?;
        self.api
            .put(&format!("/auth/users/{id}/activate"), &serde_json::json!({}))
            .await
    }

    /// Deactivation is a soft delete. Nobody can deactivate themselves.
    pub fn prepare_deactivate(&self, user: &Identity) -> CamwatchResult<PendingDeletion<T>> {
        self.api.require(Capability::ManageUsers)?;
        if self.me()?.id == user.id {
            return Err(CamwatchError::validation("Cannot delete your own account"));
        }
        Ok(PendingDeletion::new(
            self.api.clone(),
            format!("/auth/users/{}", user.id),
            "Deactivate",
            format!("user '{}'", user.username),
        ))
    }
}
