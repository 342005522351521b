//! In-process [`UserRepository`] backed by a locked map.
//!
//! Used by the CLI demo mode and by tests; a deployment would put the
//! credential store behind its own database.

use std::collections::BTreeMap;
use std::sync::Arc;

use camwatch_core::error::{CamwatchError, CamwatchResult};
use camwatch_core::models::UserId;
use camwatch_core::models::user::{NewUser, UpdateUser, User, UserFilter};
use camwatch_core::repository::{PaginatedResult, Pagination, UserRepository};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

#[derive(Default)]
struct Store {
    next_id: UserId,
    users: BTreeMap<UserId, User>,
}

/// Cheap to clone; clones share the same store.
#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    inner: Arc<RwLock<Store>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_user<T>(&self, id: UserId, f: impl FnOnce(&mut User) -> T) -> CamwatchResult<T> {
        let mut store = self.inner.write();
        let user = store
            .users
            .get_mut(&id)
            .ok_or_else(|| CamwatchError::not_found("user", id))?;
        let out = f(user);
        user.updated_at = Utc::now();
        Ok(out)
    }
}

fn matches(user: &User, filter: &UserFilter) -> bool {
    if filter.role.is_some_and(|role| role != user.role) {
        return false;
    }
    if filter.is_active.is_some_and(|active| active != user.is_active) {
        return false;
    }
    if filter
        .assigned_location
        .is_some_and(|loc| user.assigned_location_id != Some(loc))
    {
        return false;
    }
    match filter.search.as_deref().map(str::to_lowercase) {
        Some(needle) if !needle.is_empty() => [&user.username, &user.full_name, &user.email]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle)),
        _ => true,
    }
}

impl UserRepository for MemoryUserRepository {
    async fn create(&self, input: NewUser) -> CamwatchResult<User> {
        let mut store = self.inner.write();
        if let Some(existing) = store
            .users
            .values()
            .find(|u| u.username == input.username || u.email == input.email)
        {
            let reason = if existing.username == input.username {
                "Username already registered"
            } else {
                "Email already registered"
            };
            return Err(CamwatchError::validation(reason));
        }

        store.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: store.next_id,
            username: input.username,
            email: input.email,
            full_name: input.full_name,
            password_hash: input.password_hash,
            role: input.role,
            is_active: true,
            is_verified: input.is_verified,
            assigned_location_id: input.assigned_location_id,
            created_at: now,
            updated_at: now,
            last_login: None,
        };
        store.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: UserId) -> CamwatchResult<User> {
        self.inner
            .read()
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| CamwatchError::not_found("user", id))
    }

    async fn get_by_username(&self, username: &str) -> CamwatchResult<User> {
        self.inner
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| CamwatchError::not_found("user", username))
    }

    async fn get_by_email(&self, email: &str) -> CamwatchResult<User> {
        self.inner
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| CamwatchError::not_found("user", email))
    }

    async fn update(&self, id: UserId, input: UpdateUser) -> CamwatchResult<User> {
        if let Some(email) = &input.email {
            let taken = self
                .inner
                .read()
                .users
                .values()
                .any(|u| u.id != id && &u.email == email);
            if taken {
                return Err(CamwatchError::validation("Email already registered"));
            }
        }

        self.with_user(id, |user| {
            if let Some(email) = input.email {
                user.email = email;
            }
            if let Some(full_name) = input.full_name {
                user.full_name = full_name;
            }
            if let Some(role) = input.role {
                user.role = role;
            }
            if let Some(active) = input.is_active {
                user.is_active = active;
            }
            if let Some(location) = input.assigned_location_id {
                user.assigned_location_id = location;
            }
            user.clone()
        })
    }

    async fn set_password_hash(&self, id: UserId, password_hash: String) -> CamwatchResult<()> {
        self.with_user(id, |user| user.password_hash = password_hash)
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> CamwatchResult<User> {
        self.with_user(id, |user| {
            user.last_login = Some(at);
            user.clone()
        })
    }

    async fn list(
        &self,
        filter: UserFilter,
        pagination: Pagination,
    ) -> CamwatchResult<PaginatedResult<User>> {
        let store = self.inner.read();
        let mut found: Vec<&User> = store.users.values().filter(|u| matches(u, &filter)).collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = found.len() as u64;
        let items = found
            .into_iter()
            .skip(pagination.skip as usize)
            .take(pagination.limit as usize)
            .cloned()
            .collect();
        Ok(PaginatedResult::new(items, total, pagination))
    }
}
