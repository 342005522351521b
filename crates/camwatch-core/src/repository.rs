//! Pagination types and the trait boundaries between crates.
//!
//! All operations are async. [`UserRepository`] is the storage seam of
//! the credential store; [`CredentialApi`] is what the session holder
//! consumes, implemented both in-process and over HTTP.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CamwatchResult;
use crate::models::UserId;
use crate::models::user::{
    Identity, LoginRequest, LoginResponse, NewUser, UpdateUser, User, UserFilter,
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub skip: u64,
    pub limit: u64,
}

impl Pagination {
    pub const DEFAULT_LIMIT: u64 = 100;
    pub const MAX_LIMIT: u64 = 1000;

    /// Build a page request, clamping `limit` into `1..=MAX_LIMIT`.
    pub fn new(skip: u64, limit: u64) -> Self {
        Self {
            skip,
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Pagination for a 1-based page number.
    pub fn page(page: u64, per_page: u64) -> Self {
        let per_page = per_page.clamp(1, Self::MAX_LIMIT);
        Self::new(page.saturating_sub(1).saturating_mul(per_page), per_page)
    }

    pub fn next(&self) -> Self {
        Self::new(self.skip.saturating_add(self.limit), self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Requested ordering for a list view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort {
    pub field: Option<String>,
    pub order: SortOrder,
}

impl Sort {
    pub fn by(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: Some(field.into()),
            order,
        }
    }
}

/// A paginated result set (`{items, total, skip, limit, has_more}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
    pub has_more: bool,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        let has_more = pagination.skip.saturating_add(items.len() as u64) < total;
        Self {
            items,
            total,
            skip: pagination.skip,
            limit: pagination.limit,
            has_more,
        }
    }
}

// ---------------------------------------------------------------------------
// Credential store
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the username or email is taken.
    fn create(&self, input: NewUser) -> impl Future<Output = CamwatchResult<User>> + Send;
    fn get_by_id(&self, id: UserId) -> impl Future<Output = CamwatchResult<User>> + Send;
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = CamwatchResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = CamwatchResult<User>> + Send;
    fn update(
        &self,
        id: UserId,
        input: UpdateUser,
    ) -> impl Future<Output = CamwatchResult<User>> + Send;
    fn set_password_hash(
        &self,
        id: UserId,
        password_hash: String,
    ) -> impl Future<Output = CamwatchResult<()>> + Send;
    fn record_login(
        &self,
        id: UserId,
        at: DateTime<Utc>,
    ) -> impl Future<Output = CamwatchResult<User>> + Send;
    /// Newest first.
    fn list(
        &self,
        filter: UserFilter,
        pagination: Pagination,
    ) -> impl Future<Output = CamwatchResult<PaginatedResult<User>>> + Send;
}

/// Verifies credentials and resolves bearer tokens to identities.
pub trait CredentialApi: Send + Sync {
    /// Fails with `AuthenticationFailed` on bad credentials.
    fn login(
        &self,
        request: LoginRequest,
    ) -> impl Future<Output = CamwatchResult<LoginResponse>> + Send;

    /// Fails with `AuthenticationFailed` on an invalid or expired token.
    fn profile(&self, token: &str) -> impl Future<Output = CamwatchResult<Identity>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(Pagination::new(0, 0).limit, 1);
        assert_eq!(Pagination::new(0, 5_000).limit, Pagination::MAX_LIMIT);
        assert_eq!(Pagination::default().limit, 100);
    }

    #[test]
    fn page_numbers_are_one_based() {
        assert_eq!(Pagination::page(1, 25), Pagination::new(0, 25));
        assert_eq!(Pagination::page(3, 25), Pagination::new(50, 25));
        assert_eq!(Pagination::page(0, 25), Pagination::new(0, 25));
    }

    #[test]
    fn huge_page_numbers_saturate() {
        let last = Pagination::page(u64::MAX, Pagination::MAX_LIMIT);
        assert_eq!(last.skip, u64::MAX);
        assert_eq!(last.next().skip, u64::MAX);

        let beyond = PaginatedResult::new(vec![1], 5, last);
        assert!(!beyond.has_more);
    }

    #[test]
    fn has_more_reflects_remaining_rows() {
        let page = PaginatedResult::new(vec![1, 2, 3], 10, Pagination::new(0, 3));
        assert!(page.has_more);

        let last = PaginatedResult::new(vec![10], 10, Pagination::new(9, 3));
        assert!(!last.has_more);

        let empty: PaginatedResult<u8> = PaginatedResult::new(vec![], 0, Pagination::default());
        assert!(!empty.has_more);
    }
}
