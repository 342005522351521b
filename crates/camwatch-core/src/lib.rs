//! camwatch core: domain models, the authorization policy, input
//! validation and the traits shared by the credential store and the
//! client.

pub mod error;
pub mod models;
pub mod policy;
pub mod repository;
pub mod validation;

pub use error::{CamwatchError, CamwatchResult};
pub use models::role::Role;
pub use policy::{Capability, PolicyContext, decide};
pub use repository::{CredentialApi, PaginatedResult, Pagination, Sort, SortOrder, UserRepository};
