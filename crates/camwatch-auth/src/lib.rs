//! camwatch auth: the credential store with Argon2id password hashing,
//! HS256 access tokens and user administration.

pub mod config;
pub mod error;
pub mod memory;
pub mod password;
pub mod service;
pub mod token;

pub use config::{AuthConfig, Environment};
pub use error::AuthError;
pub use memory::MemoryUserRepository;
pub use service::CredentialService;
pub use token::AccessTokenClaims;
