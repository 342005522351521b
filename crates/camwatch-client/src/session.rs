//! Session holder: the single live authenticated identity and token.
//!
//! # State machine
//!
//! ```text
//! Restoring ──initialize──▶ Authenticated | Unauthenticated
//! Unauthenticated | Error ──login──▶ Authenticating ──▶ Authenticated | Error
//! any ──logout / force_logout──▶ Unauthenticated
//! Error ──clear_error──▶ Unauthenticated
//! ```
//!
//! # Staleness
//!
//! Every invalidating transition bumps a generation counter. An async
//! credential call remembers the generation it started under and its
//! result is dropped if the counter moved: the latest-issued login wins,
//! and a profile fetch that resolves after logout never revives the
//! session.
//!
//! # Locking
//!
//! State lives behind a `parking_lot::Mutex` that is never held across
//! `.await`.

use std::fmt;

use camwatch_core::error::{CamwatchError, CamwatchResult};
use camwatch_core::models::LocationId;
use camwatch_core::models::role::Role;
use camwatch_core::models::user::{Identity, IdentityPatch, LoginRequest};
use camwatch_core::policy::{self, Capability, PolicyContext};
use camwatch_core::repository::CredentialApi;
use camwatch_core::validation;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::token_store::TokenStore;

/// Bearer token; never printed.
#[derive(Clone, PartialEq, Eq)]
struct Token(String);

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

#[derive(Debug, Clone, PartialEq)]
enum AuthState {
    Restoring,
    Unauthenticated,
    Authenticating,
    Authenticated { identity: Identity, token: Token },
    Error { message: String },
}

/// Token-free view of the session published to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    /// Silent re-validation of a persisted token is in flight.
    Restoring,
    Unauthenticated,
    Authenticating,
    Authenticated(Identity),
    /// Unauthenticated, with the message of the last failed login.
    Error(String),
}

impl AuthStatus {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthStatus::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthStatus::Authenticated(_))
    }

    /// Neither resolved to a session nor to its absence.
    pub fn is_pending(&self) -> bool {
        matches!(self, AuthStatus::Restoring | AuthStatus::Authenticating)
    }

    pub fn role(&self) -> Option<Role> {
        self.identity().map(|identity| identity.role)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            AuthStatus::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl AuthState {
    fn status(&self) -> AuthStatus {
        match self {
            AuthState::Restoring => AuthStatus::Restoring,
            AuthState::Unauthenticated => AuthStatus::Unauthenticated,
            AuthState::Authenticating => AuthStatus::Authenticating,
            AuthState::Authenticated { identity, .. } => AuthStatus::Authenticated(identity.clone()),
            AuthState::Error { message } => AuthStatus::Error(message.clone()),
        }
    }
}

/// `Authorization` header for the current session.
///
/// Remembers the session generation it was issued under so a late 401
/// for an old token cannot end a newer session.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthHeader {
    value: String,
    generation: u64,
}

impl AuthHeader {
    pub const NAME: &'static str = "Authorization";

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for AuthHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthHeader")
            .field("value", &"Bearer <redacted>")
            .field("generation", &self.generation)
            .finish()
    }
}

/// What resource services need from the session.
pub trait AuthContext: Send + Sync {
    fn auth_header(&self) -> Option<AuthHeader>;
    fn identity(&self) -> Option<Identity>;
    fn can(&self, capability: Capability) -> bool;
    /// End the session because the server rejected `header`.
    ///
    /// Ignored if the session has changed since `header` was issued.
    fn reject(&self, header: &AuthHeader, reason: &str);
}

struct Inner {
    state: AuthState,
    generation: u64,
}

pub struct SessionHolder<C: CredentialApi, S: TokenStore> {
    credentials: C,
    store: S,
    inner: Mutex<Inner>,
    status_tx: watch::Sender<AuthStatus>,
}

impl<C: CredentialApi, S: TokenStore> SessionHolder<C, S> {
    /// Starts in `Restoring`; call [`initialize`](Self::initialize) next.
    pub fn new(credentials: C, store: S) -> Self {
        let (status_tx, _) = watch::channel(AuthStatus::Restoring);
        Self {
            credentials,
            store,
            inner: Mutex::new(Inner {
                state: AuthState::Restoring,
                generation: 0,
            }),
            status_tx,
        }
    }

    pub fn credentials(&self) -> &C {
        &self.credentials
    }

    fn set_state(&self, inner: &mut Inner, state: AuthState) {
        inner.state = state;
        self.status_tx.send_replace(inner.state.status());
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear persisted token");
        }
    }

    /// Sign out while the caller holds the lock. The store is cleared
    /// under the same lock so a later login's token is never wiped.
    fn end_locked(&self, inner: &mut Inner) {
        inner.generation += 1;
        self.set_state(inner, AuthState::Unauthenticated);
        self.clear_store();
    }

    /// Re-validate a persisted token, if any.
    ///
    /// Failures (rejected token or unreachable server) are logged and
    /// end in `Unauthenticated`; they are never returned.
    pub async fn initialize(&self) -> AuthStatus {
        let generation = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            self.set_state(&mut inner, AuthState::Restoring);
            inner.generation
        };

        let token = match self.store.load() {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => return self.resolve_restore(generation, None, false),
            Err(e) => {
                warn!(error = %e, "could not read persisted token");
                return self.resolve_restore(generation, None, false);
            }
        };

        match self.credentials.profile(&token).await {
            Ok(identity) => self.resolve_restore(generation, Some((identity, token)), false),
            Err(e) => {
                warn!(error = %e, "persisted token rejected, discarding it");
                self.resolve_restore(generation, None, true)
            }
        }
    }

    /// `discard` clears the persisted token, but only if this restore
    /// is still current.
    fn resolve_restore(
        &self,
        generation: u64,
        restored: Option<(Identity, String)>,
        discard: bool,
    ) -> AuthStatus {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            debug!("discarding stale session restore");
            return inner.state.status();
        }
        if discard {
            self.clear_store();
        }
        let state = match restored {
            Some((identity, token)) => {
                info!(user_id = identity.id, "session restored");
                AuthState::Authenticated {
                    identity,
                    token: Token(token),
                }
            }
            None => AuthState::Unauthenticated,
        };
        self.set_state(&mut inner, state);
        inner.state.status()
    }

    /// Exchange credentials for a session.
    ///
    /// Blank fields fail validation without a request. If another login
    /// (or a logout) starts before this one resolves, this one returns
    /// [`CamwatchError::Superseded`] and leaves the state alone.
    pub async fn login(&self, username: &str, password: &str) -> CamwatchResult<Identity> {
        let request = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        validation::check(&request)?;

        let generation = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            self.set_state(&mut inner, AuthState::Authenticating);
            inner.generation
        };

        let result = self.credentials.login(request).await;

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            debug!(username, "login superseded");
            return Err(CamwatchError::Superseded);
        }

        match result {
            Ok(response) if !response.access_token.is_empty() => {
                if let Err(e) = self.store.save(&response.access_token) {
                    warn!(error = %e, "failed to persist token; session will not survive restart");
                }
                info!(user_id = response.user.id, role = %response.user.role, "logged in");
                let identity = response.user.clone();
                self.set_state(
                    &mut inner,
                    AuthState::Authenticated {
                        identity: response.user,
                        token: Token(response.access_token),
                    },
                );
                Ok(identity)
            }
            Ok(_) => {
                let err = CamwatchError::AuthenticationFailed {
                    reason: "Server returned an empty token".into(),
                };
                self.set_state(&mut inner, AuthState::Error { message: err.user_message() });
                Err(err)
            }
            Err(e) => {
                info!(username, error = %e, "login failed");
                self.set_state(&mut inner, AuthState::Error { message: e.user_message() });
                Err(e)
            }
        }
    }

    /// End the session. Never fails.
    pub fn logout(&self) {
        self.end_session();
        info!("logged out");
    }

    /// End the session because a request was rejected.
    pub fn force_logout(&self, reason: &str) {
        self.end_session();
        warn!(reason, "session ended by server rejection");
    }

    fn end_session(&self) {
        let mut inner = self.inner.lock();
        self.end_locked(&mut inner);
    }

    /// Merge profile fields into the live identity. No-op unless
    /// authenticated.
    pub fn update_identity(&self, patch: IdentityPatch) {
        let mut inner = self.inner.lock();
        if let AuthState::Authenticated { identity, .. } = &mut inner.state {
            patch.apply(identity);
            let status = inner.state.status();
            self.status_tx.send_replace(status);
        }
    }

    pub fn clear_error(&self) {
        let mut inner = self.inner.lock();
        if matches!(inner.state, AuthState::Error { .. }) {
            self.set_state(&mut inner, AuthState::Unauthenticated);
        }
    }

    /// Re-fetch the profile with the current token.
    ///
    /// A rejected token ends the session; other failures leave it as is.
    pub async fn refresh_profile(&self) -> CamwatchResult<Identity> {
        let (token, generation) = {
            let inner = self.inner.lock();
            match &inner.state {
                AuthState::Authenticated { token, .. } => (token.0.clone(), inner.generation),
                _ => {
                    return Err(CamwatchError::AuthenticationFailed {
                        reason: "Not authenticated".into(),
                    });
                }
            }
        };

        let result = self.credentials.profile(&token).await;

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return Err(CamwatchError::Superseded);
        }
        match result {
            Ok(fresh) => {
                if let AuthState::Authenticated { identity, .. } = &mut inner.state {
                    *identity = fresh.clone();
                }
                let status = inner.state.status();
                self.status_tx.send_replace(status);
                Ok(fresh)
            }
            Err(e @ CamwatchError::AuthenticationFailed { .. }) => {
                self.end_locked(&mut inner);
                drop(inner);
                warn!(error = %e, "profile refresh rejected token");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn status(&self) -> AuthStatus {
        self.inner.lock().state.status()
    }

    /// Observe status changes. The receiver starts at the current status.
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status_tx.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.inner.lock().state, AuthState::Authenticated { .. })
    }

    pub fn is_loading(&self) -> bool {
        self.status().is_pending()
    }

    pub fn identity(&self) -> Option<Identity> {
        match &self.inner.lock().state {
            AuthState::Authenticated { identity, .. } => Some(identity.clone()),
            _ => None,
        }
    }

    pub fn current_role(&self) -> Option<Role> {
        match &self.inner.lock().state {
            AuthState::Authenticated { identity, .. } => Some(identity.role),
            _ => None,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.current_role() == Some(role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.current_role().is_some_and(|role| roles.contains(&role))
    }

    fn policy_inputs(&self) -> (Option<Role>, PolicyContext) {
        match &self.inner.lock().state {
            AuthState::Authenticated { identity, .. } => {
                (Some(identity.role), identity.policy_context())
            }
            _ => (None, PolicyContext::default()),
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        let (role, context) = self.policy_inputs();
        policy::decide(role, capability, &context)
    }

    pub fn can_access_location(&self, location: LocationId) -> bool {
        self.can(Capability::AccessLocation(location))
    }

    pub fn auth_header(&self) -> Option<AuthHeader> {
        let inner = self.inner.lock();
        match &inner.state {
            AuthState::Authenticated { token, .. } => Some(AuthHeader {
                value: format!("Bearer {}", token.0),
                generation: inner.generation,
            }),
            _ => None,
        }
    }
}

impl<C: CredentialApi, S: TokenStore> AuthContext for SessionHolder<C, S> {
    fn auth_header(&self) -> Option<AuthHeader> {
        SessionHolder::auth_header(self)
    }

    fn identity(&self) -> Option<Identity> {
        SessionHolder::identity(self)
    }

    fn can(&self, capability: Capability) -> bool {
        SessionHolder::can(self, capability)
    }

    fn reject(&self, header: &AuthHeader, reason: &str) {
        let mut inner = self.inner.lock();
        if inner.generation != header.generation {
            debug!(reason, "ignoring rejection of a superseded token");
            return;
        }
        self.end_locked(&mut inner);
        drop(inner);
        warn!(reason, "session ended by server rejection");
    }
}
