//! camwatch client: the session holder, route guard, capability gate,
//! periodic refresh and the per-resource services that talk to the
//! camwatch API.

pub mod api;
pub mod config;
pub mod error;
pub mod gate;
pub mod guard;
pub mod poll;
pub mod services;
pub mod session;
pub mod token_store;
pub mod transport;

pub use api::{ApiClient, HttpCredentials, Query};
pub use config::{ClientConfig, RefreshIntervals};
pub use error::TransportError;
pub use gate::Gate;
pub use guard::{Navigator, Outcome, Route, RouteGuard};
pub use poll::{ListState, Poller};
pub use services::{
    ActionService, CameraService, LocationService, NvrService, PendingDeletion, UserService,
};
pub use session::{AuthContext, AuthHeader, AuthStatus, SessionHolder};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use transport::{ApiRequest, ApiResponse, Method, ReqwestTransport, Transport};
