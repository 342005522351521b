//! Route guard and navigation.

use std::fmt;

use camwatch_core::models::{CameraId, LocationId, NvrId, UserId};
use camwatch_core::policy::{self, Capability};

use crate::session::AuthStatus;

/// Shown in place of a view the current role may not open.
pub const ACCESS_DENIED_MESSAGE: &str =
    "Access denied: you do not have permission to view this page.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    Profile,
    Cameras,
    CameraNew,
    CameraDetail(CameraId),
    CameraEdit(CameraId),
    Locations,
    LocationNew,
    LocationDetail(LocationId),
    LocationEdit(LocationId),
    Nvrs,
    NvrNew,
    NvrDetail(NvrId),
    NvrEdit(NvrId),
    Actions,
    ActionNew,
    Users,
    UserNew,
    UserEdit(UserId),
}

/// Collections with list/new/detail/edit views.
const COLLECTIONS: [&str; 3] = ["cameras", "locations", "nvrs"];

impl Route {
    /// Parse an application path. Unknown paths yield `None`.
    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let route = match segments.as_slice() {
            [] | ["dashboard"] => Route::Dashboard,
            ["login"] => Route::Login,
            ["profile"] => Route::Profile,
            ["actions"] => Route::Actions,
            ["actions", "new"] => Route::ActionNew,
            ["users"] => Route::Users,
            ["users", "new"] => Route::UserNew,
            ["users", id, "edit"] => Route::UserEdit(id.parse().ok()?),
            [collection, rest @ ..] if COLLECTIONS.contains(collection) => {
                Self::collection_route(collection, rest)?
            }
            _ => return None,
        };
        Some(route)
    }

    fn collection_route(collection: &str, rest: &[&str]) -> Option<Route> {
        enum View {
            List,
            New,
            Detail(i64),
            Edit(i64),
        }
        let view = match rest {
            [] => View::List,
            ["new"] => View::New,
            [id] => View::Detail(id.parse().ok()?),
            [id, "edit"] => View::Edit(id.parse().ok()?),
            _ => return None,
        };
        Some(match (collection, view) {
            ("cameras", View::List) => Route::Cameras,
            ("cameras", View::New) => Route::CameraNew,
            ("cameras", View::Detail(id)) => Route::CameraDetail(id),
            ("cameras", View::Edit(id)) => Route::CameraEdit(id),
            ("locations", View::List) => Route::Locations,
            ("locations", View::New) => Route::LocationNew,
            ("locations", View::Detail(id)) => Route::LocationDetail(id),
            ("locations", View::Edit(id)) => Route::LocationEdit(id),
            (_, View::List) => Route::Nvrs,
            (_, View::New) => Route::NvrNew,
            (_, View::Detail(id)) => Route::NvrDetail(id),
            (_, View::Edit(id)) => Route::NvrEdit(id),
        })
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".into(),
            Route::Dashboard => "/".into(),
            Route::Profile => "/profile".into(),
            Route::Cameras => "/cameras".into(),
            Route::CameraNew => "/cameras/new".into(),
            Route::CameraDetail(id) => format!("/cameras/{id}"),
            Route::CameraEdit(id) => format!("/cameras/{id}/edit"),
            Route::Locations => "/locations".into(),
            Route::LocationNew => "/locations/new".into(),
            Route::LocationDetail(id) => format!("/locations/{id}"),
            Route::LocationEdit(id) => format!("/locations/{id}/edit"),
            Route::Nvrs => "/nvrs".into(),
            Route::NvrNew => "/nvrs/new".into(),
            Route::NvrDetail(id) => format!("/nvrs/{id}"),
            Route::NvrEdit(id) => format!("/nvrs/{id}/edit"),
            Route::Actions => "/actions".into(),
            Route::ActionNew => "/actions/new".into(),
            Route::Users => "/users".into(),
            Route::UserNew => "/users/new".into(),
            Route::UserEdit(id) => format!("/users/{id}/edit"),
        }
    }

    /// Reachable without a session.
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login)
    }

    pub fn required_capabilities(&self) -> &'static [Capability] {
        match self {
            Route::Login | Route::Dashboard | Route::Profile => &[],
            Route::Cameras
            | Route::CameraDetail(_)
            | Route::Locations
            | Route::LocationDetail(_)
            | Route::Nvrs
            | Route::NvrDetail(_)
            | Route::Actions => &[Capability::ReadResource],
            Route::CameraNew | Route::LocationNew | Route::NvrNew | Route::ActionNew => {
                &[Capability::CreateResource]
            }
            Route::CameraEdit(_) | Route::LocationEdit(_) | Route::NvrEdit(_) => {
                &[Capability::EditResource]
            }
            Route::Users | Route::UserNew | Route::UserEdit(_) => &[Capability::ManageUsers],
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Session not resolved yet: show a loading indicator and re-evaluate.
    Pending,
    Allow,
    RedirectToLogin,
    Forbidden,
}

impl Outcome {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Outcome::Forbidden => Some(ACCESS_DENIED_MESSAGE),
            _ => None,
        }
    }
}

pub struct RouteGuard;

impl RouteGuard {
    /// Decide a protected view requiring every capability in `required`.
    pub fn evaluate(status: &AuthStatus, required: &[Capability]) -> Outcome {
        match status {
            AuthStatus::Restoring | AuthStatus::Authenticating => Outcome::Pending,
            AuthStatus::Unauthenticated | AuthStatus::Error(_) => Outcome::RedirectToLogin,
            AuthStatus::Authenticated(identity) => {
                let context = identity.policy_context();
                if policy::decide_all(Some(identity.role), required, &context) {
                    Outcome::Allow
                } else {
                    Outcome::Forbidden
                }
            }
        }
    }

    pub fn evaluate_route(status: &AuthStatus, route: &Route) -> Outcome {
        if route.is_public() {
            return Outcome::Allow;
        }
        Self::evaluate(status, route.required_capabilities())
    }
}

/// Tracks the current view and follows session changes.
#[derive(Debug, Clone)]
pub struct Navigator {
    current: Route,
    /// Where to go after logging in.
    return_to: Option<Route>,
}

impl Navigator {
    pub fn new(start: Route) -> Self {
        Self {
            current: start,
            return_to: None,
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    pub fn return_to(&self) -> Option<Route> {
        self.return_to
    }

    /// Navigate to `route` and report what the view should show.
    ///
    /// A redirect lands on the login view and remembers `route`.
    pub fn navigate(&mut self, route: Route, status: &AuthStatus) -> Outcome {
        let outcome = RouteGuard::evaluate_route(status, &route);
        if outcome == Outcome::RedirectToLogin {
            self.return_to = Some(route);
            self.current = Route::Login;
        } else {
            self.current = route;
        }
        outcome
    }

    /// React to a status change; returns the new route if it moved.
    ///
    /// Leaves the login view once authenticated and sends a protected
    /// view to login when its session ends.
    pub fn on_status(&mut self, status: &AuthStatus) -> Option<Route> {
        match status {
            AuthStatus::Authenticated(_) if self.current == Route::Login => {
                let target = self.return_to.take().unwrap_or(Route::Dashboard);
                self.current = target;
                Some(target)
            }
            AuthStatus::Unauthenticated | AuthStatus::Error(_) if !self.current.is_public() => {
                self.return_to = Some(self.current);
                self.current = Route::Login;
                Some(Route::Login)
            }
            _ => None,
        }
    }
}
