//! Offline walkthrough: the session, route guard and poller driven by
//! an in-memory credential store seeded with the demo accounts.

use std::time::Duration;

use camwatch_auth::config::AuthConfig;
use camwatch_auth::memory::MemoryUserRepository;
use camwatch_auth::service::CredentialService;
use camwatch_client::guard::{Navigator, Outcome, Route};
use camwatch_client::poll::{ListState, Poller};
use camwatch_client::session::{AuthStatus, SessionHolder};
use camwatch_client::token_store::MemoryTokenStore;
use camwatch_core::error::{CamwatchError, CamwatchResult};
use camwatch_core::models::user::{UserFilter, UserList};
use camwatch_core::repository::Pagination;
use tokio::sync::watch;
use tracing::info;

const REFRESH_EVERY: Duration = Duration::from_millis(500);

fn describe(status: &AuthStatus) -> String {
    match status {
        AuthStatus::Restoring => "restoring".into(),
        AuthStatus::Unauthenticated => "signed out".into(),
        AuthStatus::Authenticating => "signing in".into(),
        AuthStatus::Authenticated(identity) => {
            format!("signed in as {} ({})", identity.username, identity.role)
        }
        AuthStatus::Error(message) => format!("error: {message}"),
    }
}

fn show(navigator: &mut Navigator, route: Route, status: &AuthStatus) {
    let outcome = navigator.navigate(route, status);
    match outcome.message() {
        Some(message) => println!("  open {route} -> {outcome:?}: {message}"),
        None => println!("  open {route} -> {outcome:?} (now at {})", navigator.current()),
    }
}

/// Wait for the next finished refresh.
async fn next_refresh(
    rx: &mut watch::Receiver<ListState<UserList>>,
) -> CamwatchResult<ListState<UserList>> {
    loop {
        rx.changed()
            .await
            .map_err(|_| CamwatchError::Internal("poller stopped".into()))?;
        let state = rx.borrow_and_update().clone();
        if !state.loading {
            return Ok(state);
        }
    }
}

pub async fn run() -> CamwatchResult<()> {
    let service = CredentialService::new(MemoryUserRepository::new(), AuthConfig::from_env()?);
    service.seed_demo_users().await?;
    info!("demo credential store ready");

    let session = SessionHolder::new(service.clone(), MemoryTokenStore::new());
    let mut navigator = Navigator::new(Route::Dashboard);

    let status = session.initialize().await;
    println!("startup: {}", describe(&status));
    show(&mut navigator, Route::Cameras, &status);

    session.login("viewer", "view123").await?;
    let status = session.status();
    println!("{}", describe(&status));
    if let Some(route) = navigator.on_status(&status) {
        println!("  returned to {route}");
    }
    show(&mut navigator, Route::CameraEdit(1), &status);
    show(&mut navigator, Route::Users, &status);

    session.logout();
    let status = session.status();
    println!("{}", describe(&status));
    if let Some(route) = navigator.on_status(&status) {
        println!("  sent to {route}");
    }

    if let Err(e) = session.login("admin", "wrong-password").await {
        println!("bad password: {}", e.user_message());
    }
    session.clear_error();

    let admin = session.login("admin", "admin123").await?;
    let status = session.status();
    println!("{}", describe(&status));
    navigator.on_status(&status);
    show(&mut navigator, Route::Users, &status);
    if navigator.navigate(Route::UserNew, &status) != Outcome::Allow {
        return Err(CamwatchError::Internal("administrator was refused".into()));
    }

    let (poller, mut users) = Poller::refresh("users", REFRESH_EVERY, move || {
        let service = service.clone();
        let admin = admin.clone();
        async move {
            service
                .list_users(&admin, UserFilter::default(), Pagination::default())
                .await
        }
    });
    for round in 1..=2 {
        let state = next_refresh(&mut users).await?;
        let names: Vec<String> = state
            .data
            .map(|list| list.users.into_iter().map(|u| u.username).collect())
            .unwrap_or_default();
        println!("refresh {round} ({}): {}", poller.name(), names.join(", "));
    }
    drop(poller);

    session.logout();
    println!("{}", describe(&session.status()));
    Ok(())
}
