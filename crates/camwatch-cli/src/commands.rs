//! Commands that talk to a live API.

use std::future::Future;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use camwatch_client::api::{ApiClient, HttpCredentials};
use camwatch_client::config::{ClientConfig, RefreshIntervals};
use camwatch_client::poll::Poller;
use camwatch_client::services::{
    ActionService, CameraService, LocationService, NvrService, UserService,
};
use camwatch_client::session::{AuthContext, SessionHolder};
use camwatch_client::token_store::FileTokenStore;
use camwatch_client::transport::ReqwestTransport;
use camwatch_core::error::{CamwatchError, CamwatchResult};
use camwatch_core::models::camera::CameraFilter;
use camwatch_core::models::camera_action::ActionFilter;
use camwatch_core::models::location::LocationFilter;
use camwatch_core::models::nvr::NvrFilter;
use camwatch_core::models::user::UserFilter;
use camwatch_core::repository::{Pagination, Sort, SortOrder};
use serde::Serialize;
use tokio::signal;
use tracing::debug;

use crate::{Command, ListArgs, demo};

/// Global flags that take precedence over the environment.
pub struct Overrides {
    pub api_url: Option<String>,
    pub token_path: Option<PathBuf>,
}

type Http = Arc<ReqwestTransport>;
type Session = SessionHolder<HttpCredentials<Http>, FileTokenStore>;

struct Client {
    session: Arc<Session>,
    api: Arc<ApiClient<Http>>,
    refresh: RefreshIntervals,
}

fn connect(overrides: Overrides) -> CamwatchResult<Client> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = overrides.api_url {
        config = config.with_base_url(url);
    }
    if let Some(path) = overrides.token_path {
        config.token_path = Some(path);
    }
    debug!(base_url = %config.base_url, "connecting");

    let store = match &config.token_path {
        Some(path) => FileTokenStore::new(path.clone()),
        None => FileTokenStore::default_location()?,
    };
    let transport = Arc::new(ReqwestTransport::new(&config)?);
    let session = Arc::new(SessionHolder::new(
        HttpCredentials::new(transport.clone()),
        store,
    ));
    let auth: Arc<dyn AuthContext> = session.clone();
    let api = Arc::new(ApiClient::new(transport, auth));
    Ok(Client {
        session,
        api,
        refresh: config.refresh,
    })
}

impl ListArgs {
    fn pagination(&self) -> Pagination {
        Pagination::page(self.page, self.per_page)
    }

    fn sort_order(&self) -> Sort {
        match &self.sort {
            Some(field) => {
                let order = if self.desc { SortOrder::Desc } else { SortOrder::Asc };
                Sort::by(field.clone(), order)
            }
            None => Sort::default(),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> CamwatchResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CamwatchError::Internal(format!("could not render output: {e}")))?;
    println!("{text}");
    Ok(())
}

/// Ask on the terminal; anything but `y`/`yes` declines.
fn confirm(prompt: &str) -> CamwatchResult<bool> {
    let io_error = |e: io::Error| CamwatchError::Internal(format!("terminal: {e}"));
    print!("{prompt} [y/N] ");
    io::stdout().flush().map_err(io_error)?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer).map_err(io_error)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Print `fetch` once, or on every `interval` until Ctrl+C when `follow`
/// is set.
async fn show<T, F, Fut>(
    name: &'static str,
    follow: Option<Duration>,
    mut fetch: F,
) -> CamwatchResult<()>
where
    T: Serialize + Send + Sync + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = CamwatchResult<T>> + Send + 'static,
{
    let Some(interval) = follow else {
        return print_json(&fetch().await?);
    };

    let (poller, mut updates) = Poller::refresh(name, interval, fetch);
    eprintln!(
        "Refreshing {name} every {}s. Press Ctrl+C to stop.",
        interval.as_secs()
    );
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update();
                if state.loading {
                    continue;
                }
                match (&state.error, &state.data) {
                    (Some(error), _) => eprintln!("refresh failed: {error}"),
                    (None, Some(data)) => print_json(data)?,
                    (None, None) => {}
                }
            }
        }
    }
    drop(poller);
    Ok(())
}

pub async fn run(command: Command, overrides: Overrides) -> CamwatchResult<()> {
    if let Command::Demo = command {
        return demo::run().await;
    }

    let client = connect(overrides)?;
    match &command {
        Command::Login { username, password } => {
            let identity = client.session.login(username, password).await?;
            println!("Signed in as {} ({}).", identity.username, identity.role);
            return Ok(());
        }
        Command::Logout => {
            client.session.logout();
            println!("Signed out.");
            return Ok(());
        }
        _ => {}
    }

    let status = client.session.initialize().await;
    if !status.is_authenticated() {
        return Err(CamwatchError::AuthenticationFailed {
            reason: "Not signed in. Run `camwatch login <username>` first.".into(),
        });
    }

    let api = client.api;
    let refresh = client.refresh;
    match command {
        Command::Whoami => print_json(&client.session.identity()),
        Command::Cameras(args) => {
            let filter = CameraFilter {
                search: args.list.search.clone(),
                include_relations: true,
                ..Default::default()
            };
            let (pagination, sort) = (args.list.pagination(), args.list.sort_order());
            let cameras = CameraService::new(api);
            show("cameras", args.follow.then_some(refresh.cameras), move || {
                let (cameras, filter, sort) = (cameras.clone(), filter.clone(), sort.clone());
                async move { cameras.list(&filter, pagination, &sort).await }
            })
            .await
        }
        Command::Locations(args) => {
            let filter = LocationFilter {
                search: args.list.search.clone(),
                ..Default::default()
            };
            let (pagination, sort) = (args.list.pagination(), args.list.sort_order());
            let locations = LocationService::new(api);
            show("locations", args.follow.then_some(refresh.locations), move || {
                let (locations, filter, sort) = (locations.clone(), filter.clone(), sort.clone());
                async move { locations.list(&filter, pagination, &sort).await }
            })
            .await
        }
        Command::Nvrs(args) => {
            let filter = NvrFilter {
                search: args.list.search.clone(),
                ..Default::default()
            };
            let (pagination, sort) = (args.list.pagination(), args.list.sort_order());
            let nvrs = NvrService::new(api);
            show("nvrs", args.follow.then_some(refresh.nvrs), move || {
                let (nvrs, filter, sort) = (nvrs.clone(), filter.clone(), sort.clone());
                async move { nvrs.list(&filter, pagination, &sort).await }
            })
            .await
        }
        Command::Actions { list, camera } => {
            let filter = ActionFilter {
                camera_id: camera,
                search: list.list.search.clone(),
                include_camera: true,
                ..Default::default()
            };
            let (pagination, sort) = (list.list.pagination(), list.list.sort_order());
            let actions = ActionService::new(api);
            show("actions", list.follow.then_some(refresh.actions), move || {
                let (actions, filter, sort) = (actions.clone(), filter.clone(), sort.clone());
                async move { actions.list(&filter, pagination, &sort).await }
            })
            .await
        }
        Command::Users(args) => {
            let filter = UserFilter {
                search: args.search.clone(),
                ..Default::default()
            };
            let users = UserService::new(api).list(&filter, args.pagination()).await?;
            print_json(&users)
        }
        Command::DeleteLocation { id, yes } => {
            let locations = LocationService::new(api);
            let location = locations.get(id, true).await?;
            let pending = locations.prepare_delete(&location).await?;
            if !yes && !confirm(&pending.prompt())? {
                println!("Cancelled.");
                return Ok(());
            }
            pending.confirm().await?;
            println!("Deleted location {id}.");
            Ok(())
        }
        Command::Login { .. } | Command::Logout | Command::Demo => Ok(()),
    }
}
