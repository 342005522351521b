//! camwatch: command-line client for the camera administration API.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

mod commands;
mod demo;

#[derive(Parser)]
#[command(name = "camwatch")]
#[command(about = "Camera administration client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// API root, e.g. http://localhost:8000/api/v1
    #[arg(long, global = true, env = "CAMWATCH_API_URL")]
    api_url: Option<String>,

    /// Where the access token is persisted between runs
    #[arg(long, global = true, env = "CAMWATCH_TOKEN_PATH")]
    token_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and persist the access token
    Login {
        username: String,
        #[arg(long, env = "CAMWATCH_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the persisted token
    Logout,
    /// Show the signed-in identity
    Whoami,
    /// List cameras
    Cameras(FollowArgs),
    /// List locations
    Locations(FollowArgs),
    /// List NVR devices
    Nvrs(FollowArgs),
    /// List camera history
    Actions {
        #[command(flatten)]
        list: FollowArgs,
        #[arg(long)]
        camera: Option<i64>,
    },
    /// List users (administrators only)
    Users(ListArgs),
    /// Delete a location that has no cameras
    DeleteLocation {
        id: i64,
        /// Skip the confirmation question
        #[arg(long)]
        yes: bool,
    },
    /// Run a session walkthrough against an in-memory credential store
    Demo,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long, default_value = "1")]
    pub page: u64,
    #[arg(long, default_value = "100")]
    pub per_page: u64,
    /// Column to sort by
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(long)]
    pub desc: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FollowArgs {
    #[command(flatten)]
    pub list: ListArgs,
    /// Re-fetch on the configured refresh interval until Ctrl+C
    #[arg(long)]
    pub follow: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let directive = if cli.verbose { "camwatch=debug" } else { "camwatch=info" };
    let filter = match directive.parse::<Directive>() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_writer(std::io::stderr)
        .init();

    let overrides = commands::Overrides {
        api_url: cli.api_url,
        token_path: cli.token_path,
    };
    let result = commands::run(cli.command, overrides).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
