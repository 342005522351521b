//! Resource services: one per entity, over a shared [`ApiClient`].
//!
//! Every write checks the session's capabilities and validates its input
//! before a request is built. Destructive operations go through a
//! two-step [`PendingDeletion`].

mod actions;
mod cameras;
mod locations;
mod nvrs;
mod users;

use std::sync::Arc;

use camwatch_core::error::CamwatchResult;
use tracing::info;

use crate::api::ApiClient;
use crate::transport::Transport;

pub use actions::ActionService;
pub use cameras::CameraService;
pub use locations::LocationService;
pub use nvrs::NvrService;
pub use users::UserService;

/// A checked destructive request awaiting confirmation.
///
/// Nothing is sent until [`confirm`](Self::confirm); dropping it cancels.
#[must_use = "nothing is deleted until the deletion is confirmed"]
pub struct PendingDeletion<T: Transport> {
    api: Arc<ApiClient<T>>,
    path: String,
    verb: &'static str,
    description: String,
}

impl<T: Transport> PendingDeletion<T> {
    fn new(
        api: Arc<ApiClient<T>>,
        path: String,
        verb: &'static str,
        description: String,
    ) -> Self {
        Self {
            api,
            path,
            verb,
            description,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Confirmation question for the user.
    pub fn prompt(&self) -> String {
        format!("{} {}? This cannot be undone.", self.verb, self.description)
    }

    pub async fn confirm(self) -> CamwatchResult<()> {
        self.api.delete(&self.path).await?;
        info!(path = %self.path, "{} confirmed", self.verb.to_lowercase());
        Ok(())
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("1 {word}")
    } else {
        format!("{count} {word}s")
    }
}
