//! Client configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use camwatch_core::error::{CamwatchError, CamwatchResult};

/// How often each list view re-fetches while open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshIntervals {
    pub cameras: Duration,
    pub actions: Duration,
    pub locations: Duration,
    pub nvrs: Duration,
}

impl Default for RefreshIntervals {
    fn default() -> Self {
        Self {
            cameras: Duration::from_secs(30),
            actions: Duration::from_secs(30),
            locations: Duration::from_secs(60),
            nvrs: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:8000/api/v1`. No trailing slash.
    pub base_url: String,
    pub request_timeout: Duration,
    /// Token slot location; `None` selects the platform data directory.
    pub token_path: Option<PathBuf>,
    pub refresh: RefreshIntervals,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".into(),
            request_timeout: Duration::from_secs(30),
            token_path: None,
            refresh: RefreshIntervals::default(),
        }
    }
}

fn seconds(key: &str, value: &str) -> CamwatchResult<Duration> {
    value
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| {
            CamwatchError::Internal(format!("{key} must be a positive number of seconds, got {value:?}"))
        })
}

impl ClientConfig {
    /// Read `CAMWATCH_*` variables on top of the defaults.
    pub fn from_env() -> CamwatchResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CamwatchResult<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("CAMWATCH_API_URL") {
            config = config.with_base_url(url);
        }
        if let Some(value) = lookup("CAMWATCH_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = seconds("CAMWATCH_REQUEST_TIMEOUT_SECS", &value)?;
        }
        if let Some(path) = lookup("CAMWATCH_TOKEN_PATH") {
            config.token_path = Some(PathBuf::from(path));
        }

        let intervals = [
            ("CAMWATCH_REFRESH_CAMERAS_SECS", &mut config.refresh.cameras),
            ("CAMWATCH_REFRESH_ACTIONS_SECS", &mut config.refresh.actions),
            ("CAMWATCH_REFRESH_LOCATIONS_SECS", &mut config.refresh.locations),
            ("CAMWATCH_REFRESH_NVRS_SECS", &mut config.refresh.nvrs),
        ];
        for (key, slot) in intervals {
            if let Some(value) = lookup(key) {
                *slot = seconds(key, &value)?;
            }
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_intervals() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.refresh.cameras, Duration::from_secs(30));
        assert_eq!(config.refresh.locations, Duration::from_secs(60));
    }

    #[test]
    fn environment_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CAMWATCH_API_URL", "https://cams.example.com/api/v1/"),
            ("CAMWATCH_REFRESH_NVRS_SECS", "120"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://cams.example.com/api/v1");
        assert_eq!(config.refresh.nvrs, Duration::from_secs(120));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[("CAMWATCH_REFRESH_CAMERAS_SECS", "0")]));
        assert!(err.is_err());
    }
}
