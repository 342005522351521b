//! Periodic list refresh.
//!
//! A [`Poller`] owns one background task. Dropping the poller (or
//! calling [`Poller::cancel`]) stops the task; no tick runs after that.

use std::future::Future;
use std::time::Duration;

use camwatch_core::error::CamwatchResult;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Last known state of a refreshed list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T> {
    pub data: Option<T>,
    pub error: Option<String>,
    pub loading: bool,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            loading: false,
        }
    }
}

#[derive(Debug)]
pub struct Poller {
    name: &'static str,
    shutdown_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Run `tick` now and then every `interval` until cancelled.
    pub fn spawn<F, Fut>(name: &'static str, interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        // A tick in flight is abandoned on shutdown.
                        tokio::select! {
                            biased;
                            _ = shutdown_rx.changed() => break,
                            _ = tick() => {}
                        }
                    }
                }
            }
            debug!(poller = name, "stopped");
        });
        debug!(poller = name, ?interval, "started");
        Self {
            name,
            shutdown_tx,
            handle: Some(handle),
        }
    }

    /// Refresh `fetch` into a watch channel.
    ///
    /// `loading` is set while a fetch is in flight and always cleared
    /// after it, whether it succeeded or not. A failed fetch keeps the
    /// previous data and records the error message.
    pub fn refresh<T, F, Fut>(
        name: &'static str,
        interval: Duration,
        mut fetch: F,
    ) -> (Self, watch::Receiver<ListState<T>>)
    where
        T: Send + Sync + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = CamwatchResult<T>> + Send + 'static,
    {
        let (state_tx, state_rx) = watch::channel(ListState::default());
        let poller = Self::spawn(name, interval, move || {
            let state_tx = state_tx.clone();
            let fetch = fetch();
            async move {
                state_tx.send_modify(|state| state.loading = true);
                let result = fetch.await;
                state_tx.send_modify(|state| {
                    state.loading = false;
                    match result {
                        Ok(data) => {
                            state.data = Some(data);
                            state.error = None;
                        }
                        Err(e) => {
                            warn!(poller = name, error = %e, "refresh failed");
                            state.error = Some(e.user_message());
                        }
                    }
                });
            }
        });
        (poller, state_rx)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn cancel(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use camwatch_core::error::CamwatchError;

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() -> std::future::Ready<()> + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (count, move || {
            c.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_at_interval() {
        let (count, tick) = counter();
        let _poller = Poller::spawn("test", Duration::from_secs(30), tick);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn no_ticks_after_drop() {
        let (count, tick) = counter();
        let poller = Poller::spawn("test", Duration::from_secs(30), tick);
        tokio::time::sleep(Duration::from_millis(1)).await;
        drop(poller);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_task() {
        let (_, tick) = counter();
        let mut poller = Poller::spawn("test", Duration::from_secs(30), tick);
        assert!(poller.is_running());
        poller.cancel();
        assert!(!poller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_keeps_data_on_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let (_poller, mut rx) = Poller::refresh("test", Duration::from_secs(60), move || {
            let n = c.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Ok(vec![1, 2, 3])
                } else {
                    Err(CamwatchError::Network("connection refused".into()))
                }
            }
        });

        tokio::time::sleep(Duration::from_millis(1)).await;
        {
            let state = rx.borrow_and_update();
            assert_eq!(state.data, Some(vec![1, 2, 3]));
            assert!(!state.loading);
        }

        tokio::time::sleep(Duration::from_secs(60)).await;
        let state = rx.borrow_and_update();
        assert_eq!(state.data, Some(vec![1, 2, 3]));
        assert_eq!(state.error.as_deref(), Some("Network error: connection refused"));
        assert!(!state.loading);
    }
}
