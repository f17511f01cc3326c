//! Observable application state: plot list, status line, current user.
//!
//! DESIGN
//! ======
//! Each value sits in its own `tokio::sync::watch` channel so UI surfaces can
//! subscribe to exactly what they render. Writes use `send_replace` /
//! `send_modify`, which succeed even when nobody is subscribed.
//!
//! STATUS RESET
//! ============
//! `set_status` schedules a deferred clear that carries the message it was
//! set with. When it fires it clears the status only if the status still
//! equals that message, so a newer message is never wiped by an older timer.
//! Comparison is full-value equality. There is no cancellation token.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::geo::{Plot, UserRef};

pub const INITIAL_STATUS: &str = "Ready";
pub const DEFAULT_STATUS_DURATION: Duration = Duration::from_millis(3000);

struct StoreInner {
    plots: watch::Sender<Vec<Plot>>,
    status: watch::Sender<String>,
    current_user: watch::Sender<Option<UserRef>>,
}

/// Process-wide observable state. Cloning shares the same channels.
#[derive(Clone)]
pub struct AppStore {
    inner: Arc<StoreInner>,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AppStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                plots: watch::Sender::new(Vec::new()),
                status: watch::Sender::new(INITIAL_STATUS.to_owned()),
                current_user: watch::Sender::new(None),
            }),
        }
    }

    // -------------------------------------------------------------------------
    // plots
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn plots(&self) -> Vec<Plot> {
        self.inner.plots.borrow().clone()
    }

    pub fn set_plots(&self, plots: Vec<Plot>) {
        self.inner.plots.send_replace(plots);
    }

    /// Append a newly registered plot, keeping registration order.
    pub fn push_plot(&self, plot: Plot) {
        self.inner.plots.send_modify(|plots| plots.push(plot));
    }

    #[must_use]
    pub fn subscribe_plots(&self) -> watch::Receiver<Vec<Plot>> {
        self.inner.plots.subscribe()
    }

    // -------------------------------------------------------------------------
    // status
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn status(&self) -> String {
        self.inner.status.borrow().clone()
    }

    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<String> {
        self.inner.status.subscribe()
    }

    /// Show `message` now and clear it after `duration` unless replaced.
    ///
    /// The reset runs on the current Tokio runtime; outside one the message
    /// simply stays. Dropping the returned handle does not cancel the reset.
    pub fn set_status(&self, message: impl Into<String>, duration: Duration) -> Option<JoinHandle<()>> {
        let message = message.into();
        self.inner.status.send_replace(message.clone());
        let Ok(runtime) = Handle::try_current() else {
            warn!(%message, "no runtime for status reset; message will persist");
            return None;
        };
        let inner = Arc::clone(&self.inner);
        Some(runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            let cleared = inner.status.send_if_modified(|current| {
                if *current == message {
                    current.clear();
                    true
                } else {
                    false
                }
            });
            debug!(%message, cleared, "status reset fired");
        }))
    }

    /// [`Self::set_status`] with [`DEFAULT_STATUS_DURATION`].
    pub fn flash_status(&self, message: impl Into<String>) -> Option<JoinHandle<()>> {
        self.set_status(message, DEFAULT_STATUS_DURATION)
    }

    // -------------------------------------------------------------------------
    // current user
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn current_user(&self) -> Option<UserRef> {
        self.inner.current_user.borrow().clone()
    }

    pub fn set_current_user(&self, user: Option<UserRef>) {
        self.inner.current_user.send_replace(user);
    }

    #[must_use]
    pub fn subscribe_current_user(&self) -> watch::Receiver<Option<UserRef>> {
        self.inner.current_user.subscribe()
    }
}
