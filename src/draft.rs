//! Boundary point buffer: the plot currently being drawn.
//!
//! DESIGN
//! ======
//! States: `Empty -> Drafting -> Committing -> (Empty | Drafting)`, plus
//! `cancel` back to `Empty`. Every append redraws the preview through the
//! map surface, removing the previous shape first so at most one preview
//! exists per buffer.
//!
//! The buffer state sits behind a `std::sync::Mutex` that is never held
//! across an `.await`. Clicks may therefore keep appending while a commit
//! request is in flight.
//!
//! COMMIT POLICY
//! =============
//! - Fewer than three points is rejected locally, before any network call.
//! - A second commit while one is pending is rejected with `CommitInFlight`.
//! - The commit sends a snapshot of the points. On success exactly that many
//!   leading points are drained; points clicked during the request stay as
//!   the start of the next draft, in order.
//! - On failure every point is kept so the user can retry without redrawing.
//! - Cancel is rejected while a commit is pending.

#[cfg(test)]
#[path = "draft_test.rs"]
mod draft_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::geo::{GeoPoint, Plot, PlotDraft};
use crate::map::{MapSurface, RenderedShape};
use crate::registry::{PlotRegistry, RegistryError};

/// Minimum vertices for a polygon that may be registered.
pub const MIN_COMMIT_POINTS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("a plot needs at least {MIN_COMMIT_POINTS} points (have {count})")]
    TooFewPoints { count: usize },
    #[error("a registration for this boundary is already in progress")]
    CommitInFlight,
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    Empty,
    Drafting,
    Committing,
}

struct BufferInner {
    points: Vec<GeoPoint>,
    shape: Option<RenderedShape>,
    committing: bool,
}

impl BufferInner {
    fn state(&self) -> DraftState {
        if self.committing {
            DraftState::Committing
        } else if self.points.is_empty() {
            DraftState::Empty
        } else {
            DraftState::Drafting
        }
    }
}

/// Clears the committing flag if a commit future is dropped mid-request.
struct InFlight<'a> {
    buffer: &'a BoundaryBuffer,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.buffer.lock().committing = false;
        }
    }
}

/// The in-progress boundary plus its preview shape.
#[derive(Clone)]
pub struct BoundaryBuffer {
    inner: Arc<Mutex<BufferInner>>,
    surface: MapSurface,
    registry: Arc<dyn PlotRegistry>,
    color: String,
}

impl BoundaryBuffer {
    #[must_use]
    pub fn new(surface: MapSurface, registry: Arc<dyn PlotRegistry>, color: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BufferInner { points: Vec::new(), shape: None, committing: false })),
            surface,
            registry,
            color: color.into(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BufferInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Swap the preview for one matching the current points.
    fn redraw(&self, inner: &mut BufferInner) {
        if let Some(old) = inner.shape.take() {
            self.surface.remove(old);
        }
        inner.shape = self.surface.render_draft(&inner.points, &self.color);
    }

    /// Add a clicked point and refresh the preview.
    pub fn append(&self, point: GeoPoint) {
        let mut inner = self.lock();
        inner.points.push(point);
        self.redraw(&mut inner);
        debug!(lat = point.lat, lng = point.lng, count = inner.points.len(), "boundary point added");
    }

    #[must_use]
    pub fn can_commit(&self) -> bool {
        self.lock().points.len() >= MIN_COMMIT_POINTS
    }

    #[must_use]
    pub fn state(&self) -> DraftState {
        self.lock().state()
    }

    #[must_use]
    pub fn points(&self) -> Vec<GeoPoint> {
        self.lock().points.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().points.is_empty()
    }

    /// Whether a preview shape is currently on the map.
    #[must_use]
    pub fn has_shape(&self) -> bool {
        self.lock().shape.is_some()
    }

    /// Register the boundary under `name`.
    ///
    /// # Errors
    ///
    /// See [`Self::commit_with`].
    pub async fn commit(&self, name: &str) -> Result<Plot, DraftError> {
        self.commit_with(name, Map::new()).await
    }

    /// Register the boundary under `name` with extra metadata fields.
    ///
    /// # Errors
    ///
    /// - [`DraftError::TooFewPoints`] with fewer than three points (no request is made)
    /// - [`DraftError::CommitInFlight`] while another commit is pending
    /// - [`DraftError::Registry`] when the registry rejects or is unreachable;
    ///   the points are kept
    pub async fn commit_with(&self, name: &str, metadata: Map<String, Value>) -> Result<Plot, DraftError> {
        let snapshot = {
            let mut inner = self.lock();
            if inner.committing {
                return Err(DraftError::CommitInFlight);
            }
            if inner.points.len() < MIN_COMMIT_POINTS {
                return Err(DraftError::TooFewPoints { count: inner.points.len() });
            }
            inner.committing = true;
            inner.points.clone()
        };

        let committed = snapshot.len();
        let draft = PlotDraft::with_metadata(name, snapshot, metadata);
        let mut in_flight = InFlight { buffer: self, armed: true };
        let result = self.registry.register(&draft).await;

        let mut inner = self.lock();
        inner.committing = false;
        in_flight.armed = false;
        match result {
            Ok(plot) => {
                inner.points.drain(..committed);
                self.redraw(&mut inner);
                info!(id = %plot.id, committed, remaining = inner.points.len(), "boundary committed");
                Ok(plot)
            }
            Err(e) => {
                warn!(error = %e, points = inner.points.len(), "boundary commit failed; points kept");
                Err(e.into())
            }
        }
    }

    /// Drop every point and the preview.
    ///
    /// Cancelling an empty buffer is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::CommitInFlight`] while a commit is pending.
    pub fn cancel(&self) -> Result<(), DraftError> {
        let mut inner = self.lock();
        if inner.committing {
            return Err(DraftError::CommitInFlight);
        }
        let dropped = inner.points.len();
        inner.points.clear();
        if let Some(shape) = inner.shape.take() {
            self.surface.remove(shape);
        }
        if dropped > 0 {
            info!(dropped, "boundary draft cancelled");
        }
        Ok(())
    }
}
