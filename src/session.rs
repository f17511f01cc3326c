//! Drawing session: map clicks in, registered plots out.
//!
//! SYSTEM CONTEXT
//! ==============
//! Ties the pieces together the way the map page does: the map's single
//! click handler appends to the boundary buffer, `finalize` commits the
//! buffer, and every outcome lands in the [`AppStore`] (plot list plus a
//! timed status line). Registered plots are drawn as committed shapes.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, info};

use crate::draft::{BoundaryBuffer, DraftError};
use crate::geo::Plot;
use crate::map::{ClickHandler, DRAFT_GREEN, MapBackend, MapConfig, MapError, MapSurface, RenderedShape};
use crate::registry::{PlotRegistry, RegistryError};
use crate::store::AppStore;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("map initialization failed: {0}")]
    Map(#[from] MapError),
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

pub struct DrawingSession {
    surface: MapSurface,
    buffer: BoundaryBuffer,
    registry: Arc<dyn PlotRegistry>,
    store: AppStore,
    /// Committed plots currently drawn, in plot-list order.
    committed: Mutex<Vec<RenderedShape>>,
}

impl DrawingSession {
    /// Create the map on `container` and route its clicks into a new buffer.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Map`] if the map cannot attach to the
    /// container. The failure is also shown as the status message.
    pub fn start(
        backend: Arc<dyn MapBackend>,
        container: &str,
        registry: Arc<dyn PlotRegistry>,
        store: AppStore,
        config: &MapConfig,
    ) -> Result<Self, SessionError> {
        // The handler is installed before the buffer exists; it reads the slot.
        let slot: Arc<Mutex<Option<BoundaryBuffer>>> = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&slot);
        let on_click: ClickHandler = Arc::new(move |point| {
            if let Some(buffer) = sink.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
                buffer.append(point);
            }
        });

        let surface = match MapSurface::initialize_with(backend, container, config, Some(on_click)) {
            Ok(surface) => surface,
            Err(e) => {
                error!(container, error = %e, "map initialization failed");
                store.flash_status(e.to_string());
                return Err(e.into());
            }
        };
        let buffer = BoundaryBuffer::new(surface.clone(), Arc::clone(&registry), DRAFT_GREEN);
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(buffer.clone());

        Ok(Self { surface, buffer, registry, store, committed: Mutex::new(Vec::new()) })
    }

    #[must_use]
    pub fn surface(&self) -> &MapSurface {
        &self.surface
    }

    #[must_use]
    pub fn buffer(&self) -> &BoundaryBuffer {
        &self.buffer
    }

    #[must_use]
    pub fn store(&self) -> &AppStore {
        &self.store
    }

    fn draw_committed(&self, plot: &Plot) {
        match self.surface.render_committed_plot(&plot.points, &plot.id, &plot.name) {
            Ok(shape) => self.committed.lock().unwrap_or_else(PoisonError::into_inner).push(shape),
            Err(e) => info!(id = %plot.id, error = %e, "plot has no boundary to draw"),
        }
    }

    /// Replace the plot list with the registry's contents and redraw them.
    ///
    /// # Errors
    ///
    /// Returns the registry error; the status line shows its message.
    pub async fn load_plots(&self) -> Result<Vec<Plot>, SessionError> {
        let plots = match self.registry.fetch_all().await {
            Ok(plots) => plots,
            Err(e) => {
                self.store.flash_status(e.to_string());
                return Err(e.into());
            }
        };

        let stale = std::mem::take(&mut *self.committed.lock().unwrap_or_else(PoisonError::into_inner));
        for shape in stale {
            self.surface.remove(shape);
        }
        for plot in &plots {
            self.draw_committed(plot);
        }
        self.store.set_plots(plots.clone());
        self.store.flash_status(format!("Loaded {} plots", plots.len()));
        Ok(plots)
    }

    /// Register the current boundary under `name`.
    ///
    /// # Errors
    ///
    /// Returns the draft error (validation, busy, or registry). The status
    /// line shows its message and the boundary is kept.
    pub async fn finalize(&self, name: &str) -> Result<Plot, SessionError> {
        match self.buffer.commit(name).await {
            Ok(plot) => {
                self.draw_committed(&plot);
                self.store.push_plot(plot.clone());
                self.store.flash_status(format!("Registered {}", plot.label()));
                Ok(plot)
            }
            Err(e) => {
                self.store.flash_status(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Abandon the current boundary.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::CommitInFlight`] while a registration is pending.
    pub fn cancel(&self) -> Result<(), SessionError> {
        self.buffer.cancel()?;
        self.store.flash_status("Drawing cancelled");
        Ok(())
    }
}
