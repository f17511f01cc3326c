//! Map surface adapter: draft previews and committed plots on a map widget.
//!
//! DESIGN
//! ======
//! The surface wraps an injected [`MapBackend`] plus the map id it created.
//! Two rendering modes exist and must never look alike:
//! - draft: dashed outline over a translucent, non-interactive fill, drawn
//!   while the user is still clicking points
//! - committed: solid outline, fill and a permanent `"{name} (ID: {id})"`
//!   tooltip for plots the registry has accepted
//!
//! Every draw returns an owned [`RenderedShape`]. Removing a shape consumes
//! it, so a caller cannot keep a stale handle around after a redraw.

pub mod backend;
pub mod scene;


use std::sync::Arc;

use tracing::info;

use crate::geo::{GeoPoint, closed_ring, plot_label};

pub use backend::{ClickHandler, Fill, LayerId, MapBackend, MapId, PathStyle, Stroke, TileLayer, Tooltip};

pub const DEFAULT_CENTER: GeoPoint = GeoPoint::new(-13.24, 34.3);
pub const DEFAULT_ZOOM: u8 = 15;
pub const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const DEFAULT_TILE_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors";

/// Stroke for boundaries being drawn.
pub const DRAFT_GREEN: &str = "#22c55e";
/// Stroke for existing plots shown for reference.
pub const REFERENCE_BLUE: &str = "#3b82f6";

const DRAFT_GREEN_TINT: &str = "#86efac";
const REFERENCE_BLUE_TINT: &str = "#93c5fd";
/// Used when a caller passes a blank color.
const FALLBACK_STROKE: &str = "#f97316";

const DRAFT_FILL_OPACITY: f64 = 0.2;
const DRAFT_STROKE_WEIGHT: f64 = 3.0;
const DRAFT_DASH_ARRAY: &str = "6 6";

const COMMITTED_STROKE: &str = "#1d4ed8";
const COMMITTED_FILL: &str = "#3b82f6";
const COMMITTED_FILL_OPACITY: f64 = 0.3;
const COMMITTED_STROKE_WEIGHT: f64 = 2.0;
const TOOLTIP_CLASS: &str = "font-semibold";

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("map container `{0}` not found")]
    ContainerNotFound(String),
    #[error("map container `{0}` is already initialized")]
    AlreadyInitialized(String),
    #[error("cannot render a shape without points")]
    EmptyShape,
}

// =============================================================================
// CONFIG
// =============================================================================

/// Initial view and tile source.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub center: GeoPoint,
    pub zoom: u8,
    pub tiles: TileLayer,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            tiles: TileLayer {
                url_template: DEFAULT_TILE_URL.to_owned(),
                attribution: DEFAULT_TILE_ATTRIBUTION.to_owned(),
            },
        }
    }
}

/// Translucent fill that pairs with a stroke color. Unknown colors get the blue tint.
#[must_use]
pub fn fill_tint(color: &str) -> &'static str {
    if color.eq_ignore_ascii_case(DRAFT_GREEN) { DRAFT_GREEN_TINT } else { REFERENCE_BLUE_TINT }
}

fn stroke_color(color: &str) -> String {
    let trimmed = color.trim();
    if trimmed.is_empty() { FALLBACK_STROKE.to_owned() } else { trimmed.to_owned() }
}

// =============================================================================
// RENDERED SHAPE
// =============================================================================

/// Handle to the layers making up one drawn draft or plot.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a RenderedShape leaves its layers on the map"]
pub struct RenderedShape {
    layers: Vec<LayerId>,
}

impl RenderedShape {
    #[must_use]
    pub fn layers(&self) -> &[LayerId] {
        &self.layers
    }
}

// =============================================================================
// SURFACE
// =============================================================================

/// A live map plus the backend that draws on it.
#[derive(Clone)]
pub struct MapSurface {
    backend: Arc<dyn MapBackend>,
    map: MapId,
}

impl std::fmt::Debug for MapSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSurface").field("map", &self.map).finish_non_exhaustive()
    }
}

impl MapSurface {
    /// Create a map on `container` with the default view and tiles.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] if the backend cannot attach to the container.
    pub fn initialize(
        backend: Arc<dyn MapBackend>,
        container: &str,
        on_click: Option<ClickHandler>,
    ) -> Result<Self, MapError> {
        Self::initialize_with(backend, container, &MapConfig::default(), on_click)
    }

    /// Create a map on `container` using an explicit view and tile source.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] if the backend cannot attach to the container.
    pub fn initialize_with(
        backend: Arc<dyn MapBackend>,
        container: &str,
        config: &MapConfig,
        on_click: Option<ClickHandler>,
    ) -> Result<Self, MapError> {
        let map = backend.create_map(container)?;
        backend.set_view(map, config.center, config.zoom);
        backend.add_tile_layer(map, &config.tiles);
        if let Some(handler) = on_click {
            backend.set_click_handler(map, handler);
        }
        info!(container, map = map.0, zoom = config.zoom, "map initialized");
        Ok(Self { backend, map })
    }

    #[must_use]
    pub fn map_id(&self) -> MapId {
        self.map
    }

    /// Draw an in-progress boundary. Fewer than two points draw nothing.
    pub fn render_draft(&self, points: &[GeoPoint], color: &str) -> Option<RenderedShape> {
        if points.len() < 2 {
            return None;
        }
        let ring = closed_ring(points);
        let fill_style = PathStyle {
            stroke: None,
            fill: Some(Fill { color: fill_tint(color).to_owned(), opacity: DRAFT_FILL_OPACITY }),
            interactive: false,
        };
        let outline_style = PathStyle {
            stroke: Some(Stroke {
                color: stroke_color(color),
                weight: DRAFT_STROKE_WEIGHT,
                dash_array: Some(DRAFT_DASH_ARRAY.to_owned()),
            }),
            fill: None,
            interactive: false,
        };
        // Fill first so the outline sits on top.
        let fill = self.backend.add_polygon(self.map, &ring, &fill_style);
        let outline = self.backend.add_polyline(self.map, &ring, &outline_style);
        Some(RenderedShape { layers: vec![fill, outline] })
    }

    /// Draw a registered plot with its label tooltip.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::EmptyShape`] when `points` is empty. One or two
    /// points produce a degenerate but valid shape.
    pub fn render_committed_plot(&self, points: &[GeoPoint], id: &str, name: &str) -> Result<RenderedShape, MapError> {
        if points.is_empty() {
            return Err(MapError::EmptyShape);
        }
        let style = PathStyle {
            stroke: Some(Stroke {
                color: COMMITTED_STROKE.to_owned(),
                weight: COMMITTED_STROKE_WEIGHT,
                dash_array: None,
            }),
            fill: Some(Fill { color: COMMITTED_FILL.to_owned(), opacity: COMMITTED_FILL_OPACITY }),
            interactive: true,
        };
        let layer = self.backend.add_polygon(self.map, points, &style);
        self.backend.bind_tooltip(
            layer,
            &Tooltip {
                text: plot_label(name, id),
                permanent: true,
                class_name: Some(TOOLTIP_CLASS.to_owned()),
            },
        );
        Ok(RenderedShape { layers: vec![layer] })
    }

    /// Take every layer of `shape` off the map.
    pub fn remove(&self, shape: RenderedShape) {
        for layer in shape.layers {
            self.backend.remove_layer(layer);
        }
    }
}
