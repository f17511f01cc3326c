//! The map-library seam.
//!
//! `MapBackend` is the handful of primitives the surface adapter needs from a
//! slippy-map widget: create a map on a container, set its view, add tile and
//! vector layers, bind tooltips, remove layers, and deliver clicks. A real
//! widget binding and the in-memory [`super::scene::SceneBackend`] both
//! implement it; the adapter never knows which one it holds.

use std::sync::Arc;

use crate::geo::GeoPoint;

use super::MapError;

/// Callback receiving the coordinate of every map click.
pub type ClickHandler = Arc<dyn Fn(GeoPoint) + Send + Sync>;

/// Identifies one map instance created by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapId(pub u64);

/// Identifies one layer added to a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

/// Raster background imagery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: String,
    pub weight: f64,
    /// SVG-style dash pattern; `None` draws a solid line.
    pub dash_array: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub color: String,
    pub opacity: f64,
}

/// Styling for polygon and polyline layers.
#[derive(Debug, Clone, PartialEq)]
pub struct PathStyle {
    pub stroke: Option<Stroke>,
    pub fill: Option<Fill>,
    /// Whether the layer captures pointer events.
    pub interactive: bool,
}

/// Label anchored at the center of its layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tooltip {
    pub text: String,
    /// Always shown rather than on hover.
    pub permanent: bool,
    pub class_name: Option<String>,
}

/// Primitives of a slippy-map widget.
///
/// Methods take `&self`; implementations own their interior mutability so a
/// backend can be shared between the surface and a click handler.
pub trait MapBackend: Send + Sync {
    /// Create a map bound to `container`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] if the container does not exist or already hosts a map.
    fn create_map(&self, container: &str) -> Result<MapId, MapError>;

    fn set_view(&self, map: MapId, center: GeoPoint, zoom: u8);

    fn add_tile_layer(&self, map: MapId, tiles: &TileLayer) -> LayerId;

    /// Add a polygon. Backends close the ring implicitly when drawing.
    fn add_polygon(&self, map: MapId, ring: &[GeoPoint], style: &PathStyle) -> LayerId;

    fn add_polyline(&self, map: MapId, path: &[GeoPoint], style: &PathStyle) -> LayerId;

    fn bind_tooltip(&self, layer: LayerId, tooltip: &Tooltip);

    /// Remove a layer. Unknown ids are ignored.
    fn remove_layer(&self, layer: LayerId);

    /// Install the click handler for `map`, replacing any previous one.
    fn set_click_handler(&self, map: MapId, handler: ClickHandler);
}
