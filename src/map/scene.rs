//! In-memory map backend.
//!
//! Records every map, layer and tooltip instead of drawing pixels, and lets
//! callers inject clicks. Used for headless sessions and throughout the tests.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use crate::geo::GeoPoint;

use super::backend::{ClickHandler, LayerId, MapBackend, MapId, PathStyle, TileLayer, Tooltip};
use super::MapError;

/// What a recorded layer draws.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    Tiles(TileLayer),
    Polygon(PathStyle),
    Polyline(PathStyle),
}

/// One recorded layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneLayer {
    pub map: MapId,
    pub kind: LayerKind,
    pub path: Vec<GeoPoint>,
    pub tooltip: Option<Tooltip>,
}

impl SceneLayer {
    #[must_use]
    pub fn is_vector(&self) -> bool {
        !matches!(self.kind, LayerKind::Tiles(_))
    }
}

struct SceneMap {
    container: String,
    view: Option<(GeoPoint, u8)>,
    on_click: Option<ClickHandler>,
}

#[derive(Default)]
struct SceneInner {
    containers: HashSet<String>,
    maps: HashMap<MapId, SceneMap>,
    layers: BTreeMap<LayerId, SceneLayer>,
    next_id: u64,
    /// Draw and remove calls, for asserting that nothing touched the map.
    calls: usize,
}

impl SceneInner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn add_layer(&mut self, layer: SceneLayer) -> LayerId {
        self.calls += 1;
        let id = LayerId(self.next_id());
        self.layers.insert(id, layer);
        id
    }
}

/// A [`MapBackend`] that keeps the scene in memory.
#[derive(Default)]
pub struct SceneBackend {
    inner: Mutex<SceneInner>,
}

impl SceneBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with one container already available.
    #[must_use]
    pub fn with_container(id: &str) -> Self {
        let backend = Self::new();
        backend.add_container(id);
        backend
    }

    pub fn add_container(&self, id: &str) {
        self.lock().containers.insert(id.to_owned());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SceneInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver a click to `map`. Returns `false` if no handler is installed.
    pub fn click(&self, map: MapId, point: GeoPoint) -> bool {
        // Release the lock before calling out: handlers draw on this backend.
        let handler = self.lock().maps.get(&map).and_then(|m| m.on_click.clone());
        match handler {
            Some(handler) => {
                handler(point);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn view(&self, map: MapId) -> Option<(GeoPoint, u8)> {
        self.lock().maps.get(&map).and_then(|m| m.view)
    }

    #[must_use]
    pub fn container_of(&self, map: MapId) -> Option<String> {
        self.lock().maps.get(&map).map(|m| m.container.clone())
    }

    #[must_use]
    pub fn layer(&self, id: LayerId) -> Option<SceneLayer> {
        self.lock().layers.get(&id).cloned()
    }

    /// Every layer on `map`, oldest first.
    #[must_use]
    pub fn layers(&self, map: MapId) -> Vec<(LayerId, SceneLayer)> {
        self.lock()
            .layers
            .iter()
            .filter(|(_, layer)| layer.map == map)
            .map(|(id, layer)| (*id, layer.clone()))
            .collect()
    }

    /// Polygon and polyline layers on `map`, excluding tiles.
    #[must_use]
    pub fn vector_layer_count(&self, map: MapId) -> usize {
        self.lock()
            .layers
            .values()
            .filter(|layer| layer.map == map && layer.is_vector())
            .count()
    }

    /// Number of layer add/remove/tooltip calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock().calls
    }
}

impl MapBackend for SceneBackend {
    fn create_map(&self, container: &str) -> Result<MapId, MapError> {
        let mut inner = self.lock();
        if !inner.containers.contains(container) {
            return Err(MapError::ContainerNotFound(container.to_owned()));
        }
        if inner.maps.values().any(|m| m.container == container) {
            return Err(MapError::AlreadyInitialized(container.to_owned()));
        }
        let id = MapId(inner.next_id());
        inner.maps.insert(id, SceneMap { container: container.to_owned(), view: None, on_click: None });
        Ok(id)
    }

    fn set_view(&self, map: MapId, center: GeoPoint, zoom: u8) {
        if let Some(m) = self.lock().maps.get_mut(&map) {
            m.view = Some((center, zoom));
        }
    }

    fn add_tile_layer(&self, map: MapId, tiles: &TileLayer) -> LayerId {
        self.lock().add_layer(SceneLayer {
            map,
            kind: LayerKind::Tiles(tiles.clone()),
            path: Vec::new(),
            tooltip: None,
        })
    }

    fn add_polygon(&self, map: MapId, ring: &[GeoPoint], style: &PathStyle) -> LayerId {
        self.lock().add_layer(SceneLayer {
            map,
            kind: LayerKind::Polygon(style.clone()),
            path: ring.to_vec(),
            tooltip: None,
        })
    }

    fn add_polyline(&self, map: MapId, path: &[GeoPoint], style: &PathStyle) -> LayerId {
        self.lock().add_layer(SceneLayer {
            map,
            kind: LayerKind::Polyline(style.clone()),
            path: path.to_vec(),
            tooltip: None,
        })
    }

    fn bind_tooltip(&self, layer: LayerId, tooltip: &Tooltip) {
        let mut inner = self.lock();
        inner.calls += 1;
        if let Some(l) = inner.layers.get_mut(&layer) {
            l.tooltip = Some(tooltip.clone());
        }
    }

    fn remove_layer(&self, layer: LayerId) {
        let mut inner = self.lock();
        inner.calls += 1;
        inner.layers.remove(&layer);
    }

    fn set_click_handler(&self, map: MapId, handler: ClickHandler) {
        if let Some(m) = self.lock().maps.get_mut(&map) {
            m.on_click = Some(handler);
        }
    }
}
