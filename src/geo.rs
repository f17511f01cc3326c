//! Geographic data model shared by the map, buffer, registry and server.
//!
//! Points are plain latitude/longitude pairs in the map library's native
//! plane; no projection happens anywhere in this crate.

#[cfg(test)]
#[path = "geo_test.rs"]
mod geo_test;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single map coordinate produced by a click.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Close a ring by repeating the first point at the end.
///
/// Returns an empty vector for empty input.
#[must_use]
pub fn closed_ring(points: &[GeoPoint]) -> Vec<GeoPoint> {
    let mut ring = points.to_vec();
    if let Some(first) = points.first() {
        ring.push(*first);
    }
    ring
}

// =============================================================================
// PLOT
// =============================================================================

/// A registered plot as returned by the registry. Read-only on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    pub id: String,
    #[serde(alias = "plot_name")]
    pub name: String,
    #[serde(default)]
    pub points: Vec<GeoPoint>,
    #[serde(rename = "ownerRef", alias = "owner_phone", default, skip_serializing_if = "Option::is_none")]
    pub owner_ref: Option<String>,
    /// Server-side fields this client does not interpret (`status`, timestamps).
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Plot {
    /// Tooltip label shown on a committed plot.
    #[must_use]
    pub fn label(&self) -> String {
        plot_label(&self.name, &self.id)
    }
}

#[must_use]
pub fn plot_label(name: &str, id: &str) -> String {
    format!("{name} (ID: {id})")
}

/// Body of a registration request: name, ordered boundary, free-form metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotDraft {
    pub name: String,
    pub points: Vec<GeoPoint>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// Keys written by `PlotDraft` itself; metadata may not shadow them.
pub const DRAFT_FIELDS: [&str; 3] = ["name", "plot_name", "points"];

impl PlotDraft {
    #[must_use]
    pub fn new(name: impl Into<String>, points: Vec<GeoPoint>) -> Self {
        Self { name: name.into(), points, metadata: Map::new() }
    }

    /// Draft with extra fields. Entries named like a draft field are dropped
    /// so the body never carries `name` or `points` twice.
    #[must_use]
    pub fn with_metadata(name: impl Into<String>, points: Vec<GeoPoint>, mut metadata: Map<String, Value>) -> Self {
        metadata.retain(|key, _| !DRAFT_FIELDS.contains(&key.as_str()));
        Self { name: name.into(), points, metadata }
    }
}

/// The signed-in user, as far as the map UI cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}
