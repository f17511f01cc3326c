//! Plot registry routes.

#[cfg(test)]
#[path = "plots_test.rs"]
mod plots_test;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Json, Response};
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::draft::MIN_COMMIT_POINTS;
use crate::geo::{GeoPoint, Plot};

use super::RegistryState;

/// Fields the server owns or reads explicitly; everything else is metadata.
const RESERVED_FIELDS: [&str; 7] = ["id", "name", "plot_name", "points", "status", "ownerRef", "owner_phone"];
const INITIAL_PLOT_STATUS: &str = "pending";

// =============================================================================
// ERRORS
// =============================================================================

/// JSON error response. Carries both `error` and `message` so list and save
/// clients find the text under the field they read.
#[derive(Debug, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    fn unauthorized() -> Self {
        Self { status: StatusCode::UNAUTHORIZED, message: "unauthorized".to_owned() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message, "message": self.message }))).into_response()
    }
}

fn authorize(state: &RegistryState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.token.as_deref() else {
        return Ok(());
    };
    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if presented == Some(expected) { Ok(()) } else { Err(ApiError::unauthorized()) }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// A registration body that passed validation.
#[derive(Debug, PartialEq)]
pub(crate) struct ValidDraft {
    pub(crate) name: String,
    pub(crate) points: Vec<GeoPoint>,
    pub(crate) owner_ref: Option<String>,
    pub(crate) metadata: Map<String, Value>,
}

pub(crate) fn validate_draft(body: Value) -> Result<ValidDraft, ApiError> {
    let Value::Object(mut fields) = body else {
        return Err(ApiError::bad_request("body must be a JSON object"));
    };

    let name = non_blank_str(&fields, "name")
        .or_else(|| non_blank_str(&fields, "plot_name"))
        .ok_or_else(|| ApiError::bad_request("name required"))?;

    let raw_points = fields
        .get("points")
        .cloned()
        .ok_or_else(|| ApiError::bad_request("points required"))?;
    let points: Vec<GeoPoint> =
        serde_json::from_value(raw_points).map_err(|_| ApiError::bad_request("invalid points"))?;
    if points.len() < MIN_COMMIT_POINTS {
        return Err(ApiError::bad_request(format!("at least {MIN_COMMIT_POINTS} points required")));
    }

    let owner_ref = non_blank_str(&fields, "ownerRef").or_else(|| non_blank_str(&fields, "owner_phone"));
    // Both owner keys go, or the stored plot would carry `ownerRef` twice.
    for key in RESERVED_FIELDS {
        fields.remove(key);
    }

    Ok(ValidDraft { name, points, owner_ref, metadata: fields })
}

fn non_blank_str(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Registry ids are sequential: `PL0001`, `PL0002`, ...
pub(crate) fn next_plot_id(existing: usize) -> String {
    format!("PL{:04}", existing + 1)
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /health`
pub async fn health(State(state): State<RegistryState>) -> Json<Value> {
    let plots = state.plots.read().await.len();
    Json(json!({ "status": "healthy", "plots": plots }))
}

/// `GET /api/plots`: every registered plot, oldest first.
pub async fn list_plots(
    State(state): State<RegistryState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Plot>>, ApiError> {
    authorize(&state, &headers)?;
    Ok(Json(state.plots.read().await.clone()))
}

/// `POST /api/plots`: register a plot.
pub async fn register_plot(
    State(state): State<RegistryState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Plot>), ApiError> {
    authorize(&state, &headers)?;
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let draft = validate_draft(body).inspect_err(|e| warn!(error = %e.message, "plot registration rejected"))?;

    let mut attributes = draft.metadata;
    attributes.insert("status".to_owned(), Value::String(INITIAL_PLOT_STATUS.to_owned()));

    let mut plots = state.plots.write().await;
    let plot = Plot {
        id: next_plot_id(plots.len()),
        name: draft.name,
        points: draft.points,
        owner_ref: draft.owner_ref,
        attributes,
    };
    plots.push(plot.clone());
    info!(id = %plot.id, name = %plot.name, points = plot.points.len(), "plot stored");
    Ok((StatusCode::CREATED, Json(plot)))
}
