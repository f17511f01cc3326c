//! Plot registry client.
//!
//! DESIGN
//! ======
//! `PlotRegistry` is the seam the draft buffer and the drawing session talk
//! to; `RegistryClient` implements it over HTTP with `reqwest`.
//!
//! ERROR HANDLING
//! ==============
//! Every failure is logged and returned, never swallowed. Reads and writes
//! follow different server conventions: list errors carry a `message` field,
//! save errors carry an `error` field. When neither parses, a fixed fallback
//! message is used. A successful list response that is not a JSON array is
//! treated as an empty registry rather than an error.

pub mod config;
pub mod token;


use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::geo::{Plot, PlotDraft};
pub use config::RegistryConfig;
pub use token::{FileTokenStore, NoToken, StaticToken, TokenSource};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load plots";
pub const SAVE_FAILED_MESSAGE: &str = "Save failed";

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Non-2xx response. Displays as the server's message alone.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("registry request failed: {0}")]
    Transport(String),
    #[error("malformed registry response: {0}")]
    Decode(String),
    #[error("registry config error: {0}")]
    Config(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClientBuild(String),
}

impl RegistryError {
    /// HTTP status for rejected requests.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// Backend storage of registered plots.
#[async_trait::async_trait]
pub trait PlotRegistry: Send + Sync {
    /// Fetch every registered plot.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] on transport failure or a non-success response.
    async fn fetch_all(&self) -> Result<Vec<Plot>, RegistryError>;

    /// Register a new plot and return the server's canonical copy.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] on transport failure or a non-success response.
    async fn register(&self, draft: &PlotDraft) -> Result<Plot, RegistryError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

#[derive(Deserialize, Default)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

fn parse_error_body(text: &str) -> ErrorBody {
    serde_json::from_str(text).unwrap_or_default()
}

/// Error for a failed list request: `message` field or generic fallback.
fn load_error(status: u16, text: &str) -> RegistryError {
    let message = parse_error_body(text)
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| LOAD_FAILED_MESSAGE.to_owned());
    RegistryError::Rejected { status, message }
}

/// Error for a failed save request: `error` field or generic fallback.
fn save_error(status: u16, text: &str) -> RegistryError {
    let message = parse_error_body(text)
        .error
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| SAVE_FAILED_MESSAGE.to_owned());
    RegistryError::Rejected { status, message }
}

/// Decode a list body, treating anything but an array as empty.
fn normalize_plot_list(text: &str) -> Result<Vec<Plot>, RegistryError> {
    let value: Value = serde_json::from_str(text).map_err(|e| RegistryError::Decode(e.to_string()))?;
    if !value.is_array() {
        warn!(kind = json_kind(&value), "plot list response is not an array; treating as empty");
        return Ok(Vec::new());
    }
    serde_json::from_value(value).map_err(|e| RegistryError::Decode(e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl RegistryClient {
    /// Build a client for `config`, authenticating with `tokens`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(config: &RegistryConfig, tokens: Arc<dyn TokenSource>) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| RegistryError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_owned(), tokens })
    }

    /// Build a client from environment variables. A configured token file
    /// becomes the token source; otherwise requests are unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the HTTP client fails.
    pub fn from_env() -> Result<Self, RegistryError> {
        let config = RegistryConfig::from_env()?;
        let tokens: Arc<dyn TokenSource> = match &config.token_file {
            Some(path) => Arc::new(FileTokenStore::new(path)),
            None => Arc::new(NoToken),
        };
        Self::new(&config, tokens)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn plots_url(&self) -> String {
        format!("{}/plots", self.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.tokens.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(u16, bool, String), RegistryError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| RegistryError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RegistryError::Transport(e.to_string()))?;
        Ok((status.as_u16(), status.is_success(), text))
    }

    async fn fetch_all_inner(&self) -> Result<Vec<Plot>, RegistryError> {
        let (status, ok, text) = self.send(self.http.get(self.plots_url())).await?;
        if !ok {
            return Err(load_error(status, &text));
        }
        normalize_plot_list(&text)
    }

    async fn register_inner(&self, draft: &PlotDraft) -> Result<Plot, RegistryError> {
        let (status, ok, text) = self.send(self.http.post(self.plots_url()).json(draft)).await?;
        if !ok {
            return Err(save_error(status, &text));
        }
        serde_json::from_str(&text).map_err(|e| RegistryError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl PlotRegistry for RegistryClient {
    async fn fetch_all(&self) -> Result<Vec<Plot>, RegistryError> {
        match self.fetch_all_inner().await {
            Ok(plots) => {
                info!(count = plots.len(), "plots loaded");
                Ok(plots)
            }
            Err(e) => {
                error!(error = %e, status = ?e.status(), "plot list request failed");
                Err(e)
            }
        }
    }

    async fn register(&self, draft: &PlotDraft) -> Result<Plot, RegistryError> {
        match self.register_inner(draft).await {
            Ok(plot) => {
                info!(id = %plot.id, name = %plot.name, points = plot.points.len(), "plot registered");
                Ok(plot)
            }
            Err(e) => {
                error!(error = %e, status = ?e.status(), name = %draft.name, "plot registration failed");
                Err(e)
            }
        }
    }
}
