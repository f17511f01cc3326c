//! Registry client configuration parsed from environment variables.

use std::path::PathBuf;

use super::RegistryError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for RegistryTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// API root without a trailing slash, e.g. `http://localhost:5000/api`.
    pub base_url: String,
    /// File holding the persisted bearer token, if any.
    pub token_file: Option<PathBuf>,
    pub timeouts: RegistryTimeouts,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_API_BASE_URL.to_owned(), token_file: None, timeouts: RegistryTimeouts::default() }
    }
}

impl RegistryConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `PLOT_API_BASE_URL`: default `http://localhost:5000/api`
    /// - `PLOT_API_TOKEN_FILE`: path of the persisted token
    /// - `PLOT_API_REQUEST_TIMEOUT_SECS`: default 30
    /// - `PLOT_API_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Config`] if the base URL is not http(s).
    pub fn from_env() -> Result<Self, RegistryError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Config`] if the base URL is not http(s).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RegistryError> {
        let base_url = lookup("PLOT_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(RegistryError::Config(format!("PLOT_API_BASE_URL must be http(s): {base_url}")));
        }
        let token_file = lookup("PLOT_API_TOKEN_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let timeouts = RegistryTimeouts {
            request_secs: parse_or(lookup("PLOT_API_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_or(lookup("PLOT_API_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        Ok(Self { base_url, token_file, timeouts })
    }
}

fn parse_or(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.parse::<u64>().ok()).unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
