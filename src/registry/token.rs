//! Bearer token sources.
//!
//! The token lives outside this crate (a login flow writes it somewhere).
//! Absence is never an error here: the request simply goes out without an
//! `Authorization` header and the server decides.

#[cfg(test)]
#[path = "token_test.rs"]
mod token_test;

use std::path::PathBuf;

use tracing::warn;

/// Supplies the bearer token for outgoing registry requests.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Never authenticates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

impl TokenSource for NoToken {
    fn token(&self) -> Option<String> {
        None
    }
}

/// A fixed token, e.g. from a CLI flag.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        non_blank(&self.0)
    }
}

/// Token persisted in a file, re-read on every request so a new login is
/// picked up without rebuilding the client.
///
/// The read is a synchronous `std::fs` call made from the async request
/// path. It is only meant for a small local token file; a slow or remote
/// store should implement [`TokenSource`] with its own cache.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenSource for FileTokenStore {
    fn token(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => non_blank(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "token file unreadable; sending unauthenticated");
                None
            }
        }
    }
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
