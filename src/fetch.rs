//! Policy source seam. The HTTP transport lives in the host; the engine only
//! sees "a policy, or nothing".

use crate::policy::{decode_policy, GatePolicy};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Fetches the latest policy for the running app version.
///
/// Returns `None` on any failure (network, timeout, unreadable payload).
/// Implementations own their own timeout and retry policy and must not panic.
pub trait PolicyFetcher {
    fn fetch_policy(&mut self, app_version: &str) -> Option<GatePolicy>;
}

impl<F> PolicyFetcher for F
where
    F: FnMut(&str) -> Option<GatePolicy>,
{
    fn fetch_policy(&mut self, app_version: &str) -> Option<GatePolicy> {
        self(app_version)
    }
}

/// Fetcher that always fails; every evaluation falls back to the cache.
#[derive(Debug, Clone, Default)]
pub struct OfflineFetcher;

impl PolicyFetcher for OfflineFetcher {
    fn fetch_policy(&mut self, _app_version: &str) -> Option<GatePolicy> {
        debug!("offline fetcher: no policy source");
        None
    }
}

/// Reads a policy payload from a local JSON file, standing in for the
/// network transport (CLI, fixtures). A missing or unreadable file counts as
/// a fetch failure; malformed JSON inside a readable file still decodes.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    path: PathBuf,
}

impl FileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileFetcher { path: path.into() }
    }
}

impl PolicyFetcher for FileFetcher {
    fn fetch_policy(&mut self, app_version: &str) -> Option<GatePolicy> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                debug!(path = %self.path.display(), app_version, "fetched policy payload");
                Some(decode_policy(&raw))
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "policy fetch failed");
                None
            }
        }
    }
}
