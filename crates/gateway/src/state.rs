use std::sync::Arc;

use lm_domain::config::Config;
use lm_providers::RequestCoordinator;
use sha2::{Digest, Sha256};

/// Shared application state passed to all API handlers.
///
/// Built once at startup and read-only afterwards; cloning only bumps
/// reference counts.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub coordinator: Arc<RequestCoordinator>,
    /// SHA-256 digest of the service API key (read once at startup).
    pub api_key_hash: Arc<[u8]>,
}

impl AppState {
    pub fn new(config: Arc<Config>, coordinator: Arc<RequestCoordinator>, api_key: &str) -> Self {
        Self {
            config,
            coordinator,
            api_key_hash: Arc::from(Sha256::digest(api_key.as_bytes()).as_slice()),
        }
    }

    /// `/{api_version}` prefix of the versioned routes.
    pub fn api_prefix(&self) -> String {
        format!("/{}", self.config.server.api_version)
    }
}
