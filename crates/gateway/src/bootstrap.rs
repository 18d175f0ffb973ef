//! Startup wiring: resolve the service API key, construct the provider
//! registry and wrap everything into [`AppState`].

use std::sync::Arc;

use lm_domain::config::Config;
use lm_providers::RequestCoordinator;

use crate::state::AppState;

/// Build the shared state from a loaded configuration.
pub fn build_app_state(config: Arc<Config>) -> AppState {
    let (api_key, dev_key) = config.server.resolve_api_key();
    if dev_key {
        tracing::warn!(
            env = %config.server.api_key_env,
            "service API key not set, using the development key"
        );
    }

    let coordinator = RequestCoordinator::from_config(&config.llm);
    tracing::info!(
        providers = ?coordinator.registry().list_available(),
        default_provider = %coordinator.registry().default_provider(),
        "provider registry ready"
    );

    if config.cache.enabled {
        tracing::warn!(
            ttl_secs = config.cache.ttl_secs,
            "response cache enabled in config but not available; ignoring"
        );
    }

    AppState::new(config, Arc::new(coordinator), &api_key)
}
