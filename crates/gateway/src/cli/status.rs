use lm_domain::config::Config;
use lm_providers::RequestCoordinator;

/// Build the registry from config, probe every provider and print the
/// status map. Returns `false` when any provider is unavailable.
pub async fn run(config: &Config) -> anyhow::Result<bool> {
    let coordinator = RequestCoordinator::from_config(&config.llm);
    let status = coordinator.provider_status().await;

    println!("{}", serde_json::to_string_pretty(&status)?);

    Ok(!status.is_empty() && status.values().all(|s| s.available))
}
