pub mod config;
pub mod status;

use std::path::Path;

use clap::{Parser, Subcommand};
use lm_domain::config::Config;

/// leadmsg: lead message generation over hosted LLM providers.
#[derive(Debug, Parser)]
#[command(name = "leadmsg", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Probe every configured provider and print the status map as JSON.
    Status,
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "LEADMSG_CONFIG";

/// A configuration ready to use, plus what happened while loading it.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    pub path: String,
    /// Environment overrides that were set but could not be applied.
    pub rejected_overrides: Vec<String>,
}

/// Load `.env`, then the TOML file named by `LEADMSG_CONFIG` (or
/// `config.toml`), then apply environment overrides.
///
/// Shared by every subcommand so the logic lives in one place. Runs before
/// tracing is initialised, so problems are returned rather than logged.
pub fn load_config() -> anyhow::Result<LoadedConfig> {
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(e) if e.not_found() => {}
        Err(e) => anyhow::bail!("loading .env: {e}"),
    }

    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".into());
    let mut config = load_config_file(Path::new(&path))?;
    let rejected_overrides = config.apply_env_overrides();

    Ok(LoadedConfig {
        config,
        path,
        rejected_overrides,
    })
}

/// Parse `path`; a missing file yields the defaults.
pub fn load_config_file(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {}: {e}", path.display()))
}
