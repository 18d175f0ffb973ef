use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Server
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The API key the service falls back to when `api_key_env` is unset.
/// Fine for local development, rejected by validation in production.
pub const DEV_API_KEY: &str = "dev_api_key_change_this";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_8000")]
    pub port: u16,
    #[serde(default = "d_host")]
    pub host: String,
    /// Deployment environment name reported by `/health`
    /// (`development`, `staging`, `production`).
    #[serde(default = "d_environment")]
    pub environment: String,
    /// Path prefix of the versioned API (`/v1/...`).
    #[serde(default = "d_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Environment variable holding the `X-API-Key` value that protected
    /// endpoints require.
    #[serde(default = "d_api_key_env")]
    pub api_key_env: String,
    /// Global in-flight request cap.
    #[serde(default = "d_256")]
    pub max_concurrent_requests: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: d_host(),
            environment: d_environment(),
            api_version: d_api_version(),
            cors: CorsConfig::default(),
            api_key_env: d_api_key_env(),
            max_concurrent_requests: 256,
        }
    }
}

impl ServerConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Resolve the service API key from the environment, falling back to
    /// [`DEV_API_KEY`]. The flag reports whether the fallback was used.
    pub fn resolve_api_key(&self) -> (String, bool) {
        match std::env::var(&self.api_key_env) {
            Ok(v) if !v.is_empty() => (v, false),
            _ => (DEV_API_KEY.to_string(), true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed for CORS. Entries may end in `:*` to allow any port.
    #[serde(default = "d_cors_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: d_cors_origins(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_8000() -> u16 {
    8000
}
fn d_host() -> String {
    "0.0.0.0".into()
}
fn d_environment() -> String {
    "development".into()
}
fn d_api_version() -> String {
    "v1".into()
}
fn d_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".into()]
}
fn d_api_key_env() -> String {
    "API_KEY".into()
}
fn d_256() -> usize {
    256
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
