use lm_domain::config::{Config, ConfigError, ConfigSeverity};

/// Number of blocking issues in a validation report.
pub fn error_count(issues: &[ConfigError]) -> usize {
    issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count()
}

/// Parse and validate the config, printing any issues.
///
/// Returns `false` when errors are found so the caller can exit with 1.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();

    if issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    let errors = error_count(&issues);
    for issue in &issues {
        println!("{issue}");
    }
    println!(
        "\n{} error(s), {} warning(s) in {config_path}",
        errors,
        issues.len() - errors,
    );

    errors == 0
}

/// Render the resolved config (with all defaults filled in) as TOML.
/// Provider keys set directly in the file are never serialized.
///
/// `overrides` names the environment variables that shaped the result; they
/// are listed in a leading comment so the output stays valid TOML.
pub fn render(config: &Config, overrides: &[&str]) -> anyhow::Result<String> {
    let body = toml::to_string_pretty(config)?;
    if overrides.is_empty() {
        return Ok(body);
    }
    Ok(format!("# env overrides: {}

{body}", overrides.join(", ")))
}
