//! Loading configuration from files and the environment.

use crate::error::ConfigError;
use crate::gateway::GatewayConfig;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "RP_GATEWAY_CONFIG";

/// Load configuration
///
/// Reads the file named by `RP_GATEWAY_CONFIG` when set, otherwise starts
/// from the defaults, then applies environment overrides and validates.
///
/// # Errors
/// Returns error if the file cannot be read or the result is invalid
pub async fn load_config() -> Result<GatewayConfig, ConfigError> {
    let mut config = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => load_from_file(Path::new(&path)).await?,
        _ => {
            debug!("No config file set, using defaults");
            GatewayConfig::default()
        }
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Load and parse a TOML or YAML config file
///
/// # Errors
/// Returns error if the file cannot be read or parsed
pub async fn load_from_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let config = parse_config(&contents, &extension)?;

    info!(path = %path.display(), providers = config.providers.len(), "Configuration file loaded");
    Ok(config)
}

/// Parse configuration text in the given format (`toml`, `yaml` or `yml`)
///
/// # Errors
/// Returns error on syntax errors or an unknown format
pub fn parse_config(contents: &str, format: &str) -> Result<GatewayConfig, ConfigError> {
    match format {
        "toml" => Ok(toml::from_str(contents)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(contents)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

/// Apply `RP_GATEWAY_*` and `SD_SERVER_URL` overrides
///
/// # Errors
/// Returns error when an override is not a valid number
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("RP_GATEWAY_MAX_CONCURRENT") {
        config.queue.default_max_concurrent = parse_number("RP_GATEWAY_MAX_CONCURRENT", &value)?;
    }
    if let Some(value) = lookup("RP_GATEWAY_CHAT_TIMEOUT_SECS") {
        let secs: u64 = parse_number("RP_GATEWAY_CHAT_TIMEOUT_SECS", &value)?;
        config.timeouts.chat = Duration::from_secs(secs);
    }
    if let Some(value) = lookup("RP_GATEWAY_LOG_DIR") {
        config.llm_log.directory = value.into();
    }
    if let Some(value) = lookup("SD_SERVER_URL").filter(|v| !v.trim().is_empty()) {
        config.image.base_url = value;
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(key, format!("'{value}' is not a number")))
}
