// src/config/loader.rs

use crate::config::{CategoryConfig, ConfigValidator, KeyRotationConfig};
use crate::error::{AppError, Result};
use secrecy::Secret;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const ENV_STATE_FILE: &str = "KEY_ROTATION_STATE_FILE";
pub const ENV_BASE_COOLDOWN: &str = "KEY_ROTATION_BASE_COOLDOWN_SECS";
pub const ENV_MAX_COOLDOWN: &str = "KEY_ROTATION_MAX_COOLDOWN_SECS";
pub const ENV_GENERIC_COOLDOWN: &str = "KEY_ROTATION_GENERIC_COOLDOWN_SECS";
pub const ENV_CATEGORIES: &str = "KEY_ROTATION_CATEGORIES";

/// Load configuration from file (optional) and the process environment.
pub fn load_config(config_path: &Path) -> Result<KeyRotationConfig> {
    load_config_with_env(config_path, |name| std::env::var(name).ok())
}

/// Same as [`load_config`], with an explicit environment lookup.
pub fn load_config_with_env<F>(config_path: &Path, env: F) -> Result<KeyRotationConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = if config_path.exists() {
        info!("Loading configuration from file: {}", config_path.display());
        load_from_file(config_path)?
    } else {
        info!(
            "Configuration file '{}' not found, using defaults",
            config_path.display()
        );
        KeyRotationConfig::default()
    };

    override_with_env(&mut config, &env);
    resolve_key_pools(&mut config, &env);

    ConfigValidator::validate(&config)?;

    debug!(
        categories = config.categories.len(),
        "Configuration loaded and validated successfully"
    );
    Ok(config)
}

fn load_from_file(config_path: &Path) -> Result<KeyRotationConfig> {
    let content = std::fs::read_to_string(config_path).map_err(|_| AppError::ConfigNotFound {
        path: config_path.display().to_string(),
    })?;

    if content.trim().is_empty() {
        warn!("Config file '{}' is empty. Using defaults.", config_path.display());
        return Ok(KeyRotationConfig::default());
    }

    serde_yaml::from_str(&content).map_err(|e| AppError::ConfigParse {
        message: format!("Failed to parse config file: {e}"),
        line: e.location().map(|loc| loc.line()),
    })
}

fn override_with_env<F>(config: &mut KeyRotationConfig, env: &F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = env(ENV_STATE_FILE).filter(|p| !p.trim().is_empty()) {
        info!("Overriding state file from environment: {}", path);
        config.state_file = PathBuf::from(path.trim());
    }

    let cooldowns = [
        (ENV_BASE_COOLDOWN, &mut config.cooldown.base_secs),
        (ENV_MAX_COOLDOWN, &mut config.cooldown.max_secs),
        (ENV_GENERIC_COOLDOWN, &mut config.cooldown.generic_secs),
    ];
    for (var, slot) in cooldowns {
        if let Some(raw) = env(var) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => {
                    info!("Overriding {} from environment: {}", var, secs);
                    *slot = secs;
                }
                Err(_) => warn!("Invalid {} environment variable: {}", var, raw),
            }
        }
    }

    if let Some(names) = env(ENV_CATEGORIES) {
        for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if config.category(name).is_none() {
                debug!(category = name, "Adding category declared in environment");
                config.categories.push(CategoryConfig::new(name));
            }
        }
    }
}

/// Environment pool strings take precedence over inline `keys`.
fn resolve_key_pools<F>(config: &mut KeyRotationConfig, env: &F)
where
    F: Fn(&str) -> Option<String>,
{
    for category in &mut config.categories {
        let var = category.env_var_name();
        if let Some(raw) = env(&var) {
            category.keys = Some(raw);
        } else if category.keys.is_none() {
            warn!(
                category = %category.name,
                env_var = %var,
                "No key pool configured for category; selections will fail"
            );
        }
    }
}

/// Split a comma-separated pool into secrets, dropping blank entries.
pub fn parse_key_pool(raw: &str) -> Vec<Secret<String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| Secret::new(k.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn exposed(raw: &str) -> Vec<String> {
        parse_key_pool(raw)
            .iter()
            .map(|s| s.expose_secret().clone())
            .collect()
    }

    #[test]
    fn parse_drops_blank_entries() {
        assert_eq!(exposed("a, b,,  ,c,"), vec!["a", "b", "c"]);
    }

    #[test]
    fn parse_empty_pool() {
        assert!(exposed("").is_empty());
        assert!(exposed(" , ,").is_empty());
    }
}
