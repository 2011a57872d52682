// src/config/validation.rs

use crate::config::KeyRotationConfig;
use crate::error::{AppError, Result};
use std::collections::HashSet;
use tracing::{debug, warn};
use validator::Validate;

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &KeyRotationConfig) -> Result<()> {
        debug!("Starting configuration validation");

        config.validate().map_err(|e| {
            warn!("Field validation failed: {}", e);
            AppError::from(e)
        })?;

        if let Err(e) = Self::validate_categories(config) {
            warn!("Category validation failed: {}", e);
            return Err(e);
        }

        if let Err(e) = Self::validate_cooldowns(config) {
            warn!("Cooldown validation failed: {}", e);
            return Err(e);
        }

        if config.state_file.as_os_str().is_empty() {
            return Err(AppError::config_validation(
                "State file path cannot be empty",
                Some("state_file"),
            ));
        }

        debug!("Configuration validation completed successfully");
        Ok(())
    }

    fn validate_categories(config: &KeyRotationConfig) -> Result<()> {
        let mut names = HashSet::new();
        for category in &config.categories {
            let name = category.name.trim();
            if name.is_empty() {
                return Err(AppError::config_validation(
                    "Category name cannot be blank",
                    Some("categories.name"),
                ));
            }
            if !names.insert(name) {
                return Err(AppError::config_validation(
                    format!("Duplicate category name: {name}"),
                    Some("categories.name"),
                ));
            }
        }
        Ok(())
    }

    fn validate_cooldowns(config: &KeyRotationConfig) -> Result<()> {
        let cooldown = &config.cooldown;
        if cooldown.base_secs > cooldown.max_secs {
            return Err(AppError::config_validation(
                format!(
                    "Base cooldown ({}s) exceeds max cooldown ({}s)",
                    cooldown.base_secs, cooldown.max_secs
                ),
                Some("cooldown.base_secs"),
            ));
        }
        Ok(())
    }
}
