// src/config/app.rs

use crate::core::health::CooldownPolicy;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// One key category and where its comma-separated pool comes from.
#[derive(Deserialize, Clone, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
pub struct CategoryConfig {
    #[validate(length(min = 1))]
    pub name: String,
    /// Environment variable holding the pool. Defaults to `<NAME>_KEYS`.
    #[serde(default)]
    pub env_var: Option<String>,
    /// Inline pool, used when the environment variable is unset.
    #[serde(default)]
    pub keys: Option<String>,
}

impl CategoryConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            env_var: None,
            keys: None,
        }
    }

    pub fn with_keys(mut self, keys: impl Into<String>) -> Self {
        self.keys = Some(keys.into());
        self
    }

    pub fn env_var_name(&self) -> String {
        self.env_var
            .clone()
            .unwrap_or_else(|| format!("{}_KEYS", self.name))
    }
}

// The pool string is secret material; never print it.
impl fmt::Debug for CategoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryConfig")
            .field("name", &self.name)
            .field("env_var", &self.env_var_name())
            .field("keys", &self.keys.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
pub struct CooldownConfig {
    #[serde(default = "default_base_cooldown")]
    #[validate(range(min = 1))]
    pub base_secs: u64,
    #[serde(default = "default_max_cooldown")]
    #[validate(range(min = 1))]
    pub max_secs: u64,
    #[serde(default = "default_generic_cooldown")]
    #[validate(range(min = 1))]
    pub generic_secs: u64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            base_secs: default_base_cooldown(),
            max_secs: default_max_cooldown(),
            generic_secs: default_generic_cooldown(),
        }
    }
}

impl CooldownConfig {
    pub fn policy(&self) -> CooldownPolicy {
        CooldownPolicy {
            base: Duration::from_secs(self.base_secs),
            max: Duration::from_secs(self.max_secs),
            generic: Duration::from_secs(self.generic_secs),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
pub struct KeyRotationConfig {
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    #[serde(default)]
    #[validate(nested)]
    pub cooldown: CooldownConfig,
    #[serde(default)]
    #[validate(nested)]
    pub categories: Vec<CategoryConfig>,
}

impl Default for KeyRotationConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            cooldown: CooldownConfig::default(),
            categories: Vec::new(),
        }
    }
}

impl KeyRotationConfig {
    pub fn category(&self, name: &str) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| c.name == name)
    }
}

// Default value functions
fn default_state_file() -> PathBuf {
    PathBuf::from(".key_health.json")
}

fn default_base_cooldown() -> u64 {
    5
}

fn default_max_cooldown() -> u64 {
    300
}

fn default_generic_cooldown() -> u64 {
    5
}
