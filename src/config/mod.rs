// src/config/mod.rs

pub mod app;
pub mod loader;
pub mod validation;

pub use app::{CategoryConfig, CooldownConfig, KeyRotationConfig};
pub use loader::{load_config, load_config_with_env, parse_key_pool};
pub use validation::ConfigValidator;
