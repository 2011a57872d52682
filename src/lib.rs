// src/lib.rs

//! API key pool manager for LLM benchmark harnesses.
//!
//! Hands out provider credentials to concurrent callers, tracks per-key
//! health, cools down or revokes failing keys, keeps a run on one key, and
//! persists health across restarts.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod key_manager;
pub mod pool;
pub mod storage;
pub mod utils;

// Re-exports of the main types
pub use config::KeyRotationConfig;
pub use core::{ClassifierChain, CooldownPolicy, FailureClassifier, FailureKind};
pub use error::{AppError, Result};
pub use key_manager::{KeyManager, KeyManagerTrait, SelectedKey};
pub use pool::{KeyCategory, KeyPool};
pub use storage::{HealthSnapshot, KeyId, KeyStatus};
