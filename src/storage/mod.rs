// src/storage/mod.rs

pub mod json_file;
pub mod key_state;
pub mod memory;
pub mod traits;

pub use json_file::JsonFileStore;
pub use key_state::{HealthSnapshot, KeyHealth, KeyId, KeyRecord, KeyStatus};
pub use memory::InMemoryStore;
pub use traits::SnapshotStore;
