// src/utils/mod.rs

pub mod clock;
pub mod crypto;

pub use clock::{Clock, ManualClock, SystemClock};
pub use crypto::preview_secret;
