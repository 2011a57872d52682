// src/core/mod.rs

pub mod classifier;
pub mod health;
pub mod key_rotation;
pub mod sticky;

pub use classifier::{
    AuthFailureClassifier, ClassifierChain, FailureClassifier, FailureKind,
    QuotaFailureClassifier, SubstringClassifier,
};
pub use health::{CooldownPolicy, Transition};
pub use key_rotation::{KeySelector, Selection};
pub use sticky::SessionBindings;
