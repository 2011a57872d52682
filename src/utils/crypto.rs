// src/utils/crypto.rs

use secrecy::{ExposeSecret, Secret};

/// Redacted form of a credential, safe for logs: `abcd...wxyz`.
/// Short values are fully masked.
pub fn preview_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}

pub fn preview_key(key: &Secret<String>) -> String {
    preview_secret(key.expose_secret())
}

/// Copies a secret without it ever passing through a loggable type.
pub fn duplicate_secret(key: &Secret<String>) -> Secret<String> {
    Secret::new(key.expose_secret().clone())
}
