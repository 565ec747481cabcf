use rand::seq::IndexedRandom;
use std::env;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("no API credentials available")]
    NoCredentialsAvailable,
}

/// Immutable pool of provider API keys, populated once at startup.
///
/// Each external call draws one key uniformly at random, spreading request
/// volume across quota buckets without sticky affinity.
#[derive(Debug, Clone)]
pub struct CredentialPool {
    keys: Vec<String>,
}

impl CredentialPool {
    pub fn from_env() -> Self {
        let raw = env::var("GEMINI_API_KEYS")
            .or_else(|_| env::var("GEMINI_API_KEY"))
            .unwrap_or_default();
        let pool = Self::from_raw(&raw);
        if pool.is_empty() {
            warn!(
                target = "stylist.credentials",
                "GEMINI_API_KEYS is empty; generation calls will fail until it is configured"
            );
        } else {
            info!(
                target = "stylist.credentials",
                key_count = pool.len(),
                "loaded Gemini credentials from env"
            );
        }
        pool
    }

    pub fn from_raw(raw: &str) -> Self {
        let keys = raw
            .split([' ', '\n', '\t', ','])
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect();
        Self { keys }
    }

    pub fn select(&self) -> Result<&str, CredentialError> {
        self.keys
            .choose(&mut rand::rng())
            .map(String::as_str)
            .ok_or(CredentialError::NoCredentialsAvailable)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
