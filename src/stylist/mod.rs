pub mod analyzer;
pub mod chat;
pub mod persona;
pub mod prompts;

use crate::credentials::CredentialPool;
use std::sync::Arc;
use thiserror::Error;

/// Orchestration façade over the generative-model provider. Holds only
/// immutable shared state; every request is processed independently.
#[derive(Clone)]
pub struct Stylist {
    pub credentials: Arc<CredentialPool>,
}

impl Stylist {
    pub fn new(credentials: CredentialPool) -> Self {
        Self {
            credentials: Arc::new(credentials),
        }
    }

    pub fn from_env() -> Self {
        Self::new(CredentialPool::from_env())
    }
}

#[derive(Debug, Error)]
#[error("stage `{stage}` failed: {message}")]
pub struct StylistError {
    stage: &'static str,
    message: String,
    kind: StylistErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StylistErrorKind {
    InvalidInput,
    NoCredentials,
    AssetProcessing,
    AssetTimeout,
    Upstream,
}

impl StylistError {
    pub fn invalid_input(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: StylistErrorKind::InvalidInput,
        }
    }

    pub fn no_credentials(stage: &'static str) -> Self {
        Self {
            stage,
            message: "no API credentials available".into(),
            kind: StylistErrorKind::NoCredentials,
        }
    }

    pub fn asset_processing(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: StylistErrorKind::AssetProcessing,
        }
    }

    pub fn asset_timeout(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: StylistErrorKind::AssetTimeout,
        }
    }

    pub fn upstream(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: StylistErrorKind::Upstream,
        }
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    pub fn kind(&self) -> StylistErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.message
    }
}
