//! Registry errors

use crate::logging::codes::{self, Code};

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Mapping '{id}' is already registered")]
    DuplicateMapping { id: String },

    #[error("Invalid mapping script: {message}")]
    InvalidScript { message: String },

    #[error("Mapping '{id}' failed to compile with {failures} error(s)")]
    CompilationFailed { id: String, failures: usize },

    #[error("{what} limit of {limit} exceeded")]
    LimitExceeded { what: String, limit: usize },

    #[error("Deployed mapping '{id}' no longer matches its types: {detail}")]
    RehydrationMismatch { id: String, detail: String },

    #[error("Serialization failed: {message}")]
    Serialization { message: String },

    #[error("Registry lock poisoned")]
    LockPoisoned,
}

impl RegistryError {
    pub fn invalid_script(message: &str) -> Self {
        Self::InvalidScript {
            message: message.to_string(),
        }
    }

    pub fn serialization(message: &str) -> Self {
        Self::Serialization {
            message: message.to_string(),
        }
    }

    pub fn limit_exceeded(what: &str, limit: usize) -> Self {
        Self::LimitExceeded {
            what: what.to_string(),
            limit,
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::DuplicateMapping { .. } => codes::registry::DUPLICATE_MAPPING,
            Self::InvalidScript { .. } | Self::CompilationFailed { .. } => {
                codes::registry::INVALID_SCRIPT
            }
            Self::LimitExceeded { .. } => codes::registry::LIMIT_EXCEEDED,
            Self::RehydrationMismatch { .. } => codes::registry::REHYDRATION_MISMATCH,
            Self::Serialization { .. } => codes::system::INTERNAL_ERROR,
            Self::LockPoisoned => codes::registry::LOCK_POISONED,
        }
    }
}
