//! Error types for indexing and mapping execution

use otc_compiler::logging::codes::{self, Code};

pub type IndexingResult<T> = Result<T, IndexingError>;

/// Failures while reading or walking a live object graph
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndexingError {
    #[error("Object of type '{type_name}' is reachable from itself")]
    CyclicGraph { type_name: String },

    #[error("Cannot read field '{field}' of '{owner}': {reason}")]
    FieldAccess {
        owner: String,
        field: String,
        reason: String,
    },

    #[error("Indexing depth limit of {limit} exceeded")]
    DepthLimitExceeded { limit: usize },

    #[error("Indexed node limit of {limit} exceeded")]
    NodeLimitExceeded { limit: usize },

    #[error("Mapping '{id}' is not registered")]
    UnknownMapping { id: String },

    #[error("Command tree does not match chain: {detail}")]
    TreeMismatch { detail: String },

    #[error("Value at '{path}' is not a valid {expected}: found {found}")]
    Conversion {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Object lock poisoned")]
    LockPoisoned,
}

impl IndexingError {
    pub fn field_access(owner: &str, field: &str, reason: &str) -> Self {
        Self::FieldAccess {
            owner: owner.to_string(),
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn conversion(path: &str, expected: &str, found: &str) -> Self {
        Self::Conversion {
            path: path.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn tree_mismatch(detail: &str) -> Self {
        Self::TreeMismatch {
            detail: detail.to_string(),
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::CyclicGraph { .. } => codes::indexing::CYCLIC_GRAPH,
            Self::FieldAccess { .. } | Self::LockPoisoned => codes::indexing::FIELD_ACCESS,
            Self::DepthLimitExceeded { .. } => codes::indexing::DEPTH_LIMIT,
            Self::NodeLimitExceeded { .. } => codes::indexing::NODE_LIMIT,
            Self::UnknownMapping { .. } => codes::indexing::UNKNOWN_MAPPING,
            Self::TreeMismatch { .. } => codes::indexing::TREE_MISMATCH,
            Self::Conversion { .. } => codes::indexing::VALUE_CONVERSION,
        }
    }
}

/// Indexing failure of one mapping invocation, fatal for that invocation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Mapping '{mapping_id}' failed on chain '{chain}': {source}")]
pub struct ExecutionError {
    pub mapping_id: String,
    pub chain: String,
    #[source]
    pub source: IndexingError,
}

impl ExecutionError {
    pub fn new(mapping_id: &str, chain: &str, source: IndexingError) -> Self {
        Self {
            mapping_id: mapping_id.to_string(),
            chain: chain.to_string(),
            source,
        }
    }

    pub fn unknown_mapping(mapping_id: &str) -> Self {
        Self::new(
            mapping_id,
            "",
            IndexingError::UnknownMapping {
                id: mapping_id.to_string(),
            },
        )
    }

    pub fn error_code(&self) -> Code {
        self.source.error_code()
    }
}
