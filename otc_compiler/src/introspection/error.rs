//! Type resolution errors

use crate::logging::codes::{self, Code};

pub type TypeResult<T> = Result<T, TypeResolutionError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeResolutionError {
    #[error("Type '{name}' is not known")]
    UnknownType { name: String },

    #[error("Type '{owner}' has no field '{field}'")]
    UnknownField { owner: String, field: String },

    #[error("Field '{owner}.{field}' is a raw {kind} with no element type and no concrete-type override")]
    RawCollection {
        owner: String,
        field: String,
        kind: String,
    },

    #[error("Type '{type_name}' is abstract and no concrete type is configured for '{path}'")]
    UnresolvedAbstractType { type_name: String, path: String },

    #[error("Command tree exceeds {limit} nodes")]
    TreeTooLarge { limit: usize },

    #[error("Invalid type expression '{expression}': {reason}")]
    InvalidTypeExpression { expression: String, reason: String },
}

impl TypeResolutionError {
    pub fn unknown_type(name: &str) -> Self {
        Self::UnknownType {
            name: name.to_string(),
        }
    }

    pub fn unknown_field(owner: &str, field: &str) -> Self {
        Self::UnknownField {
            owner: owner.to_string(),
            field: field.to_string(),
        }
    }

    pub fn invalid_expression(expression: &str, reason: &str) -> Self {
        Self::InvalidTypeExpression {
            expression: expression.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::UnknownType { .. } => codes::type_resolution::UNKNOWN_TYPE,
            Self::UnknownField { .. } => codes::type_resolution::UNKNOWN_FIELD,
            Self::RawCollection { .. } => codes::type_resolution::RAW_COLLECTION,
            Self::UnresolvedAbstractType { .. } => codes::type_resolution::UNRESOLVED_ABSTRACT_TYPE,
            Self::TreeTooLarge { .. } => codes::type_resolution::TREE_TOO_LARGE,
            Self::InvalidTypeExpression { .. } => codes::type_resolution::INVALID_TYPE_EXPRESSION,
        }
    }
}

/// Failures loading a type schema document
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Failed to read schema '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse schema '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("Unsupported schema format '{path}', expected .toml or .json")]
    UnsupportedFormat { path: String },

    #[error("Invalid field '{owner}.{field}': {source}")]
    Field {
        owner: String,
        field: String,
        #[source]
        source: TypeResolutionError,
    },
}

impl SchemaError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::Io { .. } => codes::file_processing::IO_ERROR,
            Self::Parse { .. } | Self::UnsupportedFormat { .. } => {
                codes::file_processing::INVALID_SCRIPT
            }
            Self::Field { source, .. } => source.error_code(),
        }
    }
}
