//! Errors raised while resolving a chain into command nodes

use crate::grammar::SyntaxError;
use crate::introspection::TypeResolutionError;
use crate::logging::codes::{self, Code};
use crate::utils::Span;

pub type ChainResult<T> = Result<T, ChainError>;

/// A chain that parses but does not fit the type it is bound to
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SemanticsError {
    #[error("Map field '{field}' in chain '{chain}' needs a <K> or <V> marker at {span}")]
    MissingKeyValueMarker {
        chain: String,
        field: String,
        span: Span,
    },

    #[error("Key/value marker on non-map field '{field}' in chain '{chain}' at {span}")]
    MarkerOnNonMap {
        chain: String,
        field: String,
        span: Span,
    },

    #[error("Anchor on non-collection field '{field}' in chain '{chain}' at {span}")]
    AnchorOnNonCollection {
        chain: String,
        field: String,
        span: Span,
    },

    #[error("Field '{field}' is a {kind} and needs [*] notation in chain '{chain}' at {span}")]
    MissingCollectionNotation {
        chain: String,
        field: String,
        kind: String,
        span: Span,
    },

    #[error("Collection notation on plain field '{field}' in chain '{chain}' at {span}")]
    NotationOnPlainField {
        chain: String,
        field: String,
        span: Span,
    },

    #[error("Chain '{chain}' has {count} anchors, at most one is allowed")]
    MultipleAnchors { chain: String, count: usize },

    #[error("Type hint '{hint}' on '{field}' in chain '{chain}' conflicts with '{resolved}' from an earlier chain at {span}")]
    ConflictingTypeHint {
        chain: String,
        field: String,
        hint: String,
        resolved: String,
        span: Span,
    },

    #[error("Elements of '{field}' are containers themselves and cannot be addressed by a field in chain '{chain}' at {span}")]
    NestedContainer {
        chain: String,
        field: String,
        span: Span,
    },
}

impl SemanticsError {
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::MissingKeyValueMarker { span, .. }
            | Self::MarkerOnNonMap { span, .. }
            | Self::AnchorOnNonCollection { span, .. }
            | Self::MissingCollectionNotation { span, .. }
            | Self::NotationOnPlainField { span, .. }
            | Self::ConflictingTypeHint { span, .. }
            | Self::NestedContainer { span, .. } => Some(*span),
            Self::MultipleAnchors { .. } => None,
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::MissingKeyValueMarker { .. } => codes::semantics::MISSING_KEY_VALUE_MARKER,
            Self::MarkerOnNonMap { .. } => codes::semantics::MARKER_ON_NON_MAP,
            Self::AnchorOnNonCollection { .. } => codes::semantics::ANCHOR_ON_NON_COLLECTION,
            Self::MissingCollectionNotation { .. } => {
                codes::semantics::MISSING_COLLECTION_NOTATION
            }
            Self::NotationOnPlainField { .. } => codes::semantics::NOTATION_ON_PLAIN_FIELD,
            Self::MultipleAnchors { .. } => codes::semantics::MULTIPLE_ANCHORS,
            Self::NestedContainer { .. } => codes::semantics::NESTED_CONTAINER,
            Self::ConflictingTypeHint { .. } => codes::semantics::CONFLICTING_TYPE_HINT,
        }
    }
}

/// Any failure turning one chain into command nodes. Fatal for that chain
/// only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Semantics(#[from] SemanticsError),

    #[error("Chain '{chain}': {source}")]
    TypeResolution {
        chain: String,
        #[source]
        source: TypeResolutionError,
    },
}

impl ChainError {
    pub fn type_resolution(chain: &str, source: TypeResolutionError) -> Self {
        Self::TypeResolution {
            chain: chain.to_string(),
            source,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Syntax(e) => e.span(),
            Self::Semantics(e) => e.span(),
            Self::TypeResolution { .. } => None,
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::Syntax(e) => e.error_code(),
            Self::Semantics(e) => e.error_code(),
            Self::TypeResolution { source, .. } => source.error_code(),
        }
    }

    /// Stage name used in reports
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Syntax(_) => "syntax",
            Self::Semantics(_) => "semantics",
            Self::TypeResolution { .. } => "type_resolution",
        }
    }
}
