//! Errors raised while tokenizing a chain

use crate::logging::codes::{self, Code};
use crate::utils::Span;

pub type SyntaxResult<T> = Result<T, SyntaxError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("Unbalanced '{delimiter}' in chain '{chain}' at {span}")]
    UnbalancedBracket {
        chain: String,
        delimiter: char,
        span: Span,
    },

    #[error("Empty segment in chain '{chain}' at {span}")]
    EmptySegment { chain: String, span: Span },

    #[error("Misplaced marker '{marker}' in chain '{chain}' at {span}: {reason}")]
    MisplacedMarker {
        chain: String,
        marker: String,
        reason: String,
        span: Span,
    },

    #[error("Segment '{segment}' in chain '{chain}' is not a valid identifier")]
    InvalidIdentifier {
        chain: String,
        segment: String,
        span: Span,
    },

    #[error("Chain is {length} bytes long, limit is {limit}")]
    ChainTooLong { length: usize, limit: usize },

    #[error("Chain '{chain}' has {count} segments, limit is {limit}")]
    TooManyTokens {
        chain: String,
        count: usize,
        limit: usize,
    },
}

impl SyntaxError {
    pub fn unbalanced(chain: &str, delimiter: char, offset: usize) -> Self {
        Self::UnbalancedBracket {
            chain: chain.to_string(),
            delimiter,
            span: Span::at(offset),
        }
    }

    pub fn empty_segment(chain: &str, offset: usize) -> Self {
        Self::EmptySegment {
            chain: chain.to_string(),
            span: Span::at(offset),
        }
    }

    pub fn misplaced_marker(chain: &str, marker: &str, reason: &str, span: Span) -> Self {
        Self::MisplacedMarker {
            chain: chain.to_string(),
            marker: marker.to_string(),
            reason: reason.to_string(),
            span,
        }
    }

    pub fn invalid_identifier(chain: &str, segment: &str, span: Span) -> Self {
        Self::InvalidIdentifier {
            chain: chain.to_string(),
            segment: segment.to_string(),
            span,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnbalancedBracket { span, .. }
            | Self::EmptySegment { span, .. }
            | Self::MisplacedMarker { span, .. }
            | Self::InvalidIdentifier { span, .. } => Some(*span),
            Self::ChainTooLong { .. } | Self::TooManyTokens { .. } => None,
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::UnbalancedBracket { .. } => codes::grammar::UNBALANCED_BRACKET,
            Self::EmptySegment { .. } => codes::grammar::EMPTY_SEGMENT,
            Self::MisplacedMarker { .. } => codes::grammar::MISPLACED_MARKER,
            Self::InvalidIdentifier { .. } => codes::grammar::INVALID_IDENTIFIER,
            Self::ChainTooLong { .. } => codes::grammar::CHAIN_TOO_LONG,
            Self::TooManyTokens { .. } => codes::grammar::TOO_MANY_TOKENS,
        }
    }
}
