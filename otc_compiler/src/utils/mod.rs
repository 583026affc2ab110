//! Shared primitives for the chain grammar and diagnostics

pub mod span;

pub use span::Span;
