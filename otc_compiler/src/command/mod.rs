//! Command node model, tree factory and chain contexts

pub mod context;
pub mod error;
pub mod factory;
pub mod node;
pub mod tree;

pub use context::CommandContext;
pub use error::{ChainError, ChainResult, SemanticsError};
pub use factory::CommandTreeFactory;
pub use node::{CollectionDescriptor, CommandNode, NodeId, Side};
pub use tree::CommandTree;

pub use crate::introspection::TypeResolutionError;
