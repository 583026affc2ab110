#[macro_use]
pub mod logging;

pub mod batch;
pub mod command;
pub mod config;
pub mod execution;
pub mod grammar;
pub mod introspection;
pub mod pipeline;
pub mod registry;
pub mod utils;

// Re-export key types for library consumers
pub use batch::{BatchConfig, BatchError, BatchResults};
pub use command::{
    ChainError, CollectionDescriptor, CommandContext, CommandNode, CommandTree,
    CommandTreeFactory, NodeId, Side,
};
pub use execution::{CollectionsComparisonType, ExecutionContext};
pub use grammar::{tokenize, ChainToken, TokenizedChain};
pub use introspection::{SchemaRegistry, TypeIntrospector, TypeRef};
pub use pipeline::{PipelineError, PipelineResult};
pub use registry::{CompiledMapping, MappingRegistry, MappingScript, RegistryBuilder};
