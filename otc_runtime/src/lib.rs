//! # OTC Runtime
//!
//! Live object model, object introspection and the collection indexer that
//! runs compiled mappings from `otc_compiler` against object graphs.

pub mod error;
pub mod executor;
pub mod indexer;
pub mod introspector;
pub mod value;

// Convenience re-exports
pub use error::{ExecutionError, IndexingError, IndexingResult};
pub use executor::{CommandPlan, MappingExecution, MappingExecutor};
pub use indexer::{IndexedNode, ObjectIndexer};
pub use introspector::{ObjectIntrospector, SchemaObjectIntrospector};
pub use value::{ObjectValue, Value};

pub mod prelude {
    pub use crate::error::{ExecutionError, IndexingError};
    pub use crate::executor::{MappingExecution, MappingExecutor};
    pub use crate::indexer::{IndexedNode, ObjectIndexer};
    pub use crate::introspector::{ObjectIntrospector, SchemaObjectIntrospector};
    pub use crate::value::{ObjectRef, ObjectValue, Value};

    pub use otc_compiler::command::Side;
    pub use otc_compiler::introspection::{SchemaRegistry, TypeIntrospector};
    pub use otc_compiler::registry::{MappingRegistry, MappingScript, RegistryBuilder};
}
