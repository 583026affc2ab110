//! Mapping execution entry point
//!
//! An execution looks a mapping up in the registry, indexes the source (and
//! optionally the target) object, and hands back everything generated
//! mapping code needs for one invocation. Nothing here is shared between
//! invocations; each call gets its own index trees.

use crate::error::{ExecutionError, IndexingError};
use crate::indexer::{IndexedNode, ObjectIndexer};
use crate::introspector::ObjectIntrospector;
use crate::value::Value;
use chrono::{DateTime, Utc};
use otc_compiler::command::Side;
use otc_compiler::config::runtime::IndexerPreferences;
use otc_compiler::execution::CollectionsComparisonType;
use otc_compiler::registry::{CompiledMapping, MappingRegistry};
use otc_compiler::{log_error, log_info};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Per-command data generated code dispatches on
#[derive(Debug, Clone, Serialize)]
pub struct CommandPlan {
    pub command_id: String,
    pub generated_type: String,
    pub converter: Option<String>,
    pub collection_size_type: Option<CollectionsComparisonType>,
}

/// Result of one mapping invocation
#[derive(Debug, Clone)]
pub struct MappingExecution {
    pub execution_id: Uuid,
    pub mapping: Arc<CompiledMapping>,
    pub started_at: DateTime<Utc>,
    /// `None` when the source holds no non-empty collection a chain reaches
    pub source_index: Option<IndexedNode>,
    pub target_index: Option<IndexedNode>,
    pub commands: Vec<CommandPlan>,
}

impl MappingExecution {
    pub fn mapping_id(&self) -> &str {
        &self.mapping.id
    }

    pub fn index(&self, side: Side) -> Option<&IndexedNode> {
        match side {
            Side::Source => self.source_index.as_ref(),
            Side::Target => self.target_index.as_ref(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "execution_id": self.execution_id.to_string(),
            "mapping": self.mapping.id,
            "started_at": self.started_at.to_rfc3339(),
            "source_index": self.source_index.as_ref().map(IndexedNode::to_json),
            "target_index": self.target_index.as_ref().map(IndexedNode::to_json),
            "commands": self.commands,
        })
    }
}

pub struct MappingExecutor<'a> {
    registry: &'a MappingRegistry,
    indexer: ObjectIndexer<'a>,
}

impl<'a> MappingExecutor<'a> {
    pub fn new(registry: &'a MappingRegistry, introspector: &'a dyn ObjectIntrospector) -> Self {
        Self {
            registry,
            indexer: ObjectIndexer::new(introspector),
        }
    }

    pub fn with_preferences(
        registry: &'a MappingRegistry,
        introspector: &'a dyn ObjectIntrospector,
        preferences: IndexerPreferences,
    ) -> Self {
        Self {
            registry,
            indexer: ObjectIndexer::with_preferences(introspector, preferences),
        }
    }

    /// Prepare one invocation of `mapping_id` over `source`, and over
    /// `target` when mapping onto an existing object.
    ///
    /// The mapping is taken from the registry's current snapshot, so a
    /// concurrent reload never changes a running execution.
    pub fn execute(
        &self,
        mapping_id: &str,
        source: &Value,
        target: Option<&Value>,
    ) -> Result<MappingExecution, ExecutionError> {
        let execution_id = Uuid::new_v4();
        let started_at = Utc::now();

        let mapping = self
            .registry
            .get(mapping_id)
            .map_err(|_| ExecutionError::new(mapping_id, "", IndexingError::LockPoisoned))?
            .ok_or_else(|| {
                let error = ExecutionError::unknown_mapping(mapping_id);
                log_error!(error.error_code(), "Mapping not registered",
                    "mapping" => mapping_id,
                    "execution" => execution_id
                );
                error
            })?;

        log_info!("Executing mapping",
            "mapping" => mapping_id,
            "execution" => execution_id
        );

        let source_index = self.indexer.index_object(&mapping, Side::Source, source)?;
        let target_index = match target {
            Some(target) => self.indexer.index_object(&mapping, Side::Target, target)?,
            None => None,
        };

        let commands = mapping
            .commands
            .iter()
            .map(|command| CommandPlan {
                command_id: command.id.clone(),
                generated_type: command.generated_type.clone(),
                converter: command.converter.clone(),
                collection_size_type: command.collection_size_type,
            })
            .collect();

        Ok(MappingExecution {
            execution_id,
            mapping,
            started_at,
            source_index,
            target_index,
            commands,
        })
    }
}
