//! Mapping registry
//!
//! Lifecycle: a [`RegistryBuilder`] compiles every script during a
//! single-threaded registration phase, then [`MappingRegistry`] serves the
//! resulting snapshot read-only. Reloading builds a fresh snapshot and swaps
//! it in whole, so readers never see a partially rebuilt tree.

pub mod compile;
pub mod deployment;
pub mod error;
pub mod report;
pub mod script;

pub use compile::{
    compile_script, ChainDescriptor, CompilationOutcome, CompiledCommand, CompiledMapping,
    MappingCompiler,
};
pub use deployment::{DeployedCommand, DeployedNode, MappingDeployment};
pub use error::{RegistryError, RegistryResult};
pub use report::CompilationReport;
pub use script::{CommandScript, ConcreteTypeOverride, MappingScript};

use crate::config::compile_time::registry::MAX_MAPPINGS;
use crate::introspection::TypeIntrospector;
use crate::logging::codes;
use crate::log_success;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::sync::{Arc, RwLock};

/// Read-only set of compiled mappings
#[derive(Debug)]
pub struct RegistrySnapshot {
    mappings: IndexMap<String, Arc<CompiledMapping>>,
    reports: Vec<CompilationReport>,
    loaded_at: DateTime<Utc>,
}

impl RegistrySnapshot {
    pub fn empty() -> Self {
        Self {
            mappings: IndexMap::new(),
            reports: Vec::new(),
            loaded_at: Utc::now(),
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<CompiledMapping>> {
        self.mappings.get(id).cloned()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.mappings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Every report produced while building this snapshot
    pub fn reports(&self) -> &[CompilationReport] {
        &self.reports
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

/// Registration phase
pub struct RegistryBuilder<'a> {
    compiler: MappingCompiler<'a>,
    mappings: IndexMap<String, Arc<CompiledMapping>>,
    reports: Vec<CompilationReport>,
}

impl<'a> RegistryBuilder<'a> {
    pub fn new(introspector: &'a dyn TypeIntrospector) -> Self {
        Self::with_compiler(MappingCompiler::new(introspector))
    }

    pub fn with_compiler(compiler: MappingCompiler<'a>) -> Self {
        Self {
            compiler,
            mappings: IndexMap::new(),
            reports: Vec::new(),
        }
    }

    /// Compile and register one script. Compilation failures are returned
    /// as an error after their reports have been recorded.
    pub fn add_script(&mut self, script: &MappingScript) -> RegistryResult<&CompiledMapping> {
        if self.mappings.contains_key(&script.id) {
            return Err(RegistryError::DuplicateMapping {
                id: script.id.clone(),
            });
        }
        if self.mappings.len() >= MAX_MAPPINGS {
            return Err(RegistryError::limit_exceeded("mapping", MAX_MAPPINGS));
        }

        let outcome = self.compiler.compile(script);
        let failures = outcome.failure_count();
        self.reports.extend(outcome.reports);

        match outcome.mapping {
            Some(mapping) => {
                let id = mapping.id.clone();
                let entry = self.mappings.entry(id).or_insert(Arc::new(mapping));
                Ok(&**entry)
            }
            None => Err(RegistryError::CompilationFailed {
                id: script.id.clone(),
                failures,
            }),
        }
    }

    /// Register an already compiled mapping, e.g. a rehydrated deployment
    pub fn add_compiled(&mut self, mapping: CompiledMapping) -> RegistryResult<()> {
        if self.mappings.contains_key(&mapping.id) {
            return Err(RegistryError::DuplicateMapping { id: mapping.id });
        }
        if self.mappings.len() >= MAX_MAPPINGS {
            return Err(RegistryError::limit_exceeded("mapping", MAX_MAPPINGS));
        }
        self.mappings.insert(mapping.id.clone(), Arc::new(mapping));
        Ok(())
    }

    pub fn reports(&self) -> &[CompilationReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn build(self) -> RegistrySnapshot {
        RegistrySnapshot {
            mappings: self.mappings,
            reports: self.reports,
            loaded_at: Utc::now(),
        }
    }
}

/// Shared handle to the current snapshot
#[derive(Debug)]
pub struct MappingRegistry {
    current: RwLock<Arc<RegistrySnapshot>>,
}

impl MappingRegistry {
    pub fn new(snapshot: RegistrySnapshot) -> Self {
        log_success!(codes::success::REGISTRY_LOADED, "Mapping registry loaded",
            "mappings" => snapshot.len()
        );
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn from_builder(builder: RegistryBuilder<'_>) -> Self {
        Self::new(builder.build())
    }

    /// Current snapshot; stays valid across later reloads
    pub fn snapshot(&self) -> RegistryResult<Arc<RegistrySnapshot>> {
        self.current
            .read()
            .map(|guard| Arc::clone(&*guard))
            .map_err(|_| RegistryError::LockPoisoned)
    }

    pub fn get(&self, id: &str) -> RegistryResult<Option<Arc<CompiledMapping>>> {
        Ok(self.snapshot()?.get(id))
    }

    /// Swap in the snapshot built by `builder` and return the previous one
    pub fn reload(&self, builder: RegistryBuilder<'_>) -> RegistryResult<Arc<RegistrySnapshot>> {
        let next = Arc::new(builder.build());
        let count = next.len();

        let mut guard = self
            .current
            .write()
            .map_err(|_| RegistryError::LockPoisoned)?;
        let previous = std::mem::replace(&mut *guard, next);
        drop(guard);

        log_success!(codes::success::REGISTRY_RELOADED, "Mapping registry reloaded",
            "mappings" => count,
            "previous" => previous.len()
        );
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspection::SchemaRegistry;
    use assert_matches::assert_matches;
    use std::thread;

    const SCHEMA: &str = r#"
        [types.A.fields]
        name = "String"
        items = "List<String>"

        [types.B.fields]
        title = "String"
    "#;

    fn script(id: &str, from: &str) -> MappingScript {
        MappingScript::from_toml_str(&format!(
            "id = \"{}\"\nsource_type = \"A\"\ntarget_type = \"B\"\n[[commands]]\nid = \"c\"\nfrom = \"{}\"\nto = \"title\"\n",
            id, from
        ))
        .unwrap()
    }

    #[test]
    fn test_builder_registers_and_rejects_duplicates() {
        let schema = SchemaRegistry::from_toml_str(SCHEMA).unwrap();
        let mut builder = RegistryBuilder::new(&schema);

        builder.add_script(&script("first", "name")).unwrap();
        assert_matches!(
            builder.add_script(&script("first", "name")),
            Err(RegistryError::DuplicateMapping { .. })
        );
        assert_matches!(
            builder.add_script(&script("broken", "ghost")),
            Err(RegistryError::CompilationFailed { failures: 1, .. })
        );

        let snapshot = builder.build();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.get("broken").is_none());
        assert!(snapshot.reports().iter().any(|r| !r.success));
    }

    #[test]
    fn test_reload_swaps_whole_snapshot() {
        let schema = SchemaRegistry::from_toml_str(SCHEMA).unwrap();
        let mut builder = RegistryBuilder::new(&schema);
        builder.add_script(&script("first", "name")).unwrap();
        let registry = MappingRegistry::from_builder(builder);

        let held = registry.snapshot().unwrap();

        let mut next = RegistryBuilder::new(&schema);
        next.add_script(&script("second", "name")).unwrap();
        let previous = registry.reload(next).unwrap();

        assert!(previous.get("first").is_some());
        assert!(held.get("first").is_some());
        assert!(registry.get("first").unwrap().is_none());
        assert!(registry.get("second").unwrap().is_some());
    }

    #[test]
    fn test_concurrent_readers_share_snapshot() {
        let schema = SchemaRegistry::from_toml_str(SCHEMA).unwrap();
        let mut builder = RegistryBuilder::new(&schema);
        builder.add_script(&script("first", "name")).unwrap();
        let registry = Arc::new(MappingRegistry::from_builder(builder));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let mapping = registry.get("first").unwrap().unwrap();
                    mapping.source_tree.len()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
    }
}
