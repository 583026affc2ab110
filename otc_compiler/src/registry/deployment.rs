//! Persisted form of compiled mappings
//!
//! Field descriptors are not persisted. A deployment keeps the chain strings,
//! overrides and per-node collection descriptors; [`MappingDeployment::rehydrate`]
//! rebuilds the trees through the introspector and fails when the types have
//! drifted from what was deployed.

use super::compile::{CompiledMapping, MappingCompiler};
use super::error::{RegistryError, RegistryResult};
use super::script::{CommandScript, ConcreteTypeOverride, MappingScript};
use crate::command::{CollectionDescriptor, Side};
use crate::execution::CollectionsComparisonType;
use crate::introspection::TypeIntrospector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedCommand {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,
    pub generated_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_size_type: Option<CollectionsComparisonType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedNode {
    pub side: Side,
    pub path: String,
    pub descriptor: CollectionDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingDeployment {
    pub id: String,
    pub namespace: String,
    pub source_type: String,
    pub target_type: String,
    pub commands: Vec<DeployedCommand>,
    #[serde(default)]
    pub overrides: Vec<ConcreteTypeOverride>,
    pub nodes: Vec<DeployedNode>,
    pub deployed_at: DateTime<Utc>,
}

fn node_table(mapping: &CompiledMapping) -> Vec<DeployedNode> {
    [Side::Source, Side::Target]
        .into_iter()
        .flat_map(|side| {
            mapping
                .tree(side)
                .descriptor_summary()
                .into_iter()
                .map(move |(path, descriptor)| DeployedNode {
                    side,
                    path,
                    descriptor,
                })
        })
        .collect()
}

fn overrides_of(mapping: &CompiledMapping) -> Vec<ConcreteTypeOverride> {
    [Side::Source, Side::Target]
        .into_iter()
        .flat_map(|side| {
            mapping
                .tree(side)
                .overrides()
                .iter()
                .map(move |(path, concrete)| ConcreteTypeOverride {
                    side,
                    token_path: path.clone(),
                    concrete_type: concrete.clone(),
                })
        })
        .collect()
}

impl MappingDeployment {
    pub fn from_compiled(mapping: &CompiledMapping) -> Self {
        Self {
            id: mapping.id.clone(),
            namespace: mapping.namespace.clone(),
            source_type: mapping.source_tree.root_type().name.clone(),
            target_type: mapping.target_tree.root_type().name.clone(),
            commands: mapping
                .commands
                .iter()
                .map(|c| DeployedCommand {
                    id: c.id.clone(),
                    from: c.source.as_ref().map(|s| s.chain.chain.clone()),
                    to: c.target.chain.chain.clone(),
                    converter: c.converter.clone(),
                    generated_type: c.generated_type.clone(),
                    collection_size_type: c.collection_size_type,
                })
                .collect(),
            overrides: overrides_of(mapping),
            nodes: node_table(mapping),
            deployed_at: Utc::now(),
        }
    }

    pub fn to_json(&self) -> RegistryResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| RegistryError::serialization(&e.to_string()))
    }

    pub fn from_json(content: &str) -> RegistryResult<Self> {
        serde_json::from_str(content).map_err(|e| RegistryError::serialization(&e.to_string()))
    }

    fn as_script(&self) -> MappingScript {
        MappingScript {
            id: self.id.clone(),
            source_type: self.source_type.clone(),
            target_type: self.target_type.clone(),
            namespace: Some(self.namespace.clone()),
            commands: self
                .commands
                .iter()
                .map(|c| CommandScript {
                    id: c.id.clone(),
                    from: c.from.clone(),
                    to: c.to.clone(),
                    converter: c.converter.clone(),
                })
                .collect(),
            overrides: self.overrides.clone(),
        }
    }

    /// Rebuild the compiled mapping without the original script. Generated
    /// type names are kept as deployed.
    pub fn rehydrate(&self, introspector: &dyn TypeIntrospector) -> RegistryResult<CompiledMapping> {
        let mut compiler = MappingCompiler::new(introspector);
        let outcome = compiler.compile(&self.as_script());
        let failures = outcome.failure_count();

        let mut mapping = outcome.mapping.ok_or_else(|| RegistryError::CompilationFailed {
            id: self.id.clone(),
            failures,
        })?;

        let deployed: HashMap<(Side, &str), CollectionDescriptor> = self
            .nodes
            .iter()
            .map(|n| ((n.side, n.path.as_str()), n.descriptor))
            .collect();
        let rebuilt = node_table(&mapping);
        let rebuilt: HashMap<(Side, &str), CollectionDescriptor> = rebuilt
            .iter()
            .map(|n| ((n.side, n.path.as_str()), n.descriptor))
            .collect();

        if deployed != rebuilt {
            let detail = rebuilt
                .iter()
                .find(|(key, descriptor)| deployed.get(*key) != Some(*descriptor))
                .map(|((side, path), descriptor)| {
                    format!(
                        "{} node '{}' is now {}",
                        side.as_str(),
                        path,
                        descriptor.as_str()
                    )
                })
                .unwrap_or_else(|| "deployed nodes are missing from the rebuilt tree".to_string());
            return Err(RegistryError::RehydrationMismatch {
                id: self.id.clone(),
                detail,
            });
        }

        for (command, deployed) in mapping.commands.iter_mut().zip(&self.commands) {
            command.generated_type = deployed.generated_type.clone();
        }
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspection::SchemaRegistry;
    use assert_matches::assert_matches;

    const SCHEMA: &str = r#"
        [types.Customer.fields]
        orders = "List<Order>"
        tags = "Map<String, Int>"

        [types.Order.fields]
        id = "String"

        [types.Account.fields]
        ids = "List<String>"
        keys = "List<String>"
    "#;

    const DRIFTED: &str = r#"
        [types.Customer.fields]
        orders = "Set<Order>"
        tags = "Map<String, Int>"

        [types.Order.fields]
        id = "String"

        [types.Account.fields]
        ids = "List<String>"
        keys = "List<String>"
    "#;

    const SCRIPT: &str = r#"
        id = "customer_to_account"
        source_type = "Customer"
        target_type = "Account"

        [[commands]]
        id = "ids"
        from = "orders[*].id"
        to = "ids[*]"

        [[commands]]
        id = "keys"
        from = "tags<K>"
        to = "keys[*]"
    "#;

    fn compiled() -> CompiledMapping {
        let schema = SchemaRegistry::from_toml_str(SCHEMA).unwrap();
        let script = MappingScript::from_toml_str(SCRIPT).unwrap();
        MappingCompiler::new(&schema).compile(&script).mapping.unwrap()
    }

    #[test]
    fn test_deployment_json_round_trip_and_rehydrate() {
        let mapping = compiled();
        let deployment = MappingDeployment::from_compiled(&mapping);
        assert!(deployment
            .nodes
            .iter()
            .any(|n| n.path == "tags<K>" && n.descriptor == CollectionDescriptor::MapKey));

        let restored = MappingDeployment::from_json(&deployment.to_json().unwrap()).unwrap();
        assert_eq!(restored, deployment);

        let schema = SchemaRegistry::from_toml_str(SCHEMA).unwrap();
        let rehydrated = restored.rehydrate(&schema).unwrap();
        assert_eq!(rehydrated.source_tree, mapping.source_tree);
        assert_eq!(rehydrated.target_tree, mapping.target_tree);
        assert_eq!(
            rehydrated.commands[0].generated_type,
            mapping.commands[0].generated_type
        );
    }

    #[test]
    fn test_rehydrate_detects_type_drift() {
        let deployment = MappingDeployment::from_compiled(&compiled());
        let drifted = SchemaRegistry::from_toml_str(DRIFTED).unwrap();

        assert_matches!(
            deployment.rehydrate(&drifted),
            Err(RegistryError::RehydrationMismatch { detail, .. }) if detail.contains("orders")
        );
    }
}
