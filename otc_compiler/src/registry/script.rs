//! Mapping script documents
//!
//! ```toml
//! id = "customer_to_account"
//! source_type = "Customer"
//! target_type = "Account"
//! namespace = "crm"
//!
//! [[commands]]
//! id = "skus"
//! from = "orders[*].items[*].sku"
//! to = "lines[*].code"
//!
//! [[overrides]]
//! side = "source"
//! token_path = "payment"
//! concrete_type = "CardPayment"
//! ```

use super::error::RegistryError;
use crate::command::Side;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingScript {
    pub id: String,
    pub source_type: String,
    pub target_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub commands: Vec<CommandScript>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<ConcreteTypeOverride>,
}

/// One `from` to `to` correspondence. A command without `from` only
/// addresses the target (constants, converters without input).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandScript {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,
}

/// Concrete type for the node at a normalized chain prefix. On a container
/// prefix (`orders[*]`, `tags<V>`) it types the member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcreteTypeOverride {
    pub side: Side,
    pub token_path: String,
    pub concrete_type: String,
}

impl MappingScript {
    pub fn from_toml_str(content: &str) -> Result<Self, RegistryError> {
        toml::from_str(content).map_err(|e| RegistryError::invalid_script(&e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, RegistryError> {
        toml::to_string(self).map_err(|e| RegistryError::serialization(&e.to_string()))
    }

    pub fn overrides_for(&self, side: Side) -> impl Iterator<Item = &ConcreteTypeOverride> {
        self.overrides.iter().filter(move |o| o.side == side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SCRIPT: &str = r#"
        id = "customer_to_account"
        source_type = "Customer"
        target_type = "Account"

        [[commands]]
        id = "skus"
        from = "orders[*].items[*].sku"
        to = "lines[*].code"

        [[commands]]
        id = "status"
        to = "status"
        converter = "constant_active"

        [[overrides]]
        side = "target"
        token_path = "lines[*]"
        concrete_type = "Line"
    "#;

    #[test]
    fn test_parse_script() {
        let script = MappingScript::from_toml_str(SCRIPT).unwrap();
        assert_eq!(script.id, "customer_to_account");
        assert_eq!(script.namespace, None);
        assert_eq!(script.commands.len(), 2);
        assert_eq!(script.commands[1].from, None);
        assert_eq!(script.commands[1].converter.as_deref(), Some("constant_active"));
        assert_eq!(script.overrides_for(Side::Target).count(), 1);
        assert_eq!(script.overrides_for(Side::Source).count(), 0);
    }

    #[test]
    fn test_toml_round_trip_keeps_commands() {
        let script = MappingScript::from_toml_str(SCRIPT).unwrap();
        let rendered = script.to_toml_string().unwrap();
        assert_eq!(MappingScript::from_toml_str(&rendered).unwrap(), script);
    }

    #[test]
    fn test_missing_target_chain_is_invalid() {
        let broken = "id = \"m\"\nsource_type = \"A\"\ntarget_type = \"B\"\n[[commands]]\nid = \"c\"\nfrom = \"x\"";
        assert_matches!(
            MappingScript::from_toml_str(broken),
            Err(RegistryError::InvalidScript { .. })
        );
    }
}
