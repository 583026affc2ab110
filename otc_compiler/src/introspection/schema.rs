//! Schema-document backed type introspection
//!
//! A schema lists object types and their fields as textual type expressions:
//!
//! ```toml
//! [types.Customer.fields]
//! orders = "List<Order>"
//! tags = "Map<String, Int>"
//! payment = "Payment"
//!
//! [types.Payment]
//! abstract = true
//!
//! [types.CardPayment.fields]
//! number = "String"
//!
//! [concrete_types]
//! Payment = "CardPayment"
//! ```

use super::error::{SchemaError, TypeResolutionError, TypeResult};
use super::types::{parse_type_expression, FieldDescriptor, TypeKind, TypeRef};
use super::TypeIntrospector;
use crate::config::compile_time::file_processing::MAX_FILE_SIZE;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub types: IndexMap<String, TypeDefinition>,
    /// Abstract type name to the concrete type used when resolving through it
    #[serde(default)]
    pub concrete_types: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeDefinition {
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub fields: IndexMap<String, String>,
}

#[derive(Debug, Clone)]
struct ResolvedType {
    kind: TypeKind,
    fields: IndexMap<String, TypeRef>,
}

/// [`TypeIntrospector`] over a [`SchemaDocument`]. All field expressions are
/// parsed once at load time.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: HashMap<String, ResolvedType>,
    concrete_types: HashMap<String, String>,
}

impl SchemaRegistry {
    pub fn from_document(document: SchemaDocument) -> Result<Self, SchemaError> {
        let kinds: HashMap<&str, TypeKind> = document
            .types
            .iter()
            .map(|(name, def)| {
                let kind = if def.is_abstract {
                    TypeKind::Abstract
                } else {
                    TypeKind::Object
                };
                (name.as_str(), kind)
            })
            .collect();
        let classify = |name: &str| kinds.get(name).copied();

        let mut types = HashMap::with_capacity(document.types.len());
        for (name, def) in &document.types {
            let mut fields = IndexMap::with_capacity(def.fields.len());
            for (field, expression) in &def.fields {
                let parsed =
                    parse_type_expression(expression, &classify).map_err(|source| {
                        SchemaError::Field {
                            owner: name.clone(),
                            field: field.clone(),
                            source,
                        }
                    })?;
                fields.insert(field.clone(), parsed);
            }
            types.insert(
                name.clone(),
                ResolvedType {
                    kind: kinds.get(name.as_str()).copied().unwrap_or(TypeKind::Object),
                    fields,
                },
            );
        }

        for (declared, concrete) in &document.concrete_types {
            match kinds.get(concrete.as_str()) {
                Some(TypeKind::Object) => {}
                _ => {
                    return Err(SchemaError::Parse {
                        path: "<concrete_types>".to_string(),
                        message: format!(
                            "concrete type '{}' for '{}' is not a known object type",
                            concrete, declared
                        ),
                    })
                }
            }
        }

        Ok(Self {
            types,
            concrete_types: document.concrete_types.into_iter().collect(),
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SchemaError> {
        let document: SchemaDocument = toml::from_str(content).map_err(|e| SchemaError::Parse {
            path: "<toml>".to_string(),
            message: e.to_string(),
        })?;
        Self::from_document(document)
    }

    pub fn from_json_str(content: &str) -> Result<Self, SchemaError> {
        let document: SchemaDocument =
            serde_json::from_str(content).map_err(|e| SchemaError::Parse {
                path: "<json>".to_string(),
                message: e.to_string(),
            })?;
        Self::from_document(document)
    }

    /// Load a `.toml` or `.json` schema file
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let display = path.display().to_string();
        let metadata = std::fs::metadata(path).map_err(|source| SchemaError::Io {
            path: display.clone(),
            source,
        })?;
        if metadata.len() > MAX_FILE_SIZE {
            return Err(SchemaError::Parse {
                path: display,
                message: format!("file exceeds {} bytes", MAX_FILE_SIZE),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: display.clone(),
            source,
        })?;

        let loaded = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => return Err(SchemaError::UnsupportedFormat { path: display }),
        };

        loaded.map_err(|e| match e {
            SchemaError::Parse { message, .. } => SchemaError::Parse {
                path: display,
                message,
            },
            other => other,
        })
    }

    pub fn contains_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Declared fields of an object type in declaration order
    pub fn fields_of(&self, name: &str) -> Option<&IndexMap<String, TypeRef>> {
        self.types.get(name).map(|t| &t.fields)
    }

    /// Concrete type name configured for an abstract type
    pub fn concrete_name(&self, abstract_name: &str) -> Option<&str> {
        self.concrete_types.get(abstract_name).map(String::as_str)
    }
}

impl TypeIntrospector for SchemaRegistry {
    fn type_ref(&self, name: &str) -> TypeResult<TypeRef> {
        if let Some(resolved) = self.types.get(name) {
            return Ok(TypeRef::new(name, resolved.kind));
        }
        let classify = |n: &str| self.types.get(n).map(|t| t.kind);
        parse_type_expression(name, &classify)
    }

    fn field_type(&self, owner: &str, field: &str) -> TypeResult<FieldDescriptor> {
        let resolved = self
            .types
            .get(owner)
            .ok_or_else(|| TypeResolutionError::unknown_type(owner))?;
        let declared = resolved
            .fields
            .get(field)
            .ok_or_else(|| TypeResolutionError::unknown_field(owner, field))?;
        Ok(FieldDescriptor::new(owner, field, declared.clone()))
    }

    fn concrete_type(&self, declared: &TypeRef) -> Option<TypeRef> {
        if declared.kind != TypeKind::Abstract {
            return None;
        }
        self.concrete_name(&declared.name)
            .map(|name| TypeRef::new(name, TypeKind::Object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    const SCHEMA: &str = r#"
        [types.Customer.fields]
        name = "String"
        orders = "List<Order>"
        tags = "Map<String, Int>"
        payment = "Payment"
        legacy = "List"

        [types.Order.fields]
        items = "Item[]"

        [types.Item.fields]
        sku = "String"

        [types.Payment]
        abstract = true

        [types.CardPayment.fields]
        number = "String"

        [concrete_types]
        Payment = "CardPayment"
    "#;

    #[test]
    fn test_field_lookup() {
        let schema = SchemaRegistry::from_toml_str(SCHEMA).unwrap();

        let orders = schema.field_type("Customer", "orders").unwrap();
        assert_eq!(orders.owner, "Customer");
        assert_eq!(orders.declared_type, TypeRef::list_of(TypeRef::object("Order")));

        let tags = schema.field_type("Customer", "tags").unwrap();
        let args = schema.generic_arguments(&tags);
        assert_eq!(args, vec![TypeRef::scalar("String"), TypeRef::scalar("Int")]);

        let legacy = schema.field_type("Customer", "legacy").unwrap();
        assert!(schema.generic_arguments(&legacy).is_empty());

        assert_matches!(
            schema.field_type("Customer", "missing"),
            Err(TypeResolutionError::UnknownField { .. })
        );
        assert_matches!(
            schema.field_type("Ghost", "x"),
            Err(TypeResolutionError::UnknownType { .. })
        );
    }

    #[test]
    fn test_field_order_is_preserved() {
        let schema = SchemaRegistry::from_toml_str(SCHEMA).unwrap();
        let names: Vec<&String> = schema.fields_of("Customer").unwrap().keys().collect();
        assert_eq!(names, vec!["name", "orders", "tags", "payment", "legacy"]);
    }

    #[test]
    fn test_concrete_types() {
        let schema = SchemaRegistry::from_toml_str(SCHEMA).unwrap();
        let payment = schema.field_type("Customer", "payment").unwrap();
        assert_eq!(payment.declared_type.kind, TypeKind::Abstract);
        assert_eq!(
            schema.concrete_type(&payment.declared_type),
            Some(TypeRef::object("CardPayment"))
        );
        assert_eq!(schema.concrete_type(&TypeRef::object("Order")), None);
    }

    #[test]
    fn test_type_ref_parses_expressions() {
        let schema = SchemaRegistry::from_toml_str(SCHEMA).unwrap();
        assert_eq!(schema.type_ref("Item").unwrap(), TypeRef::object("Item"));
        assert_eq!(
            schema.type_ref("List<Item>").unwrap(),
            TypeRef::list_of(TypeRef::object("Item"))
        );
        assert_matches!(schema.type_ref("Ghost"), Err(TypeResolutionError::UnknownType { .. }));
    }

    #[test]
    fn test_invalid_documents() {
        let unknown_field_type = "[types.A.fields]\nb = \"List<Ghost>\"";
        assert_matches!(
            SchemaRegistry::from_toml_str(unknown_field_type),
            Err(SchemaError::Field { field, .. }) if field == "b"
        );

        let bad_concrete = "[types.A]\nabstract = true\n[concrete_types]\nA = \"A\"";
        assert_matches!(
            SchemaRegistry::from_toml_str(bad_concrete),
            Err(SchemaError::Parse { .. })
        );
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"types": {{"Root": {{"fields": {{"values": "Set<Long>"}}}}}}}}"#
        )
        .unwrap();

        let schema = SchemaRegistry::load(file.path()).unwrap();
        let values = schema.field_type("Root", "values").unwrap();
        assert_eq!(values.declared_type.kind, TypeKind::Set);
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert_matches!(
            SchemaRegistry::load(file.path()),
            Err(SchemaError::UnsupportedFormat { .. })
        );
    }
}
