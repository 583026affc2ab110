//! Reading live objects through the fields a command tree binds

use crate::error::{IndexingError, IndexingResult};
use crate::value::Value;
use otc_compiler::introspection::{
    FieldDescriptor, SchemaRegistry, TypeIntrospector, TypeRef, TypeResult,
};
use std::sync::Arc;

/// Type introspection extended with access to instances.
///
/// The indexer only ever reads fields it finds on command nodes, so every
/// read goes through the [`FieldDescriptor`] the tree factory bound.
pub trait ObjectIntrospector: TypeIntrospector {
    /// Read `field` from `instance`
    ///
    /// # Returns
    /// * `Ok(Some(value))` - the field holds a non-null value
    /// * `Ok(None)` - the field is unset or null
    /// * `Err(FieldAccess)` - `instance` is not an object of the field's owner
    fn read_field(&self, field: &FieldDescriptor, instance: &Value) -> IndexingResult<Option<Value>>;
}

/// [`ObjectIntrospector`] over [`crate::value::ObjectValue`] instances,
/// typed by a [`SchemaRegistry`]
#[derive(Debug, Clone)]
pub struct SchemaObjectIntrospector {
    schema: Arc<SchemaRegistry>,
}

impl SchemaObjectIntrospector {
    pub fn new(schema: SchemaRegistry) -> Self {
        Self::from_shared(Arc::new(schema))
    }

    pub fn from_shared(schema: Arc<SchemaRegistry>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }
}

impl TypeIntrospector for SchemaObjectIntrospector {
    fn type_ref(&self, name: &str) -> TypeResult<TypeRef> {
        self.schema.type_ref(name)
    }

    fn field_type(&self, owner: &str, field: &str) -> TypeResult<FieldDescriptor> {
        self.schema.field_type(owner, field)
    }

    fn generic_arguments(&self, field: &FieldDescriptor) -> Vec<TypeRef> {
        self.schema.generic_arguments(field)
    }

    fn concrete_type(&self, declared: &TypeRef) -> Option<TypeRef> {
        self.schema.concrete_type(declared)
    }
}

impl ObjectIntrospector for SchemaObjectIntrospector {
    fn read_field(&self, field: &FieldDescriptor, instance: &Value) -> IndexingResult<Option<Value>> {
        let object = instance.as_object().ok_or_else(|| {
            IndexingError::field_access(
                &field.owner,
                &field.name,
                &format!("instance is {}", instance.kind_label()),
            )
        })?;

        if object.type_name() != field.owner {
            return Err(IndexingError::field_access(
                &field.owner,
                &field.name,
                &format!("instance is a '{}'", object.type_name()),
            ));
        }

        Ok(object.get_field(&field.name)?.filter(|value| !value.is_null()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ObjectValue;
    use assert_matches::assert_matches;

    fn introspector() -> SchemaObjectIntrospector {
        let schema = SchemaRegistry::from_toml_str(
            r#"
            [types.Order.fields]
            code = "String"
            note = "String"
            "#,
        )
        .unwrap();
        SchemaObjectIntrospector::new(schema)
    }

    #[test]
    fn test_read_field() {
        let introspector = introspector();
        let code = introspector.field_type("Order", "code").unwrap();
        let note = introspector.field_type("Order", "note").unwrap();
        let order = Value::Object(ObjectValue::with_fields(
            "Order",
            [("code", Value::from("A-1")), ("note", Value::Null)],
        ));

        let value = introspector.read_field(&code, &order).unwrap().unwrap();
        assert_eq!(value.as_text(), Some("A-1"));
        assert!(introspector.read_field(&note, &order).unwrap().is_none());
    }

    #[test]
    fn test_read_field_rejects_foreign_instances() {
        let introspector = introspector();
        let code = introspector.field_type("Order", "code").unwrap();

        assert_matches!(
            introspector.read_field(&code, &Value::Object(ObjectValue::new("Invoice"))),
            Err(IndexingError::FieldAccess { reason, .. }) if reason.contains("Invoice")
        );
        assert_matches!(
            introspector.read_field(&code, &Value::Int(3)),
            Err(IndexingError::FieldAccess { reason, .. }) if reason == "instance is int"
        );
    }
}
