//! # Type Introspection
//!
//! The command tree factory never inspects types directly. Everything it
//! knows about a field (declared type, generic arguments, configured concrete
//! type) comes through [`TypeIntrospector`], so the same resolution logic
//! runs over a schema document, generated accessor tables or any other
//! source of type information.
//!
//! ## Usage
//!
//! ```rust
//! use otc_compiler::introspection::{SchemaRegistry, TypeIntrospector, TypeKind};
//!
//! let schema = SchemaRegistry::from_toml_str(r#"
//!     [types.Customer.fields]
//!     orders = "List<Order>"
//!
//!     [types.Order.fields]
//!     id = "String"
//! "#).unwrap();
//!
//! let field = schema.field_type("Customer", "orders").unwrap();
//! assert_eq!(field.declared_type.kind, TypeKind::List);
//! assert_eq!(schema.generic_arguments(&field)[0].name, "Order");
//! ```

pub mod error;
pub mod schema;
pub mod types;

pub use error::{SchemaError, TypeResolutionError, TypeResult};
pub use schema::{SchemaDocument, SchemaRegistry, TypeDefinition};
pub use types::{parse_type_expression, FieldDescriptor, TypeKind, TypeRef};

/// Type information provider consumed by the command tree factory
pub trait TypeIntrospector: Send + Sync {
    /// Describe a type by name
    fn type_ref(&self, name: &str) -> TypeResult<TypeRef>;

    /// Bind `field` on `owner`
    ///
    /// # Returns
    /// * `Ok(descriptor)` - the field exists on `owner`
    /// * `Err(UnknownType)` - `owner` is not known
    /// * `Err(UnknownField)` - `owner` has no such field
    fn field_type(&self, owner: &str, field: &str) -> TypeResult<FieldDescriptor>;

    /// Generic arguments of a container field: the element type of a
    /// list/set/queue/array, or key and value types of a map. Empty for raw
    /// containers.
    fn generic_arguments(&self, field: &FieldDescriptor) -> Vec<TypeRef> {
        field.declared_type.generic_args.clone()
    }

    /// Type-level concrete type configured for an abstract declared type
    fn concrete_type(&self, _declared: &TypeRef) -> Option<TypeRef> {
        None
    }
}
