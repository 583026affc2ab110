//! # Live Object Model
//!
//! [`Value`] is the in-memory object graph the indexer walks. Objects,
//! sequences and maps are reference-counted handles, so the same instance
//! can be reachable from several places (and from itself, which the indexer
//! detects). Cloning a `Value` clones the handle, never the instance.
//!
//! ## Usage
//!
//! ```rust
//! use otc_runtime::value::{ObjectValue, Value};
//!
//! let order = ObjectValue::new("Order");
//! order.set_field("code", Value::from("A-1")).unwrap();
//!
//! let customer = ObjectValue::new("Customer");
//! customer
//!     .set_field("orders", Value::sequence(vec![Value::Object(order.clone())]))
//!     .unwrap();
//!
//! let orders = customer.get_field("orders").unwrap().unwrap();
//! assert_eq!(orders.len(), Some(1));
//! ```

use crate::error::{IndexingError, IndexingResult};
use indexmap::IndexMap;
use otc_compiler::introspection::{SchemaRegistry, TypeIntrospector, TypeKind, TypeRef};
use std::fmt;
use std::sync::{Arc, RwLock};

/// Key carrying the concrete type of an abstract-typed JSON object
pub const TYPE_KEY: &str = "$type";

pub type ObjectRef = Arc<ObjectValue>;
pub type SequenceRef = Arc<Vec<Value>>;
pub type MapRef = Arc<Vec<(Value, Value)>>;

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Object(ObjectRef),
    /// List, set, queue or array contents in iteration order
    Sequence(SequenceRef),
    /// Map entries in iteration order
    Map(MapRef),
}

impl Value {
    pub fn sequence(items: Vec<Value>) -> Self {
        Value::Sequence(Arc::new(items))
    }

    pub fn map(entries: Vec<(Value, Value)>) -> Self {
        Value::Map(Arc::new(entries))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Sequence or map without elements
    pub fn is_empty_container(&self) -> bool {
        self.len() == Some(0)
    }

    /// Element count of a sequence or map
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Sequence(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Address of the shared instance behind a handle; `None` for scalars
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Object(object) => Some(Arc::as_ptr(object) as *const () as usize),
            Value::Sequence(items) => Some(Arc::as_ptr(items) as *const () as usize),
            Value::Map(entries) => Some(Arc::as_ptr(entries) as *const () as usize),
            _ => None,
        }
    }

    /// Both values are handles to the same instance
    pub fn same_instance(&self, other: &Value) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Object(_) => "object",
            Value::Sequence(_) => "sequence",
            Value::Map(_) => "map",
        }
    }

    /// Short JSON rendering: scalars as themselves, handles as their type
    /// and size. Never recurses, so cyclic graphs render fine.
    pub fn summary(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(value) => serde_json::Value::from(*value),
            Value::Int(value) => serde_json::Value::from(*value),
            Value::Float(value) => serde_json::Value::from(*value),
            Value::Text(text) => serde_json::Value::from(text.as_str()),
            Value::Object(object) => serde_json::json!({ "type": object.type_name() }),
            Value::Sequence(items) => serde_json::json!({ "sequence": items.len() }),
            Value::Map(entries) => serde_json::json!({ "map": entries.len() }),
        }
    }

    /// Build a value graph from JSON, guided by `declared` and the schema.
    ///
    /// Objects take the field types of their schema type; an abstract type
    /// is replaced by the object's `$type` key or, failing that, by the
    /// schema's configured concrete type. Maps are read from JSON objects.
    /// Fields absent from the JSON are left unset.
    pub fn from_json(
        json: &serde_json::Value,
        declared: &TypeRef,
        schema: &SchemaRegistry,
    ) -> IndexingResult<Value> {
        JsonConverter { schema }.convert(json, declared, "$")
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}

/// An object instance: a type name and its field values.
///
/// Fields sit behind a lock so a graph can be wired after its objects exist,
/// which is the only way to build a cycle out of `Arc`s.
pub struct ObjectValue {
    type_name: String,
    fields: RwLock<IndexMap<String, Value>>,
}

impl ObjectValue {
    pub fn new(type_name: &str) -> ObjectRef {
        Arc::new(Self {
            type_name: type_name.to_string(),
            fields: RwLock::new(IndexMap::new()),
        })
    }

    pub fn with_fields<I, K>(type_name: &str, fields: I) -> ObjectRef
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Arc::new(Self {
            type_name: type_name.to_string(),
            fields: RwLock::new(fields.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn set_field(&self, name: &str, value: Value) -> IndexingResult<()> {
        let mut fields = self.fields.write().map_err(|_| IndexingError::LockPoisoned)?;
        fields.insert(name.to_string(), value);
        Ok(())
    }

    /// Handle to a field's value; `None` when the field was never set
    pub fn get_field(&self, name: &str) -> IndexingResult<Option<Value>> {
        let fields = self.fields.read().map_err(|_| IndexingError::LockPoisoned)?;
        Ok(fields.get(name).cloned())
    }

    pub fn field_names(&self) -> IndexingResult<Vec<String>> {
        let fields = self.fields.read().map_err(|_| IndexingError::LockPoisoned)?;
        Ok(fields.keys().cloned().collect())
    }
}

// Field values are left out: they may lead back to this object.
impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("ObjectValue");
        debug.field("type_name", &self.type_name);
        if let Ok(fields) = self.fields.read() {
            debug.field("fields", &fields.keys().collect::<Vec<_>>());
        }
        debug.finish()
    }
}

struct JsonConverter<'a> {
    schema: &'a SchemaRegistry,
}

impl JsonConverter<'_> {
    fn convert(
        &self,
        json: &serde_json::Value,
        declared: &TypeRef,
        path: &str,
    ) -> IndexingResult<Value> {
        if json.is_null() {
            return Ok(Value::Null);
        }

        match declared.kind {
            TypeKind::Scalar => self.scalar(json, &declared.name, path),
            TypeKind::Object | TypeKind::Abstract => self.object(json, declared, path),
            TypeKind::List | TypeKind::Set | TypeKind::Queue | TypeKind::Array => {
                let items = json
                    .as_array()
                    .ok_or_else(|| mismatch(path, &declared.to_string(), json))?;
                let element = declared.generic_args.first();
                let values = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let item_path = format!("{}[{}]", path, i);
                        match element {
                            Some(element) => self.convert(item, element, &item_path),
                            None => Ok(untyped(item)),
                        }
                    })
                    .collect::<IndexingResult<Vec<_>>>()?;
                Ok(Value::sequence(values))
            }
            TypeKind::Map => {
                let entries = json
                    .as_object()
                    .ok_or_else(|| mismatch(path, &declared.to_string(), json))?;
                let key_type = declared.generic_args.first();
                let value_type = declared.generic_args.get(1);
                let values = entries
                    .iter()
                    .map(|(key, value)| {
                        let entry_path = format!("{}[{}]", path, key);
                        let key = match key_type {
                            Some(key_type) => self.map_key(key, key_type, &entry_path)?,
                            None => Value::from(key.as_str()),
                        };
                        let value = match value_type {
                            Some(value_type) => self.convert(value, value_type, &entry_path)?,
                            None => untyped(value),
                        };
                        Ok((key, value))
                    })
                    .collect::<IndexingResult<Vec<_>>>()?;
                Ok(Value::map(values))
            }
        }
    }

    fn object(
        &self,
        json: &serde_json::Value,
        declared: &TypeRef,
        path: &str,
    ) -> IndexingResult<Value> {
        let fields = json
            .as_object()
            .ok_or_else(|| mismatch(path, &declared.name, json))?;

        let type_name = match fields.get(TYPE_KEY).and_then(|t| t.as_str()) {
            Some(concrete) => concrete.to_string(),
            None if declared.kind == TypeKind::Abstract => self
                .schema
                .concrete_type(declared)
                .map(|t| t.name)
                .ok_or_else(|| {
                    IndexingError::conversion(path, &declared.name, "object without '$type'")
                })?,
            None => declared.name.clone(),
        };

        let declared_fields = self
            .schema
            .fields_of(&type_name)
            .ok_or_else(|| IndexingError::conversion(path, "known type", &type_name))?;

        let object = ObjectValue::new(&type_name);
        for (name, field_type) in declared_fields {
            if let Some(field_json) = fields.get(name) {
                let field_path = format!("{}.{}", path, name);
                object.set_field(name, self.convert(field_json, field_type, &field_path)?)?;
            }
        }
        Ok(Value::Object(object))
    }

    fn scalar(&self, json: &serde_json::Value, name: &str, path: &str) -> IndexingResult<Value> {
        let converted = match name {
            "Bool" | "Boolean" => json.as_bool().map(Value::Bool),
            "Byte" | "Short" | "Int" | "Integer" | "Long" => json.as_i64().map(Value::Int),
            "Float" | "Double" => json.as_f64().map(Value::Float),
            "Decimal" => json
                .as_f64()
                .map(Value::Float)
                .or_else(|| json.as_str().map(Value::from)),
            "String" | "Char" | "Date" | "DateTime" | "Uuid" => json.as_str().map(Value::from),
            _ if !json.is_array() && !json.is_object() => Some(untyped(json)),
            _ => None,
        };
        converted.ok_or_else(|| mismatch(path, name, json))
    }

    /// JSON object keys are strings; integer-keyed maps parse them back
    fn map_key(&self, key: &str, key_type: &TypeRef, path: &str) -> IndexingResult<Value> {
        match key_type.name.as_str() {
            "Byte" | "Short" | "Int" | "Integer" | "Long" => key
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| IndexingError::conversion(path, &key_type.name, key)),
            _ => Ok(Value::from(key)),
        }
    }
}

/// Conversion without type information: arrays become sequences and
/// objects become text-keyed maps
fn untyped(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(value) => Value::Bool(*value),
        serde_json::Value::Number(number) => match number.as_i64() {
            Some(value) => Value::Int(value),
            None => Value::Float(number.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(text) => Value::Text(text.clone()),
        serde_json::Value::Array(items) => Value::sequence(items.iter().map(untyped).collect()),
        serde_json::Value::Object(entries) => Value::map(
            entries
                .iter()
                .map(|(k, v)| (Value::from(k.as_str()), untyped(v)))
                .collect(),
        ),
    }
}

fn mismatch(path: &str, expected: &str, found: &serde_json::Value) -> IndexingError {
    let found = match found {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    };
    IndexingError::conversion(path, expected, found)
}
