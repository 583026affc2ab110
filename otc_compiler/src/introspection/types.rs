//! Type descriptors handed out by introspectors

use super::error::{TypeResolutionError, TypeResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Scalar,
    Object,
    /// Interface or abstract class; needs a concrete type to resolve fields
    Abstract,
    List,
    Set,
    Queue,
    Array,
    Map,
}

impl TypeKind {
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            TypeKind::List | TypeKind::Set | TypeKind::Queue | TypeKind::Array
        )
    }

    pub fn is_map(&self) -> bool {
        matches!(self, TypeKind::Map)
    }

    pub fn is_container(&self) -> bool {
        self.is_collection() || self.is_map()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Scalar => "scalar",
            TypeKind::Object => "object",
            TypeKind::Abstract => "abstract",
            TypeKind::List => "list",
            TypeKind::Set => "set",
            TypeKind::Queue => "queue",
            TypeKind::Array => "array",
            TypeKind::Map => "map",
        }
    }

    /// Container kind for a generic name such as `List` or `HashMap`
    pub fn container_from_name(name: &str) -> Option<Self> {
        match name {
            "List" | "Vec" | "ArrayList" | "LinkedList" => Some(TypeKind::List),
            "Set" | "HashSet" | "BTreeSet" | "TreeSet" => Some(TypeKind::Set),
            "Queue" | "Deque" | "VecDeque" => Some(TypeKind::Queue),
            "Map" | "HashMap" | "BTreeMap" | "TreeMap" => Some(TypeKind::Map),
            _ => None,
        }
    }
}

pub const SCALAR_TYPES: &[&str] = &[
    "String", "Char", "Bool", "Boolean", "Byte", "Short", "Int", "Integer", "Long", "Float",
    "Double", "Decimal", "Date", "DateTime", "Uuid",
];

/// A declared type: name, kind, and generic arguments in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    pub name: String,
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generic_args: Vec<TypeRef>,
}

impl TypeRef {
    pub fn new(name: &str, kind: TypeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            generic_args: Vec::new(),
        }
    }

    pub fn scalar(name: &str) -> Self {
        Self::new(name, TypeKind::Scalar)
    }

    pub fn object(name: &str) -> Self {
        Self::new(name, TypeKind::Object)
    }

    pub fn with_args(mut self, args: Vec<TypeRef>) -> Self {
        self.generic_args = args;
        self
    }

    pub fn list_of(element: TypeRef) -> Self {
        Self::new("List", TypeKind::List).with_args(vec![element])
    }

    pub fn array_of(element: TypeRef) -> Self {
        Self::new("Array", TypeKind::Array).with_args(vec![element])
    }

    pub fn map_of(key: TypeRef, value: TypeRef) -> Self {
        Self::new("Map", TypeKind::Map).with_args(vec![key, value])
    }

    pub fn is_collection(&self) -> bool {
        self.kind.is_collection()
    }

    pub fn is_map(&self) -> bool {
        self.kind.is_map()
    }

    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == TypeKind::Array {
            if let Some(component) = self.generic_args.first() {
                return write!(f, "{}[]", component);
            }
        }
        write!(f, "{}", self.name)?;
        if !self.generic_args.is_empty() {
            let args: Vec<String> = self.generic_args.iter().map(|a| a.to_string()).collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        Ok(())
    }
}

/// A field bound on its owning type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub owner: String,
    pub name: String,
    pub declared_type: TypeRef,
}

impl FieldDescriptor {
    pub fn new(owner: &str, name: &str, declared_type: TypeRef) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            declared_type,
        }
    }
}

/// Parse a textual type expression such as `List<Item>`, `Map<String, Order>`
/// or `Item[]`. `classify` decides the kind of every non-container name.
pub fn parse_type_expression<F>(expression: &str, classify: &F) -> TypeResult<TypeRef>
where
    F: Fn(&str) -> Option<TypeKind>,
{
    let expr = expression.trim();
    if expr.is_empty() {
        return Err(TypeResolutionError::invalid_expression(
            expression,
            "empty type",
        ));
    }

    if let Some(component) = expr.strip_suffix("[]") {
        let element = parse_type_expression(component, classify)?;
        return Ok(TypeRef::array_of(element));
    }

    let (name, args) = match expr.find('<') {
        Some(open) => {
            let inner = expr[open + 1..].strip_suffix('>').ok_or_else(|| {
                TypeResolutionError::invalid_expression(expression, "unclosed '<'")
            })?;
            let args = split_top_level(inner)
                .into_iter()
                .map(|part| parse_type_expression(part, classify))
                .collect::<TypeResult<Vec<_>>>()?;
            (expr[..open].trim(), args)
        }
        None => (expr, Vec::new()),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
        return Err(TypeResolutionError::invalid_expression(
            expression,
            "invalid type name",
        ));
    }

    if let Some(kind) = TypeKind::container_from_name(name) {
        let expected = if kind == TypeKind::Map { 2 } else { 1 };
        if !args.is_empty() && args.len() != expected {
            return Err(TypeResolutionError::invalid_expression(
                expression,
                &format!("{} takes {} type argument(s)", name, expected),
            ));
        }
        return Ok(TypeRef::new(name, kind).with_args(args));
    }

    if !args.is_empty() {
        return Err(TypeResolutionError::invalid_expression(
            expression,
            "only container types take type arguments",
        ));
    }

    let kind = if SCALAR_TYPES.contains(&name) {
        TypeKind::Scalar
    } else {
        classify(name).ok_or_else(|| TypeResolutionError::unknown_type(name))?
    };
    Ok(TypeRef::new(name, kind))
}

fn split_top_level(inner: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in inner.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&inner[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn classify(name: &str) -> Option<TypeKind> {
        match name {
            "Order" | "Item" => Some(TypeKind::Object),
            "Payment" => Some(TypeKind::Abstract),
            _ => None,
        }
    }

    #[test]
    fn test_parse_nested_generics() {
        let parsed = parse_type_expression("Map<String, List<Order>>", &classify).unwrap();
        assert_eq!(parsed.kind, TypeKind::Map);
        assert_eq!(parsed.generic_args[0], TypeRef::scalar("String"));
        assert_eq!(parsed.generic_args[1], TypeRef::list_of(TypeRef::object("Order")));
        assert_eq!(parsed.to_string(), "Map<String, List<Order>>");
    }

    #[test]
    fn test_parse_arrays_and_raw_collections() {
        let array = parse_type_expression("Item[]", &classify).unwrap();
        assert_eq!(array, TypeRef::array_of(TypeRef::object("Item")));
        assert_eq!(array.to_string(), "Item[]");

        let raw = parse_type_expression("Set", &classify).unwrap();
        assert_eq!(raw.kind, TypeKind::Set);
        assert!(raw.generic_args.is_empty());

        let abstract_type = parse_type_expression("Payment", &classify).unwrap();
        assert_eq!(abstract_type.kind, TypeKind::Abstract);
    }

    #[test]
    fn test_parse_errors() {
        assert_matches!(
            parse_type_expression("Ghost", &classify),
            Err(TypeResolutionError::UnknownType { name }) if name == "Ghost"
        );
        assert_matches!(
            parse_type_expression("List<Item", &classify),
            Err(TypeResolutionError::InvalidTypeExpression { .. })
        );
        assert_matches!(
            parse_type_expression("Map<String>", &classify),
            Err(TypeResolutionError::InvalidTypeExpression { .. })
        );
        assert_matches!(
            parse_type_expression("Order<Item>", &classify),
            Err(TypeResolutionError::InvalidTypeExpression { .. })
        );
    }
}
