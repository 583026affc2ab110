//! Command node model

use crate::introspection::{FieldDescriptor, TypeKind, TypeRef};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Index of a node in its [`super::CommandTree`]
pub type NodeId = usize;

/// Structural classification of a command node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectionDescriptor {
    Normal,
    List,
    Set,
    Queue,
    Array,
    Map,
    MapKey,
    MapValue,
    CollectionMember,
}

impl CollectionDescriptor {
    pub fn from_kind(kind: TypeKind) -> Self {
        match kind {
            TypeKind::List => Self::List,
            TypeKind::Set => Self::Set,
            TypeKind::Queue => Self::Queue,
            TypeKind::Array => Self::Array,
            TypeKind::Map => Self::Map,
            TypeKind::Scalar | TypeKind::Object | TypeKind::Abstract => Self::Normal,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Self::List | Self::Set | Self::Queue | Self::Array)
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map)
    }

    pub fn is_container(&self) -> bool {
        self.is_collection() || self.is_map()
    }

    /// Synthesized child of a container
    pub fn is_member(&self) -> bool {
        matches!(self, Self::CollectionMember | Self::MapKey | Self::MapValue)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::List => "LIST",
            Self::Set => "SET",
            Self::Queue => "QUEUE",
            Self::Array => "ARRAY",
            Self::Map => "MAP",
            Self::MapKey => "MAP_KEY",
            Self::MapValue => "MAP_VALUE",
            Self::CollectionMember => "COLLECTION_MEMBER",
        }
    }
}

/// Which object graph a tree describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Source,
    Target,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Target => "target",
        }
    }
}

/// One resolved chain segment.
///
/// Container fields get their members synthesized at creation: a single
/// `CollectionMember` keyed by the field name, or a `MapKey`/`MapValue` pair
/// keyed `<K>name`/`<V>name`. Members share the container's token index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandNode {
    pub id: NodeId,
    pub token_index: usize,
    /// Key of this node in its parent's children
    pub token: String,
    /// Normalized chain prefix identifying this node, e.g. `orders` for the
    /// list field and `orders[*]` for its member
    pub path: String,
    pub field: FieldDescriptor,
    pub descriptor: CollectionDescriptor,
    /// Field type, or element type for members
    pub declared_type: TypeRef,
    pub concrete_type: Option<TypeRef>,
    pub is_first_node: bool,
    pub side: Side,
    pub parent: Option<NodeId>,
    pub children: Option<IndexMap<String, NodeId>>,
}

impl CommandNode {
    /// Type used to resolve this node's children
    pub fn effective_type(&self) -> &TypeRef {
        self.concrete_type.as_ref().unwrap_or(&self.declared_type)
    }

    pub fn child(&self, key: &str) -> Option<NodeId> {
        self.children.as_ref().and_then(|c| c.get(key).copied())
    }

    pub fn child_count(&self) -> usize {
        self.children.as_ref().map_or(0, IndexMap::len)
    }

    pub fn is_collection(&self) -> bool {
        self.descriptor.is_collection()
    }

    pub fn is_map(&self) -> bool {
        self.descriptor.is_map()
    }

    pub fn is_container(&self) -> bool {
        self.descriptor.is_container()
    }

    pub fn is_map_key(&self) -> bool {
        self.descriptor == CollectionDescriptor::MapKey
    }

    pub fn is_map_value(&self) -> bool {
        self.descriptor == CollectionDescriptor::MapValue
    }

    pub fn is_collection_member(&self) -> bool {
        self.descriptor == CollectionDescriptor::CollectionMember
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_classification() {
        assert_eq!(CollectionDescriptor::from_kind(TypeKind::Array), CollectionDescriptor::Array);
        assert_eq!(CollectionDescriptor::from_kind(TypeKind::Abstract), CollectionDescriptor::Normal);
        assert!(CollectionDescriptor::Queue.is_container());
        assert!(CollectionDescriptor::Map.is_container());
        assert!(!CollectionDescriptor::Map.is_collection());
        assert!(CollectionDescriptor::MapValue.is_member());
        assert!(!CollectionDescriptor::Normal.is_member());
    }

    #[test]
    fn test_descriptor_serializes_in_screaming_case() {
        let json = serde_json::to_string(&CollectionDescriptor::CollectionMember).unwrap();
        assert_eq!(json, "\"COLLECTION_MEMBER\"");
        let back: CollectionDescriptor = serde_json::from_str("\"MAP_KEY\"").unwrap();
        assert_eq!(back, CollectionDescriptor::MapKey);
    }
}
