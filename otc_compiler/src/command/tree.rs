//! Arena holding the command nodes of one side of a mapping

use super::node::{CollectionDescriptor, CommandNode, NodeId, Side};
use crate::config::compile_time::command_tree::{MAX_CHILDREN_PER_NODE, MAX_TREE_NODES};
use crate::grammar::MapSide;
use crate::introspection::{TypeResolutionError, TypeResult, TypeRef};
use indexmap::IndexMap;
use serde::Serialize;

/// All command nodes resolved against one root type.
///
/// Nodes live in a flat arena and refer to each other by [`NodeId`], so the
/// parent link is a plain index rather than an owning pointer. First-level
/// nodes hang off `first_nodes`; the root type itself has no node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandTree {
    side: Side,
    root_type: TypeRef,
    nodes: Vec<CommandNode>,
    first_nodes: IndexMap<String, NodeId>,
    /// Concrete type names keyed by normalized chain prefix
    overrides: IndexMap<String, String>,
}

impl CommandTree {
    pub fn new(side: Side, root_type: TypeRef) -> Self {
        Self {
            side,
            root_type,
            nodes: Vec::new(),
            first_nodes: IndexMap::new(),
            overrides: IndexMap::new(),
        }
    }

    pub fn with_overrides(mut self, overrides: IndexMap<String, String>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn add_override(&mut self, path: &str, concrete_type: &str) {
        self.overrides
            .insert(path.to_string(), concrete_type.to_string());
    }

    pub fn override_for(&self, path: &str) -> Option<&str> {
        self.overrides.get(path).map(String::as_str)
    }

    pub fn overrides(&self) -> &IndexMap<String, String> {
        &self.overrides
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn root_type(&self) -> &TypeRef {
        &self.root_type
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node by id. Ids are only handed out by this tree.
    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id]
    }

    pub fn try_node(&self, id: NodeId) -> Option<&CommandNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[CommandNode] {
        &self.nodes
    }

    pub fn first_node(&self, field_name: &str) -> Option<NodeId> {
        self.first_nodes.get(field_name).copied()
    }

    pub fn first_nodes(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.first_nodes.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Child of `parent` under `key`; `None` as parent means the root
    pub fn child_of(&self, parent: Option<NodeId>, key: &str) -> Option<NodeId> {
        match parent {
            Some(id) => self.node(id).child(key),
            None => self.first_node(key),
        }
    }

    /// Member of a container node: the single collection member, or the
    /// addressed side of a map
    pub fn member_of(&self, id: NodeId, side: Option<MapSide>) -> Option<NodeId> {
        let node = self.node(id);
        match (node.descriptor, side) {
            (CollectionDescriptor::Map, Some(side)) => node.child(&side.member_key(&node.field.name)),
            (CollectionDescriptor::Map, None) => None,
            (d, _) if d.is_collection() => node.child(&node.field.name),
            _ => None,
        }
    }

    pub fn find_by_path(&self, path: &str) -> Option<NodeId> {
        self.nodes.iter().find(|n| n.path == path).map(|n| n.id)
    }

    /// Ids from `id` up to its first-level ancestor
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |current| self.node(*current).parent)
    }

    /// Path and descriptor of every node in creation order
    pub fn descriptor_summary(&self) -> Vec<(String, CollectionDescriptor)> {
        self.nodes
            .iter()
            .map(|n| (n.path.clone(), n.descriptor))
            .collect()
    }

    /// Append a node and link it under `parent`, enforcing tree limits.
    /// The node's `id`, `parent` and `token` are set here.
    pub(crate) fn insert(
        &mut self,
        parent: Option<NodeId>,
        key: &str,
        mut node: CommandNode,
    ) -> TypeResult<NodeId> {
        if self.nodes.len() >= MAX_TREE_NODES {
            return Err(TypeResolutionError::TreeTooLarge {
                limit: MAX_TREE_NODES,
            });
        }

        let id = self.nodes.len();
        node.id = id;
        node.parent = parent;
        node.token = key.to_string();

        match parent {
            Some(parent_id) => {
                let children = self.nodes[parent_id]
                    .children
                    .get_or_insert_with(IndexMap::new);
                if children.len() >= MAX_CHILDREN_PER_NODE {
                    return Err(TypeResolutionError::TreeTooLarge {
                        limit: MAX_CHILDREN_PER_NODE,
                    });
                }
                children.insert(key.to_string(), id);
            }
            None => {
                if self.first_nodes.len() >= MAX_CHILDREN_PER_NODE {
                    return Err(TypeResolutionError::TreeTooLarge {
                        limit: MAX_CHILDREN_PER_NODE,
                    });
                }
                self.first_nodes.insert(key.to_string(), id);
            }
        }

        self.nodes.push(node);
        Ok(id)
    }

    /// Drop every node created at or after `mark`, unlinking them from their
    /// parents. Used to discard the partial work of a failed chain.
    pub(crate) fn rollback(&mut self, mark: usize) {
        if mark >= self.nodes.len() {
            return;
        }
        self.nodes.truncate(mark);
        self.first_nodes.retain(|_, id| *id < mark);
        for node in &mut self.nodes {
            if let Some(children) = node.children.as_mut() {
                children.retain(|_, id| *id < mark);
                if children.is_empty() && !node.descriptor.is_container() {
                    node.children = None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspection::FieldDescriptor;

    fn plain(name: &str, path: &str) -> CommandNode {
        CommandNode {
            id: 0,
            token_index: 0,
            token: String::new(),
            path: path.to_string(),
            field: FieldDescriptor::new("Root", name, TypeRef::object("Thing")),
            descriptor: CollectionDescriptor::Normal,
            declared_type: TypeRef::object("Thing"),
            concrete_type: None,
            is_first_node: true,
            side: Side::Source,
            parent: None,
            children: None,
        }
    }

    #[test]
    fn test_insert_links_parent_and_children() {
        let mut tree = CommandTree::new(Side::Source, TypeRef::object("Root"));
        let a = tree.insert(None, "a", plain("a", "a")).unwrap();
        let b = tree.insert(Some(a), "b", plain("b", "a.b")).unwrap();

        assert_eq!(tree.first_node("a"), Some(a));
        assert_eq!(tree.child_of(Some(a), "b"), Some(b));
        assert_eq!(tree.node(b).parent, Some(a));
        assert_eq!(tree.ancestors(b).collect::<Vec<_>>(), vec![b, a]);
        assert_eq!(tree.find_by_path("a.b"), Some(b));
    }

    #[test]
    fn test_rollback_unlinks_discarded_nodes() {
        let mut tree = CommandTree::new(Side::Target, TypeRef::object("Root"));
        let a = tree.insert(None, "a", plain("a", "a")).unwrap();
        let mark = tree.len();
        tree.insert(Some(a), "b", plain("b", "a.b")).unwrap();
        tree.insert(None, "c", plain("c", "c")).unwrap();

        tree.rollback(mark);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.node(a).children, None);
        assert_eq!(tree.first_node("c"), None);
    }
}
