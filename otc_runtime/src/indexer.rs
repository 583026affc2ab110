//! # Object Indexer
//!
//! Walks a live object along the compiled chains of one mapping side and
//! records every non-empty collection or map it meets, so generated mapping
//! code can iterate by position instead of re-walking the graph.
//!
//! ## Index layout
//!
//! ```text
//! root
//! └── orders[*]            position key of the first collection level
//!     └── 0                element index
//!         └── items[*]     position key below an element
//!             ├── 0
//!             └── 1
//! ```
//!
//! A position key is the chain segment from the nearest enclosing collection
//! (or the root) down to the container, followed by `[*]` for collections and
//! `[*,*]` for maps. Map entries produce `"<i><K>"` and `"<i><V>"` children
//! from one pass over the entries, so both sides of a map share one subtree
//! whichever side a chain addresses.
//!
//! Null values and empty containers produce no nodes. An element whose
//! nested chain indexes nothing is dropped with them.

use crate::error::{ExecutionError, IndexingError, IndexingResult};
use crate::introspector::ObjectIntrospector;
use crate::value::Value;
use indexmap::map::Entry;
use indexmap::IndexMap;
use otc_compiler::command::{CommandContext, CommandTree, Side};
use otc_compiler::config::compile_time::indexer::{MAX_INDEX_DEPTH, MAX_INDEXED_NODES};
use otc_compiler::config::runtime::IndexerPreferences;
use otc_compiler::grammar::notation::{COLLECTION_NOTATION, MAP_NOTATION};
use otc_compiler::grammar::{ChainToken, MapSide, TokenizedChain};
use otc_compiler::logging::codes;
use otc_compiler::registry::CompiledMapping;
use otc_compiler::{log_debug, log_error, log_success};

/// Id of the node every indexed chain hangs from
pub const ROOT_ID: &str = "root";

/// One realized container or element of a live object
#[derive(Debug, Clone)]
pub struct IndexedNode {
    id: String,
    value: Value,
    children: Option<IndexMap<String, IndexedNode>>,
}

impl IndexedNode {
    pub fn new(id: &str, value: Value) -> Self {
        Self {
            id: id.to_string(),
            value,
            children: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Handle to the indexed instance
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// `None` until the first child is indexed
    pub fn children(&self) -> Option<&IndexMap<String, IndexedNode>> {
        self.children.as_ref()
    }

    pub fn child(&self, id: &str) -> Option<&IndexedNode> {
        self.children.as_ref().and_then(|c| c.get(id))
    }

    pub fn child_ids(&self) -> Vec<&str> {
        self.children
            .as_ref()
            .map(|c| c.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn child_count(&self) -> usize {
        self.children.as_ref().map_or(0, IndexMap::len)
    }

    /// Follow child ids from this node
    pub fn find(&self, path: &[&str]) -> Option<&IndexedNode> {
        path.iter().try_fold(self, |node, id| node.child(id))
    }

    /// Nodes in this subtree, itself included
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .as_ref()
            .map_or(0, |c| c.values().map(IndexedNode::node_count).sum())
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut json = serde_json::json!({
            "id": self.id,
            "value": self.value.summary(),
        });
        if let Some(children) = &self.children {
            json["children"] = children.values().map(IndexedNode::to_json).collect();
        }
        json
    }

    fn child_mut(&mut self, id: &str) -> Option<&mut IndexedNode> {
        self.children.as_mut().and_then(|c| c.get_mut(id))
    }
}

/// Working state of one indexing call
struct IndexingPass {
    created: usize,
    /// Identities of the objects on the current descent path
    path: Vec<usize>,
    detect_cycles: bool,
}

impl IndexingPass {
    fn new(detect_cycles: bool) -> Self {
        Self {
            created: 0,
            path: Vec::new(),
            detect_cycles,
        }
    }

    /// Existing child `id` of `parent`, or a new one wrapping `value`
    fn child<'n>(
        &mut self,
        parent: &'n mut IndexedNode,
        id: &str,
        value: &Value,
    ) -> IndexingResult<&'n mut IndexedNode> {
        let children = parent.children.get_or_insert_with(IndexMap::new);
        match children.entry(id.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                self.count_node()?;
                Ok(entry.insert(IndexedNode::new(id, value.clone())))
            }
        }
    }

    fn adopt(&mut self, parent: &mut IndexedNode, node: IndexedNode) -> IndexingResult<()> {
        self.count_node()?;
        parent
            .children
            .get_or_insert_with(IndexMap::new)
            .insert(node.id.clone(), node);
        Ok(())
    }

    fn count_node(&mut self) -> IndexingResult<()> {
        if self.created >= MAX_INDEXED_NODES {
            return Err(IndexingError::NodeLimitExceeded {
                limit: MAX_INDEXED_NODES,
            });
        }
        self.created += 1;
        Ok(())
    }

    fn enter(&mut self, value: &Value) -> IndexingResult<bool> {
        if !self.detect_cycles {
            return Ok(false);
        }
        let (Some(identity), Value::Object(object)) = (value.identity(), value) else {
            return Ok(false);
        };
        if self.path.contains(&identity) {
            return Err(IndexingError::CyclicGraph {
                type_name: object.type_name().to_string(),
            });
        }
        self.path.push(identity);
        Ok(true)
    }

    fn leave(&mut self, entered: bool) {
        if entered {
            self.path.pop();
        }
    }
}

/// Builds [`IndexedNode`] trees for one side of compiled mappings
pub struct ObjectIndexer<'a> {
    introspector: &'a dyn ObjectIntrospector,
    preferences: IndexerPreferences,
}

impl<'a> ObjectIndexer<'a> {
    pub fn new(introspector: &'a dyn ObjectIntrospector) -> Self {
        Self::with_preferences(introspector, IndexerPreferences::default())
    }

    pub fn with_preferences(
        introspector: &'a dyn ObjectIntrospector,
        preferences: IndexerPreferences,
    ) -> Self {
        Self {
            introspector,
            preferences,
        }
    }

    /// Index every chain of `side` in `mapping` over `root`.
    ///
    /// Chains without collection levels are skipped, as are chains whose
    /// sanitized prefix up to their last collection equals one already
    /// walked. Returns `None` when no chain reached a non-empty container.
    pub fn index_object(
        &self,
        mapping: &CompiledMapping,
        side: Side,
        root: &Value,
    ) -> Result<Option<IndexedNode>, ExecutionError> {
        let tree = mapping.tree(side);
        let mut pass = IndexingPass::new(self.preferences.detect_cycles);
        let mut root_node = IndexedNode::new(ROOT_ID, root.clone());
        let mut seen: Vec<String> = Vec::new();

        for chain in mapping.chains(side) {
            let Some(last_collection) = chain.last_collection_index() else {
                continue;
            };
            let prefix = chain.sanitized_prefix(last_collection);
            if seen.contains(&prefix) {
                if self.preferences.log_skipped_chains {
                    log_debug!("Chain prefix already indexed",
                        "mapping" => mapping.id,
                        "chain" => chain.chain,
                        "prefix" => prefix
                    );
                }
                continue;
            }

            self.index_chain_with(&mut pass, tree, chain, root, &mut root_node)
                .map_err(|error| {
                    let error = ExecutionError::new(&mapping.id, &chain.chain, error);
                    log_error!(error.error_code(), "Indexing failed",
                        "mapping" => mapping.id,
                        "side" => side.as_str(),
                        "chain" => chain.chain,
                        "error" => error.source
                    );
                    error
                })?;
            seen.push(prefix);
        }

        if root_node.children.is_none() {
            return Ok(None);
        }

        log_success!(codes::success::OBJECT_INDEXED, "Object indexed",
            "mapping" => mapping.id,
            "side" => side.as_str(),
            "chains" => seen.len(),
            "nodes" => pass.created
        );
        Ok(Some(root_node))
    }

    /// Index a single resolved chain of `tree` over `instance` into `parent`
    pub fn index_chain(
        &self,
        tree: &CommandTree,
        chain: &TokenizedChain,
        instance: &Value,
        parent: &mut IndexedNode,
    ) -> IndexingResult<()> {
        let mut pass = IndexingPass::new(self.preferences.detect_cycles);
        self.index_chain_with(&mut pass, tree, chain, instance, parent)
    }

    fn index_chain_with(
        &self,
        pass: &mut IndexingPass,
        tree: &CommandTree,
        chain: &TokenizedChain,
        instance: &Value,
        parent: &mut IndexedNode,
    ) -> IndexingResult<()> {
        let ctx = CommandContext::at_first(tree, chain).ok_or_else(|| {
            IndexingError::tree_mismatch(&format!(
                "chain '{}' is not resolved in the {} tree",
                chain.chain,
                tree.side().as_str()
            ))
        })?;

        let entered = pass.enter(instance)?;
        let result = self.index_from(pass, ctx, instance, parent, 0);
        pass.leave(entered);
        result
    }

    fn index_from(
        &self,
        pass: &mut IndexingPass,
        ctx: CommandContext<'_>,
        instance: &Value,
        parent: &mut IndexedNode,
        depth: usize,
    ) -> IndexingResult<()> {
        if depth >= MAX_INDEX_DEPTH {
            return Err(IndexingError::DepthLimitExceeded {
                limit: MAX_INDEX_DEPTH,
            });
        }

        let Some((ctx, container)) = self.read_to_container(ctx, instance)? else {
            return Ok(());
        };
        if container.is_empty_container() {
            return Ok(());
        }

        let node = ctx.node();
        let (next, map_side) = match (&container, node.is_map()) {
            (Value::Sequence(_), false) => (next_level(ctx.member())?, None),
            (Value::Map(_), true) => {
                let side = ctx.token().map_side.ok_or_else(|| {
                    IndexingError::tree_mismatch(&format!(
                        "map '{}' is addressed without a key or value marker",
                        node.path
                    ))
                })?;
                (next_level(ctx.map_member(side))?, Some(side))
            }
            (other, _) => {
                return Err(IndexingError::tree_mismatch(&format!(
                    "'{}' is {} but holds a {} value",
                    node.path,
                    node.descriptor.as_str(),
                    other.kind_label()
                )))
            }
        };

        let key = position_key(&ctx);
        if let Some(existing) = parent.child_mut(&key) {
            return self.index_elements(pass, &container, map_side, next, existing, depth);
        }

        // Kept only once an element survives
        let mut position = IndexedNode::new(&key, container.clone());
        self.index_elements(pass, &container, map_side, next, &mut position, depth)?;
        if position.children.is_some() {
            pass.adopt(parent, position)?;
        }
        Ok(())
    }

    fn index_elements(
        &self,
        pass: &mut IndexingPass,
        container: &Value,
        map_side: Option<MapSide>,
        next: Option<CommandContext<'_>>,
        position: &mut IndexedNode,
        depth: usize,
    ) -> IndexingResult<()> {
        match (container, map_side) {
            (Value::Map(entries), Some(side)) => {
                // One iterator for both sides keeps keys and values paired
                for (i, (key, value)) in entries.iter().enumerate() {
                    for (entry_side, entry_value) in [(MapSide::Key, key), (MapSide::Value, value)] {
                        if entry_value.is_null() {
                            continue;
                        }
                        let id = format!("{}{}", i, entry_side.marker());
                        if entry_side == side {
                            self.index_element(pass, position, &id, entry_value, next, depth)?;
                        } else {
                            pass.child(position, &id, entry_value)?;
                        }
                    }
                }
            }
            (Value::Sequence(items), None) => {
                for (i, item) in items.iter().enumerate() {
                    if !item.is_null() {
                        self.index_element(pass, position, &i.to_string(), item, next, depth)?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Read NORMAL nodes from `instance` down to the chain's next container
    fn read_to_container<'t>(
        &self,
        ctx: CommandContext<'t>,
        instance: &Value,
    ) -> IndexingResult<Option<(CommandContext<'t>, Value)>> {
        let mut ctx = ctx;
        let mut current = instance.clone();
        loop {
            let node = ctx.node();
            if node.descriptor.is_member() {
                return Err(IndexingError::tree_mismatch(&format!(
                    "expected a field node at '{}', found {}",
                    node.path,
                    node.descriptor.as_str()
                )));
            }

            let Some(value) = self.introspector.read_field(&node.field, &current)? else {
                return Ok(None);
            };
            if node.is_container() {
                return Ok(Some((ctx, value)));
            }
            match ctx.descend() {
                Some(next) => {
                    ctx = next;
                    current = value;
                }
                None => return Ok(None),
            }
        }
    }

    /// Element `id` of a container. Without a deeper level every non-null
    /// element is recorded; otherwise only elements whose nested chain
    /// indexed something.
    fn index_element(
        &self,
        pass: &mut IndexingPass,
        position: &mut IndexedNode,
        id: &str,
        item: &Value,
        next: Option<CommandContext<'_>>,
        depth: usize,
    ) -> IndexingResult<()> {
        let Some(next) = next else {
            pass.child(position, id, item)?;
            return Ok(());
        };

        if let Some(existing) = position.child_mut(id) {
            return self.descend_into(pass, next, item, existing, depth);
        }

        let mut element = IndexedNode::new(id, item.clone());
        self.descend_into(pass, next, item, &mut element, depth)?;
        if element.children.is_some() {
            pass.adopt(position, element)?;
        }
        Ok(())
    }

    fn descend_into(
        &self,
        pass: &mut IndexingPass,
        next: CommandContext<'_>,
        item: &Value,
        element: &mut IndexedNode,
        depth: usize,
    ) -> IndexingResult<()> {
        let entered = pass.enter(item)?;
        let result = self.index_from(pass, next, item, element, depth + 1);
        pass.leave(entered);
        result
    }
}

/// Context for the level below a container's member, when the chain goes on
/// to another collection or map
fn next_level(member: Option<CommandContext<'_>>) -> IndexingResult<Option<CommandContext<'_>>> {
    let member = member
        .ok_or_else(|| IndexingError::tree_mismatch("container node without its member"))?;
    if !member.has_descendant_collection_or_map() {
        return Ok(None);
    }
    member.descend().map(Some).ok_or_else(|| {
        IndexingError::tree_mismatch(&format!(
            "member '{}' has no child for the rest of the chain",
            member.node().path
        ))
    })
}

fn position_key(ctx: &CommandContext<'_>) -> String {
    let tokens = &ctx.chain().tokens[..=ctx.token_index()];
    let start = tokens[..tokens.len() - 1]
        .iter()
        .rposition(ChainToken::has_notation)
        .map_or(0, |i| i + 1);
    let segment = tokens[start..]
        .iter()
        .map(|t| t.field_name.as_str())
        .collect::<Vec<_>>()
        .join(".");
    let notation = if ctx.node().is_map() {
        MAP_NOTATION
    } else {
        COLLECTION_NOTATION
    };
    format!("{}{}", segment, notation)
}
