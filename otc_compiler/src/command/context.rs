//! Positional queries over a resolved chain

use super::node::{CommandNode, NodeId};
use super::tree::CommandTree;
use crate::grammar::{ChainToken, MapSide, TokenizedChain};

/// A cursor pairing one chain's tokens with a node of its command tree.
///
/// Contexts are small `Copy` values; moving to another node produces a new
/// context and leaves the original untouched.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    tree: &'a CommandTree,
    chain: &'a TokenizedChain,
    node: NodeId,
}

impl<'a> CommandContext<'a> {
    pub fn new(tree: &'a CommandTree, chain: &'a TokenizedChain, node: NodeId) -> Self {
        Self { tree, chain, node }
    }

    /// Context at the chain's first node, if the chain was resolved
    pub fn at_first(tree: &'a CommandTree, chain: &'a TokenizedChain) -> Option<Self> {
        let first = chain.tokens.first()?;
        tree.first_node(&first.field_name)
            .map(|node| Self::new(tree, chain, node))
    }

    /// Same chain, different node
    pub fn with_node(&self, node: NodeId) -> Self {
        Self { node, ..*self }
    }

    pub fn tree(&self) -> &'a CommandTree {
        self.tree
    }

    pub fn chain(&self) -> &'a TokenizedChain {
        self.chain
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub fn node(&self) -> &'a CommandNode {
        self.tree.node(self.node)
    }

    pub fn token_index(&self) -> usize {
        self.node().token_index
    }

    pub fn token(&self) -> &'a ChainToken {
        &self.chain.tokens[self.token_index()]
    }

    pub fn is_first_node(&self) -> bool {
        self.node().is_first_node
    }

    fn is_last_token(&self) -> bool {
        self.token_index() == self.chain.last_index()
    }

    /// Last token, and not a container still waiting for its member
    pub fn is_leaf(&self) -> bool {
        self.is_last_token() && !self.node().is_container()
    }

    /// The node directly above the chain's leaf: one token before the end
    /// with a plain last token, or the container whose member is the leaf.
    pub fn is_leaf_parent(&self) -> bool {
        let node = self.node();
        if self.is_last_token() {
            return node.is_container();
        }
        if node.is_container() || self.token_index() + 1 != self.chain.last_index() {
            return false;
        }
        self.chain
            .tokens
            .last()
            .is_some_and(|last| !last.has_notation())
    }

    /// A token strictly before the current one carries collection or map
    /// notation
    pub fn has_ancestral_collection_or_map(&self) -> bool {
        self.chain.tokens[..self.token_index()]
            .iter()
            .any(ChainToken::has_notation)
    }

    /// A token strictly after the current one carries collection or map
    /// notation
    pub fn has_descendant_collection_or_map(&self) -> bool {
        self.chain.tokens[self.token_index() + 1..]
            .iter()
            .any(ChainToken::has_notation)
    }

    pub fn is_current_token_anchored(&self) -> bool {
        self.token().is_anchored()
    }

    pub fn is_pre_anchored(&self) -> bool {
        self.token().is_pre_anchored()
    }

    pub fn is_post_anchored(&self) -> bool {
        self.token().is_post_anchored()
    }

    pub fn chain_has_anchor(&self) -> bool {
        self.chain.has_anchor()
    }

    /// Tokens from the current one to the end carrying collection or map
    /// notation
    pub fn descendants_collections_count_inclusive(&self) -> usize {
        self.chain.tokens[self.token_index()..]
            .iter()
            .filter(|t| t.has_notation())
            .count()
    }

    /// Collection or map levels of the whole chain
    pub fn collections_count(&self) -> usize {
        self.chain.collection_count()
    }

    /// Normalized chain prefix up to and including the current token
    pub fn sanitized_prefix(&self) -> String {
        self.chain.sanitized_prefix(self.token_index())
    }

    /// Member of the current container: the collection member, or the map
    /// side addressed by the current token
    pub fn member(&self) -> Option<Self> {
        self.tree
            .member_of(self.node, self.token().map_side)
            .map(|id| self.with_node(id))
    }

    /// A specific side of the current map
    pub fn map_member(&self, side: MapSide) -> Option<Self> {
        self.tree
            .member_of(self.node, Some(side))
            .map(|id| self.with_node(id))
    }

    /// Next node along the chain: a container steps to its member, anything
    /// else to the child bound by the next token
    pub fn descend(&self) -> Option<Self> {
        if self.node().is_container() {
            return self.member();
        }
        let next = self.chain.tokens.get(self.token_index() + 1)?;
        self.node()
            .child(&next.field_name)
            .map(|id| self.with_node(id))
    }

    /// Parent context; members step back to their container
    pub fn parent(&self) -> Option<Self> {
        self.node().parent.map(|id| self.with_node(id))
    }
}
