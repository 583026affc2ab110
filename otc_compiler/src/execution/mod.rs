//! Collection-size reconciliation between a source and a target chain
//!
//! Code generation opens one loop per collection level. When the two sides
//! nest differently, [`CollectionsComparisonType`] says which side is deeper
//! and therefore drives iteration.

use crate::command::CommandContext;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectionsComparisonType {
    LargeSource,
    LargeTarget,
    EqualSize,
}

impl CollectionsComparisonType {
    pub fn compare(source_count: usize, target_count: usize) -> Self {
        match source_count.cmp(&target_count) {
            Ordering::Greater => Self::LargeSource,
            Ordering::Less => Self::LargeTarget,
            Ordering::Equal => Self::EqualSize,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LargeSource => "LARGE_SOURCE",
            Self::LargeTarget => "LARGE_TARGET",
            Self::EqualSize => "EQUAL_SIZE",
        }
    }
}

/// Source and target contexts of one mapping command
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub source: CommandContext<'a>,
    pub target: CommandContext<'a>,
    collection_size_type: CollectionsComparisonType,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(source: CommandContext<'a>, target: CommandContext<'a>) -> Self {
        let mut context = Self {
            source,
            target,
            collection_size_type: CollectionsComparisonType::EqualSize,
        };
        context.collection_size_type = context.init_collection_size_type();
        context
    }

    /// Classification computed when the context was created
    pub fn collection_size_type(&self) -> CollectionsComparisonType {
        self.collection_size_type
    }

    /// Whole source chain against whole target chain
    pub fn init_collection_size_type(&self) -> CollectionsComparisonType {
        CollectionsComparisonType::compare(
            self.source.collections_count(),
            self.target.collections_count(),
        )
    }

    /// Source depth against the target's remaining depth at `target`. The
    /// source loses one level when the target chain is anchored somewhere
    /// other than the current token.
    pub fn current_collection_size_type(
        &self,
        target: &CommandContext<'_>,
    ) -> CollectionsComparisonType {
        let mut source_count = self.source.collections_count();
        if target.chain_has_anchor() && !target.is_current_token_anchored() {
            source_count = source_count.saturating_sub(1);
        }
        CollectionsComparisonType::compare(
            source_count,
            target.descendants_collections_count_inclusive(),
        )
    }

    /// As [`Self::current_collection_size_type`] without the anchor
    /// adjustment
    pub fn current_collection_inclusive_size_type(
        &self,
        target: &CommandContext<'_>,
    ) -> CollectionsComparisonType {
        CollectionsComparisonType::compare(
            self.source.collections_count(),
            target.descendants_collections_count_inclusive(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandTree, CommandTreeFactory, Side};
    use crate::grammar::TokenizedChain;
    use crate::introspection::{SchemaRegistry, TypeRef};

    const SCHEMA: &str = r#"
        [types.A.fields]
        xs = "List<B>"
        name = "String"

        [types.B.fields]
        ys = "List<C>"
        name = "String"

        [types.C.fields]
        zs = "List<D>"
        name = "String"

        [types.D.fields]
        name = "String"
    "#;

    fn build(side: Side, chain: &str) -> (CommandTree, TokenizedChain) {
        let schema = SchemaRegistry::from_toml_str(SCHEMA).unwrap();
        let factory = CommandTreeFactory::new(&schema);
        let mut tree = CommandTree::new(side, TypeRef::object("A"));
        let (tokens, _) = factory.resolve_str(&mut tree, chain).unwrap();
        (tree, tokens)
    }

    fn classify(source: &str, target: &str) -> CollectionsComparisonType {
        let (source_tree, source_chain) = build(Side::Source, source);
        let (target_tree, target_chain) = build(Side::Target, target);
        let source_ctx = CommandContext::at_first(&source_tree, &source_chain).unwrap();
        let target_ctx = CommandContext::at_first(&target_tree, &target_chain).unwrap();
        ExecutionContext::new(source_ctx, target_ctx).collection_size_type()
    }

    #[test]
    fn test_equal_depth() {
        assert_eq!(
            classify("xs[*].ys[*].name", "xs[*].ys[*].name"),
            CollectionsComparisonType::EqualSize
        );
    }

    #[test]
    fn test_large_source() {
        assert_eq!(
            classify("xs[*].ys[*].zs[*].name", "xs[*].name"),
            CollectionsComparisonType::LargeSource
        );
    }

    #[test]
    fn test_large_target() {
        assert_eq!(
            classify("xs[*].name", "xs[*].ys[*].zs[*].name"),
            CollectionsComparisonType::LargeTarget
        );
    }

    #[test]
    fn test_current_size_with_anchor() {
        let (source_tree, source_chain) = build(Side::Source, "xs[*].ys[*].name");
        let (target_tree, target_chain) = build(Side::Target, "xs[^].ys[*].name");
        let source = CommandContext::at_first(&source_tree, &source_chain).unwrap();
        let target = CommandContext::at_first(&target_tree, &target_chain).unwrap();
        let execution = ExecutionContext::new(source, target);

        // at the anchored token no adjustment applies
        assert_eq!(
            execution.current_collection_size_type(&target),
            CollectionsComparisonType::EqualSize
        );

        // past the anchor the source loses one level: 1 vs 1
        let inner = target.descend().unwrap().descend().unwrap();
        assert_eq!(inner.node().path, "xs[*].ys");
        assert_eq!(
            execution.current_collection_size_type(&inner),
            CollectionsComparisonType::EqualSize
        );
        assert_eq!(
            execution.current_collection_inclusive_size_type(&inner),
            CollectionsComparisonType::LargeSource
        );
    }

    #[test]
    fn test_current_size_without_anchor() {
        let (source_tree, source_chain) = build(Side::Source, "xs[*].ys[*].name");
        let (target_tree, target_chain) = build(Side::Target, "xs[*].ys[*].name");
        let source = CommandContext::at_first(&source_tree, &source_chain).unwrap();
        let target = CommandContext::at_first(&target_tree, &target_chain).unwrap();
        let execution = ExecutionContext::new(source, target);

        let inner = target.descend().unwrap().descend().unwrap();
        assert_eq!(
            execution.current_collection_size_type(&inner),
            CollectionsComparisonType::LargeSource
        );
    }
}
